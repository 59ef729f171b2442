//! HTTP route definitions

use crate::{handlers, middleware, AppState};
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main router
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        // Service endpoints
        .route("/", get(handlers::health_check))
        .route("/auth/check", post(handlers::auth_check))
        // Locked folder endpoints
        .route("/files/list", post(handlers::list_files))
        .route("/files/upload", post(handlers::upload_file))
        .route("/files/{file_id}/download", post(handlers::download_file));

    if let Some(limiter) = middleware::create_rate_limiter(state.config.rate_limit_rps) {
        middleware::spawn_rate_limit_cleanup(&limiter, middleware::RATE_LIMIT_CLEANUP_INTERVAL);
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    if state.config.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(Any);
        router = router.layer(cors);
    }

    let max_body_size = state.config.max_body_size;
    router
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(max_body_size))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GatewayConfig;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use pinvault_drive::{ByteStream, DriveApi, DriveError, DriveFile, NewFile};
    use tower::ServiceExt;

    /// Drive that fails every call; routes under test must not reach it
    struct OfflineDrive;

    #[async_trait]
    impl DriveApi for OfflineDrive {
        async fn list_folder(&self, _folder_id: &str) -> pinvault_drive::Result<Vec<DriveFile>> {
            Err(DriveError::Config("offline".into()))
        }

        async fn create_file(&self, _file: NewFile) -> pinvault_drive::Result<DriveFile> {
            Err(DriveError::Config("offline".into()))
        }

        async fn get_metadata(&self, _file_id: &str) -> pinvault_drive::Result<DriveFile> {
            Err(DriveError::Config("offline".into()))
        }

        async fn download(&self, _file_id: &str) -> pinvault_drive::Result<ByteStream> {
            Err(DriveError::Config("offline".into()))
        }
    }

    fn router(rate_limit_rps: u32) -> Router {
        let config = GatewayConfig {
            folder_id: "F1".into(),
            pin: "1234".into(),
            rate_limit_rps,
            ..Default::default()
        };
        create_router(Arc::new(AppState::with_drive(config, Arc::new(OfflineDrive))))
    }

    fn post_json(uri: &str, body: &'static str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = router(0)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(middleware::REQUEST_ID_HEADER));
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"status": "ok", "message": "Locked folder API running"})
        );
    }

    #[tokio::test]
    async fn test_pin_checked_before_drive() {
        let response = router(0)
            .oneshot(post_json("/files/list", r#"{"pin":"9999"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router(0)
            .oneshot(post_json("/files/abc/download", "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "PIN is required"})
        );
    }

    #[tokio::test]
    async fn test_drive_failure_is_generic() {
        let response = router(0)
            .oneshot(post_json("/files/list", r#"{"pin":"1234"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Internal error listing files"})
        );
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = router(0)
            .oneshot(Request::get("/files/list").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_rate_limit() {
        let app = router(1);
        let first = app
            .clone()
            .oneshot(post_json("/auth/check", r#"{"pin":"0000"}"#))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(post_json("/auth/check", r#"{"pin":"0000"}"#))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
