//! Application state

use crate::auth::PinGuard;
use crate::config::GatewayConfig;
use pinvault_drive::{DriveApi, DriveClient, DriveConfig};
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared across handlers
///
/// Built once at startup and read-only afterwards.
pub struct AppState {
    /// Gateway configuration
    pub config: GatewayConfig,
    /// Drive client scoped by the service-account credentials
    pub drive: Arc<dyn DriveApi>,
    /// PIN checker
    pub pin_guard: PinGuard,
}

impl AppState {
    /// Create the state with a Drive client for the configured key file
    pub fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        if config.credentials_path.exists() {
            info!(path = %config.credentials_path.display(), "Using service account key");
        } else {
            // Drive calls will fail until the file appears
            warn!(
                path = %config.credentials_path.display(),
                "Service account key not found"
            );
        }

        let drive = DriveClient::from_service_account(
            config.credentials_path.clone(),
            DriveConfig::default(),
        )?;

        Ok(Self::with_drive(config, Arc::new(drive)))
    }

    /// Create the state around an existing Drive implementation
    pub fn with_drive(config: GatewayConfig, drive: Arc<dyn DriveApi>) -> Self {
        let pin_guard = PinGuard::new(&config.pin);
        Self {
            config,
            drive,
            pin_guard,
        }
    }

    /// ID of the locked folder
    pub fn folder_id(&self) -> &str {
        &self.config.folder_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_file_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = GatewayConfig {
            folder_id: "F1".into(),
            pin: "1234".into(),
            credentials_path: dir.path().join("absent.json"),
            ..Default::default()
        };

        let state = AppState::new(config).unwrap();
        assert_eq!(state.folder_id(), "F1");
        assert!(state.pin_guard.matches(Some("1234")));

        // The key is read on first use, so Drive calls fail instead
        assert!(state.drive.list_folder("F1").await.is_err());
    }
}
