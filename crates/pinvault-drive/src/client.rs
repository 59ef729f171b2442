//! Main client implementation

use crate::{
    auth::{ServiceAccountTokenProvider, TokenProvider},
    types::*,
    DriveApi, DriveConfig, DriveError, Result,
};
use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use futures::TryStreamExt;
use reqwest::{header, Client, RequestBuilder, Response};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, instrument};
use url::Url;

/// Google Drive v3 client
pub struct DriveClient {
    config: DriveConfig,
    http: Client,
    tokens: Arc<dyn TokenProvider>,
}

impl DriveClient {
    /// Create a client with an explicit token source
    pub fn new(config: DriveConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        let http = build_http(&config)?;
        Ok(Self { config, http, tokens })
    }

    /// Create a client authenticated by a service-account key file
    ///
    /// The key is loaded lazily; see [`ServiceAccountTokenProvider`].
    pub fn from_service_account(
        key_path: impl Into<PathBuf>,
        config: DriveConfig,
    ) -> Result<Self> {
        let http = build_http(&config)?;
        let tokens = Arc::new(ServiceAccountTokenProvider::new(
            key_path,
            config.scope.clone(),
            http.clone(),
        ));
        Ok(Self { config, http, tokens })
    }

    // ==================== Helper Methods ====================

    fn files_url(&self, base: &str) -> Result<Url> {
        let mut url = Url::parse(base)
            .map_err(|e| DriveError::Config(format!("invalid base URL {}: {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| DriveError::Config(format!("base URL cannot have a path: {}", base)))?
            .pop_if_empty()
            .push("files");
        Ok(url)
    }

    fn file_url(&self, file_id: &str) -> Result<Url> {
        let mut url = self.files_url(&self.config.api_base)?;
        url.path_segments_mut()
            .map_err(|_| DriveError::Config("base URL cannot have a path".to_string()))?
            .push(file_id);
        Ok(url)
    }

    async fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.tokens.access_token().await?;
        Ok(req.bearer_auth(token).query(&[("supportsAllDrives", "true")]))
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let response = self.authorized(req).await?.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(DriveError::from_api_body(status.as_u16(), &text));
        }

        Ok(response)
    }

    async fn list_page(&self, folder_id: &str, page_token: Option<&str>) -> Result<FileList> {
        let url = self.files_url(&self.config.api_base)?;
        let query = folder_query(folder_id);
        let page_size = self.config.page_size.to_string();

        let mut params = vec![
            ("q", query.as_str()),
            ("fields", LIST_FIELDS),
            ("pageSize", page_size.as_str()),
            ("includeItemsFromAllDrives", "true"),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let req = self
            .http
            .get(url)
            .query(&params)
            .timeout(self.config.timeout);
        let response = self.send(req).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl DriveApi for DriveClient {
    #[instrument(skip(self))]
    async fn list_folder(&self, folder_id: &str) -> Result<Vec<DriveFile>> {
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.list_page(folder_id, page_token.as_deref()).await?;
            files.extend(page.files);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(count = files.len(), "Listed folder");
        Ok(files)
    }

    #[instrument(skip(self, file), fields(name = %file.name, size = file.content.len()))]
    async fn create_file(&self, file: NewFile) -> Result<DriveFile> {
        let url = self.files_url(&self.config.upload_base)?;
        let boundary = format!("pinvault-{}", uuid::Uuid::new_v4().simple());
        let body = related_body(&boundary, &file)?;

        let req = self
            .http
            .post(url)
            .query(&[("uploadType", "multipart"), ("fields", CREATE_FIELDS)])
            .header(
                header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .timeout(self.config.upload_timeout)
            .body(body);

        let response = self.send(req).await?;
        let created: DriveFile = response.json().await?;
        if created.id.is_empty() {
            return Err(DriveError::InvalidResponse(
                "upload response has no file id".to_string(),
            ));
        }

        debug!(id = %created.id, "Created file");
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn get_metadata(&self, file_id: &str) -> Result<DriveFile> {
        let url = self.file_url(file_id)?;
        let req = self
            .http
            .get(url)
            .query(&[("fields", METADATA_FIELDS)])
            .timeout(self.config.timeout);

        let response = self.send(req).await?;
        Ok(response.json().await?)
    }

    #[instrument(skip(self))]
    async fn download(&self, file_id: &str) -> Result<ByteStream> {
        let url = self.file_url(file_id)?;
        // No overall timeout: the body may take arbitrarily long to stream
        let req = self.http.get(url).query(&[("alt", "media")]);

        let response = self.send(req).await?;
        let stream = response.bytes_stream().map_err(DriveError::from);
        Ok(Box::pin(stream))
    }
}

fn build_http(config: &DriveConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(DriveError::Http)
}

/// Drive query selecting the live children of a folder
fn folder_query(folder_id: &str) -> String {
    let escaped = folder_id.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}' in parents and trashed = false", escaped)
}

/// Build a `multipart/related` body: JSON metadata, then the media
fn related_body(boundary: &str, file: &NewFile) -> Result<Bytes> {
    let metadata = serde_json::to_vec(&file.metadata())?;

    let mut body = BytesMut::with_capacity(file.content.len() + metadata.len() + 256);
    body.put_slice(format!("--{}\r\n", boundary).as_bytes());
    body.put_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.put_slice(&metadata);
    body.put_slice(b"\r\n");

    body.put_slice(format!("--{}\r\n", boundary).as_bytes());
    body.put_slice(format!("Content-Type: {}\r\n\r\n", file.mime_type).as_bytes());
    body.put_slice(&file.content);
    body.put_slice(b"\r\n");
    body.put_slice(format!("--{}--\r\n", boundary).as_bytes());

    Ok(body.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaticTokenProvider;

    fn client(base: &str) -> DriveClient {
        DriveClient::new(
            DriveConfig::default().with_base_url(base),
            Arc::new(StaticTokenProvider::new("token")),
        )
        .unwrap()
    }

    #[test]
    fn test_folder_query() {
        assert_eq!(
            folder_query("1AbC"),
            "'1AbC' in parents and trashed = false"
        );
        assert_eq!(
            folder_query("it's"),
            "'it\\'s' in parents and trashed = false"
        );
    }

    #[test]
    fn test_file_url_escapes_id() {
        let client = client("https://example.com");
        let url = client.file_url("a/b c").unwrap();
        assert_eq!(url.as_str(), "https://example.com/drive/v3/files/a%2Fb%20c");
    }

    #[test]
    fn test_related_body_layout() {
        let file = NewFile::in_folder("F1", "notes.txt", "text/plain", "hello");
        let body = related_body("xyz", &file).unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();

        assert!(text.starts_with("--xyz\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n"));
        assert!(text.contains(r#""parents":["F1"]"#));
        assert!(text.contains("--xyz\r\nContent-Type: text/plain\r\n\r\nhello\r\n"));
        assert!(text.ends_with("--xyz--\r\n"));
    }
}
