//! The operations the gateway needs from Drive

use crate::{ByteStream, DriveFile, NewFile, Result};
use async_trait::async_trait;

/// Folder-scoped Drive operations
///
/// [`DriveClient`](crate::DriveClient) talks to Google; the gateway only sees
/// this trait, so tests can substitute an in-memory drive.
#[async_trait]
pub trait DriveApi: Send + Sync {
    /// List the non-trashed children of a folder (all pages)
    async fn list_folder(&self, folder_id: &str) -> Result<Vec<DriveFile>>;

    /// Create a file with metadata and content, returning `id, name, mimeType`
    async fn create_file(&self, file: NewFile) -> Result<DriveFile>;

    /// Fetch `id, name, parents, mimeType` of a file
    async fn get_metadata(&self, file_id: &str) -> Result<DriveFile>;

    /// Open the file content as a byte stream
    async fn download(&self, file_id: &str) -> Result<ByteStream>;
}
