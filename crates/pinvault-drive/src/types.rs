//! Common types for the Drive client

use crate::DriveError;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Fields requested when listing a folder
pub const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, createdTime, size)";

/// Fields requested when checking a file before download
pub const METADATA_FIELDS: &str = "id, name, parents, mimeType";

/// Fields returned after an upload
pub const CREATE_FIELDS: &str = "id, name, mimeType";

/// Raw file content as it arrives from Drive
pub type ByteStream = BoxStream<'static, Result<Bytes, DriveError>>;

/// A Drive file resource (only the fields Pinvault asks for)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    /// File ID
    pub id: String,
    /// File name
    #[serde(default)]
    pub name: String,
    /// Mime type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Creation time (RFC 3339, as sent by Drive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    /// Size in bytes; Drive encodes int64 values as strings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// IDs of the parent folders
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

impl DriveFile {
    /// Check whether the file sits directly in the given folder
    pub fn is_in_folder(&self, folder_id: &str) -> bool {
        self.parents.iter().any(|p| p == folder_id)
    }
}

/// One page of `files.list`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileList {
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub files: Vec<DriveFile>,
}

/// A file to create in Drive
#[derive(Clone, Debug)]
pub struct NewFile {
    /// File name
    pub name: String,
    /// Media type of the content
    pub mime_type: String,
    /// Parent folder IDs
    pub parents: Vec<String>,
    /// File content
    pub content: Bytes,
}

impl NewFile {
    /// Create a file placed in a single folder
    pub fn in_folder(
        folder_id: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            parents: vec![folder_id.into()],
            content: content.into(),
        }
    }

    /// Metadata part of the upload request
    pub(crate) fn metadata(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "mimeType": self.mime_type,
            "parents": self.parents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_list_page() {
        let json = r#"{
            "nextPageToken": "next",
            "files": [
                {"id": "1", "name": "a.txt", "mimeType": "text/plain", "createdTime": "2024-05-01T10:00:00.000Z", "size": "12"},
                {"id": "2", "name": "sub", "mimeType": "application/vnd.google-apps.folder", "createdTime": "2024-05-02T10:00:00.000Z"}
            ]
        }"#;

        let page: FileList = serde_json::from_str(json).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("next"));
        assert_eq!(page.files.len(), 2);
        assert_eq!(page.files[0].size.as_deref(), Some("12"));
        assert_eq!(
            page.files[1].mime_type.as_deref(),
            Some("application/vnd.google-apps.folder")
        );
        assert_eq!(page.files[1].size, None);
    }

    #[test]
    fn test_empty_page_has_no_files() {
        let page: FileList = serde_json::from_str("{}").unwrap();
        assert!(page.files.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_is_in_folder() {
        let file = DriveFile {
            id: "abc".into(),
            parents: vec!["F2".into(), "F3".into()],
            ..Default::default()
        };
        assert!(file.is_in_folder("F3"));
        assert!(!file.is_in_folder("F1"));
        assert!(!DriveFile::default().is_in_folder("F1"));
    }

    #[test]
    fn test_serialize_skips_missing_fields() {
        let file = DriveFile {
            id: "1".into(),
            name: "a.txt".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(&file).unwrap();
        assert_eq!(value, serde_json::json!({"id": "1", "name": "a.txt"}));
    }
}
