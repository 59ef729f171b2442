//! Locked folder handlers (list, upload, download)

use crate::auth::PinBody;
use crate::relay::{relay, RelayError};
use crate::{ApiError, AppState, ErrorCode, Operation};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use pinvault_drive::{DriveFile, NewFile};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Multipart field carrying the upload
pub const FILE_FIELD: &str = "file";
/// Multipart field carrying the PIN
pub const PIN_FIELD: &str = "pin";

const OCTET_STREAM: &str = "application/octet-stream";

/// A file as shown in folder listings
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

impl From<DriveFile> for FileSummary {
    fn from(file: DriveFile) -> Self {
        Self {
            id: file.id,
            name: file.name,
            mime_type: file.mime_type,
            created_time: file.created_time,
            size: file.size,
        }
    }
}

/// Response of POST /files/list
#[derive(Debug, Serialize)]
pub struct ListFilesResponse {
    pub files: Vec<FileSummary>,
}

/// The created file as returned after an upload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Response of POST /files/upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub file: UploadedFile,
}

/// POST /files/list - List the locked folder
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    body: PinBody,
) -> Result<Json<ListFilesResponse>, ApiError> {
    state.pin_guard.check(body.pin())?;

    let files = state
        .drive
        .list_folder(state.folder_id())
        .await
        .map_err(ApiError::upstream_for(Operation::List))?;

    debug!(count = files.len(), "Listed locked folder");
    Ok(Json(ListFilesResponse {
        files: files.into_iter().map(FileSummary::from).collect(),
    }))
}

/// An uploaded file read from the multipart body
struct FilePart {
    name: String,
    content_type: Option<String>,
    data: Bytes,
}

/// POST /files/upload - Upload a file into the locked folder
///
/// Expects `multipart/form-data` with a `pin` field and a `file` field. When
/// the PIN precedes the file, a bad PIN is rejected before the file is read.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut pin: Option<String> = None;
    let mut file: Option<FilePart> = None;

    // A non-multipart body carries neither field
    if let Ok(mut multipart) = multipart {
        while let Some(field) = multipart.next_field().await.map_err(|e| {
            ApiError::with_message(ErrorCode::InvalidRequest, e.body_text())
        })? {
            let field_name = field.name().map(str::to_string);
            match field_name.as_deref() {
                Some(PIN_FIELD) if pin.is_none() => {
                    pin = Some(field.text().await.map_err(|e| {
                        ApiError::with_message(ErrorCode::InvalidRequest, e.body_text())
                    })?);
                }
                Some(FILE_FIELD) if file.is_none() => {
                    // A `file` field without a file name is not a file
                    let Some(name) = field
                        .file_name()
                        .filter(|n| !n.is_empty())
                        .map(str::to_string)
                    else {
                        continue;
                    };
                    if pin.is_some() {
                        state.pin_guard.check(pin.as_deref())?;
                    }
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await.map_err(|e| {
                        ApiError::with_message(ErrorCode::InvalidRequest, e.body_text())
                    })?;
                    file = Some(FilePart {
                        name,
                        content_type,
                        data,
                    });
                }
                _ => {}
            }
        }
    }

    state.pin_guard.check(pin.as_deref())?;
    let file = file.ok_or_else(|| ApiError::new(ErrorCode::FileRequired))?;

    let mime_type = upload_mime_type(&file.name, file.content_type.as_deref());
    let size = file.data.len();
    let new_file = NewFile::in_folder(state.folder_id(), file.name, mime_type, file.data);

    let created = state
        .drive
        .create_file(new_file)
        .await
        .map_err(ApiError::upstream_for(Operation::Upload))?;

    info!(id = %created.id, name = %created.name, size, "File uploaded");

    let body = UploadResponse {
        message: "File uploaded",
        file: UploadedFile {
            id: created.id,
            name: created.name,
            mime_type: created.mime_type,
        },
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// POST /files/{file_id}/download - Stream a file out of the locked folder
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
    body: PinBody,
) -> Result<Response, ApiError> {
    state.pin_guard.check(body.pin())?;

    let meta = state
        .drive
        .get_metadata(&file_id)
        .await
        .map_err(ApiError::upstream_for(Operation::Download))?;

    // A valid PIN must not unlock files outside the folder
    if !meta.is_in_folder(state.folder_id()) {
        info!(file_id = %file_id, "Refused download outside the locked folder");
        return Err(ApiError::new(ErrorCode::NotInLockedFolder));
    }

    let upstream = state
        .drive
        .download(&file_id)
        .await
        .map_err(ApiError::upstream_for(Operation::Download))?;

    let body = relay(upstream, state.config.stream_idle_timeout())
        .await
        .map_err(|e| match e {
            RelayError::Upstream(source) => ApiError::upstream(Operation::Download, source),
            other => ApiError::Internal(other.to_string()),
        })?;

    let content_type = meta
        .mime_type
        .as_deref()
        .filter(|m| !m.is_empty())
        .unwrap_or(OCTET_STREAM);

    Ok((
        [
            (header::CONTENT_DISPOSITION, content_disposition(&meta.name)),
            (header::CONTENT_TYPE, content_type.to_string()),
        ],
        body,
    )
        .into_response())
}

/// Pick the stored media type of an upload
///
/// The part's declared type wins, then a guess from the file name.
pub fn upload_mime_type(file_name: &str, declared: Option<&str>) -> String {
    match declared {
        Some(ct) if !ct.is_empty() && ct != OCTET_STREAM => {
            ct.to_string()
        }
        _ => mime_guess::from_path(file_name)
            .first_or_octet_stream()
            .to_string(),
    }
}

/// Build an `attachment` Content-Disposition value
///
/// The quoted `filename` keeps printable ASCII only; names with anything else
/// also get an RFC 5987 `filename*` carrying the exact UTF-8 name.
pub fn content_disposition(name: &str) -> String {
    let plain = name.chars().all(|c| c.is_ascii() && !c.is_ascii_control());
    let fallback: String = name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if !c.is_ascii() || c.is_ascii_control() => '_',
            c => c,
        })
        .collect();

    if plain {
        format!("attachment; filename=\"{}\"", fallback)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            urlencoding::encode(name)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_plain() {
        assert_eq!(
            content_disposition("report.pdf"),
            "attachment; filename=\"report.pdf\""
        );
    }

    #[test]
    fn test_content_disposition_escapes_quotes() {
        assert_eq!(
            content_disposition("say \"hi\".txt"),
            "attachment; filename=\"say _hi_.txt\""
        );
    }

    #[test]
    fn test_content_disposition_unicode() {
        let value = content_disposition("résumé.pdf");
        assert_eq!(
            value,
            "attachment; filename=\"r_sum_.pdf\"; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf"
        );
        assert!(axum::http::HeaderValue::from_str(&value).is_ok());
    }

    #[test]
    fn test_content_disposition_control_chars() {
        let value = content_disposition("evil\r\nSet-Cookie: x.txt");
        assert!(axum::http::HeaderValue::from_str(&value).is_ok());
        assert!(value.starts_with("attachment; filename=\"evil__Set-Cookie: x.txt\""));
    }

    #[test]
    fn test_upload_mime_type() {
        assert_eq!(upload_mime_type("a.txt", Some("text/markdown")), "text/markdown");
        assert_eq!(upload_mime_type("a.png", None), "image/png");
        assert_eq!(
            upload_mime_type("a.png", Some("application/octet-stream")),
            "image/png"
        );
        assert_eq!(
            upload_mime_type("noext", None),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_list_summary_drops_parents() {
        let file = DriveFile {
            id: "1".into(),
            name: "a.txt".into(),
            mime_type: Some("text/plain".into()),
            created_time: Some("2024-05-01T00:00:00.000Z".into()),
            size: Some("5".into()),
            parents: vec!["F1".into()],
        };
        let value = serde_json::to_value(FileSummary::from(file)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "1",
                "name": "a.txt",
                "mimeType": "text/plain",
                "createdTime": "2024-05-01T00:00:00.000Z",
                "size": "5"
            })
        );
    }
}
