//! File handlers for Web API.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{
        multipart::{Field, MultipartError},
        Multipart, Path, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::file::{Download, SettingsChange, UploadSource};
use crate::web::dto::{
    BrowseRequest, BulkDeletedResponse, FileDeleteRequest, FileEntry, FileListResponse,
    FileMoveRequest, FileSettingsRequest, MessageResponse, OneOrMany, OptionalValidatedJson,
    SettingsResponse,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::{ReadScope, Scoped, WriteScope};
use crate::FiledockError;

/// Generate a safe Content-Disposition header value for file downloads.
///
/// Control characters are dropped and quotes or backslashes replaced in the
/// plain `filename` parameter. Names that are not plain ASCII additionally
/// get an RFC 5987 `filename*` parameter carrying the exact name.
fn content_disposition_header(filename: &str) -> String {
    let needs_encoding =
        !filename.is_ascii() || filename.chars().any(|c| c.is_control() || c == '"' || c == '\\');
    if !needs_encoding {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let fallback: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            c if !c.is_ascii() => '_',
            c => c,
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

fn download_response(download: Download) -> Result<Response, ApiError> {
    let Download { record, content } = download;
    Response::builder()
        .header(header::CONTENT_TYPE, record.content_type.as_str())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&record.full_name),
        )
        .header(header::CONTENT_LENGTH, content.len())
        .body(Body::from(content))
        .map_err(|e| {
            tracing::error!(file_id = record.id, "Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// Multipart field read chunk by chunk into storage.
struct FieldSource<'a> {
    field: Field<'a>,
    max_bytes: u64,
}

impl UploadSource for FieldSource<'_> {
    type Chunk = Bytes;

    async fn next_chunk(&mut self) -> crate::Result<Option<Bytes>> {
        self.field
            .chunk()
            .await
            .map_err(|e| multipart_error(e, self.max_bytes))
    }
}

fn multipart_error(e: MultipartError, max_bytes: u64) -> FiledockError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        FiledockError::TooLarge(max_bytes)
    } else {
        FiledockError::Validation(format!("invalid multipart data: {}", e.body_text()))
    }
}

/// POST /file/upload/{folder_id} - Upload one file from the `file` field.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    auth: Scoped<WriteScope>,
    Path(folder_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<MessageResponse>, ApiError> {
    let max_bytes = state.storage.max_upload_bytes();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::from(multipart_error(e, max_bytes)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::bad_request("File field has no file name"))?;
        let content_type = field.content_type().map(str::to_string);

        let mut source = FieldSource { field, max_bytes };
        state
            .catalog()
            .upload(
                auth.user.id,
                folder_id,
                &filename,
                content_type.as_deref(),
                &mut source,
            )
            .await?;

        return Ok(Json(MessageResponse::new("Successfully uploaded file.")));
    }

    Err(ApiError::bad_request("No file provided"))
}

/// PATCH /file - Change a file's share mode and/or name.
pub async fn file_settings(
    State(state): State<Arc<AppState>>,
    auth: Scoped<WriteScope>,
    Json(req): Json<FileSettingsRequest>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let change = SettingsChange {
        share: req.share,
        rename: req.rename,
    };
    let outcome = state
        .catalog()
        .apply_settings(auth.user.id, req.file_id, change)
        .await?;
    Ok(Json(SettingsResponse::from(outcome)))
}

/// DELETE /file - Delete one file, or several from a list of ids.
pub async fn delete_files(
    State(state): State<Arc<AppState>>,
    auth: Scoped<WriteScope>,
    Json(req): Json<FileDeleteRequest>,
) -> Result<Response, ApiError> {
    let catalog = state.catalog();
    match req.file_id {
        OneOrMany::One(id) => {
            catalog.delete(auth.user.id, id).await?;
            let message = format!("Success, file with this id <{id}> deleted");
            Ok(Json(MessageResponse::new(message)).into_response())
        }
        OneOrMany::Many(ids) => {
            let outcome = catalog.delete_many(auth.user.id, ids).await?;
            Ok(Json(BulkDeletedResponse::from(outcome)).into_response())
        }
    }
}

/// GET /file/{file_id} - Public download of a shared file.
pub async fn download_shared(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<i64>,
) -> Result<Response, ApiError> {
    let download = state.catalog().download_shared(file_id).await?;
    download_response(download)
}

/// GET /file/download/{file_id} - Owner download.
pub async fn download_owned(
    State(state): State<Arc<AppState>>,
    auth: Scoped<ReadScope>,
    Path(file_id): Path<i64>,
) -> Result<Response, ApiError> {
    let download = state.catalog().download_owned(file_id, auth.user.id).await?;
    download_response(download)
}

/// POST /file/move - Move a file to another folder.
pub async fn move_file(
    State(state): State<Arc<AppState>>,
    auth: Scoped<WriteScope>,
    Json(req): Json<FileMoveRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .catalog()
        .move_to(auth.user.id, req.file_id, req.folder_id)
        .await?;
    Ok(Json(MessageResponse::new(
        "Successfully moved file to another folder!",
    )))
}

/// POST /file - Browse the caller's files. The body is optional.
pub async fn browse_files(
    State(state): State<Arc<AppState>>,
    auth: Scoped<ReadScope>,
    OptionalValidatedJson(req): OptionalValidatedJson<BrowseRequest>,
) -> Result<Json<FileListResponse>, ApiError> {
    let req = req.unwrap_or_default();
    let files = state
        .catalog()
        .browse(
            auth.user.id,
            req.name_pattern.as_deref(),
            req.filters.as_ref(),
        )
        .await?;
    Ok(Json(FileListResponse {
        files: files.into_iter().map(FileEntry::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition_header("report.pdf"),
            "attachment; filename=\"report.pdf\""
        );
    }

    #[test]
    fn test_content_disposition_non_ascii() {
        let value = content_disposition_header("отчёт.pdf");
        assert!(value.starts_with("attachment; filename=\""));
        assert!(value.contains("filename*=UTF-8''%D0%BE%D1%82%D1%87%D1%91%D1%82.pdf"));
        assert!(value.is_ascii());
    }

    #[test]
    fn test_content_disposition_quotes() {
        let value = content_disposition_header("a\"b.txt");
        assert!(value.contains("filename=\"a_b.txt\""));
        assert!(value.contains("filename*=UTF-8''a%22b.txt"));
    }
}
