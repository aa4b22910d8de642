//! Folder handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};

use crate::web::dto::{
    BulkCreatedResponse, BulkDeletedResponse, FolderEntry, FolderListResponse,
    FolderNamesRequest, FolderRenameRequest, MessageResponse, OneOrMany, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::{ReadScope, Scoped, WriteScope};

/// GET /folder - List the caller's folders.
pub async fn list_folders(
    State(state): State<Arc<AppState>>,
    auth: Scoped<ReadScope>,
) -> Result<Json<FolderListResponse>, ApiError> {
    let folders = state.folders().list(auth.user.id).await?;
    Ok(Json(FolderListResponse {
        folders: folders.into_iter().map(FolderEntry::from).collect(),
    }))
}

/// POST /folder - Create one folder, or several from a list.
pub async fn create_folders(
    State(state): State<Arc<AppState>>,
    auth: Scoped<WriteScope>,
    Json(req): Json<FolderNamesRequest>,
) -> Result<Response, ApiError> {
    let folders = state.folders();
    match req.name {
        OneOrMany::One(name) => {
            folders.create(auth.user.id, &name).await?;
            Ok(Json(MessageResponse::new("Successfully created.")).into_response())
        }
        OneOrMany::Many(names) => {
            let outcome = folders.create_many(auth.user.id, names).await?;
            Ok(Json(BulkCreatedResponse::from(outcome)).into_response())
        }
    }
}

/// PATCH /folder - Rename a folder.
pub async fn rename_folder(
    State(state): State<Arc<AppState>>,
    auth: Scoped<WriteScope>,
    ValidatedJson(req): ValidatedJson<FolderRenameRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .folders()
        .rename(auth.user.id, &req.old_name, &req.new_name)
        .await?;
    Ok(Json(MessageResponse::new("Successfully renamed!")))
}

/// DELETE /folder - Delete one folder, or several from a list.
///
/// Deleting a folder deletes the files in it.
pub async fn delete_folders(
    State(state): State<Arc<AppState>>,
    auth: Scoped<WriteScope>,
    Json(req): Json<FolderNamesRequest>,
) -> Result<Response, ApiError> {
    let folders = state.folders();
    match req.name {
        OneOrMany::One(name) => {
            folders.delete(auth.user.id, &name).await?;
            Ok(Json(MessageResponse::new("Successfully deleted the folder")).into_response())
        }
        OneOrMany::Many(names) => {
            let outcome = folders.delete_many(auth.user.id, names).await?;
            Ok(Json(BulkDeletedResponse::from(outcome)).into_response())
        }
    }
}
