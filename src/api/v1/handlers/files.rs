/*
 * Responsibility
 * - GET/POST /user/files, GET/DELETE /user/files/{file_id}, POST /files (guest)
 * - 読み取り/削除は常に AuthCtx の user_id で絞り込む (他人のファイルは 404)
 * - 本体は ObjectStore、メタデータは files テーブル
 */
use axum::{
    Json,
    extract::{Multipart, Path, Query, State, multipart::MultipartError},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    api::v1::{
        dto::files::{DEFAULT_FILE_TYPE, FileResponse, ListFilesQuery, UploadedFile},
        extractors::AuthCtxExtractor,
    },
    error::AppError,
    repos::file_repo::{self, NewFile},
    state::AppState,
};

const FILE_FIELD: &str = "file";

pub async fn list_files(
    State(state): State<AppState>,
    AuthCtxExtractor(auth): AuthCtxExtractor,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<Vec<FileResponse>>, AppError> {
    let (limit, offset) = query.page();

    let rows = file_repo::list_by_owner(&state.db, auth.user_id, limit, offset).await?;

    Ok(Json(rows.into_iter().map(FileResponse::from).collect()))
}

pub async fn get_file(
    State(state): State<AppState>,
    AuthCtxExtractor(auth): AuthCtxExtractor,
    Path(file_id): Path<String>,
) -> Result<Json<FileResponse>, AppError> {
    let row = file_repo::get_owned(&state.db, auth.user_id, &file_id)
        .await?
        .ok_or_else(|| AppError::not_found("file"))?;

    Ok(Json(row.into()))
}

pub async fn upload_user_file(
    State(state): State<AppState>,
    AuthCtxExtractor(auth): AuthCtxExtractor,
    multipart: Multipart,
) -> Result<(StatusCode, Json<FileResponse>), AppError> {
    let file = read_upload(multipart).await?;
    store_upload(&state, Some(auth.user_id), file).await
}

pub async fn upload_guest_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<FileResponse>), AppError> {
    let file = read_upload(multipart).await?;
    store_upload(&state, None, file).await
}

/// Metadata goes first; a blob left behind by a failed store delete is only logged.
pub async fn delete_file(
    State(state): State<AppState>,
    AuthCtxExtractor(auth): AuthCtxExtractor,
    Path(file_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let row = file_repo::delete_owned(&state.db, auth.user_id, &file_id)
        .await?
        .ok_or_else(|| AppError::not_found("file"))?;

    if let Err(e) = state.store.delete(&row.file_id, &row.name).await {
        tracing::warn!(
            error = %e,
            file_id = %row.file_id,
            backend = state.store.backend_name(),
            "object left behind after metadata delete"
        );
    }

    tracing::info!(user_id = %auth.user_id, file_id = %row.file_id, "file deleted");

    Ok(StatusCode::NO_CONTENT)
}

async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile, AppError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let name = field.file_name().unwrap_or_default().to_string();
        let file_type = field
            .content_type()
            .unwrap_or(DEFAULT_FILE_TYPE)
            .to_string();
        let content = field.bytes().await.map_err(multipart_error)?;

        upload = Some(UploadedFile {
            name,
            file_type,
            content,
        });
    }

    let upload = upload.ok_or_else(|| AppError::bad_request("INVALID_REQUEST", "file is required"))?;
    upload
        .validate()
        .map_err(|msg| AppError::bad_request("INVALID_REQUEST", msg))?;

    Ok(upload)
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge;
    }
    tracing::debug!(error = %e, "unreadable multipart body");
    AppError::bad_request("INVALID_REQUEST", "invalid multipart body")
}

async fn store_upload(
    state: &AppState,
    owner: Option<Uuid>,
    file: UploadedFile,
) -> Result<(StatusCode, Json<FileResponse>), AppError> {
    let stored = state
        .store
        .put(&file.name, &file.file_type, file.content)
        .await?;

    let created = file_repo::create(
        &state.db,
        NewFile {
            file_id: &stored.file_id,
            bucket_id: &stored.bucket_id,
            owner,
            size: stored.size,
            name: &file.name,
            file_type: &file.file_type,
        },
    )
    .await;

    let row = match created {
        Ok(row) => row,
        Err(e) => {
            // A blob without metadata can never be listed or deleted.
            if let Err(cleanup) = state.store.delete(&stored.file_id, &file.name).await {
                tracing::warn!(error = %cleanup, file_id = %stored.file_id, "orphaned object");
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        file_id = %row.file_id,
        owner = ?owner,
        size = row.size,
        "file uploaded"
    );

    Ok((StatusCode::CREATED, Json(row.into())))
}
