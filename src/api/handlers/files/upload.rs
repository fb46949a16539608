use crate::AppState;
use crate::api::error::AppError;
use crate::models::{ContentHolder, OwnerScope, UploadBody};
use crate::utils::validation::{content_type_or_default, sanitize_filename};
use axum::{
    Extension,
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use futures::TryStreamExt;
use tokio::io::AsyncReadExt;
use tokio_util::io::StreamReader;

#[utoipa::path(
    post,
    path = "/files",
    request_body(content = super::types::UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 202, description = "File accepted", body = String),
        (status = 400, description = "Missing file or size exceeded", body = super::types::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "A backing store failed", body = super::types::ErrorResponse)
    ),
    security(
        ("jwt" = [])
    ),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerScope>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let holder = read_upload(&state, owner, &headers, multipart).await?;
    let name = holder.file.clone();

    state.coordinator.upload(holder).await?;

    Ok((StatusCode::ACCEPTED, format!("{} uploaded", name)))
}

#[utoipa::path(
    put,
    path = "/files",
    request_body(content = super::types::UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 202, description = "New version accepted", body = String),
        (status = 400, description = "Missing file or size exceeded", body = super::types::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such file to update", body = super::types::ErrorResponse),
        (status = 500, description = "A backing store failed", body = super::types::ErrorResponse)
    ),
    security(
        ("jwt" = [])
    ),
    tag = "files"
)]
pub async fn update_file(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerScope>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let holder = read_upload(&state, owner, &headers, multipart).await?;
    let name = holder.file.clone();

    state.coordinator.update(holder).await?;

    Ok((StatusCode::ACCEPTED, format!("{} uploaded", name)))
}

/// Buffers the `file` part (at most one byte past the ceiling) and collects
/// the optional `description` part.
async fn read_upload(
    state: &AppState,
    owner: OwnerScope,
    headers: &HeaderMap,
    mut multipart: Multipart,
) -> Result<ContentHolder<UploadBody>, AppError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    state.coordinator.check_declared_length(declared)?;

    let limit = state.coordinator.max_file_size() as u64 + 1;
    let mut file: Option<(String, String, UploadBody)> = None;
    let mut description = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let original = field.file_name().unwrap_or_default().to_string();
                let filename =
                    sanitize_filename(&original).map_err(|e| AppError::BadRequest(e.message))?;
                let content_type = content_type_or_default(field.content_type());

                let mut reader =
                    StreamReader::new(field.map_err(std::io::Error::other)).take(limit);
                let mut buf = Vec::new();
                reader
                    .read_to_end(&mut buf)
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Unable to read file: {}", e)))?;

                file = Some((filename, content_type, UploadBody::new(buf)));
            }
            "description" => {
                description = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
            }
            _ => {}
        }
    }

    let (filename, content_type, body) =
        file.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    Ok(ContentHolder::upload(
        owner,
        filename,
        content_type,
        description,
        body,
    ))
}
