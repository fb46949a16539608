use crate::AppState;
use crate::api::error::AppError;
use crate::models::{OwnerScope, RecordKey};
use crate::utils::validation::content_type_or_default;
use axum::{
    Extension,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::Response,
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

#[utoipa::path(
    get,
    path = "/file/{name}",
    params(
        ("name" = String, Path, description = "File name")
    ),
    responses(
        (status = 200, description = "File content"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "files"
)]
pub async fn download_file(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerScope>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let disposition = format!(
        "inline; filename*=UTF-8''{}",
        utf8_percent_encode(&name, NON_ALPHANUMERIC)
    );
    let key = RecordKey::new(owner.id, name);
    let object = state.coordinator.download(&key).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(
            header::CONTENT_TYPE,
            content_type_or_default(object.content_type.as_deref()),
        )
        .header(header::CONTENT_LENGTH, object.body.len().to_string())
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CACHE_CONTROL, "s-maxage=3600, public")
        .body(Body::from(object.body))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))
}
