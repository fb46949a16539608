use crate::AppState;
use crate::api::error::AppError;
use crate::models::{OwnerScope, RecordKey};
use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
};

#[utoipa::path(
    delete,
    path = "/file/{name}",
    params(
        ("name" = String, Path, description = "File name")
    ),
    responses(
        (status = 200, description = "File deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "files"
)]
pub async fn delete_file(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerScope>,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    let key = RecordKey::new(owner.id, name);
    state.coordinator.delete(&key).await?;
    Ok(StatusCode::OK)
}
