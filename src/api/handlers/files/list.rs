use crate::AppState;
use crate::api::error::AppError;
use crate::models::{ContentHolder, OwnerScope};
use axum::{
    Extension,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use bytes::Bytes;

fn json_body(body: Bytes) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())], body)
}

#[utoipa::path(
    get,
    path = "/files",
    responses(
        (status = 200, description = "Every file the caller owns", body = Vec<crate::models::FileResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "files"
)]
pub async fn list_files(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerScope>,
) -> Result<impl IntoResponse, AppError> {
    let body = state.coordinator.list(&owner).await?;
    Ok(json_body(body))
}

#[utoipa::path(
    get,
    path = "/file/{name}/info",
    params(
        ("name" = String, Path, description = "File name")
    ),
    responses(
        (status = 200, description = "File metadata", body = crate::models::FileResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "files"
)]
pub async fn file_info(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerScope>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let holder = ContentHolder::lookup(owner, name);
    let body = state.coordinator.info(&holder).await?;
    Ok(json_body(body))
}
