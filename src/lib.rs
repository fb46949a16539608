pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::ServiceConfig;
use crate::services::coordinator::FileCoordinator;
use crate::services::sessions::SessionRegistry;
use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::files::list::list_files,
        api::handlers::files::upload::upload_file,
        api::handlers::files::upload::update_file,
        api::handlers::files::download::download_file,
        api::handlers::files::manage::delete_file,
        api::handlers::files::list::file_info,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            models::FileResponse,
            api::handlers::files::types::UploadForm,
            api::handlers::files::types::ErrorResponse,
        )
    ),
    tags(
        (name = "files", description = "File management endpoints"),
        (name = "system", description = "Liveness")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<FileCoordinator>,
    pub sessions: Arc<SessionRegistry>,
    pub config: ServiceConfig,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route(
            "/_ah/health",
            get(api::handlers::health::health_check)
                .layer(from_fn(api::middleware::no_cache::no_cache_middleware)),
        )
        .route(
            "/files",
            get(api::handlers::files::list_files)
                .layer(from_fn(api::middleware::no_cache::no_cache_middleware))
                .post(api::handlers::files::upload_file)
                .put(api::handlers::files::update_file)
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::auth_middleware,
                )),
        )
        .route(
            "/file/:name",
            get(api::handlers::files::download_file)
                .delete(api::handlers::files::delete_file)
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::auth_middleware,
                )),
        )
        .route(
            "/file/:name/info",
            get(api::handlers::files::file_info)
                .layer(from_fn(api::middleware::no_cache::no_cache_middleware))
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::auth_middleware,
                )),
        )
        .layer(from_fn(api::middleware::metrics::metrics_middleware))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .layer(axum::extract::DefaultBodyLimit::max(
            state.config.max_file_size + 1024 * 1024, // multipart overhead
        ))
        .with_state(state)
}
