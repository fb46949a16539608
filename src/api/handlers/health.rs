/// Liveness probe. Touches no backend and needs no session.
#[utoipa::path(
    get,
    path = "/_ah/health",
    responses(
        (status = 200, description = "Service is alive", body = String)
    ),
    tag = "system"
)]
pub async fn health_check() -> &'static str {
    "ok"
}
