use clap::Parser;
use dotenvy::dotenv;
use rust_file_store::config::ServiceConfig;
use rust_file_store::infrastructure::{cache, database, events, storage};
use rust_file_store::services::coordinator::FileCoordinator;
use rust_file_store::services::metadata::MetadataStore;
use rust_file_store::services::sessions::SessionRegistry;
use rust_file_store::{AppState, create_app};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port for the API server
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_file_store=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Rust File Store...");

    let config = ServiceConfig::from_env();
    info!(
        "🛡️  Max upload size={}MB, store deadline={:?}",
        config.max_file_size / 1024 / 1024,
        config.store_timeout
    );

    // Setup Infrastructure
    let db = database::setup_database(&config.database_url).await?;
    let blobs = storage::setup_storage(&config).await;
    let read_cache = cache::setup_cache(&config)?;
    let publisher = events::setup_publisher(&config)?;

    let coordinator = Arc::new(FileCoordinator::new(
        blobs,
        Arc::new(MetadataStore::new(db)),
        read_cache,
        publisher,
        config.max_file_size,
        config.store_timeout,
    ));
    let sessions = Arc::new(SessionRegistry::new(
        config.jwt_secret.clone(),
        config.session_capacity,
        config.session_ttl,
    ));

    let state = AppState {
        coordinator: coordinator.clone(),
        sessions: sessions.clone(),
        config,
    };

    let app = create_app(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri().path(),
                    request_id = %request_id,
                )
            })
            .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                info!("📥 {} {}", request.method(), request.uri().path());
            })
            .on_response(
                |response: &axum::http::Response<_>,
                 latency: std::time::Duration,
                 _span: &tracing::Span| {
                    info!(
                        "📤 Finished in {:?} with status {}",
                        latency,
                        response.status()
                    );
                },
            ),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("✅ Server ready at http://{}", addr);
    info!("📖 Swagger UI: http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Teardown: pending cache invalidations, publisher flush, session cache
    coordinator.shutdown().await;
    sessions.clear();

    info!("🛑 Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
