//! Recap Server
//!
//! An async Rust server that turns audio recordings into transcripts and
//! summaries, driving each job through a durable staged pipeline.

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recap_server::{
    config::{AppConfig, DatabaseConfig, PipelineConfig, StoreBackend},
    engine::{Orchestrator, Scheduler},
    handlers,
    providers::Providers,
    state::AppState,
    store::{JobStore, MemoryStore, PostgresStore},
};

/// Initialize tracing/logging.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,recap_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the application router with all routes.
fn build_router(state: AppState) -> Router {
    // Permissive CORS: the API carries no cookies or credentials.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let health_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/health", get(handlers::api_health))
        .with_state(state.clone());

    let job_routes = Router::new()
        .route("/jobs", post(handlers::create_job))
        .route("/jobs", get(handlers::list_jobs))
        .route("/jobs/{job_id}", get(handlers::get_job))
        .with_state(state);

    Router::new()
        .merge(health_routes)
        .merge(job_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Open the job store selected by configuration.
async fn make_store(config: &AppConfig) -> anyhow::Result<Arc<dyn JobStore>> {
    match config.store {
        StoreBackend::Postgres => {
            let db_config = DatabaseConfig::from_env().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to load database config, using defaults");
                DatabaseConfig::default()
            });

            let store = PostgresStore::connect(&db_config).await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory job store, jobs will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting recap server");

    // Malformed environment falls back to defaults with a warning
    // rather than refusing to boot.
    let app_config = AppConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load app config, using defaults");
        AppConfig::default()
    });

    let pipeline_config = PipelineConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load pipeline config, using defaults");
        PipelineConfig::default()
    });

    tracing::info!(
        host = %app_config.host,
        port = app_config.port,
        store = ?app_config.store,
        providers = ?app_config.providers,
        "Configuration loaded"
    );

    let store = make_store(&app_config).await?;
    let providers = Providers::from_config(&app_config);
    let state = AppState::new(store.clone(), app_config.clone());

    // The scheduler owns the pipeline from here: wake dispatch and the
    // recovery sweep both run inside this task.
    let orchestrator = Orchestrator::new(store.clone(), providers, pipeline_config.clone());
    let scheduler = Scheduler::new(store, orchestrator, pipeline_config);
    tokio::spawn(scheduler.run());

    let app = build_router(state);

    let addr: SocketAddr = app_config.bind_address().parse()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
