use std::net::SocketAddr;
use std::sync::Arc;

use tabsync_db::{MemoryStore, PgSessionStore, SessionStore};
use tabsync_events::SessionHub;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tabsync_api::config::ServerConfig;
use tabsync_api::engine::SessionService;
use tabsync_api::router::build_app_router;
use tabsync_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tabsync_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Store ---
    let store = connect_store().await;

    // --- Broadcast hub ---
    let hub = Arc::new(SessionHub::new());

    // --- Verification pipeline ---
    let pipeline = config
        .upstream
        .build_pipeline()
        .expect("Failed to build upstream HTTP client");
    tracing::info!(
        verification = %config.upstream.verification_url,
        locations = %config.upstream.locations_url,
        codes = %config.upstream.codes_url,
        timeout_ms = config.upstream.timeout.as_millis() as u64,
        "Verification pipeline configured",
    );

    // --- App state ---
    let sessions = Arc::new(SessionService::new(
        Arc::clone(&store),
        hub.clone(),
        pipeline,
        config.session_list_limit,
    ));
    let state = AppState {
        store,
        hub: Arc::clone(&hub),
        sessions,
        config: Arc::new(config.clone()),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!(
        live_sessions = hub.session_count(),
        "Server stopped accepting connections, closing WebSocket subscriptions",
    );
    hub.close_all();

    tracing::info!("Graceful shutdown complete");
}

/// Connect to PostgreSQL when `DATABASE_URL` is set, otherwise fall back to
/// the in-process store.
async fn connect_store() -> Arc<dyn SessionStore> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        tracing::warn!("DATABASE_URL not set, using in-memory session store (data is not persisted)");
        return Arc::new(MemoryStore::new());
    };

    let pool = tabsync_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    tabsync_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    tabsync_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    Arc::new(PgSessionStore::new(pool))
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
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
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
