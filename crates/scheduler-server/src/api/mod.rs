//! JSON API over [`TaskLifecycle`], plus the static front end.

pub mod error;
pub mod handlers;

use crate::config::Config;
use axum::{
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use scheduler_core::db;
use scheduler_core::error::CoreError;
use scheduler_core::lifecycle::TaskLifecycle;
use scheduler_core::repository::SqliteRepository;
use scheduler_core::timezone::today_in;
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Shared application state
pub struct AppState {
    pub lifecycle: TaskLifecycle<SqliteRepository>,
    pub timezone: String,
    pub page_size: u32,
}

impl AppState {
    pub fn new(lifecycle: TaskLifecycle<SqliteRepository>, timezone: String, page_size: u32) -> Self {
        Self {
            lifecycle,
            timezone,
            page_size,
        }
    }

    /// Today's date in the configured timezone.
    pub fn today(&self) -> Result<NaiveDate, CoreError> {
        today_in(&self.timezone)
    }
}

/// Builds the application router. Paths outside `/api` are served from `web_dir`.
pub fn router(state: Arc<AppState>, web_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/api/nextdate", get(handlers::next_date))
        .route(
            "/api/task",
            post(handlers::add_task)
                .get(handlers::get_task)
                .put(handlers::update_task)
                .delete(handlers::delete_task),
        )
        .route("/api/tasks", get(handlers::list_tasks))
        .route("/api/task/done", post(handlers::complete_task))
        .fallback_service(ServeDir::new(web_dir.as_ref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Opens the database and builds the state for `config`.
pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let pool = db::establish_connection(&config.database_path).await?;
    let lifecycle = TaskLifecycle::new(Arc::new(SqliteRepository::new(pool)));
    Ok(Arc::new(AppState::new(
        lifecycle,
        config.timezone.clone(),
        config.page_size,
    )))
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let state = build_state(&config).await?;
    let app = router(state, &config.web_dir);

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        database = %config.database_path,
        timezone = %config.timezone,
        "Server listening on {}",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
