use anyhow::{Context, Result};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{assets, handlers, routes};
use crate::config::Config;
use crate::i18n::I18n;
use crate::serve::{ServeManager, TailscaleCli};

/// Console state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub manager: ServeManager,
    pub i18n: Arc<I18n>,
}

impl AppState {
    pub fn new(manager: ServeManager, i18n: I18n) -> Self {
        Self {
            manager,
            i18n: Arc::new(i18n),
        }
    }
}

/// Web console instance
pub struct ConsoleServer {
    config: Config,
    state: AppState,
}

impl ConsoleServer {
    /// Build a console that drives the configured tailscale binary.
    pub fn new(config: Config) -> Result<Self> {
        let cli = TailscaleCli::resolve(&config.tailscale_bin);
        tracing::debug!(program = %cli.program().display(), "Using tailscale binary");

        let i18n = I18n::load(&config.default_lang).context("Failed to load translations")?;
        let state = AppState::new(ServeManager::new(Arc::new(cli)), i18n);
        Ok(Self { config, state })
    }

    /// Run until Ctrl-C.
    pub async fn run(self) -> Result<()> {
        let addr = self.config.listen_addr();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;

        tracing::info!("Console listening on http://{}", addr);
        tracing::info!("Tailscale binary: {}", self.config.tailscale_bin);

        let app = create_router(self.state);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;

        tracing::info!("Console stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Create the router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::console_routes())
        .route("/static/*path", get(assets::serve_static))
        .nest("/api", routes::api_routes())
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
