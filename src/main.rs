use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

mod config;
mod error;
mod logging;
mod routes;
mod services;
pub mod models;

use services::session_store::SessionStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    logging::init_logging()?;

    // Load configuration
    let config = config::Config::new()?;

    // Open the session store and build application state
    let store = SessionStore::new(config.database_path.as_deref())?;
    let state = Arc::new(AppState::new(config.clone(), store));

    // Build our application with its routes
    let app = Router::new()
        .merge(routes::routes())
        .merge(routes::sessions::routes(&config))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Run it
    let addr = config.bind_addr;
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// Application state
pub struct AppState {
    pub config: config::Config,
    pub store: SessionStore,
}

impl AppState {
    fn new(config: config::Config, store: SessionStore) -> Self {
        Self { config, store }
    }
}
