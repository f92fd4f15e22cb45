mod config;
mod db;
mod editor;
mod errors;
mod models;
mod reconcile;
mod report;
mod routes;
mod schema;
mod state;
mod store;
mod template;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Report API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL; one store backs every boundary trait
    let db = create_pool(&config.database_url).await?;
    let store = Arc::new(PgStore::new(db));

    let layout = config.report_layout();
    info!(
        "Report layout: table width {:.2} of line width",
        layout.table_width_fraction
    );

    // Build app state
    let state = AppState {
        schemas: store.clone(),
        records: store.clone(),
        templates: store,
        layout,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS origins once the editor UI has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
