mod api;
mod config;
mod error;
mod logger;
mod state;
mod trrouting;

use std::sync::Arc;

use accessmap_core::prelude::NodeCollection;
use clap::Parser;
use tokio::net::TcpListener;

use crate::config::{Cli, ServerConfig};
use crate::error::ServerError;
use crate::state::AppState;
use crate::trrouting::TrRoutingClient;

#[tokio::main]
async fn main() {
    logger::init_logger();

    let cli = Cli::parse();
    if let Err(e) = run(&cli).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<(), ServerError> {
    let config = ServerConfig::load(cli)?;

    let content =
        std::fs::read_to_string(&config.nodes_path).map_err(|source| ServerError::Io {
            path: config.nodes_path.clone(),
            source,
        })?;
    let nodes = NodeCollection::from_geojson_str(&content)?;
    tracing::info!(
        count = nodes.len(),
        path = %config.nodes_path.display(),
        "Loaded transit nodes"
    );

    let routing = TrRoutingClient::new(
        &config.trrouting_url,
        config.request_timeout(),
        config.trrouting_attempts,
    )?;
    let state = Arc::new(AppState::new(routing, nodes, config.isochrone));
    let app = api::build_router(
        Arc::clone(&state),
        config.request_timeout(),
        config.concurrency_limit,
    );

    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.bind,
            source,
        })?;
    tracing::info!(
        addr = %config.bind,
        trrouting = %config.trrouting_url,
        "Accessibility map server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("cannot listen for the shutdown signal: {e}");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down, cancelling running calculations");
            state.begin_shutdown();
        })
        .await
        .map_err(ServerError::Serve)
}
