//! Bounty board gateway entry point.
//!
//! Serves hydrated board, task, submission and profile read models over
//! HTTP, and composes unsigned contract transactions for a wallet to sign.

use std::sync::Arc;

use reqwest::Client;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bounty_board::api::{self, ApiState};
use bounty_board::builder::TransactionBuilder;
use bounty_board::config::Config;
use bounty_board::rpc::RpcClient;
use bounty_board::sync::{SyncOptions, Synchronizer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;
    info!(
        "Network {} via {}",
        config.network.network, config.network.rpc_url
    );

    let client = Client::builder().timeout(config.request_timeout).build()?;
    let rpc = Arc::new(RpcClient::new(client, config.network.rpc_url.clone()));

    let state = Arc::new(ApiState {
        sync: Synchronizer::new(rpc, config.network.clone(), SyncOptions::from(&config)),
        builder: TransactionBuilder::new(&config.network)?,
    });

    let app = api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("Gateway listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
