// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! `tse-dispatcher` — the TSE Dispatcher HTTP service (spec §4.3, §6).

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tradecore::config::{self, DispatcherSettings};
use tradecore::dispatcher::{router, AppState, DispatcherBus, RunRegistry};
use tradecore::graph::KnowledgeGraphClient;

#[derive(Parser)]
#[command(name = "tse-dispatcher", about = "Tradespace Search Executive Dispatcher")]
struct Args {
    /// Path to the dispatcher's YAML settings file.
    #[arg(long, env = "TRADECORE_DISPATCHER_CONFIG", default_value = "config/dispatcher.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let settings: DispatcherSettings = match config::load(&args.config) {
        Ok(settings) => settings,
        Err(err) => {
            tracing::error!(error = %err, path = %args.config.display(), "failed to load dispatcher settings");
            std::process::exit(2);
        }
    };

    let graph = match KnowledgeGraphClient::connect(&settings.neo4j_uri, &settings.neo4j_user, &settings.neo4j_password).await {
        Ok(graph) => graph,
        Err(err) => {
            tracing::error!(error = %err, uri = %settings.neo4j_uri, "failed to connect to the knowledge graph");
            std::process::exit(1);
        }
    };

    let bus = match DispatcherBus::connect(&settings.bus).await {
        Ok(bus) => Arc::new(bus),
        Err(err) => {
            tracing::error!(error = %err, "failed to connect to the pub/sub bus");
            std::process::exit(1);
        }
    };

    let listen_addr = settings.listen_addr.clone();
    let state = AppState {
        settings: Arc::new(settings),
        graph,
        bus,
        registry: RunRegistry::new(),
    };

    tracing::info!(listen_addr = %listen_addr, "starting tse-dispatcher");

    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, listen_addr = %listen_addr, "failed to bind dispatcher listener");
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(listener, router(state)).with_graceful_shutdown(shutdown_signal()).await {
        tracing::error!(error = %err, "dispatcher server exited with an error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("received shutdown signal, draining in-flight runs");
}
