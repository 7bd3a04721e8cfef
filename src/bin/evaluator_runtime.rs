// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! `evaluator-runtime` — a generic Evaluator Runtime host (spec §4.2) that
//! loads a config-driven set of function handlers and exposes both ingress
//! paths (`POST /<function_name>` and the `evaluators/<tool>/<function>`
//! subscription). The numerical evaluators themselves are out of scope
//! (spec §1); this binary hosts `Stub`/`Failing` handlers for demo
//! evaluators in `demos/` and exercise-test fixtures, or any real handler
//! registered in-process by a future evaluator crate embedding this host.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tradecore::config::{self, EvaluatorSettings, FunctionSpec};
use tradecore::runtime::stub::{FailingFunction, StubFunction};
use tradecore::runtime::{EvaluatorHost, FunctionRegistry};

#[derive(Parser)]
#[command(name = "evaluator-runtime", about = "Generic Evaluator Runtime host")]
struct Args {
    /// Path to the evaluator's YAML settings file.
    #[arg(long, env = "TRADECORE_EVALUATOR_CONFIG", default_value = "config/evaluator.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let settings: EvaluatorSettings = match config::load(&args.config) {
        Ok(settings) => settings,
        Err(err) => {
            tracing::error!(error = %err, path = %args.config.display(), "failed to load evaluator settings");
            std::process::exit(2);
        }
    };

    let mut registry = FunctionRegistry::new();
    for spec in &settings.functions {
        match spec {
            FunctionSpec::Stub { name, payload } => {
                registry.register(Arc::new(StubFunction { name: name.clone(), payload: payload.clone() }));
            }
            FunctionSpec::Failing { name, reason } => {
                registry.register(Arc::new(FailingFunction { name: name.clone(), reason: reason.clone() }));
            }
        }
    }

    if registry.is_empty() {
        tracing::warn!(tool_name = %settings.tool_name, "no functions registered; every request will 400");
    }

    let listen_addr = settings.listen_addr.clone();
    let tool_name = settings.tool_name.clone();
    let host = Arc::new(EvaluatorHost::new(settings, registry));

    let host_for_bus = Arc::clone(&host);
    tokio::spawn(async move {
        if let Err(err) = host_for_bus.run_bus_subscriber().await {
            tracing::error!(error = %err, "bus subscriber exited");
        }
    });

    tracing::info!(tool_name = %tool_name, listen_addr = %listen_addr, "starting evaluator-runtime");

    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, listen_addr = %listen_addr, "failed to bind evaluator listener");
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(listener, host.router()).with_graceful_shutdown(shutdown_signal()).await {
        tracing::error!(error = %err, "evaluator server exited with an error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("received shutdown signal");
}
