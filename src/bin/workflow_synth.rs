// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! `workflow-synth` — runs the Workflow Synthesizer standalone against a
//! `TSERequest` document and prints the resulting workflow (or
//! `InfeasibleError`) to stdout. Lets an operator debug infeasibility
//! before committing to a full TSE run (spec §6 exit codes: 0 success, 1
//! infeasible, 2 bad input).

use std::path::PathBuf;

use clap::Parser;
use tradecore::graph::KnowledgeGraphClient;
use tradecore::schemas::TseRequest;
use tradecore::synth::Synthesizer;

#[derive(Parser)]
#[command(name = "workflow-synth", about = "Standalone Workflow Synthesizer")]
struct Args {
    /// Path to a JSON file containing a `TSERequest` document.
    request: PathBuf,

    /// Knowledge-graph Bolt URI.
    #[arg(long, env = "TRADECORE_NEO4J_URI")]
    neo4j_uri: String,

    #[arg(long, env = "TRADECORE_NEO4J_USER", default_value = "neo4j")]
    neo4j_user: String,

    #[arg(long, env = "TRADECORE_NEO4J_PASSWORD")]
    neo4j_password: String,

    /// Correlation id to stamp the synthesized workflow with.
    #[arg(long, default_value = "workflow-synth-preview")]
    workflow_id: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let body = match std::fs::read_to_string(&args.request) {
        Ok(body) => body,
        Err(err) => {
            eprintln!("failed to read {}: {err}", args.request.display());
            std::process::exit(2);
        }
    };

    let request: TseRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(err) => {
            eprintln!("failed to parse TSERequest from {}: {err}", args.request.display());
            std::process::exit(2);
        }
    };

    let graph = match KnowledgeGraphClient::connect(&args.neo4j_uri, &args.neo4j_user, &args.neo4j_password).await {
        Ok(graph) => graph,
        Err(err) => {
            eprintln!("failed to connect to the knowledge graph at {}: {err}", args.neo4j_uri);
            std::process::exit(1);
        }
    };

    let synthesizer = Synthesizer::new(graph);
    match synthesizer.synthesize(&args.workflow_id, &request).await {
        Ok(workflow) => {
            let rendered = serde_json::to_string_pretty(&workflow).expect("Workflow always serializes");
            println!("{rendered}");
        }
        Err(err) => {
            eprintln!("InfeasibleError: {err}");
            std::process::exit(1);
        }
    }
}
