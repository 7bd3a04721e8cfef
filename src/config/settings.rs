// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! App-level settings for the three binaries. Replaces the teacher's
//! DAG-pipeline `Config`/`Strategy`/`ProcessorConfig` (which described a
//! single in-process executor) with the knobs this system's distributed
//! services actually need: broker/graph endpoints, worker-pool sizing, and
//! retry/backoff parameters. Loaded from YAML, same as the teacher's
//! `config::loader`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_max_concurrency() -> usize {
    16
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_retry_attempts() -> u32 {
    5
}

fn default_broker_port() -> u16 {
    1883
}

/// Settings shared by both long-running services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusSettings {
    #[serde(default = "default_broker_host")]
    pub broker_host: String,
    #[serde(default = "default_broker_port")]
    pub broker_port: u16,
    pub client_id: String,
}

fn default_broker_host() -> String {
    "localhost".to_string()
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            broker_host: default_broker_host(),
            broker_port: default_broker_port(),
            client_id: "tradecore".to_string(),
        }
    }
}

/// `evaluator-runtime` settings: which tool identity this process hosts,
/// where the knowledge graph and bus live, and how much concurrency to
/// allow per evaluator (teacher's `ExecutorOptions::max_concurrency`,
/// repurposed to bound an evaluator's worker pool instead of an in-process
/// DAG executor).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatorSettings {
    pub tool_name: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    pub bus: BusSettings,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_timeout_seconds")]
    pub peer_call_timeout_seconds: u64,
    #[serde(default = "default_retry_attempts")]
    pub peer_call_retry_attempts: u32,
    /// Demo/test function handlers this process hosts, config-driven rather
    /// than compiled in — the numerical evaluators themselves are out of
    /// scope (spec §1), so a generic host only needs enough of a handler to
    /// stand in for one: echo a fixed payload, or fail on demand.
    #[serde(default)]
    pub functions: Vec<FunctionSpec>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl EvaluatorSettings {
    pub fn peer_call_timeout(&self) -> Duration {
        Duration::from_secs(self.peer_call_timeout_seconds)
    }
}

/// One configured function handler. `stub` always succeeds with `payload`
/// (an object keyed by the metric names it produces); `failing` always
/// returns a handler error, for exercising the Dispatcher's `errored` path
/// (S5) without a live numerical evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FunctionSpec {
    Stub { name: String, payload: serde_json::Value },
    Failing { name: String, reason: String },
}

impl FunctionSpec {
    pub fn name(&self) -> &str {
        match self {
            FunctionSpec::Stub { name, .. } => name,
            FunctionSpec::Failing { name, .. } => name,
        }
    }
}

/// `tse-dispatcher` settings: knowledge-graph connection, bus, back-pressure
/// and output directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherSettings {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    pub bus: BusSettings,
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    #[serde(default = "default_timeout_seconds")]
    pub callback_timeout_seconds: u64,
    #[serde(default = "default_retry_attempts")]
    pub callback_retry_attempts: u32,
    #[serde(default = "default_out_dir")]
    pub out_dir: String,
    #[serde(default = "default_hv_resolution")]
    pub hypervolume_resolution: u32,
    /// The hypervolume tracker's reference point `R`, applied uniformly
    /// across every objective axis, and doubling as the "configured
    /// sentinel" value §7 assigns to a metric that never arrives for an
    /// errored architecture.
    #[serde(default = "default_objective_reference")]
    pub objective_reference: f64,
}

fn default_max_in_flight() -> usize {
    64
}

fn default_out_dir() -> String {
    "./out".to_string()
}

fn default_hv_resolution() -> u32 {
    11
}

fn default_objective_reference() -> f64 {
    1.0e6
}

impl DispatcherSettings {
    pub fn callback_timeout(&self) -> Duration {
        Duration::from_secs(self.callback_timeout_seconds)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("failed to parse settings file {path}: {source}")]
    Parse { path: String, source: serde_yaml::Error },
}

pub fn load<T: for<'de> Deserialize<'de>>(path: impl AsRef<Path>) -> Result<T, SettingsError> {
    let path_ref = path.as_ref();
    let text = fs::read_to_string(path_ref).map_err(|source| SettingsError::Read {
        path: path_ref.display().to_string(),
        source,
    })?;
    serde_yaml::from_str(&text).map_err(|source| SettingsError::Parse {
        path: path_ref.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluator_settings_parse_with_defaults() {
        let yaml = r#"
tool_name: OrbitPy
bus:
  client_id: orbitpy-evaluator
"#;
        let settings: EvaluatorSettings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.tool_name, "OrbitPy");
        assert_eq!(settings.max_concurrency, 16);
        assert_eq!(settings.bus.broker_port, 1883);
    }

    #[test]
    fn dispatcher_settings_parse_with_defaults() {
        let yaml = r#"
bus:
  client_id: tse-dispatcher
neo4j_uri: neo4j+s://example.databases.neo4j.io
neo4j_user: neo4j
neo4j_password: secret
"#;
        let settings: DispatcherSettings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.max_in_flight, 64);
        assert_eq!(settings.hypervolume_resolution, 11);
    }
}
