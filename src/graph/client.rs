// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use neo4rs::{query, Graph};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KnowledgeGraphError {
    #[error("failed to connect to knowledge graph: {0}")]
    Connect(String),
    #[error("query failed: {0}")]
    Query(String),
}

impl From<neo4rs::Error> for KnowledgeGraphError {
    fn from(err: neo4rs::Error) -> Self {
        KnowledgeGraphError::Query(err.to_string())
    }
}

/// Read-only client over the `Tool → Function → Metric` knowledge graph.
/// `neo4rs::Graph` is itself a pooled connection handle, so a single clone
/// is shared across every synthesis request; each query below draws one
/// session from that pool and returns it on completion.
#[derive(Clone)]
pub struct KnowledgeGraphClient {
    graph: Graph,
}

impl KnowledgeGraphClient {
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self, KnowledgeGraphError> {
        let graph = Graph::new(uri, user, password)
            .await
            .map_err(|e| KnowledgeGraphError::Connect(e.to_string()))?;
        Ok(Self { graph })
    }

    /// `MATCH (f:Function)-[:CALCULATES]->(m:Metric {name: $metric_name}) RETURN f.name`
    pub async fn functions_calculating_metric(&self, metric_name: &str) -> Result<Vec<String>, KnowledgeGraphError> {
        let q = query(
            "MATCH (f:Function)-[:CALCULATES]->(m:Metric {name: $metric_name}) RETURN f.name AS function_name",
        )
        .param("metric_name", metric_name);
        self.collect_strings(q, "function_name").await
    }

    /// `MATCH (f:Function {name: $function_name})-[:REQUIRES]->(dep:Function) RETURN dep.name`
    pub async fn required_functions(&self, function_name: &str) -> Result<Vec<String>, KnowledgeGraphError> {
        let q = query(
            "MATCH (f:Function {name: $function_name})-[:REQUIRES]->(dep:Function) RETURN dep.name AS dependency_name",
        )
        .param("function_name", function_name);
        self.collect_strings(q, "dependency_name").await
    }

    /// `MATCH (t:Tool)-[:IMPLEMENTS]->(f:Function {name: $function_name}) RETURN t.name`
    /// in the graph's own stable ordering, which the synthesizer treats as
    /// the deterministic tie-break order for unpinned tool binding.
    pub async fn tools_implementing_function(&self, function_name: &str) -> Result<Vec<String>, KnowledgeGraphError> {
        let q = query(
            "MATCH (t:Tool)-[:IMPLEMENTS]->(f:Function {name: $function_name}) RETURN t.name AS tool_name",
        )
        .param("function_name", function_name);
        self.collect_strings(q, "tool_name").await
    }

    /// `MATCH (t:Tool {name: $tool_name})-[:IMPLEMENTS]->(f:Function {name: $function_name}) RETURN t.name`
    pub async fn tool_implements_function(&self, tool_name: &str, function_name: &str) -> Result<bool, KnowledgeGraphError> {
        let q = query(
            "MATCH (t:Tool {name: $tool_name})-[:IMPLEMENTS]->(f:Function {name: $function_name}) RETURN t.name AS tool_name",
        )
        .param("tool_name", tool_name)
        .param("function_name", function_name);
        let rows = self.collect_strings(q, "tool_name").await?;
        Ok(!rows.is_empty())
    }

    /// `MATCH (t:Tool {name: $tool_name}) RETURN t.address`
    pub async fn tool_address(&self, tool_name: &str) -> Result<Option<String>, KnowledgeGraphError> {
        let q = query("MATCH (t:Tool {name: $tool_name}) RETURN t.address AS address")
            .param("tool_name", tool_name);
        let mut rows = self.collect_strings(q, "address").await?;
        Ok(rows.pop())
    }

    async fn collect_strings(&self, q: neo4rs::Query, column: &str) -> Result<Vec<String>, KnowledgeGraphError> {
        let mut stream = self.graph.execute(q).await?;
        let mut out = Vec::new();
        while let Some(row) = stream.next().await? {
            if let Ok(value) = row.get::<String>(column) {
                out.push(value);
            }
        }
        Ok(out)
    }
}
