// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! `summary.csv` writer: one row per completed Solution, columns =
//! design-variable names then metric names in request order. Appended from
//! a single serializing task, matching the "single-writer" resource policy
//! of spec §5.

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::schemas::Solution;

pub struct SummaryWriter {
    sender: mpsc::UnboundedSender<Solution>,
}

impl SummaryWriter {
    /// Spawns the single task that owns the CSV file handle. `columns` is
    /// the header: design-variable names, then metric names, in request order.
    pub fn spawn(out_dir: PathBuf, columns: Vec<String>) -> (Self, tokio::task::JoinHandle<std::io::Result<()>>) {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Solution>();
        let path = out_dir.join("summary.csv");

        let handle = tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            std::fs::create_dir_all(&out_dir)?;
            let mut writer = csv::WriterBuilder::new().from_path(&path)?;
            writer.write_record(&columns)?;
            writer.flush()?;

            while let Some(solution) = receiver.blocking_recv() {
                if solution.errored {
                    continue; // partial runs: successful architectures only (spec §7).
                }
                let row: Vec<String> = columns
                    .iter()
                    .map(|col| {
                        solution
                            .design_variables
                            .get(col)
                            .or_else(|| solution.objectives.get(col))
                            .map(|v| value_to_cell(v))
                            .unwrap_or_default()
                    })
                    .collect();
                writer.write_record(&row)?;
                writer.flush()?;
            }
            Ok(())
        });

        (Self { sender }, handle)
    }

    pub fn append(&self, solution: Solution) {
        let _ = self.sender.send(solution);
    }
}

fn value_to_cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
