// ABOUTME: CSV ingestion capability reading tabular files into task outcomes
// ABOUTME: Returns row/column metadata plus the parsed records for downstream tasks

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::fs;
use tracing::debug;

use super::Capability;
use crate::engine::SharedContext;

pub struct CsvIngestCapability;

/// Configuration for the csv_ingest capability
///
/// ```yaml
/// plugin: csv_ingest
/// config:
///   path: data/input.csv
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CsvIngestConfig {
    /// Path to the CSV file to read
    pub path: String,
}

#[async_trait]
impl Capability for CsvIngestCapability {
    fn name(&self) -> &'static str {
        "csv_ingest"
    }

    async fn execute(
        &self,
        config: &serde_yaml::Value,
        _context: &SharedContext,
    ) -> anyhow::Result<serde_json::Value> {
        let config: CsvIngestConfig = serde_yaml::from_value(config.clone())
            .map_err(|e| anyhow::anyhow!("invalid csv_ingest config: {e}"))?;

        let content = fs::read_to_string(&config.path).await?;
        let mut reader = csv::Reader::from_reader(content.as_bytes());

        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|header| header.to_string())
            .collect();

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row = Map::new();
            for (column, raw) in columns.iter().zip(record.iter()) {
                row.insert(column.clone(), parse_cell(raw));
            }
            records.push(Value::Object(row));
        }

        debug!(path = %config.path, rows = records.len(), "csv file ingested");

        // The whole table travels as this task's result so dependents can
        // read it from the shared context under this task's id.
        Ok(json!({
            "rows": records.len(),
            "columns": columns,
            "records": records,
        }))
    }
}

/// Type a raw cell: integer, then float, then string; empty cells are null
fn parse_cell(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = raw.parse::<f64>() {
        if float.is_finite() {
            return Value::from(float);
        }
    }
    Value::String(raw.to_string())
}
