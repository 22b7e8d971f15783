// ABOUTME: Metrics capability computing statistics over an ingested table
// ABOUTME: Reads the upstream csv task's records through the shared context

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::Capability;
use crate::engine::SharedContext;

pub struct MetricsCapability;

/// Configuration for the metrics capability
///
/// `source` names the upstream task (usually `csv_ingest`) whose result holds
/// the table. When `numeric_columns` is empty, columns whose non-null cells
/// are all numeric are detected automatically.
///
/// ```yaml
/// plugin: metrics
/// config:
///   source: load_data
///   numeric_columns: [age, score]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub source: String,
    #[serde(default)]
    pub numeric_columns: Vec<String>,
}

#[async_trait]
impl Capability for MetricsCapability {
    fn name(&self) -> &'static str {
        "metrics"
    }

    async fn execute(
        &self,
        config: &serde_yaml::Value,
        context: &SharedContext,
    ) -> anyhow::Result<serde_json::Value> {
        let config: MetricsConfig = serde_yaml::from_value(config.clone())
            .map_err(|e| anyhow!("invalid metrics config: {e}"))?;

        let outcome = context.outcome(&config.source).await.ok_or_else(|| {
            anyhow!(
                "no outcome recorded for task '{}'; declare it in depends_on",
                config.source
            )
        })?;
        let table = match outcome.value() {
            Some(value) => value.clone(),
            None => bail!(
                "upstream task '{}' failed: {}",
                config.source,
                outcome.error().unwrap_or("unknown error")
            ),
        };

        let records = table
            .get("records")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                anyhow!(
                    "outcome of task '{}' carries no 'records' table",
                    config.source
                )
            })?;
        let columns: Vec<String> = table
            .get("columns")
            .and_then(Value::as_array)
            .map(|cols| {
                cols.iter()
                    .filter_map(|c| c.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let targets = if config.numeric_columns.is_empty() {
            detect_numeric_columns(&columns, records)
        } else {
            for column in &config.numeric_columns {
                if !columns.contains(column) {
                    bail!("column '{column}' not found in table");
                }
            }
            config.numeric_columns.clone()
        };

        let mut results = Map::new();
        for column in &targets {
            let values = numeric_values(column, records);
            if values.is_empty() {
                bail!("column '{column}' has no numeric values");
            }
            results.insert(column.clone(), column_stats(&values));
        }

        Ok(Value::Object(results))
    }
}

fn numeric_values(column: &str, records: &[Value]) -> Vec<f64> {
    records
        .iter()
        .filter_map(|record| record.get(column))
        .filter_map(Value::as_f64)
        .collect()
}

/// Columns where every non-null cell is a number, and at least one cell is
fn detect_numeric_columns(columns: &[String], records: &[Value]) -> Vec<String> {
    columns
        .iter()
        .filter(|column| {
            let mut seen = false;
            for record in records {
                match record.get(column.as_str()) {
                    Some(Value::Null) | None => {}
                    Some(Value::Number(_)) => seen = true,
                    Some(_) => return false,
                }
            }
            seen
        })
        .cloned()
        .collect()
}

fn column_stats(values: &[f64]) -> Value {
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let median = if count % 2 == 1 {
        sorted[count / 2]
    } else {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    };

    // Sample standard deviation; undefined for a single value
    let std = if count > 1 {
        let variance =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        Value::from(variance.sqrt())
    } else {
        Value::Null
    };

    json!({
        "mean": mean,
        "median": median,
        "std": std,
        "min": sorted[0],
        "max": sorted[count - 1],
        "count": count,
    })
}
