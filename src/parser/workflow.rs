// ABOUTME: Workflow source data structures and YAML decoding
// ABOUTME: Defines the WorkflowSource struct and raw task declarations

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{ParserError, Result};
use tokio::fs;

fn default_name() -> String {
    "unnamed-workflow".to_string()
}

/// A decoded workflow definition: metadata plus an ordered sequence of raw
/// task declarations.
///
/// Decoding is deliberately loose. Structural rules (unique ids, known
/// plugins, well-formed dependency lists, acyclicity) belong to the graph
/// builder so violations surface as graph errors in a fixed order rather
/// than as YAML errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSource {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tasks: Vec<TaskDeclaration>,
}

/// One raw task entry as it appears in the workflow file.
///
/// `config` is opaque here; it is handed verbatim to the plugin that executes
/// the task. `depends_on` stays an untyped YAML value so the builder can
/// report a malformed shape against the owning task id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDeclaration {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub plugin: Option<String>,
    #[serde(default)]
    pub config: serde_yaml::Value,
    #[serde(default)]
    pub depends_on: serde_yaml::Value,
}

impl WorkflowSource {
    /// Parse a workflow source from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .await
            .map_err(ParserError::IoError)?;
        Self::from_yaml(&content)
    }

    /// Parse a workflow source from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let source: WorkflowSource =
            serde_yaml::from_str(content).map_err(ParserError::YamlError)?;
        Ok(source)
    }

    /// Get all declared task ids, in declaration order
    pub fn task_ids(&self) -> Vec<&str> {
        self.tasks
            .iter()
            .filter_map(|task| task.id.as_deref())
            .collect()
    }
}

impl TaskDeclaration {
    pub fn new(id: &str, plugin: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            plugin: Some(plugin.to_string()),
            config: serde_yaml::Value::Null,
            depends_on: serde_yaml::Value::Null,
        }
    }

    pub fn with_dependencies(mut self, deps: &[&str]) -> Self {
        self.depends_on = serde_yaml::Value::Sequence(
            deps.iter()
                .map(|d| serde_yaml::Value::String(d.to_string()))
                .collect(),
        );
        self
    }

    pub fn with_config(mut self, config: serde_yaml::Value) -> Self {
        self.config = config;
        self
    }
}
