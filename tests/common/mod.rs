// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Provides shared functionality for setting up test environments and workflows

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;

pub struct TestWorkflowBuilder {
    name: String,
    description: String,
    tasks: Vec<TestTask>,
}

pub struct TestTask {
    pub id: String,
    pub plugin: String,
    pub config_yaml: Vec<String>,
    pub depends_on: Vec<String>,
}

impl TestWorkflowBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: format!("Test workflow: {}", name),
            tasks: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_task(mut self, task: TestTask) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn add_echo_task(mut self, id: &str, message: &str) -> Self {
        self.tasks.push(TestTask {
            id: id.to_string(),
            plugin: "shell".to_string(),
            config_yaml: vec![format!("command: \"echo {}\"", message)],
            depends_on: Vec::new(),
        });
        self
    }

    pub fn add_dependent_echo_task(mut self, id: &str, message: &str, depends_on: Vec<&str>) -> Self {
        self.tasks.push(TestTask {
            id: id.to_string(),
            plugin: "shell".to_string(),
            config_yaml: vec![format!("command: \"echo {}\"", message)],
            depends_on: depends_on.into_iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    // The function plugin rejects names that were never registered, which
    // gives a deterministic failure without touching the filesystem
    pub fn add_failing_task(mut self, id: &str) -> Self {
        self.tasks.push(TestTask {
            id: id.to_string(),
            plugin: "function".to_string(),
            config_yaml: vec!["function: no_such_function".to_string()],
            depends_on: Vec::new(),
        });
        self
    }

    pub fn add_function_task(mut self, id: &str, function: &str, args: &str) -> Self {
        self.tasks.push(TestTask {
            id: id.to_string(),
            plugin: "function".to_string(),
            config_yaml: vec![
                format!("function: {}", function),
                format!("args: {}", args),
            ],
            depends_on: Vec::new(),
        });
        self
    }

    pub fn add_csv_task(mut self, id: &str, path: &Path) -> Self {
        self.tasks.push(TestTask {
            id: id.to_string(),
            plugin: "csv_ingest".to_string(),
            config_yaml: vec![format!("path: \"{}\"", path.display())],
            depends_on: Vec::new(),
        });
        self
    }

    pub fn add_metrics_task(mut self, id: &str, source: &str) -> Self {
        self.tasks.push(TestTask {
            id: id.to_string(),
            plugin: "metrics".to_string(),
            config_yaml: vec![format!("source: {}", source)],
            depends_on: vec![source.to_string()],
        });
        self
    }

    pub async fn write_to_file(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        fs::write(path, self.generate_yaml()).await?;
        Ok(())
    }

    pub fn generate_yaml(&self) -> String {
        let mut yaml = format!(
            "name: {}\ndescription: \"{}\"\n\ntasks:\n",
            self.name, self.description
        );

        for task in &self.tasks {
            yaml.push_str(&format!("  - id: {}\n", task.id));
            yaml.push_str(&format!("    plugin: {}\n", task.plugin));

            if !task.config_yaml.is_empty() {
                yaml.push_str("    config:\n");
                for line in &task.config_yaml {
                    yaml.push_str(&format!("      {}\n", line));
                }
            }

            if !task.depends_on.is_empty() {
                yaml.push_str("    depends_on:\n");
                for dep in &task.depends_on {
                    yaml.push_str(&format!("      - {}\n", dep));
                }
            }
        }

        yaml
    }
}

pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn workflow_file(&self, name: &str) -> PathBuf {
        self.path().join(format!("{}.yaml", name))
    }

    pub fn log_dir(&self) -> PathBuf {
        self.path().join("logs")
    }

    pub async fn create_workflow_file(&self, name: &str, builder: &TestWorkflowBuilder) -> PathBuf {
        let workflow_file = self.workflow_file(name);
        builder
            .write_to_file(&workflow_file)
            .await
            .expect("Failed to write workflow file");
        workflow_file
    }

    pub async fn create_csv_file(&self, name: &str, content: &str) -> PathBuf {
        let csv_file = self.path().join(format!("{}.csv", name));
        fs::write(&csv_file, content)
            .await
            .expect("Failed to write csv file");
        csv_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_builder() {
        let builder = TestWorkflowBuilder::new("test_workflow")
            .with_description("Test workflow description")
            .add_echo_task("task1", "Hello World")
            .add_dependent_echo_task("task2", "Dependent task", vec!["task1"]);

        let yaml = builder.generate_yaml();

        assert!(yaml.contains("name: test_workflow"));
        assert!(yaml.contains("description: \"Test workflow description\""));
        assert!(yaml.contains("- id: task1"));
        assert!(yaml.contains("- id: task2"));
        assert!(yaml.contains("depends_on:"));
    }

    #[test]
    fn test_environment_setup() {
        let env = TestEnvironment::new();
        assert!(env.path().exists());

        let workflow_file = env.workflow_file("test");
        assert!(workflow_file.to_string_lossy().contains("test.yaml"));
    }
}
