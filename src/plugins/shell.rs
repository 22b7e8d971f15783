// ABOUTME: Shell command capability for running external commands
// ABOUTME: Captures stdout, stderr, and the exit code as the task outcome

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tokio::process::Command;
use tracing::debug;

use super::Capability;
use crate::engine::SharedContext;

pub struct ShellCapability;

/// Configuration for the shell capability
///
/// ```yaml
/// plugin: shell
/// config:
///   command: "wc -l data.csv"
///   env:
///     LC_ALL: C
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ShellConfig {
    /// Command line passed to the shell
    pub command: String,

    /// Shell interpreter (default: /bin/sh)
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Extra environment variables set for the command
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Working directory for the command
    #[serde(default)]
    pub working_dir: Option<String>,
}

fn default_shell() -> String {
    "/bin/sh".to_string()
}

#[async_trait]
impl Capability for ShellCapability {
    fn name(&self) -> &'static str {
        "shell"
    }

    async fn execute(
        &self,
        config: &serde_yaml::Value,
        _context: &SharedContext,
    ) -> anyhow::Result<serde_json::Value> {
        let config: ShellConfig = serde_yaml::from_value(config.clone())
            .map_err(|e| anyhow::anyhow!("invalid shell config: {e}"))?;

        debug!(command = %config.command, "running shell command");

        let mut command = Command::new(&config.shell);
        command.arg("-c").arg(&config.command);
        command.envs(&config.env);
        if let Some(ref dir) = config.working_dir {
            command.current_dir(dir);
        }

        let output = command.output().await?;

        // A non-zero exit code is still a completed task; the code is part
        // of the result and downstream tasks decide what it means.
        Ok(json!({
            "stdout": String::from_utf8_lossy(&output.stdout).trim(),
            "stderr": String::from_utf8_lossy(&output.stderr).trim(),
            "returncode": output.status.code(),
        }))
    }
}
