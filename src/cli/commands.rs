// ABOUTME: Command implementations for the oprun CLI
// ABOUTME: Handles execution of run, validate, and list-plugins commands

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::engine::{RunStatus, WorkflowEngine};
use crate::output::RunWriter;
use crate::parser::WorkflowSource;
use crate::plugins::PluginRegistry;

/// Execute a workflow and persist its run record
pub async fn run_workflow(workflow_path: PathBuf, log_root: PathBuf) -> Result<()> {
    info!("Starting workflow execution: {}", workflow_path.display());

    let source = WorkflowSource::from_file(&workflow_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to parse workflow: {}", e))?;
    info!("Loaded workflow: {}", source.name);

    let engine = WorkflowEngine::new();
    let summary = engine
        .execute(&source)
        .await
        .map_err(|e| anyhow::anyhow!("Workflow execution failed: {}", e))?;

    let writer = RunWriter::new(log_root);
    let run_dir = writer.persist(&workflow_stem(&workflow_path), &summary).await?;

    println!(
        "Workflow '{}' completed with status: {}",
        summary.workflow_name, summary.status
    );
    for (task_id, outcome) in &summary.outcomes {
        match outcome.error() {
            Some(message) => println!("  Task '{task_id}': failed ({message})"),
            None => println!("  Task '{task_id}': succeeded"),
        }
    }
    println!("Run record: {}", run_dir.display());

    info!("Workflow execution completed");

    // Non-zero exit when any task failed
    match summary.status {
        RunStatus::Success => Ok(()),
        status => Err(anyhow::anyhow!(
            "Workflow completed with status: {}",
            status
        )),
    }
}

/// Validate a workflow file without executing it
pub async fn validate_workflow(workflow_path: PathBuf) -> Result<()> {
    info!("Validating workflow: {}", workflow_path.display());

    let source = WorkflowSource::from_file(&workflow_path)
        .await
        .map_err(|e| anyhow::anyhow!("Workflow validation failed: {}", e))?;

    let engine = WorkflowEngine::new();
    let graph = engine
        .build_graph(&source)
        .map_err(|e| anyhow::anyhow!("Workflow validation failed: {}", e))?;

    println!("✓ Workflow '{}' is valid", source.name);
    println!("  Tasks: {}", graph.len());
    println!("  Roots: {}", graph.root_tasks().len());

    info!("Workflow validation completed successfully");

    Ok(())
}

/// List the plugins available to workflows
pub fn list_plugins() -> Result<()> {
    let registry = PluginRegistry::with_builtins();

    println!("Registered plugins:");
    for name in registry.plugin_names() {
        println!("  {name}");
    }

    Ok(())
}

fn workflow_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workflow".to_string())
}
