// ABOUTME: Concurrent workflow executor driving dependency-gated task units
// ABOUTME: Launches every task at run start, gates on predecessor terminal signals

use futures::future;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, instrument};

use super::context::SharedContext;
use super::error::Result;
use super::graph::{TaskNode, WorkflowGraph};
use super::result::{RunEvent, RunRecorder, RunSummary, TaskOutcome, UnitState};
use crate::parser::WorkflowSource;
use crate::plugins::PluginRegistry;

/// Executes a workflow graph: every task exactly once, each task only after
/// all of its predecessors are terminal, independent tasks concurrently.
///
/// There is no topological batching pass and no concurrency ceiling; the
/// graph's edges alone determine observed ordering. A failing task becomes a
/// `Failure` outcome and its dependents still run, receiving the failure
/// value through the shared context. Sibling branches are never aborted.
pub struct WorkflowEngine {
    registry: Arc<PluginRegistry>,
}

impl WorkflowEngine {
    pub fn new() -> Self {
        Self::with_registry(PluginRegistry::with_builtins())
    }

    pub fn with_registry(registry: PluginRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Validate declarations and build the dependency graph without executing
    pub fn build_graph(&self, source: &WorkflowSource) -> Result<WorkflowGraph> {
        Ok(WorkflowGraph::build(&source.tasks, &self.registry)?)
    }

    /// Execute a complete workflow.
    ///
    /// Graph errors abort before any task runs; otherwise the returned
    /// summary holds a terminal outcome for every declared task.
    #[instrument(skip(self, source), fields(workflow = %source.name))]
    pub async fn execute(&self, source: &WorkflowSource) -> Result<RunSummary> {
        let graph = self.build_graph(source)?;
        Ok(self
            .execute_graph(&source.name, source.description.clone(), graph)
            .await)
    }

    /// Execute an already-validated graph
    pub async fn execute_graph(
        &self,
        workflow_name: &str,
        description: Option<String>,
        graph: WorkflowGraph,
    ) -> RunSummary {
        let recorder = Arc::new(RunRecorder::new(
            workflow_name,
            description,
            graph.task_ids(),
        ));
        let context = SharedContext::new();

        info!(
            run_id = %recorder.run_id(),
            tasks = graph.len(),
            "Starting workflow: {workflow_name}"
        );
        recorder.event(RunEvent::run_started(workflow_name)).await;

        // One terminal signal per task; dependents clone the receiver
        let mut senders = HashMap::new();
        let mut receivers = HashMap::new();
        for task_id in graph.task_ids() {
            let (tx, rx) = watch::channel(false);
            senders.insert(task_id.clone(), tx);
            receivers.insert(task_id, rx);
        }

        // Launch every unit at once; each gates itself on its predecessors
        let mut task_ids = Vec::new();
        let mut handles = Vec::new();
        for (task_id, node) in graph.into_nodes() {
            let Some(terminal) = senders.remove(&task_id) else {
                continue;
            };
            let predecessors: Vec<watch::Receiver<bool>> = node
                .depends_on
                .iter()
                .filter_map(|dep| receivers.get(dep).cloned())
                .collect();

            task_ids.push(task_id);
            handles.push(tokio::spawn(run_unit(
                node,
                predecessors,
                terminal,
                Arc::clone(&self.registry),
                context.clone(),
                Arc::clone(&recorder),
            )));
        }
        drop(receivers);

        let joined = future::join_all(handles).await;
        for (task_id, result) in task_ids.into_iter().zip(joined) {
            if let Err(join_error) = result {
                // A panicking capability takes only its own unit down; give
                // the task a terminal record so the summary stays complete.
                error!(task = %task_id, "task unit terminated abnormally: {join_error}");
                let outcome =
                    TaskOutcome::failure(format!("task unit terminated abnormally: {join_error}"));
                context.commit(task_id.clone(), outcome.clone()).await;
                recorder
                    .event(RunEvent::task_failed(&task_id, "task unit terminated abnormally"))
                    .await;
                recorder.record(task_id, outcome).await;
            }
        }

        let summary = {
            let draft = recorder.finish().await;
            recorder
                .event(RunEvent::run_finished(workflow_name, draft.status))
                .await;
            recorder.finish().await
        };

        info!(
            run_id = %summary.run_id,
            status = %summary.status,
            succeeded = summary.counts.succeeded,
            failed = summary.counts.failed,
            "Workflow {workflow_name} finished"
        );

        summary
    }
}

impl Default for WorkflowEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// One deferred unit of work. Waits for every predecessor's terminal signal,
/// runs the capability, commits the outcome, then signals its own terminal
/// state. The commit happens before the signal so dependents always observe
/// the finished outcome.
async fn run_unit(
    node: TaskNode,
    predecessors: Vec<watch::Receiver<bool>>,
    terminal: watch::Sender<bool>,
    registry: Arc<PluginRegistry>,
    context: SharedContext,
    recorder: Arc<RunRecorder>,
) {
    let task_id = node.id.clone();

    for mut signal in predecessors {
        // Err means the predecessor's unit is gone; its terminal state stands
        let _ = signal.wait_for(|done| *done).await;
    }
    recorder.transition(&task_id, UnitState::Ready).await;

    recorder.transition(&task_id, UnitState::Running).await;
    info!(task = %task_id, plugin = %node.plugin, "Running task {task_id}");
    recorder
        .event(RunEvent::task_started(&task_id, &node.plugin))
        .await;

    let outcome = match registry.instantiate(&node.plugin) {
        Some(capability) => match capability.execute(&node.config, &context).await {
            Ok(value) => TaskOutcome::Success(value),
            Err(err) => TaskOutcome::failure(err.to_string()),
        },
        // The builder resolved every plugin; a miss means the registry
        // changed between validation and execution.
        None => TaskOutcome::failure(format!("plugin '{}' is not registered", node.plugin)),
    };

    match &outcome {
        TaskOutcome::Success(_) => {
            recorder.transition(&task_id, UnitState::Succeeded).await;
            info!(task = %task_id, "Task {task_id} completed");
            recorder.event(RunEvent::task_succeeded(&task_id)).await;
        }
        TaskOutcome::Failure { error: message } => {
            recorder.transition(&task_id, UnitState::Failed).await;
            error!(task = %task_id, "Task {task_id} failed: {message}");
            recorder
                .event(RunEvent::task_failed(&task_id, message))
                .await;
        }
    }

    context.commit(task_id.clone(), outcome.clone()).await;
    recorder.record(task_id, outcome).await;
    let _ = terminal.send(true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RunStatus;
    use crate::parser::TaskDeclaration;
    use crate::plugins::Capability;
    use anyhow::{anyhow, bail};
    use async_trait::async_trait;
    use serde_json::json;

    /// Succeeds with the configured value, but only if every configured
    /// upstream task already has a committed outcome.
    struct ProbeCapability;

    #[async_trait]
    impl Capability for ProbeCapability {
        fn name(&self) -> &'static str {
            "probe"
        }

        async fn execute(
            &self,
            config: &serde_yaml::Value,
            context: &SharedContext,
        ) -> anyhow::Result<serde_json::Value> {
            if let Some(sources) = config.get("sources").and_then(|s| s.as_sequence()) {
                for source in sources {
                    let source = source.as_str().unwrap_or_default();
                    if context.outcome(source).await.is_none() {
                        bail!("started before predecessor '{source}' committed its outcome");
                    }
                }
            }
            let value = config
                .get("value")
                .cloned()
                .unwrap_or(serde_yaml::Value::Null);
            Ok(serde_json::to_value(value)?)
        }
    }

    /// Returns the committed outcome of the task named by `source`, exactly
    /// as a dependent would observe it through the shared context.
    struct EchoCapability;

    #[async_trait]
    impl Capability for EchoCapability {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn execute(
            &self,
            config: &serde_yaml::Value,
            context: &SharedContext,
        ) -> anyhow::Result<serde_json::Value> {
            let source = config
                .get("source")
                .and_then(|s| s.as_str())
                .ok_or_else(|| anyhow!("echo needs a source task"))?;
            let outcome = context
                .outcome(source)
                .await
                .ok_or_else(|| anyhow!("no outcome for '{source}'"))?;
            Ok(serde_json::to_value(outcome)?)
        }
    }

    struct FailCapability;

    #[async_trait]
    impl Capability for FailCapability {
        fn name(&self) -> &'static str {
            "fail"
        }

        async fn execute(
            &self,
            config: &serde_yaml::Value,
            _context: &SharedContext,
        ) -> anyhow::Result<serde_json::Value> {
            let message = config
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("deliberate failure");
            Err(anyhow!("{message}"))
        }
    }

    fn test_engine() -> WorkflowEngine {
        let mut registry = PluginRegistry::new();
        registry.register(|| Box::new(ProbeCapability));
        registry.register(|| Box::new(EchoCapability));
        registry.register(|| Box::new(FailCapability));
        WorkflowEngine::with_registry(registry)
    }

    fn probe_task(id: &str, value: i64, sources: &[&str]) -> TaskDeclaration {
        let config: serde_yaml::Value = serde_yaml::from_str(&format!(
            "value: {value}\nsources: [{}]",
            sources.join(", ")
        ))
        .unwrap();
        TaskDeclaration::new(id, "probe")
            .with_config(config)
            .with_dependencies(sources)
    }

    #[tokio::test]
    async fn test_linear_chain_observes_predecessors() {
        let engine = test_engine();
        let source = WorkflowSource {
            name: "chain".to_string(),
            description: None,
            tasks: vec![
                probe_task("a", 1, &[]),
                probe_task("b", 2, &["a"]),
                probe_task("c", 3, &["b"]),
            ],
        };

        let summary = engine.execute(&source).await.unwrap();
        assert_eq!(summary.status, RunStatus::Success);
        assert_eq!(summary.counts.total, 3);
        assert_eq!(summary.outcome("c").unwrap().value(), Some(&json!(3)));
    }

    #[tokio::test]
    async fn test_failure_is_contained_to_subgraph() {
        let engine = test_engine();
        let source = WorkflowSource {
            name: "contained".to_string(),
            description: None,
            tasks: vec![
                TaskDeclaration::new("bad", "fail"),
                probe_task("sibling", 7, &[]),
                probe_task("downstream", 8, &["sibling"]),
            ],
        };

        let summary = engine.execute(&source).await.unwrap();
        assert_eq!(summary.status, RunStatus::PartialSuccess);
        assert!(summary.outcome("bad").unwrap().is_failure());
        assert!(summary.outcome("sibling").unwrap().is_success());
        assert!(summary.outcome("downstream").unwrap().is_success());
    }

    #[tokio::test]
    async fn test_dependent_runs_after_failed_predecessor() {
        let engine = test_engine();
        let source = WorkflowSource {
            name: "best_effort".to_string(),
            description: None,
            tasks: vec![
                TaskDeclaration::new("bad", "fail"),
                probe_task("after", 9, &["bad"]),
            ],
        };

        let summary = engine.execute(&source).await.unwrap();
        // The dependent saw the failure outcome committed, and still ran
        assert!(summary.outcome("bad").unwrap().is_failure());
        assert_eq!(summary.outcome("after").unwrap().value(), Some(&json!(9)));
    }

    #[tokio::test]
    async fn test_dependent_observes_failure_value() {
        let engine = test_engine();
        let fail_config: serde_yaml::Value = serde_yaml::from_str("message: boom").unwrap();
        let echo_config: serde_yaml::Value = serde_yaml::from_str("source: x").unwrap();
        let source = WorkflowSource {
            name: "observe".to_string(),
            description: None,
            tasks: vec![
                TaskDeclaration::new("x", "fail").with_config(fail_config),
                TaskDeclaration::new("y", "echo")
                    .with_config(echo_config)
                    .with_dependencies(&["x"]),
            ],
        };

        let summary = engine.execute(&source).await.unwrap();
        // y succeeded, and its value is exactly the failure descriptor x left
        assert_eq!(
            summary.outcome("y").unwrap().value(),
            Some(&json!({"error": "boom"}))
        );
    }

    #[tokio::test]
    async fn test_graph_error_aborts_before_execution() {
        let engine = test_engine();
        let source = WorkflowSource {
            name: "broken".to_string(),
            description: None,
            tasks: vec![probe_task("t1", 1, &["missing"])],
        };

        let err = engine.execute(&source).await.unwrap_err();
        match err {
            crate::engine::EngineError::Graph(crate::engine::GraphError::UnknownDependency {
                task_id,
                dependency,
            }) => {
                assert_eq!(task_id, "t1");
                assert_eq!(dependency, "missing");
            }
            other => panic!("expected unknown dependency error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_workflow_completes() {
        let engine = test_engine();
        let source = WorkflowSource {
            name: "empty".to_string(),
            description: None,
            tasks: Vec::new(),
        };

        let summary = engine.execute(&source).await.unwrap();
        assert_eq!(summary.status, RunStatus::Success);
        assert!(summary.outcomes.is_empty());
    }
}
