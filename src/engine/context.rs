// ABOUTME: Shared execution context for cross-task data flow
// ABOUTME: Single-writer-per-key store of task outcomes, readable by dependents

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::result::TaskOutcome;

/// The one channel through which tasks observe upstream results.
///
/// Each key is written exactly once, by the executor, immediately after the
/// owning task's capability returns; the executor signals the task terminal
/// only after the write lands. A dependent therefore always reads a fully
/// committed outcome for its ancestors. Entries for unrelated tasks may or
/// may not be present and plugins must not rely on them.
#[derive(Debug, Clone, Default)]
pub struct SharedContext {
    outcomes: Arc<RwLock<HashMap<String, TaskOutcome>>>,
}

impl SharedContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the recorded outcome for a task, if it has reached a terminal state
    pub async fn outcome(&self, task_id: &str) -> Option<TaskOutcome> {
        let outcomes = self.outcomes.read().await;
        outcomes.get(task_id).cloned()
    }

    pub async fn contains(&self, task_id: &str) -> bool {
        let outcomes = self.outcomes.read().await;
        outcomes.contains_key(task_id)
    }

    pub async fn snapshot(&self) -> HashMap<String, TaskOutcome> {
        let outcomes = self.outcomes.read().await;
        outcomes.clone()
    }

    /// Commit a task's outcome. Executor-only; one write per key.
    pub(crate) async fn commit(&self, task_id: String, outcome: TaskOutcome) {
        let mut outcomes = self.outcomes.write().await;
        outcomes.insert(task_id, outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_commit_and_read() {
        let context = SharedContext::new();
        assert!(context.outcome("a").await.is_none());
        assert!(!context.contains("a").await);

        context
            .commit("a".to_string(), TaskOutcome::Success(json!({"n": 1})))
            .await;

        let outcome = context.outcome("a").await.unwrap();
        assert!(outcome.is_success());
        assert!(context.contains("a").await);
    }

    #[tokio::test]
    async fn test_snapshot() {
        let context = SharedContext::new();
        context
            .commit("a".to_string(), TaskOutcome::Success(json!(1)))
            .await;
        context
            .commit("b".to_string(), TaskOutcome::failure("boom"))
            .await;

        let snapshot = context.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot["b"].is_failure());
    }
}
