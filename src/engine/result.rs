// ABOUTME: Task outcome types, run events, and run summary aggregation
// ABOUTME: Defines the per-task terminal record and the recorder that assembles it

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// Terminal record of a single task: the value its capability produced, or a
/// captured failure descriptor. Immutable once created.
///
/// Serializes untagged so a summary entry is either the raw success value or
/// `{"error": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TaskOutcome {
    Failure { error: String },
    Success(serde_json::Value),
}

impl TaskOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        TaskOutcome::Failure {
            error: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TaskOutcome::Failure { .. })
    }

    pub fn value(&self) -> Option<&serde_json::Value> {
        match self {
            TaskOutcome::Success(value) => Some(value),
            TaskOutcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            TaskOutcome::Failure { error } => Some(error),
            TaskOutcome::Success(_) => None,
        }
    }
}

/// Lifecycle of one task unit. A unit never revisits an earlier state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UnitState {
    Waiting,
    Ready,
    Running,
    Succeeded,
    Failed,
}

impl UnitState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UnitState::Succeeded | UnitState::Failed)
    }

    pub fn can_advance_to(&self, next: UnitState) -> bool {
        matches!(
            (self, next),
            (UnitState::Waiting, UnitState::Ready)
                | (UnitState::Ready, UnitState::Running)
                | (UnitState::Running, UnitState::Succeeded)
                | (UnitState::Running, UnitState::Failed)
        )
    }
}

impl std::fmt::Display for UnitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitState::Waiting => write!(f, "waiting"),
            UnitState::Ready => write!(f, "ready"),
            UnitState::Running => write!(f, "running"),
            UnitState::Succeeded => write!(f, "succeeded"),
            UnitState::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    RunStarted,
    TaskStarted,
    TaskSucceeded,
    TaskFailed,
    RunFinished,
}

/// One timestamped entry in the run's execution log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    pub task_id: Option<String>,
    pub message: String,
}

impl RunEvent {
    fn new(kind: EventKind, task_id: Option<String>, message: String) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            task_id,
            message,
        }
    }

    pub fn run_started(workflow_name: &str) -> Self {
        Self::new(
            EventKind::RunStarted,
            None,
            format!("Starting workflow: {workflow_name}"),
        )
    }

    pub fn task_started(task_id: &str, plugin: &str) -> Self {
        Self::new(
            EventKind::TaskStarted,
            Some(task_id.to_string()),
            format!("Running task {task_id} using plugin {plugin}..."),
        )
    }

    pub fn task_succeeded(task_id: &str) -> Self {
        Self::new(
            EventKind::TaskSucceeded,
            Some(task_id.to_string()),
            format!("Task {task_id} completed"),
        )
    }

    pub fn task_failed(task_id: &str, error: &str) -> Self {
        Self::new(
            EventKind::TaskFailed,
            Some(task_id.to_string()),
            format!("Task {task_id} failed: {error}"),
        )
    }

    pub fn run_finished(workflow_name: &str, status: RunStatus) -> Self {
        Self::new(
            EventKind::RunFinished,
            None,
            format!("Workflow {workflow_name} finished with status: {status}"),
        )
    }

    pub fn level(&self) -> &'static str {
        match self.kind {
            EventKind::TaskFailed => "ERROR",
            _ => "INFO",
        }
    }
}

impl std::fmt::Display for RunEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.level(),
            self.message
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    PartialSuccess,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Success => write!(f, "success"),
            RunStatus::PartialSuccess => write!(f, "partial_success"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// The complete record of a finished run: one terminal outcome per declared
/// task, in declaration order, plus the execution log.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub workflow_name: String,
    pub description: Option<String>,
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: RunStatus,
    pub counts: RunCounts,
    pub outcomes: IndexMap<String, TaskOutcome>,
    pub events: Vec<RunEvent>,
}

impl RunSummary {
    pub fn outcome(&self, task_id: &str) -> Option<&TaskOutcome> {
        self.outcomes.get(task_id)
    }

    pub fn has_failures(&self) -> bool {
        self.counts.failed > 0
    }
}

/// Aggregates outcomes and events as the scheduler funnels them in.
///
/// Pure aggregation: no execution, no validation. `finish` seals the record
/// once every task is terminal.
pub struct RunRecorder {
    workflow_name: String,
    description: Option<String>,
    run_id: String,
    started_at: DateTime<Utc>,
    task_order: Vec<String>,
    outcomes: RwLock<HashMap<String, TaskOutcome>>,
    states: RwLock<HashMap<String, UnitState>>,
    events: Mutex<Vec<RunEvent>>,
}

impl RunRecorder {
    pub fn new(workflow_name: &str, description: Option<String>, task_order: Vec<String>) -> Self {
        let states = task_order
            .iter()
            .map(|id| (id.clone(), UnitState::Waiting))
            .collect();

        Self {
            workflow_name: workflow_name.to_string(),
            description,
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            task_order,
            outcomes: RwLock::new(HashMap::new()),
            states: RwLock::new(states),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub async fn record(&self, task_id: String, outcome: TaskOutcome) {
        let mut outcomes = self.outcomes.write().await;
        outcomes.insert(task_id, outcome);
    }

    pub async fn event(&self, event: RunEvent) {
        let mut events = self.events.lock().await;
        events.push(event);
    }

    pub async fn transition(&self, task_id: &str, next: UnitState) {
        let mut states = self.states.write().await;
        if let Some(state) = states.get_mut(task_id) {
            if state.can_advance_to(next) {
                debug!(task = %task_id, from = %state, to = %next, "task state transition");
                *state = next;
            } else {
                warn!(task = %task_id, from = %state, to = %next, "invalid task state transition");
            }
        }
    }

    pub async fn state(&self, task_id: &str) -> Option<UnitState> {
        let states = self.states.read().await;
        states.get(task_id).copied()
    }

    pub async fn recorded_count(&self) -> usize {
        let outcomes = self.outcomes.read().await;
        outcomes.len()
    }

    /// Seal the run record. Outcomes are emitted in declaration order so the
    /// summary is deterministic regardless of completion interleaving.
    pub async fn finish(&self) -> RunSummary {
        let outcomes_by_id = self.outcomes.read().await;
        let events = self.events.lock().await;

        let mut outcomes = IndexMap::with_capacity(self.task_order.len());
        for task_id in &self.task_order {
            if let Some(outcome) = outcomes_by_id.get(task_id) {
                outcomes.insert(task_id.clone(), outcome.clone());
            }
        }

        let total = outcomes.len();
        let failed = outcomes.values().filter(|o| o.is_failure()).count();
        let succeeded = total - failed;

        let status = match (succeeded, failed) {
            (_, 0) => RunStatus::Success,
            (0, f) if f > 0 => RunStatus::Failed,
            _ => RunStatus::PartialSuccess,
        };

        RunSummary {
            workflow_name: self.workflow_name.clone(),
            description: self.description.clone(),
            run_id: self.run_id.clone(),
            started_at: self.started_at,
            finished_at: Utc::now(),
            status,
            counts: RunCounts {
                total,
                succeeded,
                failed,
            },
            outcomes,
            events: events.clone(),
        }
    }
}
