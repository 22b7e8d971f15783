// ABOUTME: Plugin capability contract and registry for the oprun orchestrator
// ABOUTME: Maps plugin names to factories producing fresh capability instances

pub mod csv;
pub mod function;
pub mod metrics;
pub mod shell;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::SharedContext;

pub use function::FunctionTable;

/// A named, stateless unit of work.
///
/// `config` is the opaque mapping from the task declaration, read-only to the
/// capability. `context` exposes committed outcomes of the task's transitive
/// dependencies. The returned value must be JSON-serializable; it becomes the
/// task's recorded outcome.
#[async_trait]
pub trait Capability: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(
        &self,
        config: &serde_yaml::Value,
        context: &SharedContext,
    ) -> anyhow::Result<serde_json::Value>;
}

type CapabilityFactory = Box<dyn Fn() -> Box<dyn Capability> + Send + Sync>;

/// Fixed mapping from plugin name to capability factory.
///
/// Membership is established at construction and read-only afterwards. A
/// fresh capability instance is produced per task execution so no state leaks
/// across tasks or runs.
pub struct PluginRegistry {
    factories: HashMap<String, CapabilityFactory>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry preloaded with the bundled plugins
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        let functions = Arc::new(FunctionTable::with_builtins());

        registry.register(|| Box::new(shell::ShellCapability));
        registry.register(|| Box::new(csv::CsvIngestCapability));
        registry.register(|| Box::new(metrics::MetricsCapability));
        registry.register(move || {
            Box::new(function::FunctionCapability::new(Arc::clone(&functions)))
        });

        registry
    }

    pub fn register<F>(&mut self, factory: F)
    where
        F: Fn() -> Box<dyn Capability> + Send + Sync + 'static,
    {
        let name = factory().name().to_string();
        self.factories.insert(name, Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Produce a fresh capability instance for one task execution
    pub fn instantiate(&self, name: &str) -> Option<Box<dyn Capability>> {
        self.factories.get(name).map(|factory| factory())
    }

    pub fn plugin_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
