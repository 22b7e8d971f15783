// ABOUTME: Function capability invoking named native functions with JSON args
// ABOUTME: Functions are registered in a table at startup; no runtime code loading

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::Capability;
use crate::engine::SharedContext;

pub type NativeFunction =
    Arc<dyn Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync>;

/// Lookup table of named native functions.
///
/// Populated when the registry is built and immutable afterwards; workflows
/// refer to entries by name only.
#[derive(Clone, Default)]
pub struct FunctionTable {
    functions: HashMap<String, NativeFunction>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut table = Self::new();

        table.register("identity", |args| {
            Ok(args.first().cloned().unwrap_or(Value::Null))
        });

        table.register("sum", |args| {
            let mut total = 0.0;
            for arg in flatten(args) {
                match arg.as_f64() {
                    Some(n) => total += n,
                    None => bail!("sum expects numeric arguments, got {arg}"),
                }
            }
            if total.fract() == 0.0 && total.abs() < i64::MAX as f64 {
                Ok(Value::from(total as i64))
            } else {
                Ok(Value::from(total))
            }
        });

        table.register("concat", |args| {
            let mut joined = String::new();
            for arg in flatten(args) {
                match arg {
                    Value::String(s) => joined.push_str(s),
                    other => joined.push_str(&other.to_string()),
                }
            }
            Ok(Value::String(joined))
        });

        table.register("len", |args| {
            let length = match args.first() {
                Some(Value::Array(items)) => items.len(),
                Some(Value::String(s)) => s.len(),
                Some(Value::Object(map)) => map.len(),
                _ => bail!("len expects an array, string, or object argument"),
            };
            Ok(Value::from(length))
        });

        table
    }

    pub fn register<F>(&mut self, name: &str, function: F)
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.functions.insert(name.to_string(), Arc::new(function));
    }

    pub fn get(&self, name: &str) -> Option<NativeFunction> {
        self.functions.get(name).cloned()
    }

    pub fn function_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// A single array argument stands for its elements
fn flatten(args: &[Value]) -> Vec<&Value> {
    match args {
        [Value::Array(items)] => items.iter().collect(),
        _ => args.iter().collect(),
    }
}

pub struct FunctionCapability {
    table: Arc<FunctionTable>,
}

impl FunctionCapability {
    pub fn new(table: Arc<FunctionTable>) -> Self {
        Self { table }
    }
}

/// Configuration for the function capability
///
/// ```yaml
/// plugin: function
/// config:
///   function: sum
///   args: [1, 2, 3]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionConfig {
    pub function: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

#[async_trait]
impl Capability for FunctionCapability {
    fn name(&self) -> &'static str {
        "function"
    }

    async fn execute(
        &self,
        config: &serde_yaml::Value,
        _context: &SharedContext,
    ) -> anyhow::Result<serde_json::Value> {
        let config: FunctionConfig = serde_yaml::from_value(config.clone())
            .map_err(|e| anyhow!("invalid function config: {e}"))?;

        let function = self.table.get(&config.function).ok_or_else(|| {
            anyhow!(
                "unknown function '{}'; registered functions: {:?}",
                config.function,
                self.table.function_names()
            )
        })?;

        function(&config.args)
    }
}
