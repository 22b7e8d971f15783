// ABOUTME: Workflow graph construction and validation
// ABOUTME: Turns raw task declarations into an immutable, acyclic dependency graph

use indexmap::IndexMap;
use petgraph::algo::toposort;
use petgraph::graph::NodeIndex;
use petgraph::{Direction, Graph};
use std::collections::HashMap;

use super::error::GraphError;
use crate::parser::TaskDeclaration;
use crate::plugins::PluginRegistry;

/// A validated task: resolved plugin name, opaque config, predecessor ids.
#[derive(Debug, Clone)]
pub struct TaskNode {
    pub id: String,
    pub plugin: String,
    pub config: serde_yaml::Value,
    pub depends_on: Vec<String>,
}

/// An immutable dependency graph built once per run.
///
/// Nodes keep declaration order; edges point from a dependency to the task
/// that requires it.
#[derive(Debug)]
pub struct WorkflowGraph {
    nodes: IndexMap<String, TaskNode>,
    graph: Graph<String, ()>,
    task_indices: HashMap<String, NodeIndex>,
}

impl WorkflowGraph {
    /// Validate declarations and build the graph.
    ///
    /// Checks run in a fixed order, failing on the first violation: task ids,
    /// duplicates, plugin resolution, dependency list shape, dependency
    /// references, and finally acyclicity over the whole graph.
    pub fn build(
        declarations: &[TaskDeclaration],
        registry: &PluginRegistry,
    ) -> Result<Self, GraphError> {
        // 1. Every declaration carries a non-empty string id
        let mut ids = Vec::with_capacity(declarations.len());
        for (index, decl) in declarations.iter().enumerate() {
            match decl.id.as_deref() {
                Some(id) if !id.trim().is_empty() => ids.push(id.to_string()),
                _ => return Err(GraphError::MalformedTask { index }),
            }
        }

        // 2. Ids are unique
        let mut nodes: IndexMap<String, TaskNode> = IndexMap::with_capacity(declarations.len());
        for id in &ids {
            if nodes.contains_key(id) {
                return Err(GraphError::DuplicateTaskId {
                    task_id: id.clone(),
                });
            }
            nodes.insert(
                id.clone(),
                TaskNode {
                    id: id.clone(),
                    plugin: String::new(),
                    config: serde_yaml::Value::Null,
                    depends_on: Vec::new(),
                },
            );
        }

        // 3. Every plugin name resolves against the registry
        for (id, decl) in ids.iter().zip(declarations) {
            let plugin = decl.plugin.clone().unwrap_or_default();
            if !registry.contains(&plugin) {
                return Err(GraphError::UnknownPlugin {
                    task_id: id.clone(),
                    plugin,
                });
            }
            if let Some(node) = nodes.get_mut(id) {
                node.plugin = plugin;
                node.config = decl.config.clone();
            }
        }

        // 4. depends_on is a list of strings (absent counts as empty)
        for (id, decl) in ids.iter().zip(declarations) {
            let deps = parse_dependency_list(&decl.depends_on).ok_or_else(|| {
                GraphError::MalformedDependency {
                    task_id: id.clone(),
                }
            })?;
            if let Some(node) = nodes.get_mut(id) {
                node.depends_on = deps;
            }
        }

        // 5. Every dependency refers to a declared task
        for node in nodes.values() {
            for dep in &node.depends_on {
                if !nodes.contains_key(dep) {
                    return Err(GraphError::UnknownDependency {
                        task_id: node.id.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        // 6. The dependency relation is acyclic
        let mut graph = Graph::new();
        let mut task_indices = HashMap::new();
        for id in nodes.keys() {
            let node_index = graph.add_node(id.clone());
            task_indices.insert(id.clone(), node_index);
        }
        for node in nodes.values() {
            let task_node = task_indices[&node.id];
            for dep in &node.depends_on {
                graph.add_edge(task_indices[dep], task_node, ());
            }
        }

        if toposort(&graph, None).is_err() {
            let cycle = find_cycle(&nodes).unwrap_or_default();
            return Err(GraphError::CyclicDependency { cycle });
        }

        Ok(Self {
            nodes,
            graph,
            task_indices,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.nodes.contains_key(task_id)
    }

    pub fn node(&self, task_id: &str) -> Option<&TaskNode> {
        self.nodes.get(task_id)
    }

    /// Task ids in declaration order
    pub fn task_ids(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }

    /// Consume the graph, yielding its nodes in declaration order
    pub fn into_nodes(self) -> IndexMap<String, TaskNode> {
        self.nodes
    }

    /// Get all tasks that directly depend on the given task
    pub fn dependents(&self, task_id: &str) -> Vec<String> {
        self.neighbors(task_id, Direction::Outgoing)
    }

    /// Get all tasks the given task directly depends on
    pub fn dependencies(&self, task_id: &str) -> Vec<String> {
        self.neighbors(task_id, Direction::Incoming)
    }

    /// Tasks with no dependencies; they are released immediately at run start
    pub fn root_tasks(&self) -> Vec<String> {
        self.nodes
            .values()
            .filter(|node| node.depends_on.is_empty())
            .map(|node| node.id.clone())
            .collect()
    }

    fn neighbors(&self, task_id: &str, direction: Direction) -> Vec<String> {
        if let Some(&node_idx) = self.task_indices.get(task_id) {
            self.graph
                .neighbors_directed(node_idx, direction)
                .map(|neighbor| self.graph[neighbor].clone())
                .collect()
        } else {
            Vec::new()
        }
    }
}

fn parse_dependency_list(value: &serde_yaml::Value) -> Option<Vec<String>> {
    match value {
        serde_yaml::Value::Null => Some(Vec::new()),
        serde_yaml::Value::Sequence(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

/// Walk the dependency relation depth-first and return the ordered task-id
/// sequence of the first cycle found.
fn find_cycle(nodes: &IndexMap<String, TaskNode>) -> Option<Vec<String>> {
    fn visit<'a>(
        id: &'a str,
        nodes: &'a IndexMap<String, TaskNode>,
        in_progress: &mut HashMap<&'a str, bool>,
        stack: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        match in_progress.get(id) {
            Some(true) => {
                let start = stack.iter().position(|task| *task == id).unwrap_or(0);
                return Some(stack[start..].iter().map(|s| s.to_string()).collect());
            }
            Some(false) => return None,
            None => {}
        }

        in_progress.insert(id, true);
        stack.push(id);

        if let Some(node) = nodes.get(id) {
            for dep in &node.depends_on {
                if let Some(cycle) = visit(dep.as_str(), nodes, in_progress, stack) {
                    return Some(cycle);
                }
            }
        }

        stack.pop();
        in_progress.insert(id, false);
        None
    }

    let mut in_progress = HashMap::new();
    let mut stack = Vec::new();
    for id in nodes.keys() {
        if let Some(cycle) = visit(id.as_str(), nodes, &mut in_progress, &mut stack) {
            return Some(cycle);
        }
    }
    None
}
