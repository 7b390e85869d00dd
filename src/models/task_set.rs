//! Validated task collection.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::Task;
use crate::error::PlanningResult;
use crate::validation::validate_tasks;

/// A task collection that passed validation.
///
/// Names are unique and every dependency refers to a task of the set.
/// Input order is preserved. The dependency graph may still contain a
/// cycle; that surfaces as an infeasible plan, not here.
#[derive(Debug, Clone, Serialize)]
pub struct TaskSet {
    tasks: Vec<Task>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl TaskSet {
    /// Validates `tasks` and wraps them.
    pub fn new(tasks: Vec<Task>) -> PlanningResult<Self> {
        let tasks = validate_tasks(tasks)?;
        let index = tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect();
        Ok(Self { tasks, index })
    }

    /// Tasks in input order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Position of the task named `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Looks a task up by name.
    pub fn get(&self, name: &str) -> Option<&Task> {
        self.position(name).map(|i| &self.tasks[i])
    }

    /// Sum of all execution times: the fully serial upper bound.
    ///
    /// At most [`MAX_HORIZON`](crate::validation::MAX_HORIZON).
    pub fn horizon(&self) -> i64 {
        self.tasks.iter().map(|t| t.execution_time).sum()
    }

    /// Task indices per non-empty group, ordered by group name.
    ///
    /// Ungrouped tasks are left out.
    pub fn groups(&self) -> BTreeMap<&str, Vec<usize>> {
        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, task) in self.tasks.iter().enumerate() {
            if task.has_group() {
                groups.entry(task.group.as_str()).or_default().push(i);
            }
        }
        groups
    }

    /// Dependency edges as `(task, dependency)` index pairs.
    pub fn dependency_edges(&self) -> Vec<(usize, usize)> {
        let mut edges = Vec::new();
        for (i, task) in self.tasks.iter().enumerate() {
            for dep in &task.dependencies {
                if let Some(d) = self.position(dep) {
                    edges.push((i, d));
                }
            }
        }
        edges
    }

    /// Consumes the set, returning the tasks.
    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }
}
