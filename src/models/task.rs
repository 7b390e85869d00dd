//! Task model.
//!
//! A task is a unit of pipeline work with a fixed execution time, an
//! optional group, and the names of the tasks it depends on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A pipeline task to be scheduled.
///
/// # Time Representation
/// Execution times are integral time units (the report calls them minutes).
/// A task occupies `[start, start + execution_time)` on exactly one core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task name.
    pub name: String,
    /// Group name. Empty means ungrouped.
    pub group: String,
    /// Duration in time units (>= 1).
    pub execution_time: i64,
    /// Names of tasks that must complete before this one starts.
    pub dependencies: BTreeSet<String>,
}

impl Task {
    /// Creates an ungrouped task with no dependencies.
    pub fn new(name: impl Into<String>, execution_time: i64) -> Self {
        Self {
            name: name.into(),
            group: String::new(),
            execution_time,
            dependencies: BTreeSet::new(),
        }
    }

    /// Sets the group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Adds a dependency.
    pub fn with_dependency(mut self, name: impl Into<String>) -> Self {
        self.dependencies.insert(name.into());
        self
    }

    /// Adds several dependencies.
    pub fn with_dependencies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(names.into_iter().map(Into::into));
        self
    }

    /// Whether the task belongs to a group.
    pub fn has_group(&self) -> bool {
        !self.group.is_empty()
    }

    /// Whether the task depends on `name`.
    pub fn depends_on(&self, name: &str) -> bool {
        self.dependencies.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_builder() {
        let task = Task::new("C", 2)
            .with_group("model")
            .with_dependency("B")
            .with_dependencies(["A", "B"]);

        assert_eq!(task.name, "C");
        assert_eq!(task.group, "model");
        assert_eq!(task.execution_time, 2);
        assert_eq!(task.dependencies.len(), 2);
        assert!(task.depends_on("A"));
        assert!(task.has_group());
    }

    #[test]
    fn test_task_ungrouped() {
        let task = Task::new("A", 4);
        assert!(!task.has_group());
        assert!(task.dependencies.is_empty());
    }
}
