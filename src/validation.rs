//! Input validation for pipeline tasks.
//!
//! Checks structural integrity of the task set before modeling:
//! - Duplicate task names
//! - Execution times below one
//! - Total execution time beyond [`MAX_HORIZON`]
//! - Dependencies on tasks that do not exist
//!
//! Cycles are not detected here. A cyclic dependency graph is still a valid
//! task set; the solver proves it infeasible.

use crate::error::{PlanningError, PlanningResult};
use crate::models::Task;
use std::collections::HashSet;

/// Largest supported sum of execution times.
///
/// Model time values and solver bounds stay within a few horizons.
pub const MAX_HORIZON: i64 = 1 << 60;

/// Validates the tasks of a pipeline and returns them unchanged.
///
/// Checks, in order:
/// 1. No two tasks share a name
/// 2. Every execution time is at least 1
/// 3. The execution times sum to at most [`MAX_HORIZON`]
/// 4. Every dependency names a task of the collection
///
/// # Errors
/// [`PlanningError::DuplicateTaskName`] for the first repeated name,
/// [`PlanningError::InvalidExecutionTime`] for the first non-positive
/// duration, [`PlanningError::HorizonOverflow`] for a too large total,
/// [`PlanningError::UnknownDependency`] for the first dangling dependency.
pub fn validate_tasks(tasks: Vec<Task>) -> PlanningResult<Vec<Task>> {
    let mut names = HashSet::with_capacity(tasks.len());
    for task in &tasks {
        if !names.insert(task.name.as_str()) {
            return Err(PlanningError::DuplicateTaskName(task.name.clone()));
        }
    }

    let mut horizon: i64 = 0;
    for task in &tasks {
        if task.execution_time < 1 {
            return Err(PlanningError::InvalidExecutionTime {
                task: task.name.clone(),
                value: task.execution_time.to_string(),
            });
        }
        horizon = horizon
            .checked_add(task.execution_time)
            .filter(|&h| h <= MAX_HORIZON)
            .ok_or(PlanningError::HorizonOverflow { limit: MAX_HORIZON })?;
    }

    for task in &tasks {
        for dep in &task.dependencies {
            if !names.contains(dep.as_str()) {
                return Err(PlanningError::UnknownDependency {
                    task: task.name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    Ok(tasks)
}
