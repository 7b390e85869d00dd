//! Error family shared by parsing, validation and planning.
//!
//! Every failure of a planning request surfaces as a [`PlanningError`], so a
//! single top-level handler can report it. None of them are recoverable for
//! the current request.

use thiserror::Error;

/// Errors raised while reading, validating or planning a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanningError {
    /// The input does not consist of four-line task blocks plus a terminator.
    #[error("Invalid pipeline task definition. Unexpected line count: {0}")]
    UnexpectedLineCount(usize),

    /// The last input line is not `END`.
    #[error("Invalid pipeline task definition. Last line should read \"END\", instead found: {0}")]
    MissingTerminator(String),

    /// A task name is empty after trimming.
    #[error("Encountered a task with an invalid name: \"{0}\"")]
    InvalidTaskName(String),

    /// An execution time is not an integer >= 1.
    #[error("Encountered a task with an invalid execution time! Task: \"{task}\", execution time: \"{value}\"")]
    InvalidExecutionTime { task: String, value: String },

    /// Two tasks share a name.
    #[error("Pipeline tasks contain duplicated task name: {0}")]
    DuplicateTaskName(String),

    /// The execution times add up to more than the planner can represent.
    #[error("Total execution time of the pipeline exceeds the supported maximum of {limit} time units")]
    HorizonOverflow { limit: i64 },

    /// A dependency references a task that does not exist.
    #[error("Task {task} has non-existent dependency: {dependency}")]
    UnknownDependency { task: String, dependency: String },

    /// No assignment satisfies all constraints.
    #[error("Impossible to schedule tasks - check for circular dependencies or conflicting group constraints.")]
    PlanningInfeasible,

    /// The solver stopped without proving optimality or infeasibility.
    #[error("Failed to find an optimal solution: {0}")]
    PlanningIncomplete(String),

    /// A solution claimed optimal left a task without a core.
    #[error("Solver returned no core for task {0}")]
    MissingCoreAssignment(String),
}

/// Result alias used across the crate.
pub type PlanningResult<T> = Result<T, PlanningError>;
