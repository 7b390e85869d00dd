//! Pipeline planning and KPI evaluation.
//!
//! # Algorithm
//!
//! `PipelinePlanner` formulates the pipeline as a flexible job shop
//! (identical cores, precedence edges, pairwise exclusion between groups)
//! and solves it exactly, so every accepted plan has minimum makespan.
//!
//! # KPI
//!
//! `ScheduleKpi` computes makespan, core busy time, utilization, idle time
//! and parallelism.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3-4
//! - Brucker & Schlie (1990), "Job-shop scheduling with multi-purpose machines"

mod kpi;
mod planner;

pub use kpi::ScheduleKpi;
pub use planner::PipelinePlanner;

use crate::error::PlanningResult;
use crate::models::{ScheduledTask, TaskSet};

/// Plans a validated task set on `cpu_cores` cores with default limits.
///
/// Shorthand for [`PipelinePlanner::from_task_set`] followed by
/// [`PipelinePlanner::plan`].
pub fn plan(tasks: TaskSet, cpu_cores: usize) -> PlanningResult<Vec<ScheduledTask>> {
    PipelinePlanner::from_task_set(tasks).plan(cpu_cores)
}
