//! Optimal planner for data pipelines on a multi-core machine.
//!
//! A pipeline is a set of tasks with integer durations, dependencies and
//! optional groups. Tasks of two different groups never run at the same
//! time. The planner assigns every task a core and a start time so that
//! the total execution time (makespan) is minimal.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Task`, `TaskSet`, `ScheduledTask`, `Schedule`
//! - **`validation`**: Input integrity checks (duplicate names, unknown dependencies)
//! - **`cp`**: Interval constraint model, pipeline formulation and exact solver
//! - **`scheduler`**: `PipelinePlanner` and schedule KPIs
//! - **`parser`**: Pipeline definition file format
//! - **`report`**: Text report of a plan
//! - **`error`**: `PlanningError`, shared by every stage
//!
//! # Example
//!
//! ```
//! use pipeline_planner::parser::TaskParser;
//! use pipeline_planner::report::ScheduleReport;
//! use pipeline_planner::scheduler::PipelinePlanner;
//!
//! let lines = ["A", "2", "feature", "", "B", "1", "model", "A", "END"];
//! let tasks = TaskParser::new().parse(&lines).unwrap();
//! let scheduled = PipelinePlanner::new(tasks).unwrap().plan(2).unwrap();
//!
//! let report = ScheduleReport::new().generate(&scheduled);
//! assert!(report.starts_with("Minimum Execution Time = 3 minute(s)"));
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Brucker (2007), "Scheduling Algorithms"
//! - Baptiste et al. (2001), "Constraint-Based Scheduling"

pub mod cp;
pub mod error;
pub mod models;
pub mod parser;
pub mod report;
pub mod scheduler;
pub mod validation;

pub use error::{PlanningError, PlanningResult};
