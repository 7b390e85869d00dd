//! Schedule quality metrics (KPIs).
//!
//! Computes core-level performance indicators from a completed schedule.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan (C_max) | Latest completion time |
//! | Total Work | Sum of execution times |
//! | Core Busy Time | Work assigned to each core |
//! | Core Utilization | Busy time / makespan, per core |
//! | Avg Utilization | Mean core utilization |
//! | Idle Core Time | cores * makespan - total work |
//! | Parallelism | Total work / makespan |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use serde::{Deserialize, Serialize};

use crate::models::Schedule;

/// Schedule performance indicators.
///
/// All time values are in pipeline time units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleKpi {
    /// Makespan: latest completion time.
    pub makespan: i64,
    /// Sum of execution times across all tasks.
    pub total_work: i64,
    /// Busy time per core, indexed by core.
    pub busy_by_core: Vec<i64>,
    /// Utilization per core (0.0..1.0), indexed by core.
    pub utilization_by_core: Vec<f64>,
    /// Average core utilization (0.0..1.0).
    pub avg_utilization: f64,
    /// Core time spent idle before the makespan.
    pub idle_core_time: i64,
    /// Average number of busy cores over the makespan.
    pub parallelism: f64,
}

impl ScheduleKpi {
    /// Computes KPIs for a schedule on `cpu_cores` cores.
    ///
    /// Cores that appear in the schedule beyond `cpu_cores` are counted
    /// too, so the metrics never drop work.
    pub fn calculate(schedule: &Schedule, cpu_cores: usize) -> Self {
        let makespan = schedule.makespan();
        let cores = schedule
            .tasks
            .iter()
            .map(|s| s.core + 1)
            .max()
            .unwrap_or(0)
            .max(cpu_cores);

        let mut busy_by_core = vec![0i64; cores];
        for scheduled in &schedule.tasks {
            busy_by_core[scheduled.core] += scheduled.task.execution_time;
        }
        let total_work: i64 = busy_by_core.iter().sum();

        let utilization_by_core: Vec<f64> = busy_by_core
            .iter()
            .map(|&busy| {
                if makespan > 0 {
                    busy as f64 / makespan as f64
                } else {
                    0.0
                }
            })
            .collect();

        let avg_utilization = if utilization_by_core.is_empty() {
            0.0
        } else {
            utilization_by_core.iter().sum::<f64>() / utilization_by_core.len() as f64
        };

        let parallelism = if makespan > 0 {
            total_work as f64 / makespan as f64
        } else {
            0.0
        };

        Self {
            makespan,
            total_work,
            busy_by_core,
            utilization_by_core,
            avg_utilization,
            idle_core_time: cores as i64 * makespan - total_work,
            parallelism,
        }
    }

    /// Whether every core is busy at least `min_utilization` of the time.
    pub fn meets_utilization(&self, min_utilization: f64) -> bool {
        self.utilization_by_core
            .iter()
            .all(|&u| u >= min_utilization)
    }
}
