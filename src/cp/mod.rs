//! CP-based pipeline formulation.
//!
//! Translates a validated [`TaskSet`] into a flexible job-shop [`CpModel`]
//! and decodes a [`CpSolution`] back into scheduled tasks.
//!
//! The formulation follows the textbook flexible job shop with two
//! extensions: precedences may link any two tasks, and tasks of different
//! non-empty groups never run at the same time, whatever their cores.
//!
//! # Reference
//! - Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling"
//! - Baptiste et al. (2001), "Constraint-Based Scheduling"

mod model;
mod solver;

pub use model::{CpConstraint, CpModel, IntervalId, IntervalVar, Objective};
pub use solver::{
    BranchAndBoundSolver, CpSolution, CpSolver, IntervalSolution, SolveStatus, SolverConfig,
    SolverStats,
};

use crate::error::{PlanningError, PlanningResult};
use crate::models::{ScheduledTask, TaskSet};

/// A built model together with the handles needed to read a solution.
#[derive(Debug, Clone)]
pub struct PipelineModel {
    /// The constraint model.
    pub model: CpModel,
    /// Master interval per task, in task-set order.
    pub task_intervals: Vec<IntervalId>,
    /// Optional interval per task and core. Empty when there is one core.
    pub core_intervals: Vec<Vec<IntervalId>>,
    /// Number of cores.
    pub cpu_cores: usize,
}

/// Builds a CP model from a pipeline task set.
///
/// # Example
/// ```
/// use pipeline_planner::cp::{BranchAndBoundSolver, ScheduleCpBuilder, SolverConfig};
/// use pipeline_planner::models::{Task, TaskSet};
///
/// let tasks = TaskSet::new(vec![
///     Task::new("A", 2),
///     Task::new("B", 1).with_dependency("A"),
/// ]).unwrap();
/// let builder = ScheduleCpBuilder::new(&tasks, 2);
/// let (built, solution) = builder.solve(&BranchAndBoundSolver::new(), &SolverConfig::default());
/// assert_eq!(solution.objective, Some(3));
/// assert_eq!(builder.decode_solution(&built, &solution).unwrap().len(), 2);
/// ```
pub struct ScheduleCpBuilder<'a> {
    tasks: &'a TaskSet,
    cpu_cores: usize,
}

impl<'a> ScheduleCpBuilder<'a> {
    /// Creates a builder for `cpu_cores` identical cores (at least one).
    pub fn new(tasks: &'a TaskSet, cpu_cores: usize) -> Self {
        Self {
            tasks,
            cpu_cores: cpu_cores.max(1),
        }
    }

    /// Builds the model over the serial horizon.
    ///
    /// Creates:
    /// - An `IntervalVar` per task with start in `[0, horizon - duration]`
    /// - With several cores, an optional `IntervalVar` per task and core,
    ///   tied to the task by an `Alternative` (exactly one core)
    /// - A `Precedence` per dependency edge
    /// - A `NoOverlap` per task pair across two different groups
    /// - A `NoOverlap` per core (the task intervals when there is one core)
    /// - `MinimizeMaxEnd` objective (makespan minimization)
    pub fn build(&self) -> PipelineModel {
        let horizon = self.tasks.horizon();
        log::debug!("Tasks horizon = {horizon}");

        let mut model = CpModel::new("pipeline", horizon);
        let mut task_intervals = Vec::with_capacity(self.tasks.len());
        let mut core_intervals = Vec::new();
        let mut per_core: Vec<Vec<IntervalId>> = vec![Vec::new(); self.cpu_cores];

        for task in self.tasks.tasks() {
            let duration = task.execution_time;
            let interval = model.add_interval(IntervalVar::new(
                format!("interval_{}", task.name),
                0,
                horizon - duration,
                duration,
                horizon,
            ));
            task_intervals.push(interval);

            if self.cpu_cores > 1 {
                let alternatives: Vec<IntervalId> = (0..self.cpu_cores)
                    .map(|core| {
                        let alt = model.add_interval(
                            IntervalVar::new(
                                format!("interval_{}_{core}", task.name),
                                0,
                                horizon - duration,
                                duration,
                                horizon,
                            )
                            .optional(),
                        );
                        per_core[core].push(alt);
                        alt
                    })
                    .collect();
                model.add_alternative(interval, alternatives.clone());
                core_intervals.push(alternatives);
            } else {
                per_core[0].push(interval);
            }
        }

        // Dependencies: a task starts after each of its dependencies ends
        for (task, dependency) in self.tasks.dependency_edges() {
            model.add_precedence(task_intervals[dependency], task_intervals[task]);
        }

        // Tasks of two different groups never overlap
        let groups: Vec<Vec<usize>> = self.tasks.groups().into_values().collect();
        for (i, g1) in groups.iter().enumerate() {
            for g2 in &groups[i + 1..] {
                for &t1 in g1 {
                    for &t2 in g2 {
                        model.add_no_overlap(vec![task_intervals[t1], task_intervals[t2]]);
                    }
                }
            }
        }

        // One task per core at a time
        for intervals in per_core {
            if intervals.len() > 1 {
                model.add_no_overlap(intervals);
            }
        }

        model.set_objective(Objective::MinimizeMaxEnd);

        log::debug!(
            "model built: {} intervals ({} optional), {} constraints",
            model.interval_count(),
            model.optional_count(),
            model.constraint_count()
        );

        PipelineModel {
            model,
            task_intervals,
            core_intervals,
            cpu_cores: self.cpu_cores,
        }
    }

    /// Builds and solves the model.
    pub fn solve<S: CpSolver>(
        &self,
        solver: &S,
        config: &SolverConfig,
    ) -> (PipelineModel, CpSolution) {
        let built = self.build();
        let solution = solver.solve(&built.model, config);
        (built, solution)
    }

    /// Decodes a solution into one scheduled task per task, in task-set order.
    ///
    /// # Errors
    /// [`PlanningError::MissingCoreAssignment`] if a task has no present
    /// interval on any core, [`PlanningError::PlanningIncomplete`] if the
    /// solution carries no assignment.
    pub fn decode_solution(
        &self,
        built: &PipelineModel,
        solution: &CpSolution,
    ) -> PlanningResult<Vec<ScheduledTask>> {
        if !solution.is_solution_found() {
            return Err(PlanningError::PlanningIncomplete(format!(
                "no assignment available (status {:?})",
                solution.status
            )));
        }

        let mut scheduled = Vec::with_capacity(self.tasks.len());
        for (i, task) in self.tasks.tasks().iter().enumerate() {
            let start = solution
                .interval(built.task_intervals[i])
                .map(|s| s.start)
                .ok_or_else(|| PlanningError::MissingCoreAssignment(task.name.clone()))?;

            let core = if built.cpu_cores == 1 {
                Some(0)
            } else {
                built.core_intervals[i].iter().position(|&alt| {
                    solution.interval(alt).is_some_and(|s| s.is_present)
                })
            };
            let core = core.ok_or_else(|| PlanningError::MissingCoreAssignment(task.name.clone()))?;

            log::debug!(
                "Task {} starts at {start} on cpu core {core} (duration={})",
                task.name,
                task.execution_time
            );
            scheduled.push(ScheduledTask::new(task.clone(), core, start));
        }

        Ok(scheduled)
    }
}
