//! Pipeline planner: validation, modeling, solving and extraction.
//!
//! # Algorithm
//!
//! 1. Validate the tasks (unique names, positive durations, bounded total
//!    duration, known dependencies).
//! 2. Build the flexible job-shop model over the serial horizon.
//! 3. Solve it exactly with branch-and-bound.
//! 4. Read back one (task, core, start) record per task.
//!
//! Only a proven-optimal solution is accepted. A proven-infeasible model
//! (typically a dependency cycle) and any other outcome are both errors.

use crate::cp::{BranchAndBoundSolver, CpSolver, ScheduleCpBuilder, SolveStatus, SolverConfig};
use crate::error::{PlanningError, PlanningResult};
use crate::models::{Schedule, ScheduledTask, Task, TaskSet};

/// Computes makespan-optimal schedules for a pipeline.
///
/// # Example
///
/// ```
/// use pipeline_planner::models::Task;
/// use pipeline_planner::scheduler::PipelinePlanner;
///
/// let planner = PipelinePlanner::new(vec![
///     Task::new("A", 4),
///     Task::new("B", 4),
/// ]).unwrap();
///
/// let schedule = planner.plan(2).unwrap();
/// assert_eq!(schedule.iter().map(|s| s.end()).max(), Some(4));
/// ```
#[derive(Debug, Clone)]
pub struct PipelinePlanner<S = BranchAndBoundSolver> {
    tasks: TaskSet,
    solver: S,
    config: SolverConfig,
}

impl PipelinePlanner {
    /// Validates `tasks` and creates a planner with the default solver.
    ///
    /// # Errors
    /// [`PlanningError::DuplicateTaskName`],
    /// [`PlanningError::InvalidExecutionTime`],
    /// [`PlanningError::HorizonOverflow`] or
    /// [`PlanningError::UnknownDependency`].
    pub fn new(tasks: Vec<Task>) -> PlanningResult<Self> {
        Ok(Self::from_task_set(TaskSet::new(tasks)?))
    }

    /// Creates a planner for an already validated task set.
    pub fn from_task_set(tasks: TaskSet) -> Self {
        Self {
            tasks,
            solver: BranchAndBoundSolver::new(),
            config: SolverConfig::default(),
        }
    }
}

impl<S: CpSolver> PipelinePlanner<S> {
    /// Replaces the solver.
    pub fn with_solver<T: CpSolver>(self, solver: T) -> PipelinePlanner<T> {
        PipelinePlanner {
            tasks: self.tasks,
            solver,
            config: self.config,
        }
    }

    /// Sets solver limits.
    pub fn with_solver_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    /// The validated tasks.
    pub fn tasks(&self) -> &TaskSet {
        &self.tasks
    }

    /// Plans the pipeline on `cpu_cores` identical cores.
    ///
    /// Returns one scheduled task per input task, in input order. Zero cores
    /// is treated as one.
    ///
    /// # Errors
    /// - [`PlanningError::PlanningInfeasible`] if no schedule exists
    /// - [`PlanningError::PlanningIncomplete`] if the solver stopped without
    ///   a proof of optimality
    /// - [`PlanningError::MissingCoreAssignment`] if the solution is corrupt
    pub fn plan(&self, cpu_cores: usize) -> PlanningResult<Vec<ScheduledTask>> {
        let builder = ScheduleCpBuilder::new(&self.tasks, cpu_cores);
        let (built, solution) = builder.solve(&self.solver, &self.config);

        match solution.status {
            SolveStatus::Optimal => {}
            SolveStatus::Infeasible => return Err(PlanningError::PlanningInfeasible),
            SolveStatus::Feasible | SolveStatus::Unknown => {
                let reason = solution
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("solver status {:?}", solution.status));
                log::warn!("solver stopped without proof of optimality: {reason}");
                return Err(PlanningError::PlanningIncomplete(reason));
            }
        }

        let scheduled = builder.decode_solution(&built, &solution)?;

        log::debug!(
            "Found optimal solution in {:.3} second(s) ({} nodes).",
            solution.stats.elapsed.as_secs_f64(),
            solution.stats.nodes
        );

        Ok(scheduled)
    }

    /// Plans the pipeline and wraps the result in a [`Schedule`].
    pub fn plan_schedule(&self, cpu_cores: usize) -> PlanningResult<Schedule> {
        self.plan(cpu_cores).map(Schedule::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{CpModel, CpSolution};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn makespan(scheduled: &[ScheduledTask]) -> i64 {
        scheduled.iter().map(ScheduledTask::end).max().unwrap_or(0)
    }

    fn plan_makespan(planner: &PipelinePlanner, cores: usize) -> i64 {
        makespan(&planner.plan(cores).unwrap())
    }

    /// Checks coverage, core bounds, core capacity, precedence and group
    /// exclusion.
    fn assert_valid(tasks: &[Task], scheduled: &[ScheduledTask], cores: usize) {
        assert_eq!(scheduled.len(), tasks.len());
        for (task, s) in tasks.iter().zip(scheduled) {
            assert_eq!(&s.task, task);
            assert!(s.core < cores);
            assert!(s.start >= 0);
        }
        for (i, a) in scheduled.iter().enumerate() {
            for dep in &a.task.dependencies {
                let d = scheduled.iter().find(|s| &s.task.name == dep).unwrap();
                assert!(a.start >= d.end(), "{} starts before {} ends", a.task.name, dep);
            }
            for b in &scheduled[i + 1..] {
                if a.core == b.core {
                    assert!(!a.overlaps(b), "{} and {} share a core", a.task.name, b.task.name);
                }
                if a.task.has_group() && b.task.has_group() && a.task.group != b.task.group {
                    assert!(!a.overlaps(b), "{} and {} overlap", a.task.name, b.task.name);
                }
            }
        }
    }

    fn tiny_tasks() -> Vec<Task> {
        vec![
            Task::new("A", 2).with_group("feature"),
            Task::new("B", 1).with_group("feature"),
            Task::new("C", 2).with_group("model").with_dependency("B"),
        ]
    }

    #[test]
    fn test_tiny_plan_with_one_core() {
        let tasks = tiny_tasks();
        let scheduled = PipelinePlanner::new(tasks.clone()).unwrap().plan(1).unwrap();

        assert_eq!(scheduled[0], ScheduledTask::new(tasks[0].clone(), 0, 1));
        assert_eq!(scheduled[1], ScheduledTask::new(tasks[1].clone(), 0, 0));
        assert_eq!(scheduled[2], ScheduledTask::new(tasks[2].clone(), 0, 3));
        assert_eq!(makespan(&scheduled), 5);
    }

    #[test]
    fn test_tiny_plan_with_two_cores() {
        let tasks = tiny_tasks();
        let scheduled = PipelinePlanner::new(tasks.clone()).unwrap().plan(2).unwrap();

        assert_valid(&tasks, &scheduled, 2);
        assert_eq!(scheduled[0].start, 0);
        assert_eq!(scheduled[1].start, 0);
        assert_ne!(scheduled[0].core, scheduled[1].core);
        // C waits for A: feature and model never overlap
        assert_eq!(scheduled[2].start, 2);
        assert_eq!(makespan(&scheduled), 4);
    }

    #[test]
    fn test_tiny_plan_without_groups() {
        let tasks = vec![
            Task::new("A", 2),
            Task::new("B", 1),
            Task::new("C", 2).with_dependency("B"),
        ];
        let planner = PipelinePlanner::new(tasks.clone()).unwrap();
        let scheduled = planner.plan(2).unwrap();

        assert_valid(&tasks, &scheduled, 2);
        assert_eq!(scheduled[2].start, 1);
        assert_eq!(makespan(&scheduled), 3);
        assert_eq!(plan_makespan(&planner, 1), 5);
    }

    fn small_tasks(c_time: i64, e_deps: &[&str]) -> Vec<Task> {
        vec![
            Task::new("A", 48).with_group("raw"),
            Task::new("A1", 5).with_group("raw").with_dependency("A"),
            Task::new("B", 26).with_group("feature").with_dependency("A"),
            Task::new("C", c_time).with_group("feature").with_dependency("B"),
            Task::new("D", 4).with_group("raw"),
            Task::new("E", 20)
                .with_group("feature")
                .with_dependencies(e_deps.iter().copied()),
            Task::new("F", 24).with_group("model").with_dependency("C"),
            Task::new("G", 40)
                .with_group("model")
                .with_dependencies(["B", "F"]),
            Task::new("H", 29).with_group("feature"),
            Task::new("Z", 58).with_group("model").with_dependency("H"),
        ]
    }

    #[test]
    fn test_small_plan_with_two_and_three_cores() {
        let tasks = small_tasks(55, &["C", "D"]);
        let planner = PipelinePlanner::new(tasks.clone()).unwrap();

        let two = planner.plan(2).unwrap();
        assert_valid(&tasks, &two, 2);
        assert_eq!(makespan(&two), 218);

        // A third core does not help: dependencies and groups dominate
        let three = planner.plan(3).unwrap();
        assert_valid(&tasks, &three, 3);
        assert_eq!(makespan(&three), 218);
    }

    #[test]
    fn test_modified_small_plan_with_two_and_three_cores() {
        let tasks = small_tasks(10, &["D"]);
        let planner = PipelinePlanner::new(tasks).unwrap();

        assert_eq!(plan_makespan(&planner, 2), 163);
        assert_eq!(plan_makespan(&planner, 3), 153);
    }

    #[test]
    fn test_infeasible_due_to_circular_dependency() {
        let planner = PipelinePlanner::new(vec![
            Task::new("A", 2).with_group("feature").with_dependency("B"),
            Task::new("B", 2).with_group("feature").with_dependency("C"),
            Task::new("C", 2).with_group("feature").with_dependency("A"),
        ])
        .unwrap();

        assert_eq!(planner.plan(2).unwrap_err(), PlanningError::PlanningInfeasible);
        assert_eq!(planner.plan(1).unwrap_err(), PlanningError::PlanningInfeasible);
    }

    #[test]
    fn test_tasks_without_group_can_run_in_parallel_with_tasks_from_groups() {
        let planner = PipelinePlanner::new(vec![
            Task::new("A", 4).with_group("group"),
            Task::new("B", 4),
        ])
        .unwrap();

        assert_eq!(plan_makespan(&planner, 1), 8);
        assert_eq!(plan_makespan(&planner, 2), 4);
    }

    #[test]
    fn test_tasks_from_group_cannot_run_in_parallel_with_tasks_from_other_groups() {
        let planner = PipelinePlanner::new(vec![
            Task::new("A", 4).with_group("group1"),
            Task::new("B", 4).with_group("group2"),
        ])
        .unwrap();

        assert_eq!(plan_makespan(&planner, 1), 8);
        assert_eq!(plan_makespan(&planner, 2), 8);
    }

    #[test]
    fn test_scale_linearly_when_no_dependencies() {
        let tasks = ["A", "B", "C", "D", "E", "F", "G", "H"]
            .iter()
            .map(|n| Task::new(*n, 4))
            .collect();
        let planner = PipelinePlanner::new(tasks).unwrap();

        assert_eq!(plan_makespan(&planner, 1), 32);
        assert_eq!(plan_makespan(&planner, 2), 16);
        assert_eq!(plan_makespan(&planner, 4), 8);
        assert_eq!(plan_makespan(&planner, 8), 4);
    }

    #[test]
    fn test_cannot_scale_due_to_explicit_dependencies() {
        let names = ["A", "B", "C", "D", "E", "F", "G", "H"];
        let tasks = names
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let task = Task::new(*n, 4);
                if i == 0 {
                    task
                } else {
                    task.with_dependency(names[i - 1])
                }
            })
            .collect();
        let planner = PipelinePlanner::new(tasks).unwrap();

        for cores in [1, 2, 4, 8] {
            assert_eq!(plan_makespan(&planner, cores), 32);
        }
    }

    fn independent_tasks(n: usize) -> Vec<Task> {
        (0..n).map(|i| Task::new(format!("T{i}"), 1)).collect()
    }

    #[test]
    fn test_many_independent_tasks_on_one_core() {
        // Runs with a stack well below the main thread's default
        let handle = std::thread::Builder::new()
            .stack_size(1 << 20)
            .spawn(|| {
                let planner = PipelinePlanner::new(independent_tasks(400)).unwrap();
                planner.plan(1).map(|scheduled| makespan(&scheduled))
            })
            .unwrap();

        assert_eq!(handle.join().unwrap(), Ok(400));
    }

    #[test]
    fn test_many_independent_tasks_on_two_cores() {
        let tasks = independent_tasks(500);
        let scheduled = PipelinePlanner::new(tasks.clone()).unwrap().plan(2).unwrap();

        assert_valid(&tasks, &scheduled, 2);
        assert_eq!(makespan(&scheduled), 250);
    }

    #[test]
    fn test_same_group_runs_concurrently() {
        let planner = PipelinePlanner::new(vec![
            Task::new("A", 3).with_group("g"),
            Task::new("B", 3).with_group("g"),
        ])
        .unwrap();
        assert_eq!(plan_makespan(&planner, 2), 3);
    }

    #[test]
    fn test_validation_errors_surface() {
        assert_eq!(
            PipelinePlanner::new(vec![Task::new("A", 1), Task::new("A", 2)]).unwrap_err(),
            PlanningError::DuplicateTaskName("A".into())
        );
        assert!(matches!(
            PipelinePlanner::new(vec![Task::new("A", 1).with_dependency("Q")]),
            Err(PlanningError::UnknownDependency { .. })
        ));
    }

    #[test]
    fn test_oversized_durations_are_rejected() {
        assert_eq!(
            PipelinePlanner::new(vec![Task::new("A", i64::MAX), Task::new("B", 1)]).unwrap_err(),
            PlanningError::HorizonOverflow {
                limit: crate::validation::MAX_HORIZON
            }
        );
    }

    #[test]
    fn test_zero_duration_is_rejected_before_modeling() {
        assert_eq!(
            PipelinePlanner::new(vec![Task::new("A", 0)]).unwrap_err(),
            PlanningError::InvalidExecutionTime {
                task: "A".into(),
                value: "0".into(),
            }
        );
    }

    #[test]
    fn test_large_durations_within_limit() {
        let planner = PipelinePlanner::new(vec![
            Task::new("A", 1 << 40).with_group("x"),
            Task::new("B", 1 << 40).with_group("y"),
        ])
        .unwrap();
        assert_eq!(plan_makespan(&planner, 2), 1 << 41);
    }

    #[test]
    fn test_node_limit_is_incomplete() {
        let planner = PipelinePlanner::new(small_tasks(55, &["C", "D"]))
            .unwrap()
            .with_solver_config(SolverConfig::default().with_node_limit(1));

        assert!(matches!(
            planner.plan(2),
            Err(PlanningError::PlanningIncomplete(_))
        ));
    }

    struct GiveUp;

    impl CpSolver for GiveUp {
        fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
            let mut solution =
                BranchAndBoundSolver::new().solve(model, config);
            solution.status = SolveStatus::Feasible;
            solution.message = None;
            solution
        }
    }

    #[test]
    fn test_feasible_but_unproven_is_rejected() {
        let planner = PipelinePlanner::new(tiny_tasks()).unwrap().with_solver(GiveUp);
        let err = planner.plan(2).unwrap_err();
        assert!(matches!(err, PlanningError::PlanningIncomplete(ref m) if m.contains("Feasible")));
    }

    #[test]
    fn test_plan_schedule() {
        let planner = PipelinePlanner::new(tiny_tasks()).unwrap();
        let schedule = planner.plan_schedule(2).unwrap();
        assert_eq!(schedule.makespan(), 4);
        assert_eq!(schedule.len(), 3);
    }

    /// Smallest makespan over every start-time vector, or `None` if none is
    /// feasible. Core capacity is checked as "at most `cores` tasks at once",
    /// which is equivalent for identical cores.
    fn brute_force(tasks: &[Task], cores: usize) -> Option<i64> {
        let horizon: i64 = tasks.iter().map(|t| t.execution_time).sum();
        let n = tasks.len();
        let mut starts = vec![0i64; n];
        let mut best: Option<i64> = None;

        loop {
            if feasible(tasks, &starts, cores, horizon) {
                let m = (0..n)
                    .map(|i| starts[i] + tasks[i].execution_time)
                    .max()
                    .unwrap_or(0);
                best = Some(best.map_or(m, |b: i64| b.min(m)));
            }
            // Odometer increment over [0, horizon - duration]
            let mut i = 0;
            loop {
                if i == n {
                    return best;
                }
                if starts[i] < horizon - tasks[i].execution_time {
                    starts[i] += 1;
                    break;
                }
                starts[i] = 0;
                i += 1;
            }
        }
    }

    fn feasible(tasks: &[Task], starts: &[i64], cores: usize, horizon: i64) -> bool {
        let end = |i: usize| starts[i] + tasks[i].execution_time;
        for (i, task) in tasks.iter().enumerate() {
            for dep in &task.dependencies {
                let d = tasks.iter().position(|t| &t.name == dep).unwrap();
                if starts[i] < end(d) {
                    return false;
                }
            }
            for j in i + 1..tasks.len() {
                let other = &tasks[j];
                if task.has_group()
                    && other.has_group()
                    && task.group != other.group
                    && starts[i] < end(j)
                    && starts[j] < end(i)
                {
                    return false;
                }
            }
        }
        (0..horizon).all(|t| {
            (0..tasks.len())
                .filter(|&i| starts[i] <= t && t < end(i))
                .count()
                <= cores
        })
    }

    fn random_tasks(rng: &mut StdRng) -> Vec<Task> {
        let n = rng.random_range(1..=4);
        let groups = ["", "a", "b"];
        (0..n)
            .map(|i| {
                let mut task = Task::new(format!("T{i}"), rng.random_range(1..=3))
                    .with_group(groups[rng.random_range(0..groups.len())]);
                for d in 0..i {
                    if rng.random_bool(0.3) {
                        task = task.with_dependency(format!("T{d}"));
                    }
                }
                task
            })
            .collect()
    }

    #[test]
    fn test_matches_brute_force_on_random_instances() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..60 {
            let tasks = random_tasks(&mut rng);
            let cores = rng.random_range(1..=3);
            let planner = PipelinePlanner::new(tasks.clone()).unwrap();

            let scheduled = planner.plan(cores).unwrap();
            assert_valid(&tasks, &scheduled, cores);
            assert_eq!(
                Some(makespan(&scheduled)),
                brute_force(&tasks, cores),
                "suboptimal plan for {tasks:?} on {cores} cores"
            );
        }
    }
}
