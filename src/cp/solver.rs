//! Exact branch-and-bound solver for [`CpModel`]s.
//!
//! # Algorithm
//!
//! The model is compiled into jobs (mandatory intervals) and unary
//! resources (one per `NoOverlap` constraint). The search then sweeps time
//! forward over event points:
//!
//! 1. At event time `t`, collect the jobs whose predecessors have all ended.
//! 2. Decide, job by job in priority order, whether it starts at `t` and on
//!    which alternative. Interchangeable resources are tried once.
//! 3. Advance `t` to the next end event and repeat.
//!
//! Open decisions live on an explicit stack of frames, so search depth is
//! not bounded by the thread's call stack.
//!
//! Every job of a semi-active schedule starts at time 0 or at the end of
//! another job, so the sweep reaches an optimal schedule. Nodes whose lower
//! bound cannot beat the incumbent are pruned, and the search stops as soon
//! as the incumbent meets the root bound.
//!
//! # Bounds
//! - Critical path: earliest start plus longest remaining chain.
//! - Unary resource: remaining mandatory work after the resource frees up.
//! - Energy: remaining work over a pool of interchangeable resources.
//!
//! # Reference
//! - Baptiste et al. (2001), "Constraint-Based Scheduling", Ch. 4
//! - Demeulemeester & Herroelen (1992), "A Branch-and-Bound Procedure for
//!   the Multiple Resource-Constrained Project Scheduling Problem"

use std::cmp::Reverse;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::model::{CpConstraint, CpModel, IntervalId, Objective};

/// Solver limits.
///
/// With no limits set the solver runs until it proves optimality or
/// infeasibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Wall-clock budget.
    pub time_limit: Option<Duration>,
    /// Maximum number of search nodes.
    pub node_limit: Option<u64>,
    /// Maximum number of remembered search states.
    pub max_memo_states: usize,
}

impl SolverConfig {
    /// Sets the wall-clock budget.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Sets the node budget.
    pub fn with_node_limit(mut self, limit: u64) -> Self {
        self.node_limit = Some(limit);
        self
    }

    /// Sets the memo capacity. Zero disables memoization.
    pub fn with_max_memo_states(mut self, states: usize) -> Self {
        self.max_memo_states = states;
        self
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit: None,
            node_limit: None,
            max_memo_states: 1 << 20,
        }
    }
}

/// Outcome of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// A solution was found and proven optimal.
    Optimal,
    /// A solution was found but a limit stopped the proof.
    Feasible,
    /// No solution exists.
    Infeasible,
    /// A limit was reached before any solution, or the model is unsupported.
    Unknown,
}

/// Value of one interval variable in a solution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalSolution {
    pub start: i64,
    pub end: i64,
    pub is_present: bool,
}

/// Search statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolverStats {
    /// Search nodes visited.
    pub nodes: u64,
    /// States skipped because they were seen before.
    pub memo_hits: u64,
    /// Lower bound at the root.
    pub root_bound: i64,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

/// Solver result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpSolution {
    /// Outcome.
    pub status: SolveStatus,
    /// Objective value of the returned assignment.
    pub objective: Option<i64>,
    /// Values indexed by [`IntervalId`].
    pub intervals: Vec<IntervalSolution>,
    /// Search statistics.
    pub stats: SolverStats,
    /// Why the model could not be solved, for `Unknown` results.
    pub message: Option<String>,
}

impl CpSolution {
    fn without_assignment(status: SolveStatus, model: &CpModel) -> Self {
        Self {
            status,
            objective: None,
            intervals: vec![IntervalSolution::default(); model.interval_count()],
            stats: SolverStats::default(),
            message: None,
        }
    }

    /// Whether an assignment is available.
    pub fn is_solution_found(&self) -> bool {
        matches!(self.status, SolveStatus::Optimal | SolveStatus::Feasible)
    }

    /// Whether the assignment is proven optimal.
    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }

    /// Value of an interval.
    pub fn interval(&self, id: IntervalId) -> Option<&IntervalSolution> {
        self.intervals.get(id.0)
    }
}

/// A solver for [`CpModel`]s.
pub trait CpSolver {
    /// Solves `model` within the limits of `config`.
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution;
}

/// Depth-first branch-and-bound over event times.
///
/// Deterministic: ready jobs are tried longest remaining chain first, then
/// in interval order, and alternatives in declaration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct BranchAndBoundSolver;

impl BranchAndBoundSolver {
    /// Creates a solver.
    pub fn new() -> Self {
        Self
    }
}

impl CpSolver for BranchAndBoundSolver {
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
        let started_at = Instant::now();

        let problem = match Problem::compile(model) {
            Ok(Compiled::Ready(problem)) => problem,
            Ok(Compiled::Infeasible(reason)) => {
                log::debug!("model '{}' infeasible before search: {reason}", model.name);
                let mut solution = CpSolution::without_assignment(SolveStatus::Infeasible, model);
                solution.stats.elapsed = started_at.elapsed();
                return solution;
            }
            Err(reason) => {
                log::error!("model '{}' is not supported: {reason}", model.name);
                let mut solution = CpSolution::without_assignment(SolveStatus::Unknown, model);
                solution.message = Some(reason);
                return solution;
            }
        };

        log::debug!(
            "compiled model '{}': {} jobs, {} resources, {} pools",
            model.name,
            problem.jobs.len(),
            problem.resource_count,
            problem.pools.len()
        );

        let mut search = Search::new(&problem, config, started_at);
        search.run();

        let status = match (search.best.is_some(), search.interrupted) {
            (true, false) => SolveStatus::Optimal,
            (true, true) => SolveStatus::Feasible,
            (false, false) => SolveStatus::Infeasible,
            (false, true) => SolveStatus::Unknown,
        };

        let mut solution = CpSolution::without_assignment(status, model);
        if let Some(best) = &search.best {
            solution.objective = Some(best.makespan);
            for (j, job) in problem.jobs.iter().enumerate() {
                let start = best.starts[j];
                let value = IntervalSolution {
                    start,
                    end: start + job.duration,
                    is_present: true,
                };
                solution.intervals[job.interval] = value;
                if let Some(o) = best.choices[j] {
                    solution.intervals[job.options[o].interval] = value;
                }
            }
        }
        solution.stats = SolverStats {
            nodes: search.nodes,
            memo_hits: search.memo_hits,
            root_bound: search.root_bound,
            elapsed: started_at.elapsed(),
        };
        if search.interrupted {
            solution.message = Some(format!(
                "search limit reached after {} nodes",
                search.nodes
            ));
        }

        log::debug!(
            "model '{}' solved: {:?}, objective {:?}, {} nodes, {} memo hits, root bound {}",
            model.name,
            solution.status,
            solution.objective,
            solution.stats.nodes,
            solution.stats.memo_hits,
            solution.stats.root_bound
        );

        solution
    }
}

/// One way of running a job: an optional interval and its resources.
#[derive(Debug, Clone)]
struct Choice {
    interval: usize,
    resources: Vec<usize>,
    /// Choices sharing a class are interchangeable.
    class: usize,
}

/// A mandatory interval with everything the search needs about it.
#[derive(Debug, Clone)]
struct Job {
    interval: usize,
    duration: i64,
    start_min: i64,
    latest_start: i64,
    preds: Vec<usize>,
    resources: Vec<usize>,
    options: Vec<Choice>,
}

/// Resources that are interchangeable, with the jobs that must use one.
#[derive(Debug, Clone)]
struct Pool {
    resources: Vec<usize>,
    jobs: Vec<usize>,
}

#[derive(Debug)]
struct Problem {
    jobs: Vec<Job>,
    resource_count: usize,
    pools: Vec<Pool>,
    topo: Vec<usize>,
    tails: Vec<i64>,
    priority: Vec<usize>,
}

enum Compiled {
    Ready(Problem),
    Infeasible(String),
}

impl Problem {
    fn compile(model: &CpModel) -> Result<Compiled, String> {
        let Objective::MinimizeMaxEnd = model.objective;
        let count = model.interval_count();

        let mut job_of: Vec<Option<usize>> = vec![None; count];
        let mut jobs = Vec::new();
        for (i, iv) in model.intervals.iter().enumerate() {
            if iv.duration < 1 {
                return Err(format!("interval '{}' has a non-positive duration", iv.name));
            }
            if !iv.optional {
                job_of[i] = Some(jobs.len());
                jobs.push(Job {
                    interval: i,
                    duration: iv.duration,
                    start_min: iv.start_min.max(0),
                    latest_start: iv.latest_start(),
                    preds: Vec::new(),
                    resources: Vec::new(),
                    options: Vec::new(),
                });
            }
        }

        let check = |id: IntervalId| -> Result<usize, String> {
            if id.0 < count {
                Ok(id.0)
            } else {
                Err(format!("unknown interval {}", id.0))
            }
        };

        // Alternatives: optional interval -> owning job
        let mut owner: Vec<Option<usize>> = vec![None; count];
        for constraint in &model.constraints {
            if let CpConstraint::Alternative {
                master,
                alternatives,
            } = constraint
            {
                let j = job_of[check(*master)?]
                    .ok_or_else(|| format!("alternative master {} is optional", master.0))?;
                if alternatives.is_empty() {
                    return Ok(Compiled::Infeasible(format!(
                        "interval '{}' has no alternative",
                        model.intervals[master.0].name
                    )));
                }
                if !jobs[j].options.is_empty() {
                    return Err(format!(
                        "interval '{}' has several alternative constraints",
                        model.intervals[master.0].name
                    ));
                }
                for alt in alternatives {
                    let a = check(*alt)?;
                    let iv = &model.intervals[a];
                    if !iv.optional || owner[a].is_some() {
                        return Err(format!(
                            "interval '{}' cannot serve as an alternative",
                            iv.name
                        ));
                    }
                    if iv.duration != jobs[j].duration {
                        return Err(format!(
                            "alternative '{}' differs in duration from its master",
                            iv.name
                        ));
                    }
                    if iv.start_min > jobs[j].start_min || iv.latest_start() < jobs[j].latest_start
                    {
                        return Err(format!(
                            "alternative '{}' has a narrower domain than its master",
                            iv.name
                        ));
                    }
                    owner[a] = Some(j);
                    jobs[j].options.push(Choice {
                        interval: a,
                        resources: Vec::new(),
                        class: 0,
                    });
                }
            }
        }

        // Unary resources and precedences
        let mut resource_count = 0;
        let mut choice_resources: Vec<Vec<usize>> = vec![Vec::new(); count];
        let mut members: Vec<Vec<usize>> = Vec::new();
        for constraint in &model.constraints {
            match constraint {
                CpConstraint::Precedence { before, after } => {
                    let b = job_of[check(*before)?]
                        .ok_or_else(|| "precedence on an optional interval".to_string())?;
                    let a = job_of[check(*after)?]
                        .ok_or_else(|| "precedence on an optional interval".to_string())?;
                    if !jobs[a].preds.contains(&b) {
                        jobs[a].preds.push(b);
                    }
                }
                CpConstraint::NoOverlap(list) => {
                    let mut ids = Vec::with_capacity(list.len());
                    for id in list {
                        let i = check(*id)?;
                        if !ids.contains(&i) && (job_of[i].is_some() || owner[i].is_some()) {
                            ids.push(i);
                        }
                    }
                    if ids.len() < 2 {
                        continue;
                    }
                    let r = resource_count;
                    resource_count += 1;
                    let mut users = Vec::with_capacity(ids.len());
                    for i in ids {
                        if let Some(j) = job_of[i] {
                            jobs[j].resources.push(r);
                            users.push(j);
                        } else if let Some(j) = owner[i] {
                            choice_resources[i].push(r);
                            users.push(j);
                        }
                    }
                    users.sort_unstable();
                    members.push(users);
                }
                CpConstraint::Alternative { .. } => {}
            }
        }

        for job in &mut jobs {
            for choice in &mut job.options {
                choice.resources = std::mem::take(&mut choice_resources[choice.interval]);
            }
        }

        // A resource is exclusive when each of its users reaches it through
        // a single-resource alternative. Exclusive resources with the same
        // users are interchangeable.
        let mut exclusive = vec![true; resource_count];
        for job in &jobs {
            for &r in &job.resources {
                exclusive[r] = false;
            }
            for choice in &job.options {
                if choice.resources.len() != 1 {
                    for &r in &choice.resources {
                        exclusive[r] = false;
                    }
                }
            }
        }
        let mut class_of_resource = vec![0usize; resource_count];
        let mut classes: HashMap<&[usize], usize> = HashMap::new();
        let mut class_count = 0;
        for r in 0..resource_count {
            class_of_resource[r] = if exclusive[r] {
                *classes.entry(members[r].as_slice()).or_insert_with(|| {
                    class_count += 1;
                    class_count - 1
                })
            } else {
                class_count += 1;
                class_count - 1
            };
        }
        for job in &mut jobs {
            for choice in &mut job.options {
                choice.class = match choice.resources.as_slice() {
                    [r] => class_of_resource[*r],
                    _ => {
                        class_count += 1;
                        class_count - 1
                    }
                };
            }
        }

        let mut pools = Vec::new();
        let mut by_class: HashMap<usize, Vec<usize>> = HashMap::new();
        for r in 0..resource_count {
            if exclusive[r] {
                by_class.entry(class_of_resource[r]).or_default().push(r);
            }
        }
        let mut pool_classes: Vec<_> = by_class.into_iter().collect();
        pool_classes.sort_unstable();
        for (class, resources) in pool_classes {
            let pool_jobs: Vec<usize> = (0..jobs.len())
                .filter(|&j| {
                    !jobs[j].options.is_empty()
                        && jobs[j].options.iter().all(|c| c.class == class)
                })
                .collect();
            if !pool_jobs.is_empty() {
                pools.push(Pool {
                    resources,
                    jobs: pool_jobs,
                });
            }
        }

        // Topological order (Kahn)
        let n = jobs.len();
        let mut succs: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut indegree = vec![0usize; n];
        for (j, job) in jobs.iter().enumerate() {
            for &p in &job.preds {
                succs[p].push(j);
                indegree[j] += 1;
            }
        }
        let mut topo: Vec<usize> = (0..n).filter(|&j| indegree[j] == 0).collect();
        let mut head = 0;
        while head < topo.len() {
            let j = topo[head];
            head += 1;
            for &s in &succs[j] {
                indegree[s] -= 1;
                if indegree[s] == 0 {
                    topo.push(s);
                }
            }
        }
        if topo.len() < n {
            return Ok(Compiled::Infeasible("precedence graph has a cycle".into()));
        }

        let mut tails = vec![0i64; n];
        for &j in topo.iter().rev() {
            let longest_succ = succs[j].iter().map(|&s| tails[s]).max().unwrap_or(0);
            tails[j] = jobs[j].duration + longest_succ;
        }

        let mut priority: Vec<usize> = (0..n).collect();
        priority.sort_by_key(|&j| (Reverse(tails[j]), j));

        Ok(Compiled::Ready(Problem {
            jobs,
            resource_count,
            pools,
            topo,
            tails,
            priority,
        }))
    }
}

/// Best assignment found so far.
struct Incumbent {
    makespan: i64,
    starts: Vec<i64>,
    choices: Vec<Option<usize>>,
}

type StateKey = (i64, Vec<u64>, Vec<(usize, i64, usize)>);

/// An open decision: how job `ready[k]` starts at `t`, if at all.
struct Frame {
    t: i64,
    ready: Rc<[usize]>,
    k: usize,
    /// Placements to try, followed by the "not now" child.
    options: Vec<Option<usize>>,
    next: usize,
    /// Placement of the child being explored, undone on return.
    placed: Option<(usize, Option<usize>, Vec<i64>)>,
}

const NO_BOUND: i64 = i64::MAX;
const TIME_CHECK_INTERVAL: u64 = 256;

struct Search<'a> {
    problem: &'a Problem,
    config: &'a SolverConfig,
    started_at: Instant,
    start: Vec<Option<i64>>,
    choice: Vec<Option<usize>>,
    busy_until: Vec<i64>,
    started: usize,
    best: Option<Incumbent>,
    root_bound: i64,
    nodes: u64,
    memo: FxHashSet<StateKey>,
    memo_hits: u64,
    interrupted: bool,
    proven: bool,
    est: Vec<i64>,
}

impl<'a> Search<'a> {
    fn new(problem: &'a Problem, config: &'a SolverConfig, started_at: Instant) -> Self {
        let n = problem.jobs.len();
        Self {
            problem,
            config,
            started_at,
            start: vec![None; n],
            choice: vec![None; n],
            busy_until: vec![0; problem.resource_count],
            started: 0,
            best: None,
            root_bound: 0,
            nodes: 0,
            memo: FxHashSet::default(),
            memo_hits: 0,
            interrupted: false,
            proven: false,
            est: vec![0; n],
        }
    }

    fn run(&mut self) {
        self.root_bound = self.lower_bound(0);
        if self.root_bound == NO_BOUND {
            return;
        }

        let mut stack: Vec<Frame> = Vec::new();
        let ready: Rc<[usize]> = self.ready_at(0).into();
        self.enter(&mut stack, 0, ready, 0);

        while let Some(frame) = stack.last_mut() {
            if self.halted() {
                return;
            }
            if let Some((j, choice, saved)) = frame.placed.take() {
                self.unplace(j, choice, &saved);
            }

            let (t, k, ready) = (frame.t, frame.k, Rc::clone(&frame.ready));
            if frame.next < frame.options.len() {
                let choice = frame.options[frame.next];
                frame.next += 1;
                let j = ready[k];
                let saved = self.place(j, t, choice);
                frame.placed = Some((j, choice, saved));
                self.enter(&mut stack, t, ready, k + 1);
            } else if frame.next == frame.options.len() {
                // Last child: leave the job for a later event
                frame.next += 1;
                self.enter(&mut stack, t, ready, k + 1);
            } else {
                stack.pop();
            }
        }
    }

    fn halted(&self) -> bool {
        self.interrupted || self.proven
    }

    fn limit_reached(&self) -> bool {
        if let Some(limit) = self.config.node_limit {
            if self.nodes > limit {
                return true;
            }
        }
        if let Some(limit) = self.config.time_limit {
            if self.nodes % TIME_CHECK_INTERVAL == 0 && self.started_at.elapsed() >= limit {
                return true;
            }
        }
        false
    }

    /// Opens the node deciding `ready[k..]` at time `t`.
    ///
    /// Jobs that cannot start at `t` are passed over in place, and an
    /// exhausted ready list moves on to the next event. A frame is pushed
    /// only when the node has a real choice to make.
    fn enter(&mut self, stack: &mut Vec<Frame>, mut t: i64, mut ready: Rc<[usize]>, mut k: usize) {
        let mut changed = true;
        loop {
            if self.halted() {
                return;
            }
            self.nodes += 1;
            if self.limit_reached() {
                self.interrupted = true;
                return;
            }
            if changed {
                let bound = self.lower_bound(t);
                if bound == NO_BOUND || self.best.as_ref().is_some_and(|b| bound >= b.makespan) {
                    return;
                }
            }

            if k == ready.len() {
                if self.started == self.problem.jobs.len() {
                    self.record();
                    return;
                }
                let Some(next) = self.next_event(t) else {
                    return;
                };
                if !self.remember(next) {
                    self.memo_hits += 1;
                    return;
                }
                ready = self.ready_at(next).into();
                t = next;
                k = 0;
                changed = true;
                continue;
            }

            let options = self.placements(ready[k], t);
            if options.is_empty() {
                // Same state, same bound
                k += 1;
                changed = false;
                continue;
            }
            stack.push(Frame {
                t,
                ready,
                k,
                options,
                next: 0,
                placed: None,
            });
            return;
        }
    }

    /// Earliest end or release strictly after `t`.
    fn next_event(&self, t: i64) -> Option<i64> {
        self.problem
            .jobs
            .iter()
            .enumerate()
            .filter_map(|(j, job)| match self.start[j] {
                Some(s) if s + job.duration > t => Some(s + job.duration),
                None if job.start_min > t => Some(job.start_min),
                _ => None,
            })
            .min()
    }

    fn record(&mut self) {
        let makespan = self
            .problem
            .jobs
            .iter()
            .enumerate()
            .filter_map(|(j, job)| self.start[j].map(|s| s + job.duration))
            .max()
            .unwrap_or(0);
        if self.best.as_ref().map_or(true, |b| makespan < b.makespan) {
            log::trace!("incumbent improved to {makespan} after {} nodes", self.nodes);
            self.best = Some(Incumbent {
                makespan,
                starts: self.start.iter().map(|s| s.unwrap_or(0)).collect(),
                choices: self.choice.clone(),
            });
            if makespan <= self.root_bound {
                self.proven = true;
            }
        }
    }

    /// Returns false when the state at `t` was already explored.
    fn remember(&mut self, t: i64) -> bool {
        if self.config.max_memo_states == 0 {
            return true;
        }
        let n = self.problem.jobs.len();
        let mut words = vec![0u64; n.div_ceil(64)];
        let mut running = Vec::new();
        for j in 0..n {
            if let Some(s) = self.start[j] {
                words[j / 64] |= 1 << (j % 64);
                let end = s + self.problem.jobs[j].duration;
                if end > t {
                    running.push((j, end, self.choice[j].unwrap_or(usize::MAX)));
                }
            }
        }
        let key = (t, words, running);
        if self.memo.contains(&key) {
            return false;
        }
        if self.memo.len() < self.config.max_memo_states {
            self.memo.insert(key);
        }
        true
    }

    /// Unstarted jobs whose predecessors have ended by `t`, in priority order.
    fn ready_at(&self, t: i64) -> Vec<usize> {
        let jobs = &self.problem.jobs;
        self.problem
            .priority
            .iter()
            .copied()
            .filter(|&j| {
                self.start[j].is_none()
                    && jobs[j].start_min <= t
                    && t <= jobs[j].latest_start
                    && jobs[j].preds.iter().all(|&p| {
                        self.start[p].is_some_and(|s| s + jobs[p].duration <= t)
                    })
            })
            .collect()
    }

    /// Ways to start job `j` at `t`; empty when it cannot start.
    fn placements(&self, j: usize, t: i64) -> Vec<Option<usize>> {
        let job = &self.problem.jobs[j];
        if t < job.start_min || t > job.latest_start {
            return Vec::new();
        }
        if job.resources.iter().any(|&r| self.busy_until[r] > t) {
            return Vec::new();
        }
        if job.options.is_empty() {
            return vec![None];
        }

        let mut classes = Vec::new();
        let mut out = Vec::new();
        for (o, choice) in job.options.iter().enumerate() {
            if choice.resources.iter().any(|&r| self.busy_until[r] > t) {
                continue;
            }
            if classes.contains(&choice.class) {
                continue;
            }
            classes.push(choice.class);
            out.push(Some(o));
        }
        out
    }

    fn place(&mut self, j: usize, t: i64, choice: Option<usize>) -> Vec<i64> {
        let problem = self.problem;
        let job = &problem.jobs[j];
        let end = t + job.duration;
        let mut saved = Vec::new();
        for &r in self.resources_of(j, choice) {
            saved.push(self.busy_until[r]);
            self.busy_until[r] = end;
        }
        for &r in &job.resources {
            saved.push(self.busy_until[r]);
            self.busy_until[r] = end;
        }
        self.start[j] = Some(t);
        self.choice[j] = choice;
        self.started += 1;
        saved
    }

    fn unplace(&mut self, j: usize, choice: Option<usize>, saved: &[i64]) {
        let problem = self.problem;
        let job = &problem.jobs[j];
        let resources = self
            .resources_of(j, choice)
            .iter()
            .chain(job.resources.iter());
        for (&r, &previous) in resources.zip(saved) {
            self.busy_until[r] = previous;
        }
        self.start[j] = None;
        self.choice[j] = None;
        self.started -= 1;
    }

    fn resources_of(&self, j: usize, choice: Option<usize>) -> &'a [usize] {
        let problem: &'a Problem = self.problem;
        match choice {
            Some(o) => &problem.jobs[j].options[o].resources,
            None => &[],
        }
    }

    /// Lower bound on the makespan of any completion of the current node.
    ///
    /// Returns [`NO_BOUND`] when some job can no longer meet its deadline.
    fn lower_bound(&mut self, t: i64) -> i64 {
        let problem = self.problem;
        let jobs = &problem.jobs;
        let mut bound = 0i64;

        for &j in &problem.topo {
            let job = &jobs[j];
            if let Some(s) = self.start[j] {
                self.est[j] = s;
                bound = bound.max(s + job.duration);
                continue;
            }
            let mut est = t.max(job.start_min);
            for &p in &job.preds {
                est = est.max(self.est[p] + jobs[p].duration);
            }
            if est > job.latest_start {
                return NO_BOUND;
            }
            self.est[j] = est;
            bound = bound.max(est + problem.tails[j]);
        }

        // Unary resources: remaining mandatory work after the resource frees
        let mut work = vec![0i64; problem.resource_count];
        let mut earliest = vec![NO_BOUND; problem.resource_count];
        for (j, job) in jobs.iter().enumerate() {
            if self.start[j].is_some() {
                continue;
            }
            for &r in &job.resources {
                work[r] += job.duration;
                earliest[r] = earliest[r].min(self.est[j]);
            }
        }
        for r in 0..problem.resource_count {
            if work[r] > 0 {
                bound = bound.max(self.busy_until[r].max(earliest[r]) + work[r]);
            }
        }

        // Energy over interchangeable resources
        for pool in &problem.pools {
            let mut energy: i64 = pool
                .resources
                .iter()
                .map(|&r| (self.busy_until[r] - t).max(0))
                .sum();
            energy += pool
                .jobs
                .iter()
                .filter(|&&j| self.start[j].is_none())
                .map(|&j| jobs[j].duration)
                .sum::<i64>();
            let capacity = pool.resources.len() as i64;
            bound = bound.max(t + (energy + capacity - 1) / capacity);
        }

        bound
    }
}
