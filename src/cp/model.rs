//! Interval-based constraint model.
//!
//! A small scheduling-oriented CP vocabulary: interval variables with a
//! fixed duration, optionally present, tied together by precedence,
//! no-overlap and alternative constraints, under a makespan objective.
//!
//! # Reference
//! Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling"

use serde::{Deserialize, Serialize};

/// Handle to an interval variable of a [`CpModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntervalId(pub usize);

/// An interval variable `[start, start + duration)`.
///
/// Optional intervals carry a presence literal decided by the solver;
/// absent intervals impose no constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalVar {
    /// Debug name.
    pub name: String,
    /// Earliest allowed start.
    pub start_min: i64,
    /// Latest allowed start.
    pub start_max: i64,
    /// Fixed duration.
    pub duration: i64,
    /// Latest allowed end.
    pub end_max: i64,
    /// Whether presence is a decision.
    pub optional: bool,
}

impl IntervalVar {
    /// Creates a mandatory interval.
    pub fn new(
        name: impl Into<String>,
        start_min: i64,
        start_max: i64,
        duration: i64,
        end_max: i64,
    ) -> Self {
        Self {
            name: name.into(),
            start_min,
            start_max,
            duration,
            end_max,
            optional: false,
        }
    }

    /// Makes the interval optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Latest start that still respects `end_max`.
    pub fn latest_start(&self) -> i64 {
        self.start_max.min(self.end_max - self.duration)
    }
}

/// A constraint over interval variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpConstraint {
    /// `after` cannot start before `before` ends.
    Precedence { before: IntervalId, after: IntervalId },
    /// Present intervals of the list pairwise do not overlap.
    NoOverlap(Vec<IntervalId>),
    /// Exactly one of `alternatives` is present, and it shares start and
    /// end with `master`.
    Alternative {
        master: IntervalId,
        alternatives: Vec<IntervalId>,
    },
}

/// Optimization objective.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    /// Minimize the latest end over mandatory intervals.
    #[default]
    MinimizeMaxEnd,
}

/// A constraint model over a bounded horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpModel {
    /// Model name.
    pub name: String,
    /// Upper bound for every time value.
    pub horizon: i64,
    /// Interval variables, indexed by [`IntervalId`].
    pub intervals: Vec<IntervalVar>,
    /// Constraints.
    pub constraints: Vec<CpConstraint>,
    /// Objective.
    pub objective: Objective,
}

impl CpModel {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>, horizon: i64) -> Self {
        Self {
            name: name.into(),
            horizon,
            intervals: Vec::new(),
            constraints: Vec::new(),
            objective: Objective::default(),
        }
    }

    /// Adds an interval variable.
    pub fn add_interval(&mut self, interval: IntervalVar) -> IntervalId {
        self.intervals.push(interval);
        IntervalId(self.intervals.len() - 1)
    }

    /// Adds a precedence `before -> after`.
    pub fn add_precedence(&mut self, before: IntervalId, after: IntervalId) {
        self.constraints
            .push(CpConstraint::Precedence { before, after });
    }

    /// Adds a no-overlap constraint over `intervals`.
    pub fn add_no_overlap(&mut self, intervals: Vec<IntervalId>) {
        self.constraints.push(CpConstraint::NoOverlap(intervals));
    }

    /// Adds an alternative constraint.
    pub fn add_alternative(&mut self, master: IntervalId, alternatives: Vec<IntervalId>) {
        self.constraints.push(CpConstraint::Alternative {
            master,
            alternatives,
        });
    }

    /// Sets the objective.
    pub fn set_objective(&mut self, objective: Objective) {
        self.objective = objective;
    }

    /// Looks up an interval.
    pub fn interval(&self, id: IntervalId) -> Option<&IntervalVar> {
        self.intervals.get(id.0)
    }

    /// Number of interval variables.
    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    /// Number of optional interval variables.
    pub fn optional_count(&self) -> usize {
        self.intervals.iter().filter(|i| i.optional).count()
    }

    /// Number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Number of constraints matching `pred`.
    pub fn count_constraints(&self, pred: impl Fn(&CpConstraint) -> bool) -> usize {
        self.constraints.iter().filter(|c| pred(c)).count()
    }
}
