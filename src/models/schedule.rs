//! Schedule (solution) model.
//!
//! A schedule assigns every task a core and a start time. It is produced
//! once per planning run and never mutated afterwards.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3

use serde::{Deserialize, Serialize};

use super::Task;

/// A task placed on a core at a start time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    /// The scheduled task.
    pub task: Task,
    /// Assigned core (0-based).
    pub core: usize,
    /// Start time.
    pub start: i64,
}

impl ScheduledTask {
    /// Creates a new placement.
    pub fn new(task: Task, core: usize, start: i64) -> Self {
        Self { task, core, start }
    }

    /// End time (exclusive).
    #[inline]
    pub fn end(&self) -> i64 {
        self.start + self.task.execution_time
    }

    /// Whether the task runs during time unit `[t, t + 1)`.
    #[inline]
    pub fn is_active_at(&self, t: i64) -> bool {
        self.start <= t && t < self.end()
    }

    /// Whether the two placements share any instant.
    #[inline]
    pub fn overlaps(&self, other: &ScheduledTask) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

/// A complete plan: one placement per task, in task-set order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Placements in the order of the input tasks.
    pub tasks: Vec<ScheduledTask>,
}

impl Schedule {
    /// Wraps placements.
    pub fn new(tasks: Vec<ScheduledTask>) -> Self {
        Self { tasks }
    }

    /// Makespan: latest end time, 0 when empty.
    pub fn makespan(&self) -> i64 {
        self.tasks.iter().map(ScheduledTask::end).max().unwrap_or(0)
    }

    /// Finds the placement of a task by name.
    pub fn task(&self, name: &str) -> Option<&ScheduledTask> {
        self.tasks.iter().find(|s| s.task.name == name)
    }

    /// Placements on a given core.
    pub fn tasks_on_core(&self, core: usize) -> Vec<&ScheduledTask> {
        self.tasks.iter().filter(|s| s.core == core).collect()
    }

    /// Placements running during time unit `[t, t + 1)`.
    pub fn active_at(&self, t: i64) -> Vec<&ScheduledTask> {
        self.tasks.iter().filter(|s| s.is_active_at(t)).collect()
    }

    /// Number of placements.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the schedule is empty.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl From<Vec<ScheduledTask>> for Schedule {
    fn from(tasks: Vec<ScheduledTask>) -> Self {
        Self::new(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schedule() -> Schedule {
        Schedule::new(vec![
            ScheduledTask::new(Task::new("T1", 3).with_group("G1"), 1, 0),
            ScheduledTask::new(Task::new("T2", 1), 0, 0),
            ScheduledTask::new(Task::new("T3", 4), 2, 0),
            ScheduledTask::new(Task::new("T4", 2), 0, 1),
        ])
    }

    #[test]
    fn test_makespan() {
        assert_eq!(sample_schedule().makespan(), 4);
        assert_eq!(Schedule::default().makespan(), 0);
    }

    #[test]
    fn test_lookup() {
        let s = sample_schedule();
        assert_eq!(s.task("T4").map(|p| p.end()), Some(3));
        assert!(s.task("T9").is_none());
        assert_eq!(s.tasks_on_core(0).len(), 2);
    }

    #[test]
    fn test_active_at() {
        let s = sample_schedule();
        let names: Vec<_> = s.active_at(3).iter().map(|p| p.task.name.as_str()).collect();
        assert_eq!(names, vec!["T3"]);
        assert_eq!(s.active_at(0).len(), 3);
        assert!(s.active_at(4).is_empty());
    }

    #[test]
    fn test_overlaps() {
        let s = sample_schedule();
        let t2 = s.task("T2").unwrap();
        let t4 = s.task("T4").unwrap();
        let t1 = s.task("T1").unwrap();
        // [0,1) and [1,3) touch but do not overlap
        assert!(!t2.overlaps(t4));
        assert!(t1.overlaps(t4));
    }
}
