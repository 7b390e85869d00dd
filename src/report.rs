//! Plain-text schedule report.
//!
//! Renders a summary line and a GitHub-flavored table with one row per
//! time unit:
//!
//! ```text
//! Minimum Execution Time = 4 minute(s)
//! | Time   | Tasks being Executed   | Group Name
//! |--------|------------------------|--------------
//! | 1      | T1,T2,T3               | G1
//! ```
//!
//! Lines carry no closing `|`.

use std::collections::BTreeSet;

use crate::models::ScheduledTask;

const HEADERS: [&str; 3] = ["Time", "Tasks being Executed", "Group Name"];

/// Minimum padding between a header and its column border.
const MIN_PADDING: usize = 2;

/// Builds the text report of a schedule.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleReport;

impl ScheduleReport {
    /// Creates a report generator.
    pub fn new() -> Self {
        Self
    }

    /// Renders the report for `scheduled`, in any order.
    ///
    /// Row `i` (1-based) lists the tasks active during `[i - 1, i)`, sorted
    /// by name, and their distinct non-empty groups, sorted.
    pub fn generate(&self, scheduled: &[ScheduledTask]) -> String {
        let makespan = scheduled.iter().map(ScheduledTask::end).max().unwrap_or(0);

        let rows: Vec<[String; 3]> = (0..makespan)
            .map(|t| {
                let active: Vec<&ScheduledTask> =
                    scheduled.iter().filter(|s| s.is_active_at(t)).collect();

                let names: BTreeSet<&str> = active.iter().map(|s| s.task.name.as_str()).collect();
                let groups: BTreeSet<&str> = active
                    .iter()
                    .filter(|s| s.task.has_group())
                    .map(|s| s.task.group.as_str())
                    .collect();

                [
                    (t + 1).to_string(),
                    names.into_iter().collect::<Vec<_>>().join(","),
                    groups.into_iter().collect::<Vec<_>>().join(","),
                ]
            })
            .collect();

        let mut out = format!("Minimum Execution Time = {makespan} minute(s)\n");
        out.push_str(&render_table(&rows));
        out
    }
}

fn render_table(rows: &[[String; 3]]) -> String {
    let widths: Vec<usize> = HEADERS
        .iter()
        .enumerate()
        .map(|(col, header)| {
            rows.iter()
                .map(|row| row[col].chars().count())
                .max()
                .unwrap_or(0)
                .max(header.chars().count() + MIN_PADDING)
        })
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render_row(&HEADERS, &widths));
    lines.push(
        widths
            .iter()
            .map(|w| format!("|{}", "-".repeat(w + 2)))
            .collect::<String>(),
    );
    for row in rows {
        lines.push(render_row(row, &widths));
    }
    lines.join("\n")
}

fn render_row<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("| {:<width$} ", cell.as_ref()))
        .collect()
}
