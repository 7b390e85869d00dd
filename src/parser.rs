//! Pipeline definition parser.
//!
//! A pipeline file is a sequence of four-line task blocks followed by a
//! terminator line:
//!
//! ```text
//! <name>
//! <execution time>
//! <group, may be empty>
//! <comma-separated dependencies, may be empty>
//! ...
//! END
//! ```

use std::collections::HashSet;
use std::io;
use std::path::Path;

use crate::error::{PlanningError, PlanningResult};
use crate::models::Task;

/// Terminator line of a pipeline definition.
pub const TERMINATOR: &str = "END";

/// Lines per task block.
const BLOCK_LINES: usize = 4;

/// Parses raw pipeline lines into tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskParser;

impl TaskParser {
    /// Creates a parser.
    pub fn new() -> Self {
        Self
    }

    /// Parses the lines of a pipeline definition, in file order.
    ///
    /// Names, execution times, groups and dependency names are trimmed.
    /// Empty dependency entries are dropped and repeated ones collapse.
    ///
    /// # Errors
    /// - [`PlanningError::UnexpectedLineCount`] unless there are `4k + 1`
    ///   lines with `k >= 1`
    /// - [`PlanningError::MissingTerminator`] if the last line is not `END`
    /// - [`PlanningError::InvalidTaskName`] for a blank name
    /// - [`PlanningError::InvalidExecutionTime`] for a time that is not an
    ///   integer >= 1
    /// - [`PlanningError::DuplicateTaskName`] for a repeated name
    pub fn parse<S: AsRef<str>>(&self, lines: &[S]) -> PlanningResult<Vec<Task>> {
        if lines.len() <= BLOCK_LINES || (lines.len() - 1) % BLOCK_LINES != 0 {
            return Err(PlanningError::UnexpectedLineCount(lines.len()));
        }

        let last = lines[lines.len() - 1].as_ref();
        if last != TERMINATOR {
            return Err(PlanningError::MissingTerminator(last.to_string()));
        }

        let mut names = HashSet::new();
        let mut tasks = Vec::with_capacity(lines.len() / BLOCK_LINES);
        for block in lines[..lines.len() - 1].chunks_exact(BLOCK_LINES) {
            let task = Self::parse_task(
                block[0].as_ref(),
                block[1].as_ref(),
                block[2].as_ref(),
                block[3].as_ref(),
            )?;
            if !names.insert(task.name.clone()) {
                return Err(PlanningError::DuplicateTaskName(task.name));
            }
            tasks.push(task);
        }

        log::debug!("parsed {} task(s)", tasks.len());
        Ok(tasks)
    }

    fn parse_task(name: &str, execution_time: &str, group: &str, deps: &str) -> PlanningResult<Task> {
        let parsed_name = name.trim();
        if parsed_name.is_empty() {
            return Err(PlanningError::InvalidTaskName(name.to_string()));
        }

        let execution_time = match execution_time.trim().parse::<i64>() {
            Ok(value) if value >= 1 => value,
            _ => {
                return Err(PlanningError::InvalidExecutionTime {
                    task: name.to_string(),
                    value: execution_time.to_string(),
                })
            }
        };

        let dependencies = deps
            .split(',')
            .map(str::trim)
            .filter(|dep| !dep.is_empty());

        Ok(Task::new(parsed_name, execution_time)
            .with_group(group.trim())
            .with_dependencies(dependencies))
    }
}

/// Reads a pipeline file into lines.
///
/// A trailing newline after the terminator does not produce an extra line.
pub fn load_pipeline(path: impl AsRef<Path>) -> io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content.lines().map(str::to_string).collect())
}
