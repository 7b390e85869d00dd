//! Pipeline planning domain models.
//!
//! Provides the data types for describing a pipeline and its plan.
//!
//! # Domain Mappings
//!
//! | pipeline-planner | Job shop | Data pipeline |
//! |------------------|----------|---------------|
//! | Task | Operation | Pipeline step |
//! | Group | Job family | Stage (raw, feature, model) |
//! | Core | Machine | CPU core |
//! | Schedule | Machine plan | Execution plan |

mod schedule;
mod task;
mod task_set;

pub use schedule::{Schedule, ScheduledTask};
pub use task::Task;
pub use task_set::TaskSet;
