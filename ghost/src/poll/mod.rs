//! Polling of asynchronously-finishing boot diagnostics.
//!
//! ```text
//! Poller ── tick ──> DiagnosticTask::poll (BootTime, PlotChart, BootChart)
//!   │                     │
//!   │                     └─ PropertySource / ToolRunner / boot record dir
//!   └─ TaskSet: tasks still pending
//! ```

mod mask;
mod metrics;
mod poller;
mod task;
pub mod tasks;

pub use mask::{TaskKind, TaskSet};
pub use metrics::{PollMetrics, TaskMetrics};
pub use poller::{PollOutcome, PollReport, PollSettings, PollState, Poller};
pub use task::{BoxedTask, DiagnosticTask, PollContext, TaskPoll};
