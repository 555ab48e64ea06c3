//! Diagnostic task trait.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use super::TaskKind;
use crate::errors::GhostResult;
use crate::property::PropertySource;
use crate::util::ToolRunner;

/// Collaborators shared by every task of one polling run.
#[derive(Clone)]
pub struct PollContext {
    pub properties: Arc<dyn PropertySource>,
    pub tools: Arc<dyn ToolRunner>,
    /// Record directory of the current boot
    pub boot_dir: PathBuf,
}

/// Result of one evaluation of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPoll {
    /// Condition not met yet, evaluate again next tick
    Pending,
    /// Artifact captured
    Done,
}

/// A diagnostic that completes asynchronously with respect to boot.
///
/// `poll` is called once per tick until it returns [`TaskPoll::Done`]. An
/// `Err` aborts the whole polling run.
#[async_trait]
pub trait DiagnosticTask: Send {
    fn kind(&self) -> TaskKind;

    /// Get human-readable task name for logging.
    fn name(&self) -> &str {
        self.kind().as_str()
    }

    async fn poll(&mut self, ctx: &PollContext) -> GhostResult<TaskPoll>;
}

pub type BoxedTask = Box<dyn DiagnosticTask>;
