//! Tick-driven polling loop.

use std::time::Duration;

use tokio::time::Instant;

use super::metrics::PollMetrics;
use super::task::{BoxedTask, PollContext, TaskPoll};
use super::{TaskKind, TaskSet};
use crate::constants::limits::{MAX_POLL_TICKS, POLL_INTERVAL};
use crate::errors::{GhostError, GhostResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Ticks evaluated before giving up
    pub max_ticks: u32,
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_ticks: MAX_POLL_TICKS,
            interval: POLL_INTERVAL,
        }
    }
}

/// Mutable progress of one polling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollState {
    pub pending: TaskSet,
    /// Ticks evaluated so far
    pub tick: u32,
}

impl PollState {
    pub fn new(pending: TaskSet) -> Self {
        Self { pending, tick: 0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Every enabled task captured its artifact
    Completed,
    /// Tick budget exhausted with tasks still pending
    TimedOut { pending: TaskSet },
}

#[derive(Debug, Clone)]
pub struct PollReport {
    pub outcome: PollOutcome,
    pub metrics: PollMetrics,
}

/// Drives diagnostic tasks once per tick until none is pending or the tick
/// budget runs out.
pub struct Poller {
    settings: PollSettings,
    tasks: Vec<BoxedTask>,
}

impl Poller {
    pub fn new(settings: PollSettings, mut tasks: Vec<BoxedTask>) -> Self {
        tasks.sort_by_key(|task| task.kind() as usize);
        Self { settings, tasks }
    }

    fn has_task(&self, kind: TaskKind) -> bool {
        self.tasks.iter().any(|task| task.kind() == kind)
    }

    /// Run until completion or timeout.
    ///
    /// Pending tasks are evaluated in [`TaskKind`] order on every tick. A
    /// timeout is logged and reported through [`PollOutcome::TimedOut`], not
    /// as an error. The first task error aborts the run.
    pub async fn run(
        &mut self,
        ctx: &PollContext,
        state: &mut PollState,
    ) -> GhostResult<PollReport> {
        if let Some(orphan) = state.pending.iter().find(|kind| !self.has_task(*kind)) {
            return Err(GhostError::Internal(format!(
                "Task {} is pending but not registered",
                orphan
            )));
        }

        let start = Instant::now();
        let mut metrics = PollMetrics::default();

        tracing::info!(
            pending = %state.pending,
            max_ticks = self.settings.max_ticks,
            "Polling boot diagnostics"
        );

        let outcome = loop {
            if state.pending.is_empty() {
                break PollOutcome::Completed;
            }

            state.tick += 1;
            for task in self.tasks.iter_mut() {
                let kind = task.kind();
                if !state.pending.contains(kind) {
                    continue;
                }

                let poll = task.poll(ctx).await.inspect_err(|e| {
                    tracing::error!(
                        task = task.name(),
                        tick = state.tick,
                        error = %e,
                        "Task failed"
                    );
                })?;

                if poll == TaskPoll::Done {
                    state.pending.remove(kind);
                    metrics.record_completion(kind, state.tick, start.elapsed());
                    tracing::debug!(task = task.name(), tick = state.tick, "Task done");
                }
            }

            if state.pending.is_empty() {
                break PollOutcome::Completed;
            }
            if state.tick >= self.settings.max_ticks {
                tracing::warn!(
                    ticks = state.tick,
                    pending = %state.pending,
                    "Polling timed out"
                );
                break PollOutcome::TimedOut {
                    pending: state.pending,
                };
            }

            tokio::time::sleep(self.settings.interval).await;
        };

        metrics.ticks = state.tick;
        metrics.total_duration_ms = start.elapsed().as_millis();

        Ok(PollReport { outcome, metrics })
    }
}
