use std::time::Duration;

use super::TaskKind;

#[derive(Debug, Clone)]
pub struct TaskMetrics {
    pub kind: TaskKind,
    /// Tick (1-based) on which the task completed
    pub tick: u32,
    /// Time from loop start to completion
    pub elapsed_ms: u128,
}

#[derive(Debug, Clone, Default)]
pub struct PollMetrics {
    pub ticks: u32,
    pub total_duration_ms: u128,
    pub tasks: Vec<TaskMetrics>,
}

impl PollMetrics {
    pub(crate) fn record_completion(&mut self, kind: TaskKind, tick: u32, elapsed: Duration) {
        self.tasks.push(TaskMetrics {
            kind,
            tick,
            elapsed_ms: elapsed.as_millis(),
        });
    }

    pub fn completion_tick(&self, kind: TaskKind) -> Option<u32> {
        self.tasks
            .iter()
            .find(|task| task.kind == kind)
            .map(|task| task.tick)
    }

    pub fn log(&self) {
        for task in &self.tasks {
            tracing::info!(
                task = %task.kind,
                tick = task.tick,
                elapsed_ms = task.elapsed_ms as u64,
                "Diagnostic captured"
            );
        }
        tracing::info!(
            ticks = self.ticks,
            total_duration_ms = self.total_duration_ms as u64,
            completed = self.tasks.len(),
            "Polling finished"
        );
    }
}
