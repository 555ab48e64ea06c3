//! Task: boot-animation completion time.

use async_trait::async_trait;

use crate::constants::archive::BOOTTIME_FILE;
use crate::constants::units::{
    ACTIVE_STATE, EXEC_MAIN_EXIT_TIMESTAMP, INACTIVE_ENTER_TIMESTAMP, RESULT,
};
use crate::errors::{GhostError, GhostResult};
use crate::poll::{DiagnosticTask, PollContext, TaskKind, TaskPoll};
use crate::property::PropertyTarget;

/// Records when the boot-animation service finished successfully.
pub struct BootTimeTask {
    unit: String,
}

impl BootTimeTask {
    pub fn new(unit: impl Into<String>) -> Self {
        Self { unit: unit.into() }
    }
}

/// Render a monotonic timestamp in microseconds as the `boottime` record.
///
/// Sub-millisecond precision is truncated before conversion to seconds.
pub fn format_platform_seconds(exit_timestamp_us: u64) -> String {
    let seconds = (exit_timestamp_us / 1000) as f64 / 1000.0;
    format!("platform(sec): {:.2}", seconds)
}

#[async_trait]
impl DiagnosticTask for BootTimeTask {
    fn kind(&self) -> TaskKind {
        TaskKind::BootTime
    }

    async fn poll(&mut self, ctx: &PollContext) -> GhostResult<TaskPoll> {
        let unit = PropertyTarget::Unit(&self.unit);
        let service = PropertyTarget::Service(&self.unit);

        let active_state = ctx.properties.get_string(unit, ACTIVE_STATE).await?;
        let inactive_since = ctx
            .properties
            .get_u64(unit, INACTIVE_ENTER_TIMESTAMP)
            .await?;
        let result = ctx.properties.get_string(service, RESULT).await?;

        if active_state != "inactive" || inactive_since == 0 || result != "success" {
            tracing::trace!(
                unit = %self.unit,
                %active_state,
                inactive_since,
                %result,
                "Boot animation not finished"
            );
            return Ok(TaskPoll::Pending);
        }

        let exit_us = ctx
            .properties
            .get_u64(service, EXEC_MAIN_EXIT_TIMESTAMP)
            .await?;
        let record = format_platform_seconds(exit_us);

        let path = ctx.boot_dir.join(BOOTTIME_FILE);
        std::fs::write(&path, format!("{}\n", record))
            .map_err(|e| GhostError::storage(format!("Failed to write {}", path.display()), e))?;

        tracing::info!(unit = %self.unit, exit_us, "Recorded boot time");
        Ok(TaskPoll::Done)
    }
}
