//! Task: service start-up chart.

use async_trait::async_trait;

use crate::constants::archive::PLOTCHART_FILE;
use crate::constants::tools::SYSTEMD_ANALYZE;
use crate::constants::units::{ACTIVE_STATE, N_JOBS};
use crate::errors::GhostResult;
use crate::poll::{DiagnosticTask, PollContext, TaskKind, TaskPoll};
use crate::property::PropertyTarget;
use crate::util::ToolInvocation;

/// Renders `systemd-analyze plot` once the default target is reached and the
/// job queue has drained.
pub struct PlotChartTask {
    target: String,
    renderer: String,
}

impl PlotChartTask {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            renderer: SYSTEMD_ANALYZE.to_string(),
        }
    }

    /// Replace the chart renderer program; it is run as `<program> plot`.
    pub fn renderer(mut self, program: impl Into<String>) -> Self {
        self.renderer = program.into();
        self
    }
}

#[async_trait]
impl DiagnosticTask for PlotChartTask {
    fn kind(&self) -> TaskKind {
        TaskKind::PlotChart
    }

    async fn poll(&mut self, ctx: &PollContext) -> GhostResult<TaskPoll> {
        let active_state = ctx
            .properties
            .get_string(PropertyTarget::Unit(&self.target), ACTIVE_STATE)
            .await?;
        if active_state != "active" {
            return Ok(TaskPoll::Pending);
        }

        let jobs = ctx.properties.get_u32(PropertyTarget::Manager, N_JOBS).await?;
        if jobs != 0 {
            tracing::trace!(jobs, "Jobs still queued");
            return Ok(TaskPoll::Pending);
        }

        let invocation = ToolInvocation::new(&self.renderer)
            .arg("plot")
            .stdout_to(ctx.boot_dir.join(PLOTCHART_FILE));

        // Any normal exit completes the task, whatever the exit code; only a
        // signal death is retried.
        match ctx.tools.run(&invocation).await {
            Ok(output) if output.exit.exited_normally() => {
                if !output.exit.success() {
                    tracing::warn!(
                        command = %invocation,
                        exit = ?output.exit,
                        "Chart renderer failed"
                    );
                }
                Ok(TaskPoll::Done)
            }
            Ok(output) => {
                tracing::warn!(
                    command = %invocation,
                    exit = ?output.exit,
                    "Chart renderer killed, retrying"
                );
                Ok(TaskPoll::Pending)
            }
            Err(e) => {
                tracing::warn!(
                    command = %invocation,
                    error = %e,
                    "Chart renderer did not start"
                );
                Ok(TaskPoll::Done)
            }
        }
    }
}
