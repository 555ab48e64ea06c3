//! Task: bootchart output collection.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::constants::archive::BOOTCHART_PREFIX;
use crate::constants::tools::CP;
use crate::errors::{GhostError, GhostResult};
use crate::poll::{DiagnosticTask, PollContext, TaskKind, TaskPoll};
use crate::util::{ProcessTable, ToolInvocation};

/// Copies `bootchart-*` files into the boot record once the bootchart
/// collector has exited.
pub struct BootChartTask {
    processes: Arc<dyn ProcessTable>,
    /// Collector PID, looked up once when the task is created
    pid: Option<u32>,
    log_dir: PathBuf,
}

impl BootChartTask {
    pub fn new(
        processes: Arc<dyn ProcessTable>,
        process_name: &str,
        log_dir: impl Into<PathBuf>,
    ) -> Self {
        let pid = processes.find_by_name(process_name);
        match pid {
            Some(pid) => tracing::debug!(process = process_name, pid, "Tracking bootchart"),
            None => tracing::debug!(process = process_name, "Bootchart not running"),
        }

        Self {
            processes,
            pid,
            log_dir: log_dir.into(),
        }
    }

    fn chart_files(&self) -> GhostResult<Vec<PathBuf>> {
        let list_err = |e: std::io::Error| {
            GhostError::storage(format!("Failed to list {}", self.log_dir.display()), e)
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.log_dir).map_err(list_err)? {
            let entry = entry.map_err(list_err)?;
            if !entry.file_type().map_err(list_err)?.is_file() {
                continue;
            }
            let is_chart = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(BOOTCHART_PREFIX));
            if is_chart {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }
}

async fn copy_into(ctx: &PollContext, source: &Path) -> GhostResult<()> {
    let invocation = ToolInvocation::new(CP)
        .arg(source.display().to_string())
        .arg(ctx.boot_dir.display().to_string());
    ctx.tools.run(&invocation).await?.require_success(&invocation)?;
    Ok(())
}

#[async_trait]
impl DiagnosticTask for BootChartTask {
    fn kind(&self) -> TaskKind {
        TaskKind::BootChart
    }

    async fn poll(&mut self, ctx: &PollContext) -> GhostResult<TaskPoll> {
        if let Some(pid) = self.pid {
            if self.processes.is_alive(pid) {
                return Ok(TaskPoll::Pending);
            }
        }

        let files = self.chart_files()?;
        let mut copied = 0usize;
        for file in &files {
            match copy_into(ctx, file).await {
                Ok(()) => copied += 1,
                Err(e) => {
                    tracing::warn!(
                        file = %file.display(),
                        error = %e,
                        "Failed to copy bootchart"
                    );
                }
            }
        }

        tracing::info!(copied, found = files.len(), "Collected bootchart output");
        Ok(TaskPoll::Done)
    }
}
