//! One collection run: sequencing, quota, working directory and polling.

use std::path::PathBuf;
use std::sync::Arc;

use crate::archive::{
    ArchiveLayout, QuotaReport, enforce_quota, next_boot_index, prepare_working_dir,
};
use crate::config::GhostConfig;
use crate::constants::limits::DISK_USAGE_THRESHOLD_RATIO;
use crate::constants::paths::{ARCHIVE_ROOT, CONFIG_FILE, KERNEL_CMDLINE, RUNTIME_LOG_DIR};
use crate::constants::tools::{BOOTCHART_INIT_ARG, BOOTCHART_PROCESS};
use crate::constants::units::{BOOT_ANIMATION, DEFAULT_TARGET};
use crate::disk::{DiskProbe, NativeDiskProbe, ToolDiskProbe};
use crate::errors::GhostResult;
use crate::poll::tasks::{BootChartTask, BootTimeTask, PlotChartTask};
use crate::poll::{
    BoxedTask, PollContext, PollReport, PollSettings, PollState, Poller, TaskKind, TaskSet,
};
use crate::property::{PropertySource, SystemctlPropertySource};
use crate::util::{
    ProcessTable, SystemProcessTable, SystemToolRunner, ToolRunner, kernel_cmdline_has,
    ordinal_suffix,
};

/// How archive usage and capacity are measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DiskProbeKind {
    /// `df -Pk` and `du -sk`
    #[default]
    Tools,
    /// `statvfs(2)` and a directory walk
    Native,
}

/// Runtime options of a collection run.
#[derive(Debug, Clone)]
pub struct CollectorOptions {
    pub config_path: PathBuf,
    pub archive_root: PathBuf,
    pub kernel_cmdline: PathBuf,
    /// Directory bootchart writes its output to
    pub runtime_log_dir: PathBuf,
    pub boot_animation_unit: String,
    pub default_target: String,
    pub bootchart_process: String,
    /// Archive usage, in percent of capacity, at which old records are pruned
    pub quota_threshold: u64,
    pub poll: PollSettings,
    pub disk_probe: DiskProbeKind,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(CONFIG_FILE),
            archive_root: PathBuf::from(ARCHIVE_ROOT),
            kernel_cmdline: PathBuf::from(KERNEL_CMDLINE),
            runtime_log_dir: PathBuf::from(RUNTIME_LOG_DIR),
            boot_animation_unit: BOOT_ANIMATION.to_string(),
            default_target: DEFAULT_TARGET.to_string(),
            bootchart_process: BOOTCHART_PROCESS.to_string(),
            quota_threshold: DISK_USAGE_THRESHOLD_RATIO,
            poll: PollSettings::default(),
            disk_probe: DiskProbeKind::default(),
        }
    }
}

/// Outcome of a run that did not fail.
#[derive(Debug, Clone)]
pub struct CollectorReport {
    pub boot_index: u64,
    pub boot_dir: PathBuf,
    pub quota: QuotaReport,
    pub poll: PollReport,
}

/// Boot diagnostics collector.
pub struct Collector {
    options: CollectorOptions,
    properties: Arc<dyn PropertySource>,
    tools: Arc<dyn ToolRunner>,
    disk: Arc<dyn DiskProbe>,
    processes: Arc<dyn ProcessTable>,
}

impl Collector {
    /// Collector talking to the running system.
    pub fn new(options: CollectorOptions) -> Self {
        let tools: Arc<dyn ToolRunner> = Arc::new(SystemToolRunner);
        let disk: Arc<dyn DiskProbe> = match options.disk_probe {
            DiskProbeKind::Tools => Arc::new(ToolDiskProbe::new(tools.clone())),
            DiskProbeKind::Native => Arc::new(NativeDiskProbe),
        };

        Self {
            properties: Arc::new(SystemctlPropertySource::new(tools.clone())),
            tools,
            disk,
            processes: Arc::new(SystemProcessTable),
            options,
        }
    }

    /// Collector with explicit backends.
    pub fn with_backends(
        options: CollectorOptions,
        properties: Arc<dyn PropertySource>,
        tools: Arc<dyn ToolRunner>,
        disk: Arc<dyn DiskProbe>,
        processes: Arc<dyn ProcessTable>,
    ) -> Self {
        Self {
            options,
            properties,
            tools,
            disk,
            processes,
        }
    }

    /// Run the whole collection once.
    ///
    /// Startup failures (configuration, archive I/O, quota measurement) and
    /// task errors are returned; a polling timeout is not an error.
    pub async fn run(&self) -> GhostResult<CollectorReport> {
        let options = &self.options;
        let config = GhostConfig::load(&options.config_path)?;

        let layout = ArchiveLayout::new(&options.archive_root);
        layout.prepare()?;

        let boot_index = next_boot_index(&layout)?;
        tracing::info!(
            boot_index,
            "Now, {}{} boot.",
            boot_index,
            ordinal_suffix(boot_index)
        );

        let quota = enforce_quota(&layout, self.disk.as_ref(), options.quota_threshold).await?;
        let boot_dir = prepare_working_dir(&layout, boot_index)?;

        let pending = self.initial_tasks(&config);
        let tasks = self.build_tasks(pending);

        let ctx = PollContext {
            properties: self.properties.clone(),
            tools: self.tools.clone(),
            boot_dir: boot_dir.clone(),
        };
        let mut state = PollState::new(pending);
        let poll = Poller::new(options.poll, tasks).run(&ctx, &mut state).await?;
        poll.metrics.log();

        Ok(CollectorReport {
            boot_index,
            boot_dir,
            quota,
            poll,
        })
    }

    /// Enabled tasks, with bootchart dropped unless the kernel booted through it.
    fn initial_tasks(&self, config: &GhostConfig) -> TaskSet {
        let mut pending = TaskSet::from_config(config);
        if pending.contains(TaskKind::BootChart)
            && !kernel_cmdline_has(&self.options.kernel_cmdline, BOOTCHART_INIT_ARG)
        {
            tracing::info!("Kernel not booted through bootchart, skipping bootchart collection");
            pending.remove(TaskKind::BootChart);
        }
        pending
    }

    fn build_tasks(&self, pending: TaskSet) -> Vec<BoxedTask> {
        let options = &self.options;
        pending
            .iter()
            .map(|kind| -> BoxedTask {
                match kind {
                    TaskKind::BootTime => {
                        Box::new(BootTimeTask::new(&options.boot_animation_unit))
                    }
                    TaskKind::PlotChart => Box::new(PlotChartTask::new(&options.default_target)),
                    TaskKind::BootChart => Box::new(BootChartTask::new(
                        self.processes.clone(),
                        &options.bootchart_process,
                        &options.runtime_log_dir,
                    )),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::units::{
        ACTIVE_STATE, EXEC_MAIN_EXIT_TIMESTAMP, INACTIVE_ENTER_TIMESTAMP, N_JOBS, RESULT,
    };
    use crate::errors::GhostError;
    use crate::poll::PollOutcome;
    use crate::property::{PropertyTarget, PropertyValue};
    use crate::testing::{
        FakeDiskProbe, FakeProcessTable, FakePropertySource, FakeToolRunner, exited,
    };
    use std::fs;
    use tempfile::{TempDir, tempdir};

    struct Harness {
        _dir: TempDir,
        options: CollectorOptions,
        properties: Arc<FakePropertySource>,
        tools: Arc<FakeToolRunner>,
        processes: Arc<FakeProcessTable>,
    }

    impl Harness {
        fn new(config: &str, cmdline: &str) -> Self {
            let dir = tempdir().unwrap();
            let options = CollectorOptions {
                config_path: dir.path().join("ghost.conf"),
                archive_root: dir.path().join("archive"),
                kernel_cmdline: dir.path().join("cmdline"),
                runtime_log_dir: dir.path().join("run-log"),
                ..CollectorOptions::default()
            };
            fs::write(&options.config_path, config).unwrap();
            fs::write(&options.kernel_cmdline, cmdline).unwrap();
            fs::create_dir_all(&options.runtime_log_dir).unwrap();

            Self {
                _dir: dir,
                options,
                properties: FakePropertySource::new(),
                tools: FakeToolRunner::new(|_| Ok(exited(0, ""))),
                processes: FakeProcessTable::new(),
            }
        }

        fn boot_settled(&self) {
            let unit = PropertyTarget::Unit(BOOT_ANIMATION);
            let service = PropertyTarget::Service(BOOT_ANIMATION);
            self.properties.set_str(unit, ACTIVE_STATE, "inactive");
            self.properties
                .set(unit, INACTIVE_ENTER_TIMESTAMP, PropertyValue::U64(3_000_000));
            self.properties.set_str(service, RESULT, "success");
            self.properties.set(
                service,
                EXEC_MAIN_EXIT_TIMESTAMP,
                PropertyValue::U64(4_250_000),
            );
            self.properties
                .set_str(PropertyTarget::Unit(DEFAULT_TARGET), ACTIVE_STATE, "active");
            self.properties
                .set(PropertyTarget::Manager, N_JOBS, PropertyValue::U32(0));
        }

        fn collector(&self) -> Collector {
            Collector::with_backends(
                self.options.clone(),
                self.properties.clone(),
                self.tools.clone(),
                Arc::new(FakeDiskProbe::new(1_000_000)),
                self.processes.clone(),
            )
        }

        fn layout(&self) -> ArchiveLayout {
            ArchiveLayout::new(&self.options.archive_root)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_run_records_diagnostics() {
        let harness = Harness::new("[Ghost]\nboottime=yes\nplotchart=yes\n", "quiet");
        harness.boot_settled();
        let layout = harness.layout();
        layout.prepare().unwrap();
        fs::create_dir(layout.record_dir(1)).unwrap();
        fs::create_dir(layout.record_dir(2)).unwrap();
        fs::write(layout.counter_file(), "2\n").unwrap();

        let report = harness.collector().run().await.unwrap();

        assert_eq!(report.boot_index, 3);
        assert_eq!(report.boot_dir, layout.record_dir(3));
        assert!(report.quota.deleted.is_empty());
        assert_eq!(report.poll.outcome, PollOutcome::Completed);
        assert_eq!(report.poll.metrics.ticks, 1);

        assert_eq!(
            fs::read_to_string(report.boot_dir.join("boottime")).unwrap(),
            "platform(sec): 4.25\n"
        );
        assert_eq!(fs::read_link(layout.current_link()).unwrap(), PathBuf::from("3"));
        assert_eq!(fs::read_to_string(layout.counter_file()).unwrap(), "3\n");
        assert_eq!(harness.tools.calls_to("systemd-analyze").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bootchart_requires_kernel_argument() {
        let harness = Harness::new(
            "[Ghost]\nboottime=no\nplotchart=no\nbootchart=yes\n",
            "root=/dev/vda quiet",
        );
        fs::write(harness.options.runtime_log_dir.join("bootchart-1.svg"), b"svg").unwrap();

        let report = harness.collector().run().await.unwrap();

        assert_eq!(report.poll.outcome, PollOutcome::Completed);
        assert_eq!(report.poll.metrics.ticks, 0);
        assert_eq!(harness.properties.query_count(), 0);
        assert!(harness.tools.calls_to("cp").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bootchart_collected_after_exit() {
        let harness = Harness::new(
            "[Ghost]\nboottime=no\nplotchart=no\nbootchart=yes\n",
            "ro init=/usr/lib/systemd/systemd-bootchart",
        );
        fs::write(harness.options.runtime_log_dir.join("bootchart-1.svg"), b"svg").unwrap();
        harness.processes.spawn(BOOTCHART_PROCESS, 77);

        let collector = harness.collector();
        let processes = harness.processes.clone();
        let run = tokio::spawn(async move { collector.run().await });
        tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
        processes.exit(77);

        let report = run.await.unwrap().unwrap();

        assert_eq!(report.poll.outcome, PollOutcome::Completed);
        assert_eq!(report.poll.metrics.completion_tick(TaskKind::BootChart), Some(4));
        let copies = harness.tools.calls_to("cp");
        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0].args[1], report.boot_dir.display().to_string());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_success() {
        let harness = Harness::new("[Ghost]\nplotchart=no\n", "");
        harness.boot_settled();
        harness
            .properties
            .set_str(PropertyTarget::Service(BOOT_ANIMATION), RESULT, "failed");

        let report = harness.collector().run().await.unwrap();

        match report.poll.outcome {
            PollOutcome::TimedOut { pending } => assert!(pending.contains(TaskKind::BootTime)),
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!(!report.boot_dir.join("boottime").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_property_failure_aborts() {
        let harness = Harness::new("[Ghost]\nboottime=no\n", "");

        let err = harness.collector().run().await.unwrap_err();

        assert!(matches!(err, GhostError::Property(_)));
        // The boot record is created before polling starts
        assert!(harness.layout().record_dir(1).is_dir());
    }

    #[tokio::test]
    async fn test_missing_config_fails_before_sequencing() {
        let harness = Harness::new("", "");
        fs::remove_file(&harness.options.config_path).unwrap();

        let err = harness.collector().run().await.unwrap_err();

        assert!(matches!(err, GhostError::Config(_)));
        assert_eq!(err.exit_code(), libc::ENOENT as u8);
        assert!(!harness.layout().counter_file().exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_prunes_before_new_record() {
        let harness = Harness::new("[Ghost]\nboottime=no\nplotchart=no\n", "");
        let layout = harness.layout();
        layout.prepare().unwrap();
        let disk = FakeDiskProbe::new(100);
        for index in [4, 5] {
            fs::create_dir(layout.record_dir(index)).unwrap();
            disk.size_path(layout.record_dir(index), 2);
        }

        let collector = Collector::with_backends(
            harness.options.clone(),
            harness.properties.clone(),
            harness.tools.clone(),
            Arc::new(disk),
            harness.processes.clone(),
        );
        let report = collector.run().await.unwrap();

        assert_eq!(report.boot_index, 6);
        assert_eq!(report.quota.deleted, vec![4]);
        assert_eq!(layout.record_indices().unwrap(), vec![5, 6]);
    }
}
