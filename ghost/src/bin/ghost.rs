//! Boot diagnostics collector entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ghost::constants::paths::{ARCHIVE_ROOT, CONFIG_FILE};
use ghost::logging::init_logging;
use ghost::poll::PollOutcome;
use ghost::{Collector, CollectorOptions, DiskProbeKind, GhostResult};

/// ghost - boot-time diagnostics collector
#[derive(Parser, Debug)]
#[command(name = "ghost")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Root of the diagnostics archive
    #[arg(long, default_value = ARCHIVE_ROOT)]
    archive_root: PathBuf,

    /// Log filter (trace, debug, info, warn, error); overrides RUST_LOG
    #[arg(long)]
    log_level: Option<String>,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// How archive disk usage is measured
    #[arg(long, value_enum, default_value_t = DiskProbeKind::Tools)]
    disk_probe: DiskProbeKind,
}

impl Args {
    fn options(&self) -> CollectorOptions {
        CollectorOptions {
            config_path: self.config.clone(),
            archive_root: self.archive_root.clone(),
            disk_probe: self.disk_probe,
            ..CollectorOptions::default()
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let _guard = match init_logging(args.log_level.as_deref(), args.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("ghost: {}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Boot diagnostics collection failed");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(args: &Args) -> GhostResult<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let collector = Collector::new(args.options());
    let report = runtime.block_on(collector.run())?;

    match report.poll.outcome {
        PollOutcome::Completed => tracing::info!(
            boot_index = report.boot_index,
            boot_dir = %report.boot_dir.display(),
            "Boot diagnostics collected"
        ),
        PollOutcome::TimedOut { pending } => tracing::warn!(
            boot_index = report.boot_index,
            %pending,
            "Boot diagnostics incomplete"
        ),
    }
    Ok(())
}
