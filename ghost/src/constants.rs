//! Collector constants.
//!
//! Centralized location for paths, unit names and limits.

/// Default filesystem locations.
pub mod paths {
    /// Configuration file with the task toggles
    pub const CONFIG_FILE: &str = "/etc/ghost.conf";

    /// Root of the diagnostics archive
    pub const ARCHIVE_ROOT: &str = "/var/log/ghost";

    /// Kernel command line
    pub const KERNEL_CMDLINE: &str = "/proc/cmdline";

    /// Runtime directory where bootchart drops its output
    pub const RUNTIME_LOG_DIR: &str = "/run/log";
}

/// Names inside the archive.
pub mod archive {
    /// Subdirectory holding one record per boot
    pub const BOOT_DIR: &str = "boot";

    /// Persisted boot counter, relative to the archive root
    pub const BOOT_COUNTER: &str = "bootcount";

    /// Symlink to the most recent boot record, relative to the boot directory
    pub const CURRENT_LINK: &str = "current";

    /// Boot-animation timing record
    pub const BOOTTIME_FILE: &str = "boottime";

    /// Rendered service start-up chart
    pub const PLOTCHART_FILE: &str = "plotchart.svg";

    /// Prefix of bootchart output files
    pub const BOOTCHART_PREFIX: &str = "bootchart-";
}

/// Service manager targets and properties.
pub mod units {
    pub const BOOT_ANIMATION: &str = "boot-animation.service";
    pub const DEFAULT_TARGET: &str = "default.target";

    pub const ACTIVE_STATE: &str = "ActiveState";
    pub const INACTIVE_ENTER_TIMESTAMP: &str = "InactiveEnterTimestampMonotonic";
    pub const RESULT: &str = "Result";
    pub const EXEC_MAIN_EXIT_TIMESTAMP: &str = "ExecMainExitTimestampMonotonic";
    pub const N_JOBS: &str = "NJobs";
}

/// External programs.
pub mod tools {
    pub const DF: &str = "df";
    pub const DU: &str = "du";
    pub const CP: &str = "cp";
    pub const SYSTEMCTL: &str = "systemctl";
    pub const SYSTEMD_ANALYZE: &str = "systemd-analyze";

    /// Process name of the bootchart collector
    pub const BOOTCHART_PROCESS: &str = "systemd-bootchart";

    /// Kernel argument that boots through bootchart
    pub const BOOTCHART_INIT_ARG: &str = "init=/usr/lib/systemd/systemd-bootchart";
}

/// Polling and quota limits.
pub mod limits {
    use std::time::Duration;

    /// Archive usage, in percent of filesystem capacity, at which pruning starts
    pub const DISK_USAGE_THRESHOLD_RATIO: u64 = 3;

    /// Maximum number of poll ticks before giving up
    pub const MAX_POLL_TICKS: u32 = 120;

    /// Delay between poll ticks
    pub const POLL_INTERVAL: Duration = Duration::from_secs(1);
}
