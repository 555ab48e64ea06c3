//! Collector configuration.
//!
//! `/etc/ghost.conf` toggles the optional diagnostic tasks:
//!
//! ```text
//! [Ghost]
//! boottime = yes
//! plotchart = yes
//! bootchart = no
//! ```

mod parser;

pub use parser::{
    Assignment, ConfigCallback, ConfigItem, MAX_SECTIONS, apply_bool, parse_boolean, parse_file,
    parse_str,
};

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Section holding the task toggles.
pub const GHOST_SECTION: &str = "Ghost";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to open config file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{source_name}:{line}: invalid section header: {header}")]
    InvalidSection {
        source_name: String,
        line: usize,
        header: String,
    },

    #[error("{source_name}:{line}: no '=' in assignment: {text}")]
    MissingAssignment {
        source_name: String,
        line: usize,
        text: String,
    },

    #[error("{source_name}: more than {max} sections")]
    TooManySections { source_name: String, max: usize },
}

impl ConfigError {
    pub(crate) fn errno(&self) -> i32 {
        match self {
            ConfigError::Open { source, .. } => source.raw_os_error().unwrap_or(libc::EIO),
            ConfigError::InvalidSection { .. } | ConfigError::MissingAssignment { .. } => {
                libc::EBADMSG
            }
            ConfigError::TooManySections { .. } => libc::EOVERFLOW,
        }
    }
}

/// Which optional diagnostic tasks are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GhostConfig {
    /// Record boot-animation completion time.
    pub boottime: bool,
    /// Render the service start-up chart once the boot settles.
    pub plotchart: bool,
    /// Copy bootchart output when the kernel booted through bootchart.
    pub bootchart: bool,
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self {
            boottime: true,
            plotchart: true,
            bootchart: false,
        }
    }
}

impl GhostConfig {
    fn table() -> [ConfigItem<GhostConfig>; 3] {
        [
            ConfigItem::new(GHOST_SECTION, "boottime", |c: &mut GhostConfig, a| {
                apply_bool(&mut c.boottime, a)
            }),
            ConfigItem::new(GHOST_SECTION, "plotchart", |c: &mut GhostConfig, a| {
                apply_bool(&mut c.plotchart, a)
            }),
            ConfigItem::new(GHOST_SECTION, "bootchart", |c: &mut GhostConfig, a| {
                apply_bool(&mut c.bootchart, a)
            }),
        ]
    }

    /// Load from a file, starting from the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        parse_file(path, &Self::table(), &mut config)?;
        tracing::debug!(path = %path.display(), ?config, "Loaded configuration");
        Ok(config)
    }

    /// Parse from in-memory content, starting from the defaults.
    pub fn from_str_named(source: &str, content: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        parse_str(source, content, &Self::table(), &mut config)?;
        Ok(config)
    }
}
