//! Disk capacity and archive usage measurement.
//!
//! Two probes are provided:
//! - [`ToolDiskProbe`]: runs `df -Pk` / `du -sk` and decodes their output
//! - [`NativeDiskProbe`]: `statvfs(2)` plus a directory walk

mod native;
mod parse;

pub use native::NativeDiskProbe;
pub use parse::{FilesystemUsage, TreeUsage};

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::constants::tools::{DF, DU};
use crate::errors::GhostResult;
use crate::util::{ToolInvocation, ToolRunner};

/// Measures the archive's filesystem and the archive tree itself.
#[async_trait]
pub trait DiskProbe: Send + Sync {
    /// Capacity of the filesystem holding `path`, in KiB blocks.
    async fn filesystem(&self, path: &Path) -> GhostResult<FilesystemUsage>;

    /// Recursive usage of the tree at `path`, in KiB blocks.
    async fn tree_usage(&self, path: &Path) -> GhostResult<u64>;
}

/// Disk probe shelling out to `df` and `du`.
pub struct ToolDiskProbe {
    runner: Arc<dyn ToolRunner>,
}

impl ToolDiskProbe {
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl DiskProbe for ToolDiskProbe {
    async fn filesystem(&self, path: &Path) -> GhostResult<FilesystemUsage> {
        let invocation = ToolInvocation::new(DF)
            .arg("-Pk")
            .arg(path.display().to_string())
            .c_locale();
        let output = self
            .runner
            .run(&invocation)
            .await?
            .require_success(&invocation)?;

        FilesystemUsage::parse_df(&output.stdout_text())
    }

    async fn tree_usage(&self, path: &Path) -> GhostResult<u64> {
        let invocation = ToolInvocation::new(DU)
            .arg("-sk")
            .arg(path.display().to_string())
            .c_locale();
        let output = self
            .runner
            .run(&invocation)
            .await?
            .require_success(&invocation)?;

        Ok(TreeUsage::parse_du(&output.stdout_text())?.blocks)
    }
}
