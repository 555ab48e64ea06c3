//! Disk probe using `statvfs(2)` and a directory walk.

use std::os::unix::fs::MetadataExt;
use std::path::Path;

use async_trait::async_trait;
use nix::sys::statvfs::statvfs;
use walkdir::WalkDir;

use super::{DiskProbe, FilesystemUsage};
use crate::errors::{GhostError, GhostResult};

const KIB: u64 = 1024;

/// `st_blocks` is always counted in 512-byte units.
const STAT_BLOCK_SIZE: u64 = 512;

/// Measures without spawning external tools.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeDiskProbe;

#[async_trait]
impl DiskProbe for NativeDiskProbe {
    async fn filesystem(&self, path: &Path) -> GhostResult<FilesystemUsage> {
        let stat = statvfs(path).map_err(|e| {
            GhostError::storage(
                format!("Failed to statvfs {}", path.display()),
                std::io::Error::from(e),
            )
        })?;

        let fragment = stat.fragment_size() as u64;
        let total_blocks = stat.blocks() as u64 * fragment / KIB;
        let free_blocks = stat.blocks_free() as u64 * fragment / KIB;
        let available_blocks = stat.blocks_available() as u64 * fragment / KIB;
        let used_blocks = total_blocks.saturating_sub(free_blocks);

        // Same rounding as df: percentage of the space usable by non-root, rounded up.
        let usable = used_blocks + available_blocks;
        let use_percent =
            (usable > 0).then(|| used_blocks.saturating_mul(100).div_ceil(usable).min(100) as u8);

        Ok(FilesystemUsage {
            filesystem: "-".to_string(),
            total_blocks,
            used_blocks,
            available_blocks,
            use_percent,
            mount_point: path.display().to_string(),
        })
    }

    async fn tree_usage(&self, path: &Path) -> GhostResult<u64> {
        let mut bytes = 0u64;

        for entry in WalkDir::new(path).follow_links(false) {
            let entry = entry.map_err(|e| {
                let context = format!("Failed to walk {}", path.display());
                match e.into_io_error() {
                    Some(source) => GhostError::storage(context, source),
                    None => GhostError::Internal(context),
                }
            })?;
            let metadata = entry.metadata().map_err(|e| {
                GhostError::Internal(format!(
                    "Failed to stat {}: {}",
                    entry.path().display(),
                    e
                ))
            })?;
            bytes += metadata.blocks() * STAT_BLOCK_SIZE;
        }

        Ok(bytes / KIB)
    }
}
