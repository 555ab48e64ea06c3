//! On-disk archive of per-boot diagnostics.
//!
//! ```text
//! <root>/
//! ├── bootcount           # last issued boot index
//! └── boot/
//!     ├── 12/             # one record per boot
//!     ├── 13/
//!     └── current -> 13
//! ```

mod quota;
mod sequencer;

pub use quota::{QuotaReport, enforce_quota};
pub use sequencer::{next_boot_index, prepare_working_dir, read_counter};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::constants::archive::{BOOT_COUNTER, BOOT_DIR, CURRENT_LINK};
use crate::errors::{GhostError, GhostResult};

/// Paths of an archive rooted at one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    root: PathBuf,
}

impl ArchiveLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn boot_dir(&self) -> PathBuf {
        self.root.join(BOOT_DIR)
    }

    pub fn counter_file(&self) -> PathBuf {
        self.root.join(BOOT_COUNTER)
    }

    pub fn current_link(&self) -> PathBuf {
        self.boot_dir().join(CURRENT_LINK)
    }

    pub fn record_dir(&self, index: u64) -> PathBuf {
        self.boot_dir().join(index.to_string())
    }

    /// Create the root and boot directories if missing.
    pub fn prepare(&self) -> GhostResult<()> {
        let boot_dir = self.boot_dir();
        fs::create_dir_all(&boot_dir).map_err(|e| {
            GhostError::storage(format!("Failed to create {}", boot_dir.display()), e)
        })
    }

    /// Indices of the boot records present, ascending.
    ///
    /// Only real directories whose names are all ASCII digits count; the
    /// `current` link and stray files are skipped. A missing boot directory
    /// yields an empty list.
    pub fn record_indices(&self) -> GhostResult<Vec<u64>> {
        let boot_dir = self.boot_dir();
        let entries = match fs::read_dir(&boot_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(GhostError::storage(
                    format!("Failed to list {}", boot_dir.display()),
                    e,
                ));
            }
        };

        let mut indices = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                GhostError::storage(format!("Failed to list {}", boot_dir.display()), e)
            })?;
            // file_type() does not follow symlinks
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }
            if let Some(index) = entry.file_name().to_str().and_then(parse_record_name) {
                indices.push(index);
            }
        }

        indices.sort_unstable();
        Ok(indices)
    }
}

fn parse_record_name(name: &str) -> Option<u64> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}
