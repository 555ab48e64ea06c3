//! Boot index allocation and working directory setup.

use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::symlink;
use std::path::PathBuf;

use tempfile::NamedTempFile;

use super::ArchiveLayout;
use crate::errors::{GhostError, GhostResult};

/// Read the persisted boot counter.
///
/// A missing counter reads as 0. Content that does not start with a decimal
/// integer also reads as 0, with a warning.
pub fn read_counter(layout: &ArchiveLayout) -> GhostResult<u64> {
    let path = layout.counter_file();
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            return Err(GhostError::storage(
                format!("Failed to read {}", path.display()),
                e,
            ));
        }
    };

    let first_line = content.lines().next().unwrap_or("").trim();
    match first_line.parse::<u64>() {
        Ok(value) => Ok(value),
        Err(_) => {
            tracing::warn!(
                path = %path.display(),
                content = first_line,
                "Boot counter is not a number, treating as 0"
            );
            Ok(0)
        }
    }
}

/// Allocate and persist the index of this boot.
///
/// The index is one past the larger of the persisted counter and the
/// highest record present, so it never collides with an existing record.
pub fn next_boot_index(layout: &ArchiveLayout) -> GhostResult<u64> {
    let counter = read_counter(layout)?;
    let highest = layout.record_indices()?.last().copied().unwrap_or(0);

    let index = counter.max(highest).checked_add(1).ok_or_else(|| {
        GhostError::Internal(format!("Boot index overflow after {}", counter.max(highest)))
    })?;

    write_counter(layout, index)?;
    tracing::debug!(counter, highest, boot_index = index, "Allocated boot index");
    Ok(index)
}

fn write_counter(layout: &ArchiveLayout, index: u64) -> GhostResult<()> {
    let path = layout.counter_file();
    let context = || format!("Failed to write {}", path.display());

    let mut file =
        NamedTempFile::new_in(layout.root()).map_err(|e| GhostError::storage(context(), e))?;
    writeln!(file, "{}", index).map_err(|e| GhostError::storage(context(), e))?;
    file.as_file()
        .sync_all()
        .map_err(|e| GhostError::storage(context(), e))?;
    file.persist(&path)
        .map_err(|e| GhostError::storage(context(), e.error))?;
    Ok(())
}

/// Create the record for `index` and point `current` at it.
///
/// Fails if an entry named `index` already exists.
pub fn prepare_working_dir(layout: &ArchiveLayout, index: u64) -> GhostResult<PathBuf> {
    let record = layout.record_dir(index);
    fs::create_dir(&record)
        .map_err(|e| GhostError::storage(format!("Failed to create {}", record.display()), e))?;

    let current = layout.current_link();
    match fs::remove_file(&current) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(GhostError::storage(
                format!("Failed to remove {}", current.display()),
                e,
            ));
        }
    }

    symlink(index.to_string(), &current)
        .map_err(|e| GhostError::storage(format!("Failed to link {}", current.display()), e))?;

    tracing::debug!(record = %record.display(), "Prepared working directory");
    Ok(record)
}
