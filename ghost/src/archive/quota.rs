//! Disk quota enforcement over boot records.

use std::fs;

use super::ArchiveLayout;
use crate::disk::DiskProbe;
use crate::errors::{GhostError, GhostResult};

/// What a quota pass observed and removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaReport {
    /// Archive usage in percent of filesystem capacity, before pruning
    pub ratio_before: u64,
    /// Usage after pruning; equal to `ratio_before` when nothing was removed
    pub ratio_after: u64,
    /// Removed record indices, in removal order
    pub deleted: Vec<u64>,
}

/// Remove the oldest boot records while the archive uses `threshold` percent
/// or more of its filesystem.
///
/// Stops as soon as usage drops below the threshold or no records remain.
/// Entries that are not numbered record directories are never touched.
pub async fn enforce_quota(
    layout: &ArchiveLayout,
    probe: &dyn DiskProbe,
    threshold: u64,
) -> GhostResult<QuotaReport> {
    let root = layout.root();
    let capacity = probe.filesystem(root).await?;
    if capacity.total_blocks == 0 {
        return Err(GhostError::Decode(format!(
            "Filesystem of {} reports zero capacity",
            root.display()
        )));
    }
    let total = capacity.total_blocks;
    let ratio = |usage: u64| usage.saturating_mul(100) / total;

    let ratio_before = ratio(probe.tree_usage(root).await?);
    let mut report = QuotaReport {
        ratio_before,
        ratio_after: ratio_before,
        deleted: Vec::new(),
    };

    if ratio_before < threshold {
        tracing::debug!(ratio = ratio_before, threshold, "Archive within quota");
        return Ok(report);
    }

    tracing::info!(
        ratio = ratio_before,
        threshold,
        total_blocks = total,
        "Archive over quota, pruning oldest boot records"
    );

    for index in layout.record_indices()? {
        let record = layout.record_dir(index);
        fs::remove_dir_all(&record).map_err(|e| {
            GhostError::storage(format!("Failed to delete {}", record.display()), e)
        })?;
        report.deleted.push(index);
        tracing::info!(boot_index = index, "Deleted boot record");

        report.ratio_after = ratio(probe.tree_usage(root).await?);
        if report.ratio_after < threshold {
            break;
        }
    }

    if report.ratio_after >= threshold {
        tracing::warn!(
            ratio = report.ratio_after,
            threshold,
            "Archive still over quota with no boot records left"
        );
    }

    Ok(report)
}
