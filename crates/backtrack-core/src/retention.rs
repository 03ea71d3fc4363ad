use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::snapshot::{SnapshotCatalog, SnapshotSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackupStats {
    pub total_backups: usize,
    pub total_files: usize,
    pub oldest_backup: Option<DateTime<Utc>>,
    pub newest_backup: Option<DateTime<Utc>>,
    pub total_size_bytes: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub cleaned: usize,
    pub errors: Vec<String>,
}

impl CleanupReport {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Aggregate statistics and pruning of old snapshots.
#[derive(Debug, Clone)]
pub struct RetentionManager {
    catalog: SnapshotCatalog,
}

impl RetentionManager {
    pub fn new(catalog: SnapshotCatalog) -> Self {
        Self { catalog }
    }

    pub async fn get_stats(&self) -> BackupStats {
        let snapshots = self.catalog.list_snapshots().await;

        let mut stats = BackupStats {
            total_backups: snapshots.len(),
            newest_backup: snapshots.first().map(|s| s.captured_at),
            oldest_backup: snapshots.last().map(|s| s.captured_at),
            ..Default::default()
        };

        for entry in snapshots.iter().flat_map(|s| &s.entries) {
            stats.total_files += 1;
            // Files that vanish or cannot be stat'd are left out of the size.
            if let Ok(metadata) = tokio::fs::metadata(&entry.snapshot_path).await {
                stats.total_size_bytes += metadata.len();
            }
        }

        stats
    }

    /// Delete every snapshot beyond the newest `keep_count`, oldest first.
    pub async fn cleanup(&self, keep_count: usize) -> CleanupReport {
        let snapshots = self.catalog.list_snapshots().await;
        let report = self.prune(snapshots.iter().skip(keep_count).rev()).await;

        tracing::info!(
            "Cleanup kept {} snapshots, removed {}, {} errors",
            snapshots.len().min(keep_count),
            report.cleaned,
            report.errors.len()
        );
        report
    }

    /// Remove the given snapshot directories in order.
    ///
    /// A failed removal is recorded and the rest are still attempted; only
    /// successful removals count towards `cleaned`.
    pub async fn prune<'a>(
        &self,
        sets: impl IntoIterator<Item = &'a SnapshotSet>,
    ) -> CleanupReport {
        let mut report = CleanupReport::default();
        for set in sets {
            match set.remove_directory().await {
                Ok(()) => {
                    tracing::debug!("Pruned snapshot {}", set.conversation_id);
                    report.cleaned += 1;
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    report.errors.push(e.to_string());
                }
            }
        }
        report
    }

    /// [`cleanup`](Self::cleanup) with the configured keep count.
    pub async fn cleanup_default(&self) -> CleanupReport {
        self.cleanup(self.catalog.layout().keep_count).await
    }
}
