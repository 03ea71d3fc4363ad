use std::sync::Arc;

use crate::config::BackupSettings;
use crate::project::ProjectContext;
use crate::retention::{BackupStats, CleanupReport, RetentionManager};
use crate::revert::{RevertEngine, RevertPreview, RevertResult, RevertSummary};
use crate::snapshot::{SnapshotCatalog, SnapshotSet};

/// Entry point for the surrounding application.
///
/// Callers must serialize access: two operations running at once against
/// the same backup directory are not coordinated.
#[derive(Debug, Clone)]
pub struct BackupManager {
    catalog: SnapshotCatalog,
    revert: RevertEngine,
    retention: RetentionManager,
}

impl BackupManager {
    pub fn new(project: Arc<dyn ProjectContext>, layout: BackupSettings) -> Self {
        let catalog = SnapshotCatalog::new(project, layout);
        Self {
            revert: RevertEngine::new(catalog.clone()),
            retention: RetentionManager::new(catalog.clone()),
            catalog,
        }
    }

    pub fn catalog(&self) -> &SnapshotCatalog {
        &self.catalog
    }

    pub async fn list_snapshots(&self) -> Vec<SnapshotSet> {
        self.catalog.list_snapshots().await
    }

    pub async fn revert_conversation(&self, conversation_id: &str) -> RevertResult {
        self.revert.revert_conversation(conversation_id).await
    }

    pub async fn revert_snapshot(&self, set: &SnapshotSet) -> RevertResult {
        self.revert.revert_snapshot(set).await
    }

    pub async fn revert_to_conversation(&self, conversation_id: &str) -> RevertSummary {
        self.revert.revert_to_conversation(conversation_id).await
    }

    pub async fn preview_revert_to(&self, conversation_id: &str) -> Option<RevertPreview> {
        self.revert.preview_revert_to(conversation_id).await
    }

    pub async fn get_stats(&self) -> BackupStats {
        self.retention.get_stats().await
    }

    pub async fn cleanup(&self, keep_count: usize) -> CleanupReport {
        self.retention.cleanup(keep_count).await
    }

    pub async fn prune<'a>(
        &self,
        sets: impl IntoIterator<Item = &'a SnapshotSet>,
    ) -> CleanupReport {
        self.retention.prune(sets).await
    }

    pub async fn cleanup_default(&self) -> CleanupReport {
        self.retention.cleanup_default().await
    }
}
