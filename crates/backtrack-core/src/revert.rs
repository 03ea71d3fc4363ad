use serde::Serialize;
use std::path::PathBuf;

use crate::error::{BacktrackError, Result};
use crate::snapshot::{SnapshotCatalog, SnapshotEntry, SnapshotSet};

/// Outcome of reverting one conversation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RevertResult {
    pub conversation_id: String,
    pub success: bool,
    pub files_restored: Vec<PathBuf>,
    pub files_deleted: Vec<PathBuf>,
    pub errors: Vec<String>,
    /// The snapshot directory was removed after a clean revert.
    pub snapshot_removed: bool,
}

impl RevertResult {
    fn failed(conversation_id: &str, error: BacktrackError) -> Self {
        Self {
            conversation_id: conversation_id.to_string(),
            success: false,
            errors: vec![error.to_string()],
            ..Default::default()
        }
    }
}

/// Outcome of reverting a range of conversations, newest first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RevertSummary {
    pub success: bool,
    pub conversation_ids: Vec<String>,
    pub files_restored: usize,
    pub files_deleted: usize,
    pub errors: Vec<String>,
    pub results: Vec<RevertResult>,
}

impl RevertSummary {
    fn absorb(&mut self, result: RevertResult) {
        self.conversation_ids.push(result.conversation_id.clone());
        self.files_restored += result.files_restored.len();
        self.files_deleted += result.files_deleted.len();
        if !result.success {
            self.success = false;
        }
        self.errors.extend(result.errors.iter().cloned());
        self.results.push(result);
    }
}

/// What a revert would do to one conversation's files.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationPreview {
    pub conversation_id: String,
    pub files_to_restore: Vec<PathBuf>,
    pub files_to_delete: Vec<PathBuf>,
}

/// What `revert_to_conversation` would do, in replay order.
#[derive(Debug, Clone, Serialize)]
pub struct RevertPreview {
    pub target: String,
    pub conversations: Vec<ConversationPreview>,
}

impl RevertPreview {
    pub fn files_to_restore(&self) -> usize {
        self.conversations.iter().map(|c| c.files_to_restore.len()).sum()
    }

    pub fn files_to_delete(&self) -> usize {
        self.conversations.iter().map(|c| c.files_to_delete.len()).sum()
    }
}

enum EntryOutcome {
    Restored(PathBuf),
    Deleted(PathBuf),
    AlreadyAbsent,
}

/// Puts live files back to the state captured in conversation snapshots.
///
/// Entries and conversations are processed one at a time. When several
/// conversations touched the same file, the last write wins, so ranges are
/// replayed newest to oldest.
#[derive(Debug, Clone)]
pub struct RevertEngine {
    catalog: SnapshotCatalog,
}

impl RevertEngine {
    pub fn new(catalog: SnapshotCatalog) -> Self {
        Self { catalog }
    }

    /// Undo one conversation's edits.
    pub async fn revert_conversation(&self, conversation_id: &str) -> RevertResult {
        match self.catalog.find_snapshot(conversation_id).await {
            Some(set) => self.revert_snapshot(&set).await,
            None => {
                RevertResult::failed(conversation_id, BacktrackError::not_found(conversation_id))
            }
        }
    }

    /// Roll the project back to just before `target_id` began, undoing it and
    /// every newer conversation.
    pub async fn revert_to_conversation(&self, target_id: &str) -> RevertSummary {
        let snapshots = self.catalog.list_snapshots().await;
        let Some(index) = snapshots.iter().position(|s| s.conversation_id == target_id) else {
            return RevertSummary {
                success: false,
                errors: vec![BacktrackError::not_found(target_id).to_string()],
                ..Default::default()
            };
        };

        let mut summary = RevertSummary {
            success: true,
            ..Default::default()
        };
        for set in &snapshots[..=index] {
            summary.absorb(self.revert_snapshot(set).await);
        }

        tracing::info!(
            "Reverted to before {}: {} conversations, {} restored, {} deleted, {} errors",
            target_id,
            summary.conversation_ids.len(),
            summary.files_restored,
            summary.files_deleted,
            summary.errors.len()
        );
        summary
    }

    /// Report what `revert_to_conversation` would change without touching disk.
    pub async fn preview_revert_to(&self, target_id: &str) -> Option<RevertPreview> {
        let snapshots = self.catalog.list_snapshots().await;
        let index = snapshots.iter().position(|s| s.conversation_id == target_id)?;

        let mut conversations = Vec::with_capacity(index + 1);
        for set in &snapshots[..=index] {
            let mut preview = ConversationPreview {
                conversation_id: set.conversation_id.clone(),
                files_to_restore: Vec::new(),
                files_to_delete: Vec::new(),
            };
            for entry in &set.entries {
                if !entry.is_new_file {
                    preview.files_to_restore.push(entry.original_path.clone());
                } else if path_exists(&entry.original_path).await {
                    preview.files_to_delete.push(entry.original_path.clone());
                }
            }
            conversations.push(preview);
        }

        Some(RevertPreview {
            target: target_id.to_string(),
            conversations,
        })
    }

    /// Revert a snapshot already taken from the catalog.
    ///
    /// Live files are processed first; the snapshot directory is removed only
    /// when every entry succeeded. A failed removal is logged and leaves
    /// `success` set, with `snapshot_removed` false.
    pub async fn revert_snapshot(&self, set: &SnapshotSet) -> RevertResult {
        let mut result = RevertResult {
            conversation_id: set.conversation_id.clone(),
            ..Default::default()
        };

        for entry in &set.entries {
            match revert_entry(entry).await {
                Ok(EntryOutcome::Restored(path)) => result.files_restored.push(path),
                Ok(EntryOutcome::Deleted(path)) => result.files_deleted.push(path),
                Ok(EntryOutcome::AlreadyAbsent) => {}
                Err(e) => {
                    tracing::warn!("Revert of {}: {}", set.conversation_id, e);
                    result.errors.push(e.to_string());
                }
            }
        }

        result.success = result.errors.is_empty();
        if result.success {
            match set.remove_directory().await {
                Ok(()) => result.snapshot_removed = true,
                Err(e) => tracing::warn!("{}", e),
            }
        }

        tracing::info!(
            "Reverted conversation {}: {} restored, {} deleted, {} errors",
            set.conversation_id,
            result.files_restored.len(),
            result.files_deleted.len(),
            result.errors.len()
        );
        result
    }
}

async fn revert_entry(entry: &SnapshotEntry) -> Result<EntryOutcome> {
    let live = &entry.original_path;

    if entry.is_new_file {
        return match tokio::fs::remove_file(live).await {
            Ok(()) => {
                tracing::debug!("Deleted {}", live.display());
                Ok(EntryOutcome::Deleted(live.clone()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(EntryOutcome::AlreadyAbsent),
            Err(source) => Err(BacktrackError::Delete {
                path: live.clone(),
                source,
            }),
        };
    }

    let content = tokio::fs::read(&entry.snapshot_path)
        .await
        .map_err(|source| BacktrackError::ReadSnapshot {
            path: entry.snapshot_path.clone(),
            source,
        })?;

    let restore_err = |source: std::io::Error| BacktrackError::Restore {
        path: live.clone(),
        source,
    };
    if let Some(parent) = live.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(restore_err)?;
    }
    tokio::fs::write(live, content).await.map_err(restore_err)?;

    tracing::debug!("Restored {}", live.display());
    Ok(EntryOutcome::Restored(live.clone()))
}

async fn path_exists(path: &std::path::Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
