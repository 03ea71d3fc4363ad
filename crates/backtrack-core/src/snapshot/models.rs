use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{BacktrackError, Result};

/// Where a snapshot's `captured_at` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampSource {
    /// Directory creation time reported by the filesystem.
    Created,
    /// Unix-millisecond timestamp leading the conversation id.
    ConversationId,
    /// Directory modification time.
    Modified,
}

/// One captured file inside a conversation snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Where the live file belongs.
    pub original_path: PathBuf,
    /// Where the captured copy lives.
    pub snapshot_path: PathBuf,
    /// The live file did not exist before the conversation and is deleted on revert.
    pub is_new_file: bool,
}

/// Everything captured for one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotSet {
    pub conversation_id: String,
    pub snapshot_directory: PathBuf,
    pub captured_at: DateTime<Utc>,
    pub timestamp_source: TimestampSource,
    pub entries: Vec<SnapshotEntry>,
}

impl SnapshotSet {
    pub fn new_file_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_new_file).count()
    }

    pub fn modified_file_count(&self) -> usize {
        self.entries.len() - self.new_file_count()
    }

    /// Recursively delete the snapshot directory.
    pub(crate) async fn remove_directory(&self) -> Result<()> {
        tokio::fs::remove_dir_all(&self.snapshot_directory)
            .await
            .map_err(|source| BacktrackError::Cleanup {
                path: self.snapshot_directory.clone(),
                source,
            })
    }
}

/// Order snapshots newest first.
///
/// Equal timestamps fall back to the conversation id, descending, so the
/// ordering is total.
pub fn sort_newest_first(sets: &mut [SnapshotSet]) {
    sets.sort_by(|a, b| {
        b.captured_at
            .cmp(&a.captured_at)
            .then_with(|| b.conversation_id.cmp(&a.conversation_id))
    });
}
