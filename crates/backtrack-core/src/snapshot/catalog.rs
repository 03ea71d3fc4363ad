use chrono::{DateTime, Utc};
use ignore::WalkBuilder;
use std::ffi::{OsStr, OsString};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::models::{sort_newest_first, SnapshotEntry, SnapshotSet, TimestampSource};
use crate::config::BackupSettings;
use crate::error::{BacktrackError, Result};
use crate::project::{ProjectContext, ProjectContextAdapter};

/// Length of a Unix-millisecond timestamp for any date between 2001 and 2286.
const MILLIS_TIMESTAMP_LEN: usize = 13;

/// Discovers conversation snapshots under the active project's backup directory.
#[derive(Debug, Clone)]
pub struct SnapshotCatalog {
    project: ProjectContextAdapter,
    layout: BackupSettings,
}

impl SnapshotCatalog {
    pub fn new(project: Arc<dyn ProjectContext>, layout: BackupSettings) -> Self {
        Self {
            project: ProjectContextAdapter::new(project),
            layout,
        }
    }

    pub fn layout(&self) -> &BackupSettings {
        &self.layout
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.project.backup_dir(&self.layout)
    }

    /// List every readable snapshot, newest first.
    ///
    /// A missing backup directory yields an empty list. Snapshot directories
    /// that cannot be read are skipped with a warning.
    pub async fn list_snapshots(&self) -> Vec<SnapshotSet> {
        let paths = self.project.paths(&self.layout);
        let backup_dir = &paths.backup_dir;

        let mut dir = match tokio::fs::read_dir(backup_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!("Cannot read {}: {}", backup_dir.display(), e);
                return Vec::new();
            }
        };

        let mut sets = Vec::new();
        loop {
            let entry = match dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Stopped scanning {}: {}", backup_dir.display(), e);
                    break;
                }
            };

            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                tracing::debug!("Ignoring non UTF-8 name {:?} in {}", name, backup_dir.display());
                continue;
            };
            let Some(conversation_id) = self.layout.parse_directory_name(name) else {
                continue;
            };

            match self.load_snapshot(&paths.root, entry.path(), conversation_id).await {
                Ok(set) => sets.push(set),
                Err(e) => tracing::warn!("Skipping snapshot: {}", e),
            }
        }

        sort_newest_first(&mut sets);
        sets
    }

    /// Load the snapshot of one conversation, if it exists and is readable.
    pub async fn find_snapshot(&self, conversation_id: &str) -> Option<SnapshotSet> {
        if conversation_id.is_empty() || conversation_id.contains(std::path::is_separator) {
            return None;
        }

        let paths = self.project.paths(&self.layout);
        let directory = paths
            .backup_dir
            .join(self.layout.directory_name_for(conversation_id));
        if tokio::fs::symlink_metadata(&directory).await.is_err() {
            return None;
        }

        match self
            .load_snapshot(&paths.root, directory, conversation_id.to_string())
            .await
        {
            Ok(set) => Some(set),
            Err(e) => {
                tracing::warn!("Skipping snapshot: {}", e);
                None
            }
        }
    }

    async fn load_snapshot(
        &self,
        root: &Path,
        directory: PathBuf,
        conversation_id: String,
    ) -> Result<SnapshotSet> {
        let metadata = tokio::fs::metadata(&directory)
            .await
            .map_err(|e| BacktrackError::catalog(&directory, e))?;
        if !metadata.is_dir() {
            return Err(BacktrackError::catalog(&directory, "not a directory"));
        }

        let (captured_at, timestamp_source) = captured_at(&metadata, &conversation_id)
            .ok_or_else(|| BacktrackError::catalog(&directory, "no usable timestamp"))?;
        let entries = self.collect_entries(root, &directory)?;

        tracing::debug!(
            "Found snapshot {} with {} files",
            conversation_id,
            entries.len()
        );

        Ok(SnapshotSet {
            conversation_id,
            snapshot_directory: directory,
            captured_at,
            timestamp_source,
            entries,
        })
    }

    fn collect_entries(&self, root: &Path, directory: &Path) -> Result<Vec<SnapshotEntry>> {
        let mut builder = WalkBuilder::new(directory);
        builder
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b));

        let mut entries = Vec::new();
        for result in builder.build() {
            let entry = result.map_err(|e| BacktrackError::catalog(directory, e))?;
            if entry.depth() == 0 || !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let snapshot_path = entry.into_path();
            let relative = snapshot_path
                .strip_prefix(directory)
                .map_err(|e| BacktrackError::catalog(directory, e))?;
            entries.push(self.classify(root, relative, &snapshot_path));
        }

        Ok(entries)
    }

    fn classify(&self, root: &Path, relative: &Path, snapshot_path: &Path) -> SnapshotEntry {
        let stem = relative
            .file_name()
            .and_then(|n| strip_marker(n, &self.layout));

        match stem {
            Some(stem) => SnapshotEntry {
                original_path: root.join(relative.with_file_name(stem)),
                snapshot_path: snapshot_path.to_path_buf(),
                is_new_file: true,
            },
            None => SnapshotEntry {
                original_path: root.join(relative),
                snapshot_path: snapshot_path.to_path_buf(),
                is_new_file: false,
            },
        }
    }
}

fn strip_marker(name: &OsStr, layout: &BackupSettings) -> Option<OsString> {
    match name.to_str() {
        Some(name) => layout.strip_new_file_marker(name).map(OsString::from),
        None => strip_marker_bytes(name, &layout.new_file_marker),
    }
}

#[cfg(unix)]
fn strip_marker_bytes(name: &OsStr, marker: &str) -> Option<OsString> {
    use std::os::unix::ffi::OsStrExt;

    let stem = name.as_bytes().strip_suffix(marker.as_bytes())?;
    if stem.is_empty() {
        return None;
    }
    Some(OsStr::from_bytes(stem).to_os_string())
}

#[cfg(not(unix))]
fn strip_marker_bytes(name: &OsStr, _marker: &str) -> Option<OsString> {
    tracing::debug!("Treating non UTF-8 name {:?} as a modified file", name);
    None
}

/// Pick the capture time of a snapshot directory.
///
/// Creation time first, then a millisecond timestamp leading the id, then
/// modification time.
fn captured_at(
    metadata: &Metadata,
    conversation_id: &str,
) -> Option<(DateTime<Utc>, TimestampSource)> {
    if let Ok(created) = metadata.created() {
        return Some((created.into(), TimestampSource::Created));
    }
    if let Some(embedded) = timestamp_from_id(conversation_id) {
        return Some((embedded, TimestampSource::ConversationId));
    }
    metadata
        .modified()
        .ok()
        .map(|modified| (modified.into(), TimestampSource::Modified))
}

fn timestamp_from_id(conversation_id: &str) -> Option<DateTime<Utc>> {
    let leading = conversation_id.split('-').next()?;
    if leading.len() != MILLIS_TIMESTAMP_LEN || !leading.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    DateTime::from_timestamp_millis(leading.parse().ok()?)
}
