use backtrack_core::{BackupManager, BackupSettings, FixedProject};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct TestProject {
    _temp_dir: TempDir,
    root: PathBuf,
    manager: BackupManager,
}

impl TestProject {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        let manager = BackupManager::new(
            Arc::new(FixedProject::new(root.clone())),
            BackupSettings::default(),
        );
        Self {
            _temp_dir: temp_dir,
            root,
            manager,
        }
    }

    fn live(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    fn snapshot_dir(&self, id: &str) -> PathBuf {
        self.root
            .join(".backup")
            .join(format!("conversation-{id}-backup"))
    }

    async fn write_live(&self, relative: &str, content: &str) {
        write_file(&self.live(relative), content).await;
    }

    async fn read_live(&self, relative: &str) -> Option<String> {
        tokio::fs::read_to_string(self.live(relative)).await.ok()
    }

    /// Capture a snapshot with the given files, then wait so the next one
    /// gets a later timestamp.
    async fn capture(&self, id: &str, files: &[(&str, &str)]) {
        let dir = self.snapshot_dir(id);
        tokio::fs::create_dir_all(&dir).await.unwrap();
        for (relative, content) in files {
            write_file(&dir.join(relative), content).await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

async fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.unwrap();
    }
    tokio::fs::write(path, content).await.unwrap();
}

// ============================================================================
// revert_conversation
// ============================================================================

#[tokio::test]
async fn test_revert_restores_modified_file() {
    let project = TestProject::new();
    project.capture("abc", &[("notes.txt", "old")]).await;
    project.write_live("notes.txt", "new").await;

    let result = project.manager.revert_conversation("abc").await;

    assert!(result.success);
    assert!(result.errors.is_empty());
    assert_eq!(result.conversation_id, "abc");
    assert_eq!(result.files_restored, vec![project.live("notes.txt")]);
    assert!(result.files_deleted.is_empty());
    assert_eq!(project.read_live("notes.txt").await.as_deref(), Some("old"));
    assert!(result.snapshot_removed);
    assert!(!project.snapshot_dir("abc").exists());
}

#[tokio::test]
async fn test_revert_deletes_new_file() {
    let project = TestProject::new();
    project.capture("abc", &[("draft.md.init", "")]).await;
    project.write_live("draft.md", "written by the conversation").await;

    let result = project.manager.revert_conversation("abc").await;

    assert!(result.success);
    assert_eq!(result.files_deleted, vec![project.live("draft.md")]);
    assert!(result.files_restored.is_empty());
    assert!(!project.live("draft.md").exists());
    assert!(!project.snapshot_dir("abc").exists());
}

#[tokio::test]
async fn test_revert_new_file_already_absent_is_not_an_error() {
    let project = TestProject::new();
    project
        .capture("abc", &[("a.txt.init", ""), ("sub/b.txt.init", "")])
        .await;

    let result = project.manager.revert_conversation("abc").await;

    assert!(result.success);
    assert!(result.files_deleted.is_empty());
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn test_revert_recreates_missing_parent_directories() {
    let project = TestProject::new();
    project
        .capture("abc", &[("src/deep/nested/mod.rs", "pub fn f() {}")])
        .await;

    let result = project.manager.revert_conversation("abc").await;

    assert!(result.success);
    assert_eq!(
        project.read_live("src/deep/nested/mod.rs").await.as_deref(),
        Some("pub fn f() {}")
    );
}

#[tokio::test]
async fn test_revert_unknown_conversation() {
    let project = TestProject::new();
    project.capture("abc", &[("notes.txt", "old")]).await;

    let result = project.manager.revert_conversation("nope").await;

    assert!(!result.success);
    assert_eq!(
        result.errors,
        vec!["Backup not found for conversation: nope".to_string()]
    );
    assert!(result.files_restored.is_empty());
    assert!(project.snapshot_dir("abc").exists());
}

#[tokio::test]
async fn test_failed_entry_keeps_snapshot_and_continues() {
    let project = TestProject::new();
    project
        .capture("abc", &[("blocked/file.txt", "old"), ("ok.txt", "old ok")])
        .await;
    // A regular file where the restore needs a directory.
    project.write_live("blocked", "not a directory").await;
    project.write_live("ok.txt", "new ok").await;

    let result = project.manager.revert_conversation("abc").await;

    assert!(!result.success);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("Failed to restore"));
    assert!(result.errors[0].contains("file.txt"));
    assert_eq!(result.files_restored, vec![project.live("ok.txt")]);
    assert_eq!(project.read_live("ok.txt").await.as_deref(), Some("old ok"));
    assert!(!result.snapshot_removed);
    assert!(project.snapshot_dir("abc").exists());
}

#[tokio::test]
async fn test_failed_delete_is_reported() {
    let project = TestProject::new();
    project.capture("abc", &[("build.init", "")]).await;
    tokio::fs::create_dir_all(project.live("build")).await.unwrap();

    let result = project.manager.revert_conversation("abc").await;

    assert!(!result.success);
    assert!(result.errors[0].starts_with("Failed to delete"));
    assert!(project.live("build").is_dir());
    assert!(project.snapshot_dir("abc").exists());
}

#[tokio::test]
async fn test_clean_revert_survives_failed_snapshot_removal() {
    let project = TestProject::new();
    project.capture("abc", &[("notes.txt", "old")]).await;
    project.write_live("notes.txt", "new").await;
    project.write_live("stray.txt", "in the way").await;

    let mut set = project.manager.catalog().find_snapshot("abc").await.unwrap();
    // The snapshot directory was replaced by a regular file after listing.
    set.snapshot_directory = project.live("stray.txt");

    let result = project.manager.revert_snapshot(&set).await;

    assert!(result.success);
    assert!(result.errors.is_empty());
    assert!(!result.snapshot_removed);
    assert_eq!(result.files_restored, vec![project.live("notes.txt")]);
    assert_eq!(project.read_live("notes.txt").await.as_deref(), Some("old"));
    assert!(project.live("stray.txt").is_file());
}

/// Whether permission bits stop the current user from writing into `dir`.
#[cfg(unix)]
fn permissions_apply(dir: &Path) -> bool {
    let check = dir.join(".write-check");
    match std::fs::write(&check, "") {
        Ok(()) => {
            std::fs::remove_file(&check).unwrap();
            false
        }
        Err(_) => true,
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_read_only_backup_dir_keeps_snapshot_after_clean_revert() {
    use std::os::unix::fs::PermissionsExt;

    let project = TestProject::new();
    project.capture("abc", &[("notes.txt", "old")]).await;
    project.write_live("notes.txt", "new").await;
    let backup = project.root.join(".backup");
    std::fs::set_permissions(&backup, std::fs::Permissions::from_mode(0o555)).unwrap();
    if !permissions_apply(&backup) {
        std::fs::set_permissions(&backup, std::fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = project.manager.revert_conversation("abc").await;
    std::fs::set_permissions(&backup, std::fs::Permissions::from_mode(0o755)).unwrap();

    assert!(result.success);
    assert!(result.errors.is_empty());
    assert!(!result.snapshot_removed);
    assert_eq!(project.read_live("notes.txt").await.as_deref(), Some("old"));
    assert!(project.snapshot_dir("abc").exists());
}

#[tokio::test]
async fn test_revert_result_serializes() {
    let project = TestProject::new();
    project.capture("abc", &[("notes.txt", "old")]).await;

    let result = project.manager.revert_conversation("abc").await;
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["success"], true);
    assert_eq!(json["conversation_id"], "abc");
    assert_eq!(json["files_restored"].as_array().unwrap().len(), 1);
}

// ============================================================================
// revert_to_conversation
// ============================================================================

/// Three conversations editing the same file: "A" -> "B" -> "C" -> "D".
async fn three_conversations(project: &TestProject) {
    project.write_live("shared.txt", "A").await;
    project.capture("c1", &[("shared.txt", "A")]).await;
    project.write_live("shared.txt", "B").await;
    project.capture("c2", &[("shared.txt", "B")]).await;
    project.write_live("shared.txt", "C").await;
    project.capture("c3", &[("shared.txt", "C")]).await;
    project.write_live("shared.txt", "D").await;
}

#[tokio::test]
async fn test_revert_to_oldest_restores_its_snapshot() {
    let project = TestProject::new();
    three_conversations(&project).await;

    let summary = project.manager.revert_to_conversation("c1").await;

    assert!(summary.success);
    assert_eq!(summary.conversation_ids, vec!["c3", "c2", "c1"]);
    assert_eq!(summary.files_restored, 3);
    assert_eq!(summary.files_deleted, 0);
    assert!(summary.errors.is_empty());
    assert_eq!(project.read_live("shared.txt").await.as_deref(), Some("A"));
    assert!(project.manager.list_snapshots().await.is_empty());
}

#[tokio::test]
async fn test_revert_to_middle_keeps_older_snapshots() {
    let project = TestProject::new();
    three_conversations(&project).await;

    let summary = project.manager.revert_to_conversation("c2").await;

    assert!(summary.success);
    assert_eq!(summary.conversation_ids, vec!["c3", "c2"]);
    assert_eq!(project.read_live("shared.txt").await.as_deref(), Some("B"));

    let remaining: Vec<_> = project
        .manager
        .list_snapshots()
        .await
        .into_iter()
        .map(|s| s.conversation_id)
        .collect();
    assert_eq!(remaining, vec!["c1"]);
}

#[tokio::test]
async fn test_revert_to_unknown_changes_nothing() {
    let project = TestProject::new();
    three_conversations(&project).await;

    let summary = project.manager.revert_to_conversation("c9").await;

    assert!(!summary.success);
    assert_eq!(
        summary.errors,
        vec!["Backup not found for conversation: c9".to_string()]
    );
    assert!(summary.conversation_ids.is_empty());
    assert_eq!(project.read_live("shared.txt").await.as_deref(), Some("D"));
    assert_eq!(project.manager.list_snapshots().await.len(), 3);
}

#[tokio::test]
async fn test_revert_to_removes_files_created_in_range() {
    let project = TestProject::new();
    project.write_live("main.rs", "v1").await;
    project.capture("c1", &[("main.rs", "v1")]).await;
    project.write_live("main.rs", "v2").await;
    project
        .capture("c2", &[("main.rs", "v2"), ("helper.rs.init", "")])
        .await;
    project.write_live("main.rs", "v3").await;
    project.write_live("helper.rs", "fn helper() {}").await;

    let summary = project.manager.revert_to_conversation("c1").await;

    assert!(summary.success);
    assert_eq!(summary.files_restored, 2);
    assert_eq!(summary.files_deleted, 1);
    assert_eq!(project.read_live("main.rs").await.as_deref(), Some("v1"));
    assert!(!project.live("helper.rs").exists());
}

#[tokio::test]
async fn test_revert_to_continues_past_failed_conversation() {
    let project = TestProject::new();
    project.capture("c1", &[("a.txt", "a1")]).await;
    project
        .capture("c2", &[("blocked/x.txt", "x"), ("b.txt", "b2")])
        .await;
    project.write_live("blocked", "file in the way").await;
    project.write_live("a.txt", "a-live").await;

    let summary = project.manager.revert_to_conversation("c1").await;

    assert!(!summary.success);
    assert_eq!(summary.conversation_ids, vec!["c2", "c1"]);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.results.len(), 2);
    assert!(!summary.results[0].success);
    assert!(summary.results[1].success);
    assert_eq!(project.read_live("a.txt").await.as_deref(), Some("a1"));
    assert_eq!(project.read_live("b.txt").await.as_deref(), Some("b2"));
    assert!(project.snapshot_dir("c2").exists());
    assert!(!project.snapshot_dir("c1").exists());
}

// ============================================================================
// preview_revert_to
// ============================================================================

#[tokio::test]
async fn test_preview_does_not_touch_disk() {
    let project = TestProject::new();
    project.capture("c1", &[("a.txt", "a1")]).await;
    project
        .capture("c2", &[("b.txt", "b1"), ("gone.txt.init", ""), ("here.txt.init", "")])
        .await;
    project.write_live("a.txt", "a-live").await;
    project.write_live("here.txt", "created").await;

    let preview = project.manager.preview_revert_to("c1").await.unwrap();

    assert_eq!(preview.target, "c1");
    assert_eq!(preview.conversations.len(), 2);
    assert_eq!(preview.conversations[0].conversation_id, "c2");
    assert_eq!(
        preview.conversations[0].files_to_delete,
        vec![project.live("here.txt")]
    );
    assert_eq!(preview.files_to_restore(), 2);
    assert_eq!(preview.files_to_delete(), 1);

    assert_eq!(project.read_live("a.txt").await.as_deref(), Some("a-live"));
    assert!(project.live("here.txt").exists());
    assert_eq!(project.manager.list_snapshots().await.len(), 2);
}

#[tokio::test]
async fn test_preview_unknown_conversation() {
    let project = TestProject::new();
    project.capture("c1", &[("a.txt", "a1")]).await;

    assert!(project.manager.preview_revert_to("missing").await.is_none());
}
