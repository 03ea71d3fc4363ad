//! Plain-text rendering of engine results.

use backtrack_core::{
    BackupStats, CleanupReport, RevertPreview, RevertResult, RevertSummary, SnapshotSet,
};
use chrono::{DateTime, Utc};
use std::fmt::Write;

fn timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Human-readable byte count, e.g. `1.5 KB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

pub fn snapshots(sets: &[SnapshotSet]) -> String {
    if sets.is_empty() {
        return "No backups found.".to_string();
    }

    let mut out = String::new();
    for set in sets {
        let _ = writeln!(
            out,
            "{}  {}  {} modified, {} new",
            set.conversation_id,
            timestamp(&set.captured_at),
            set.modified_file_count(),
            set.new_file_count()
        );
    }
    out.trim_end().to_string()
}

fn push_errors(out: &mut String, errors: &[String]) {
    if !errors.is_empty() {
        let _ = writeln!(out, "Errors:");
        for error in errors {
            let _ = writeln!(out, "  {error}");
        }
    }
}

pub fn revert_result(result: &RevertResult) -> String {
    let mut out = String::new();
    let status = if result.success { "Reverted" } else { "Failed to fully revert" };
    let _ = writeln!(out, "{status} conversation {}", result.conversation_id);
    for path in &result.files_restored {
        let _ = writeln!(out, "  restored {}", path.display());
    }
    for path in &result.files_deleted {
        let _ = writeln!(out, "  deleted  {}", path.display());
    }
    if result.success && !result.snapshot_removed {
        let _ = writeln!(out, "Backup directory could not be removed.");
    }
    push_errors(&mut out, &result.errors);
    out.trim_end().to_string()
}

pub fn revert_summary(target: &str, summary: &RevertSummary) -> String {
    let mut out = String::new();
    let status = if summary.success { "Reverted" } else { "Failed to fully revert" };
    let _ = writeln!(
        out,
        "{status} to before {target}: {} conversations, {} files restored, {} files deleted",
        summary.conversation_ids.len(),
        summary.files_restored,
        summary.files_deleted
    );
    if !summary.conversation_ids.is_empty() {
        let _ = writeln!(out, "  order: {}", summary.conversation_ids.join(" -> "));
    }
    push_errors(&mut out, &summary.errors);
    out.trim_end().to_string()
}

pub fn preview(preview: &RevertPreview) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Reverting to before {} would restore {} files and delete {} files:",
        preview.target,
        preview.files_to_restore(),
        preview.files_to_delete()
    );
    for conversation in &preview.conversations {
        let _ = writeln!(out, "{}", conversation.conversation_id);
        for path in &conversation.files_to_restore {
            let _ = writeln!(out, "  restore {}", path.display());
        }
        for path in &conversation.files_to_delete {
            let _ = writeln!(out, "  delete  {}", path.display());
        }
    }
    out.trim_end().to_string()
}

pub fn stats(stats: &BackupStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Backups:    {}", stats.total_backups);
    let _ = writeln!(out, "Files:      {}", stats.total_files);
    let _ = writeln!(out, "Total size: {}", format_size(stats.total_size_bytes));
    if let Some(newest) = &stats.newest_backup {
        let _ = writeln!(out, "Newest:     {}", timestamp(newest));
    }
    if let Some(oldest) = &stats.oldest_backup {
        let _ = writeln!(out, "Oldest:     {}", timestamp(oldest));
    }
    out.trim_end().to_string()
}

pub fn cleanup(report: &CleanupReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Removed {} old backups", report.cleaned);
    push_errors(&mut out, &report.errors);
    out.trim_end().to_string()
}
