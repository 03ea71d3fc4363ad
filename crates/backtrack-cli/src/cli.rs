use anyhow::Result;
use backtrack_core::BackupManager;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use crate::render;

#[derive(Debug, Parser)]
#[command(name = "backtrack")]
#[command(about = "Backtrack - undo the file edits of AI conversations")]
#[command(version)]
pub struct Cli {
    /// Project root (default: detected from the current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Settings file (default: ~/.config/backtrack/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// List conversation backups, newest first
    List,
    /// Undo the edits of one conversation
    Revert {
        /// Conversation id
        id: String,
    },
    /// Roll back to just before a conversation, undoing it and every newer one
    RevertTo {
        /// Conversation id
        id: String,
    },
    /// Show what revert-to would change without touching any file
    Preview {
        /// Conversation id
        id: String,
    },
    /// Show backup statistics
    Stats,
    /// Delete old backups
    Cleanup {
        /// Number of newest backups to keep (default: from settings)
        #[arg(short, long)]
        keep: Option<usize>,
    },
}

/// Rendered outcome of one command.
#[derive(Debug, Clone)]
pub struct Report {
    pub output: String,
    pub success: bool,
}

impl Report {
    fn new<T: Serialize>(value: &T, json: bool, text: String, success: bool) -> Result<Self> {
        let output = if json {
            serde_json::to_string_pretty(value)?
        } else {
            text
        };
        Ok(Self { output, success })
    }
}

pub async fn execute(command: &Command, manager: &BackupManager, json: bool) -> Result<Report> {
    match command {
        Command::List => {
            let snapshots = manager.list_snapshots().await;
            Report::new(&snapshots, json, render::snapshots(&snapshots), true)
        }
        Command::Revert { id } => {
            let result = manager.revert_conversation(id).await;
            let text = render::revert_result(&result);
            Report::new(&result, json, text, result.success)
        }
        Command::RevertTo { id } => {
            let summary = manager.revert_to_conversation(id).await;
            let text = render::revert_summary(id, &summary);
            Report::new(&summary, json, text, summary.success)
        }
        Command::Preview { id } => match manager.preview_revert_to(id).await {
            Some(preview) => Report::new(&preview, json, render::preview(&preview), true),
            None => {
                let message = format!("Backup not found for conversation: {id}");
                let value = serde_json::json!({ "error": &message });
                Report::new(&value, json, message, false)
            }
        },
        Command::Stats => {
            let stats = manager.get_stats().await;
            Report::new(&stats, json, render::stats(&stats), true)
        }
        Command::Cleanup { keep } => {
            let report = match keep {
                Some(keep) => manager.cleanup(*keep).await,
                None => manager.cleanup_default().await,
            };
            Report::new(&report, json, render::cleanup(&report), report.success())
        }
    }
}
