pub mod config;
pub mod error;
pub mod manager;
pub mod project;
pub mod retention;
pub mod revert;
pub mod snapshot;

// Re-export key types
pub use config::{BackupSettings, Settings};
pub use error::BacktrackError;
pub use manager::BackupManager;
pub use project::{FixedProject, ProjectContext, SharedProject, WorkspaceProject};
pub use retention::{BackupStats, CleanupReport, RetentionManager};
pub use revert::{RevertEngine, RevertPreview, RevertResult, RevertSummary};
pub use snapshot::{SnapshotCatalog, SnapshotEntry, SnapshotSet, TimestampSource};
