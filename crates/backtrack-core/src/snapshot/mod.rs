mod catalog;
mod models;

pub use catalog::SnapshotCatalog;
pub use models::{sort_newest_first, SnapshotEntry, SnapshotSet, TimestampSource};
