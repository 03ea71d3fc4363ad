use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use super::workspace::find_workspace_root;
use crate::config::BackupSettings;

/// Supplies the currently active project, if any.
///
/// Implementations may change their answer between calls; the catalog asks
/// again on every listing.
pub trait ProjectContext: Send + Sync {
    fn current_project_path(&self) -> Option<PathBuf>;

    fn has_active_project(&self) -> bool {
        self.current_project_path().is_some()
    }
}

/// A project root fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct FixedProject {
    root: Option<PathBuf>,
}

impl FixedProject {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    pub fn none() -> Self {
        Self { root: None }
    }
}

impl ProjectContext for FixedProject {
    fn current_project_path(&self) -> Option<PathBuf> {
        self.root.clone()
    }
}

/// A project root that can be switched while the engine is in use.
#[derive(Debug, Clone, Default)]
pub struct SharedProject {
    root: Arc<RwLock<Option<PathBuf>>>,
}

impl SharedProject {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            root: Arc::new(RwLock::new(root)),
        }
    }

    pub fn set(&self, root: Option<PathBuf>) {
        let mut guard = self.root.write().unwrap_or_else(|e| e.into_inner());
        *guard = root;
    }
}

impl ProjectContext for SharedProject {
    fn current_project_path(&self) -> Option<PathBuf> {
        self.root.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Detects the project by walking up from a start directory.
#[derive(Debug, Clone)]
pub struct WorkspaceProject {
    start: PathBuf,
}

impl WorkspaceProject {
    pub fn new(start: impl Into<PathBuf>) -> Self {
        Self {
            start: start.into(),
        }
    }

    pub fn from_current_dir() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }
}

impl ProjectContext for WorkspaceProject {
    fn current_project_path(&self) -> Option<PathBuf> {
        find_workspace_root(&self.start).map(|info| {
            tracing::debug!(
                "Detected {} project at {}",
                info.marker.name(),
                info.root.display()
            );
            info.root
        })
    }
}

/// The directories one operation works in, resolved together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub backup_dir: PathBuf,
}

/// Resolves the directories the engine works in from a [`ProjectContext`].
#[derive(Clone)]
pub struct ProjectContextAdapter {
    context: Arc<dyn ProjectContext>,
}

impl ProjectContextAdapter {
    pub fn new(context: Arc<dyn ProjectContext>) -> Self {
        Self { context }
    }

    /// The active project root, or the process working directory when no
    /// project is active.
    pub fn resolve_root(&self) -> PathBuf {
        if self.context.has_active_project() {
            if let Some(root) = self.context.current_project_path() {
                return root;
            }
        }
        std::env::current_dir().unwrap_or_else(|e| {
            tracing::warn!("Cannot read working directory, using '.': {}", e);
            PathBuf::from(".")
        })
    }

    /// Resolve the project root once and derive the backup directory from it.
    pub fn paths(&self, layout: &BackupSettings) -> ProjectPaths {
        let root = self.resolve_root();
        ProjectPaths {
            backup_dir: root.join(&layout.directory_name),
            root,
        }
    }

    pub fn backup_dir(&self, layout: &BackupSettings) -> PathBuf {
        self.paths(layout).backup_dir
    }
}

impl std::fmt::Debug for ProjectContextAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectContextAdapter")
            .field("project", &self.context.current_project_path())
            .finish()
    }
}
