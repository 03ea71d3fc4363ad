use std::path::{Path, PathBuf};

/// Information about a detected workspace.
#[derive(Debug, Clone)]
pub struct WorkspaceInfo {
    pub root: PathBuf,
    pub marker: WorkspaceMarker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceMarker {
    Git,
    Cargo,
    Node,
    Python,
    Go,
}

impl WorkspaceMarker {
    pub fn name(&self) -> &'static str {
        match self {
            WorkspaceMarker::Git => "git",
            WorkspaceMarker::Cargo => "cargo",
            WorkspaceMarker::Node => "node",
            WorkspaceMarker::Python => "python",
            WorkspaceMarker::Go => "go",
        }
    }

    /// Markers in priority order, with the file names that identify them.
    const ALL: &'static [(WorkspaceMarker, &'static [&'static str])] = &[
        (WorkspaceMarker::Git, &[".git"]),
        (WorkspaceMarker::Cargo, &["Cargo.toml"]),
        (WorkspaceMarker::Node, &["package.json"]),
        (WorkspaceMarker::Python, &["pyproject.toml", "setup.py"]),
        (WorkspaceMarker::Go, &["go.mod"]),
    ];
}

/// Walk up from the given path to find the project root.
///
/// The nearest directory carrying any marker wins; within one directory
/// `.git` takes priority over language manifests.
pub fn find_workspace_root(start: &Path) -> Option<WorkspaceInfo> {
    let mut current = if start.is_file() {
        start.parent()?.to_path_buf()
    } else {
        start.to_path_buf()
    };

    loop {
        for (marker, files) in WorkspaceMarker::ALL {
            if files.iter().any(|f| current.join(f).exists()) {
                return Some(WorkspaceInfo {
                    root: current,
                    marker: *marker,
                });
            }
        }

        if !current.pop() {
            break;
        }
    }

    None
}
