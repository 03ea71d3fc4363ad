pub mod context;
pub mod workspace;

pub use context::{
    FixedProject, ProjectContext, ProjectContextAdapter, ProjectPaths, SharedProject,
    WorkspaceProject,
};
pub use workspace::{find_workspace_root, WorkspaceInfo, WorkspaceMarker};
