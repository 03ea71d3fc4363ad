// Library interface for backtrack-cli, shared by the binary and integration tests.

pub mod cli;
pub mod render;

pub use cli::{execute, Cli, Command, Report};
