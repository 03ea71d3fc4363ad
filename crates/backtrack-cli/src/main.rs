use anyhow::Result;
use backtrack_cli::{execute, Cli};
use backtrack_core::{BackupManager, FixedProject, ProjectContext, Settings, WorkspaceProject};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log.level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let project: Arc<dyn ProjectContext> = match &cli.project {
        Some(root) => Arc::new(FixedProject::new(root.clone())),
        None => Arc::new(WorkspaceProject::from_current_dir()?),
    };
    let manager = BackupManager::new(project, settings.backup);

    let report = execute(&cli.command, &manager, cli.json).await?;
    println!("{}", report.output);

    Ok(if report.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
