//! Strato CLI entrypoint.
//!
//! This is the main entrypoint for the strato command-line tool.

use std::process::ExitCode;

use strato_deploy_stacks::aws::AwsSettings;
use strato_deploy_stacks::cli::{Cli, Commands, OutputFormatter};
use strato_deploy_stacks::deploy::DeploymentOrchestrator;
use strato_deploy_stacks::error::Result;
use strato_deploy_stacks::layout::Workspace;
use strato_deploy_stacks::params::ParameterStore;
use strato_deploy_stacks::render::TemplateRenderer;
use strato_deploy_stacks::state::LocalStateStore;

use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let workspace = Workspace::new(&cli.project_dir);
    load_dotenv(&workspace);

    let formatter = OutputFormatter::new(cli.output);
    let settings = AwsSettings::new(cli.region);

    match cli.command {
        Commands::Build { stack } => cmd_build(workspace, &stack).await,
        Commands::Test { stack } => cmd_test(workspace, stack.as_deref(), &formatter).await,
        Commands::Deploy { stack } => cmd_deploy(workspace, settings, &stack, &formatter).await,
        Commands::Remove { stack } => cmd_remove(workspace, settings, &stack).await,
        Commands::Create { stack, template } => {
            cmd_create(workspace, settings, &stack, template.as_deref()).await
        }
        Commands::Describe { stack } => cmd_describe(workspace, settings, &stack, &formatter).await,
        Commands::Upload { stack } => cmd_upload(workspace, settings, &stack).await,
        Commands::Sync { stack } => cmd_sync(workspace, settings, &stack, &formatter).await,
        Commands::UpdateCode { stack } => cmd_update_code(workspace, settings, &stack).await,
    }
}

/// Render the stack template without touching the cloud.
async fn cmd_build(workspace: Workspace, stack: &str) -> Result<()> {
    let state = LocalStateStore::new(workspace.state_path());
    let params = ParameterStore::new(workspace.clone());
    let renderer = TemplateRenderer::new(workspace.root());

    let resolved = params.resolve(&state, stack).await?;
    let output = workspace.rendered_template_path(&resolved.stack_name);
    renderer.render_file(
        &workspace.stack_template_path(&resolved.stack_folder),
        &resolved.flattened(),
        &output,
    )?;

    eprintln!("Rendered template: {}", output.display());
    Ok(())
}

/// Dry-run dump of resolved parameters.
async fn cmd_test(
    workspace: Workspace,
    stack: Option<&str>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let Some(stack) = stack else {
        eprintln!("No stack selected; pass --stack to resolve its parameters.");
        return Ok(());
    };

    let state = LocalStateStore::new(workspace.state_path());
    let params = ParameterStore::new(workspace);

    let resolved = params.resolve(&state, stack).await?;
    eprintln!("{}", formatter.format_resolved(&resolved));
    Ok(())
}

/// Full create-or-update deployment.
async fn cmd_deploy(
    workspace: Workspace,
    settings: AwsSettings,
    stack: &str,
    formatter: &OutputFormatter,
) -> Result<()> {
    let orchestrator = DeploymentOrchestrator::connect(workspace, settings).await;
    let record = orchestrator.deploy(stack).await?;

    eprintln!("{}", formatter.format_record(&record));
    Ok(())
}

/// Delete the stack and clear its record.
async fn cmd_remove(workspace: Workspace, settings: AwsSettings, stack: &str) -> Result<()> {
    let orchestrator = DeploymentOrchestrator::connect(workspace, settings).await;
    orchestrator.remove(stack).await?;

    eprintln!("Stack removed.");
    Ok(())
}

/// Scaffold a new stack folder from a template tree.
async fn cmd_create(
    workspace: Workspace,
    settings: AwsSettings,
    stack: &str,
    template: Option<&str>,
) -> Result<()> {
    let orchestrator = DeploymentOrchestrator::connect(workspace, settings).await;
    orchestrator.scaffold(stack, template).await
}

/// Show the remote stack's status and outputs.
async fn cmd_describe(
    workspace: Workspace,
    settings: AwsSettings,
    stack: &str,
    formatter: &OutputFormatter,
) -> Result<()> {
    let orchestrator = DeploymentOrchestrator::connect(workspace, settings).await;

    match orchestrator.describe(stack).await? {
        Some(remote) => eprintln!("{}", formatter.format_stack(&remote)),
        None => eprintln!("The stack does not exist."),
    }
    Ok(())
}

/// Push the rendered template to storage without deploying.
async fn cmd_upload(workspace: Workspace, settings: AwsSettings, stack: &str) -> Result<()> {
    let orchestrator = DeploymentOrchestrator::connect(workspace, settings).await;
    let key = orchestrator.upload(stack).await?;

    eprintln!("Template uploaded: {key}");
    Ok(())
}

/// Re-read the remote stack into persisted state.
async fn cmd_sync(
    workspace: Workspace,
    settings: AwsSettings,
    stack: &str,
    formatter: &OutputFormatter,
) -> Result<()> {
    let orchestrator = DeploymentOrchestrator::connect(workspace, settings).await;

    match orchestrator.sync(stack).await? {
        Some(record) => eprintln!("{}", formatter.format_record(&record)),
        None => eprintln!("The stack does not exist; cleared any stale record."),
    }
    Ok(())
}

/// Push fresh function code without a full stack update.
async fn cmd_update_code(workspace: Workspace, settings: AwsSettings, stack: &str) -> Result<()> {
    let orchestrator = DeploymentOrchestrator::connect(workspace, settings).await;
    orchestrator.update_code(stack).await?;

    eprintln!("Function code updated.");
    Ok(())
}

/// Loads the workspace `.env` file when present.
fn load_dotenv(workspace: &Workspace) {
    let env_path = workspace.root().join(".env");
    if env_path.exists() {
        match dotenvy::from_path(&env_path) {
            Ok(()) => debug!("Loaded environment from: {}", env_path.display()),
            Err(e) => warn!("Failed to load {}: {e}", env_path.display()),
        }
    } else {
        debug!(".env file not found at: {}", env_path.display());
    }
}
