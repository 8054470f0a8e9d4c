//! Waterfall - multi-role agent pipeline CLI
//!
//! ## Commands
//!
//! - `run`: solve one task with the client → analyst → architect → programmer → tester pipeline
//! - `tools`: list the GitHub tool catalog offered to the roles
//! - `roles`: show the role backbone

mod console;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};

use waterfall_core::{
    AgentRole, CatalogDispatcher, FileTraceLogger, Pipeline, PipelineConfig, PipelineError,
    ProblemSource, RoleGraph, Stage, StaticProblem, TeeTraceLogger, ToolCatalog,
    ToolExecutionConfig, TraceLogger,
};
use waterfall_gateway::{github_catalog, McpGateway, OpenAiCompletionService, OpenAiConfig};

use crate::console::{ConsoleTraceLogger, LineProblem};

/// Exit status of a run stopped by the step budget.
const EXIT_HALTED: u8 = 2;

#[derive(Parser)]
#[command(name = "waterfall")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Multi-role agent pipeline over GitHub tools", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline on one task
    Run(RunArgs),

    /// List the tools available to the roles
    Tools,

    /// Show the role backbone
    Roles,
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Problem statement (read from stdin when omitted)
    #[arg(short, long)]
    task: Option<String>,

    /// Maximum state transitions before the run is halted
    #[arg(long)]
    step_budget: Option<usize>,

    /// Transcript messages shown to each role
    #[arg(long)]
    window_size: Option<usize>,

    /// Append the transcript to this file as well
    #[arg(long)]
    trace_log: Option<PathBuf>,

    /// Chat model used by every role
    #[arg(long, env = "WATERFALL_MODEL")]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    waterfall_core::telemetry::init_tracing(cli.json, level);

    match cli.command {
        Commands::Run(args) => cmd_run(args).await,
        Commands::Tools => {
            print!("{}", tools_table(&github_catalog()));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Roles => {
            println!("{}", backbone_line(&RoleGraph::standard()));
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn cmd_run(args: RunArgs) -> Result<ExitCode> {
    let config = run_config(&args, PipelineConfig::from_env())?;

    let mut openai = OpenAiConfig::from_env().context("Failed to configure the completion API")?;
    if let Some(model) = &args.model {
        openai = openai.with_model(model.clone());
    }
    let model =
        OpenAiCompletionService::new(openai).context("Failed to build the completion client")?;
    let gateway = McpGateway::from_env().context("Failed to configure the MCP gateway")?;

    let catalog = github_catalog();
    let tools = CatalogDispatcher::new(
        catalog.clone(),
        gateway,
        ToolExecutionConfig {
            timeout_ms: config.tool_timeout_ms,
        },
    );
    let problem: Arc<dyn ProblemSource> = match args.task {
        Some(task) => Arc::new(StaticProblem::new(task)),
        None => Arc::new(LineProblem::stdin()),
    };
    let trace = trace_sink(config.trace_path.as_deref())?;

    info!(
        model = model.model(),
        step_budget = config.step_budget,
        window_size = config.window_size,
        "starting run"
    );
    let pipeline = Pipeline::new(Arc::new(model), Arc::new(tools), problem)
        .with_config(config)
        .with_catalog(catalog)
        .with_trace(trace);

    match pipeline.run().await {
        Ok(outcome) => {
            eprintln!(
                "Run {} finished: {} transitions, {} messages",
                outcome.run_id,
                outcome.transitions,
                outcome.transcript.len()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(PipelineError::RunawayHalt {
            budget,
            transitions,
        }) => {
            eprintln!(
                "Run halted: step budget of {budget} exhausted after {transitions} transitions without reaching done"
            );
            Ok(ExitCode::from(EXIT_HALTED))
        }
        Err(e) => Err(e).context("Pipeline run failed"),
    }
}

/// Environment-derived configuration with command-line flags applied on top.
fn run_config(
    args: &RunArgs,
    from_env: Result<PipelineConfig, waterfall_core::ConfigError>,
) -> Result<PipelineConfig> {
    let mut config = from_env.context("Invalid WATERFALL_* environment")?;
    if let Some(budget) = args.step_budget {
        config = config.with_step_budget(budget);
    }
    if let Some(window) = args.window_size {
        config = config.with_window_size(window);
    }
    if let Some(path) = &args.trace_log {
        config = config.with_trace_path(path.clone());
    }
    config.validate().context("Invalid run configuration")?;
    Ok(config)
}

fn trace_sink(path: Option<&Path>) -> Result<Arc<dyn TraceLogger>> {
    let console = ConsoleTraceLogger::stdout();
    match path {
        Some(path) => {
            let file = FileTraceLogger::open(path)
                .with_context(|| format!("Failed to open trace log {}", path.display()))?;
            Ok(Arc::new(TeeTraceLogger::new(console, file)))
        }
        None => Ok(Arc::new(console)),
    }
}

fn tools_table(catalog: &ToolCatalog) -> String {
    let width = catalog.specs().map(|s| s.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for spec in catalog.specs() {
        out.push_str(&format!(
            "{:<width$}  {:<5}  {}\n",
            spec.name,
            spec.capability.to_string(),
            spec.description
        ));
    }
    out
}

fn backbone_line(graph: &RoleGraph) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut stage = Stage::Role(AgentRole::Client);
    while let Stage::Role(role) = stage {
        let spec = graph.spec(role);
        if role.calls_model() {
            parts.push(format!("{role} (+tools)"));
        } else {
            parts.push(role.to_string());
        }
        stage = spec.backbone_successor();
    }
    parts.push(stage.to_string());
    parts.join(" -> ")
}
