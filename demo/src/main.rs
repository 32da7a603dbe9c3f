//! WARDEN Agent Runtime — Demo CLI
//!
//! Drives a full agent run against a scripted completion provider, with every
//! tool call passing through the secure gateway and the real built-in tools.
//!
//! Usage:
//!   cargo run -p demo -- tools
//!   cargo run -p demo -- run --goal "List the workspace" --script demo/scripts/list.txt --work-dir /tmp/ws
//!   cargo run -p demo -- run --goal "..." --script run.txt --json

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use warden_contracts::{
    config::AgentConfig,
    error::{WardenError, WardenResult},
    event::AgentEvent,
};
use warden_core::{config::load_config, AgentLoop, ScriptedProvider};
use warden_gateway::SecureGateway;
use warden_tools::default_registry;

// ── CLI definition ────────────────────────────────────────────────────────────

/// WARDEN — step-bounded agent loop behind a secure tool gateway.
#[derive(Parser)]
#[command(
    name = "warden",
    about = "WARDEN agent runtime demo",
    long_about = "Runs an agent goal against a scripted completion provider.\n\
                  Every tool call is validated, path-sandboxed and command-filtered\n\
                  before the built-in tools execute it."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one goal to completion and print its events.
    Run(RunArgs),
    /// List the built-in tools and their input schemas.
    Tools,
}

#[derive(clap::Args)]
struct RunArgs {
    /// The user's goal.
    #[arg(long)]
    goal: String,

    /// File of canned model responses separated by lines containing only `---`.
    #[arg(long)]
    script: PathBuf,

    /// TOML config file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sandbox root for every tool path.
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Maximum model round-trips.
    #[arg(long)]
    max_steps: Option<usize>,

    /// Emit one JSON object per event instead of human-readable lines.
    #[arg(long)]
    json: bool,

    /// Characters per streamed text fragment.
    #[arg(long, default_value_t = 16)]
    chunk_size: usize,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug to watch every gate decision.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run(args) => run_goal(args),
        Command::Tools => list_tools().map(|()| true),
    };

    match result {
        Ok(true) => {}
        // The run ended with an `error` event, already printed.
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("warden: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Returns whether the run finished (as opposed to ending in an error event).
fn run_goal(args: RunArgs) -> WardenResult<bool> {
    let config = resolve_config(&args)?;
    let script = std::fs::read_to_string(&args.script).map_err(|e| WardenError::ConfigError {
        reason: format!("failed to read script file '{}': {}", args.script.display(), e),
    })?;

    let provider = ScriptedProvider::from_script(&script).with_chunk_chars(args.chunk_size);
    let registry = Arc::new(default_registry(&config)?);
    let gateway = SecureGateway::new(registry, &config.work_dir);
    info!(work_dir = %gateway.sandbox_root().display(), max_steps = config.max_steps, "starting run");

    let agent = AgentLoop::new(Box::new(provider), Box::new(gateway)).with_max_steps(config.max_steps);

    let mut finished = false;
    for event in agent.run(args.goal) {
        if let AgentEvent::Finish { .. } = event {
            finished = true;
        }
        if args.json {
            print_json(&event);
        } else {
            print_human(&event);
        }
    }
    Ok(finished)
}

fn list_tools() -> WardenResult<()> {
    let registry = default_registry(&AgentConfig::default())?;
    for summary in registry.summaries() {
        println!("{}", summary.name);
        println!("  {}", summary.description);
        println!("  schema: {}", summary.input_schema);
        println!();
    }
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn resolve_config(args: &RunArgs) -> WardenResult<AgentConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AgentConfig::default(),
    };
    if let Some(work_dir) = &args.work_dir {
        config.work_dir = work_dir.clone();
    }
    if let Some(max_steps) = args.max_steps {
        config.max_steps = max_steps;
    }
    Ok(config)
}

fn print_json(event: &AgentEvent) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => eprintln!("warden: could not serialize {} event: {}", event.kind(), e),
    }
}

fn print_human(event: &AgentEvent) {
    match event {
        AgentEvent::TextDelta { delta } => {
            print!("{delta}");
            let _ = std::io::stdout().flush();
        }
        AgentEvent::Thought { thought } => println!("\n\n[thought] {thought}"),
        AgentEvent::ToolCall { action } => println!("[tool-call] {} {}", action.tool_name, action.args),
        AgentEvent::ToolOutput { observation } => println!("[observation]\n{observation}\n"),
        AgentEvent::Finish { result } => println!("\n\n[finish] {result}"),
        AgentEvent::Error { message } => println!("\n\n[error] {message}"),
    }
}
