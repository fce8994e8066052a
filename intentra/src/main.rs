//! intentra - hook-driven telemetry for AI coding assistants
//!
//! Registered as a hook command in each tool's configuration and invoked once
//! per lifecycle event with the event payload on stdin:
//!
//! ```text
//! intentra hook cursor beforeSubmitPrompt < payload.json
//! ```
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/intentra/config.toml (~/.config/intentra/config.toml)
//! - Scan archive: $XDG_DATA_HOME/intentra/scans.db (verbose mode only)
//! - Logs: $XDG_STATE_HOME/intentra/intentra.log.YYYY-MM-DD (verbose mode only)

use std::io::{self, BufRead};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use intentra_core::{Config, HookPipeline};

#[derive(Parser)]
#[command(name = "intentra")]
#[command(about = "Telemetry agent for AI coding assistant hooks")]
#[command(version)]
struct Args {
    /// Log to the state directory and archive scans locally
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Handle one hook event read from stdin
    Hook {
        /// Tool that fired the hook (cursor, claude, gemini, copilot, windsurf, ...)
        tool: String,

        /// Native hook event name, e.g. beforeSubmitPrompt
        event: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // A broken config must not break the host tool's hook
    let (mut config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    if args.verbose {
        config.hooks.debug = true;
    }

    // Logging is best-effort; the hook runs without it
    let _log_guard = intentra_core::logging::init_for_hook(&config).ok().flatten();
    if let Some(e) = config_error {
        tracing::warn!(error = %e, "Invalid configuration, using defaults");
    }

    match args.command {
        Command::Hook { tool, event } => run_hook(&config, &tool, &event),
    }
}

fn run_hook(config: &Config, tool: &str, event: &str) -> Result<()> {
    let mut line = Vec::new();
    io::stdin()
        .lock()
        .read_until(b'\n', &mut line)
        .context("failed to read hook payload from stdin")?;

    let pipeline = HookPipeline::from_config(config);
    let outcome = pipeline
        .handle(tool, event, &String::from_utf8_lossy(&line))
        .context("failed to update session buffer")?;

    tracing::debug!(tool, event, ?outcome, "Hook handled");
    Ok(())
}
