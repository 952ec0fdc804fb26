//! Enforcer: keeps Bitbucket repositories in line with JSON policy files.
//!
//! # Usage
//!
//! ```text
//! enforcer [run] [--interval-ms 1000]
//! enforcer once [--json]
//! enforcer enforce <owner/slug> [--policy <name>] [--mark]
//! enforcer check-policy <name>
//! enforcer gate <description>
//! ```
//!
//! Credentials come from `--username`/`--api-key` or the
//! `BITBUCKET_ENFORCER_*` environment variables; a `.env` file in the working
//! directory is read first.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    check_policy::CheckPolicyArgs, enforce::EnforceArgs, gate::GateArgs, once::OnceArgs,
    run::RunArgs, GlobalArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "enforcer",
    version,
    about = "Reconcile Bitbucket repository settings against policy files",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Poll the roster and enforce on every change until ctrl-c (default).
    Run(RunArgs),

    /// Enforce every repository once, ignoring the roster token.
    Once(OnceArgs),

    /// Apply a policy to a single repository, bypassing the description gate.
    Enforce(EnforceArgs),

    /// Load and validate a policy file, then print it.
    CheckPolicy(CheckPolicyArgs),

    /// Show what the description gate decides for a description.
    Gate(GateArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // Loaded before parsing so clap sees variables defined in `.env`.
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    enforcer_daemon::init_tracing(cli.global.verbose, cli.global.json_logs);

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(err) if err.not_found() => tracing::debug!("no .env file found"),
        Err(err) => tracing::warn!(error = %err, "ignoring unreadable .env file"),
    }

    let global = cli.global;
    match cli.command.unwrap_or_else(|| Commands::Run(RunArgs::default())) {
        Commands::Run(args) => args.run(&global),
        Commands::Once(args) => args.run(&global),
        Commands::Enforce(args) => args.run(&global),
        Commands::CheckPolicy(args) => args.run(&global),
        Commands::Gate(args) => args.run(),
    }
}
