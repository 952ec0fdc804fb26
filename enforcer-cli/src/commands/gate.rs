//! `enforcer gate`: dry diagnostic of the description gate.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use enforcer_engine::{gate, Gate};

/// Arguments for `enforcer gate`.
#[derive(Args, Debug)]
pub struct GateArgs {
    /// Repository description to evaluate.
    pub description: String,
}

impl GateArgs {
    pub fn run(self) -> Result<()> {
        match gate::decide(&self.description) {
            Gate::Skip(reason) => {
                println!("{} skip ({})", "·".dimmed(), reason.marker());
            }
            Gate::Enforce { policy } if policy.is_empty() => {
                println!(
                    "{} enforce with policy '' (bare -enforce; loads '.json')",
                    "!".yellow()
                );
            }
            Gate::Enforce { policy } => {
                println!("{} enforce with policy '{policy}'", "✓".green());
            }
        }
        Ok(())
    }
}
