//! `enforcer once`: a single forced cycle over the whole roster.

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use enforcer_engine::{CycleReport, RepositoryStatus};

use super::GlobalArgs;

/// Arguments for `enforcer once`.
#[derive(Args, Debug)]
pub struct OnceArgs {
    /// Print the cycle report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl OnceArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let enforcer = global.enforcer()?;
        let report = enforcer.enforce_roster();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_report(&report);
        }

        if let Some(err) = &report.error {
            bail!("could not list repositories for '{}': {err}", enforcer.owner());
        }
        let failed = report.failed();
        if failed > 0 {
            bail!("{failed} repository(ies) failed enforcement");
        }
        Ok(())
    }
}

fn print_report(report: &CycleReport) {
    if report.repositories.is_empty() && report.error.is_none() {
        println!("No repositories found.");
        return;
    }
    for entry in &report.repositories {
        let name = &entry.repository;
        match &entry.status {
            RepositoryStatus::Skipped { reason } => {
                println!("{} {name} skipped ({})", "·".dimmed(), reason.marker());
            }
            RepositoryStatus::Enforced {
                policy,
                changes,
                marked,
            } => {
                let note = if *marked { "" } else { ", marker not written" };
                println!(
                    "{} {name} enforced with '{policy}' ({} change(s){note})",
                    "✓".green(),
                    changes.len()
                );
            }
            RepositoryStatus::Failed {
                policy,
                facet,
                error,
            } => {
                let facet = facet.map(|f| format!(" at {f}")).unwrap_or_default();
                println!("{} {name} failed with '{policy}'{facet}: {error}", "✗".red());
            }
            RepositoryStatus::Invalid { error } => {
                println!("{} {name} ignored: {error}", "✗".red());
            }
        }
    }
    println!(
        "{} enforced, {} skipped, {} failed",
        report.enforced(),
        report.skipped(),
        report.failed()
    );
}
