//! `enforcer enforce`: apply one policy to one repository.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use enforcer_client::RemoteDirectory;
use enforcer_core::RepositoryRef;
use enforcer_engine::{gate::DEFAULT_POLICY, marker};

use super::GlobalArgs;

/// Arguments for `enforcer enforce`.
#[derive(Args, Debug)]
pub struct EnforceArgs {
    /// Repository as `owner/slug`.
    pub repository: RepositoryRef,

    /// Policy name, without the `.json` extension.
    #[arg(long, default_value = DEFAULT_POLICY)]
    pub policy: String,

    /// Append the enforced marker to the description afterwards.
    #[arg(long)]
    pub mark: bool,
}

impl EnforceArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let enforcer = global.enforcer()?;
        let repo = &self.repository;

        let outcome = enforcer
            .reconciler()
            .enforce(repo, &self.policy)
            .with_context(|| format!("enforcing '{}' on {repo} failed", self.policy))?;

        if outcome.is_noop() {
            println!("{} {repo} already matches '{}'", "✓".green(), outcome.policy);
        } else {
            println!(
                "{} {repo} enforced with '{}' ({} change(s))",
                "✓".green(),
                outcome.policy,
                outcome.changes.len()
            );
            for change in &outcome.changes {
                println!("  ✎  {}", serde_json::to_string(change)?);
            }
        }

        if self.mark {
            let description = enforcer
                .directory()
                .repository_settings(repo)
                .with_context(|| format!("reading description of {repo} failed"))?
                .description
                .with_context(|| {
                    format!("{repo} reported no description; refusing to overwrite it with the marker")
                })?;
            marker::write(enforcer.directory(), repo, &description)
                .with_context(|| format!("writing enforced marker on {repo} failed"))?;
            println!("  ·  marked {repo} as enforced");
        }
        Ok(())
    }
}
