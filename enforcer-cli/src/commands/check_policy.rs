//! `enforcer check-policy`: load a policy file and validate the values that
//! are otherwise only checked when their facet runs.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use enforcer_core::{IssueTracker, Permission, Policy, PolicyError};

use super::GlobalArgs;

/// Arguments for `enforcer check-policy`.
#[derive(Args, Debug)]
pub struct CheckPolicyArgs {
    /// Policy name, without the `.json` extension.
    pub name: String,
}

impl CheckPolicyArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let store = global.policy_store()?;
        let policy = match store.load(&self.name) {
            Ok(policy) => policy,
            Err(err @ PolicyError::PolicyNotFound { .. }) => {
                let available = store.list().context("listing the policy directory failed")?;
                let hint = if available.is_empty() {
                    "the directory holds no policies".to_string()
                } else {
                    format!("available: {}", available.join(", "))
                };
                return Err(anyhow::Error::new(err)
                    .context(format!("policy '{}' not found; {hint}", self.name)));
            }
            Err(err) => {
                return Err(err).with_context(|| format!("policy '{}' could not be loaded", self.name));
            }
        };

        let problems = problems(&policy);
        println!("{}", serde_json::to_string_pretty(&policy)?);

        if !problems.is_empty() {
            for problem in &problems {
                eprintln!("{} {problem}", "✗".red());
            }
            bail!("policy '{}' has {} invalid value(s)", self.name, problems.len());
        }
        eprintln!("{} policy '{}' is valid", "✓".green(), self.name);
        Ok(())
    }
}

fn problems(policy: &Policy) -> Vec<String> {
    let mut problems = Vec::new();
    if let Some(raw) = &policy.issue_tracker {
        if let Err(err) = raw.parse::<IssueTracker>() {
            problems.push(format!("IssueTracker: {err}"));
        }
    }
    let grants = policy
        .access_management
        .users
        .iter()
        .map(|(who, level)| ("user", who, level))
        .chain(
            policy
                .access_management
                .groups
                .iter()
                .map(|(who, level)| ("group", who, level)),
        );
    for (kind, who, level) in grants {
        if let Err(err) = level.parse::<Permission>() {
            problems.push(format!("AccessManagement {kind} '{who}': {err}"));
        }
    }
    problems
}
