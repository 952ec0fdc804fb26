pub mod check_policy;
pub mod enforce;
pub mod gate;
pub mod once;
pub mod run;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use enforcer_client::{BitbucketClient, ClientConfig, Credentials, DEFAULT_API_URL};
use enforcer_core::PolicyStore;
use enforcer_engine::Enforcer;

/// Flags shared by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Directory holding `<name>.json` policy files.
    #[arg(
        long,
        global = true,
        env = "BITBUCKET_ENFORCER_CONFIG_DIR",
        default_value = "configs"
    )]
    pub config_dir: PathBuf,

    /// Debug-level logs for the enforcer crates (ignored when RUST_LOG is set).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Bitbucket account used for basic auth.
    #[arg(long, global = true, env = "BITBUCKET_ENFORCER_USERNAME", hide_env_values = true)]
    pub username: Option<String>,

    /// API key (app password) for basic auth.
    #[arg(long, global = true, env = "BITBUCKET_ENFORCER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Account whose repositories are enforced; defaults to the username.
    #[arg(long, global = true, env = "BITBUCKET_ENFORCER_OWNER")]
    pub owner: Option<String>,

    /// Base URL of the API, without the version segment.
    #[arg(long, global = true, env = "BITBUCKET_ENFORCER_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout_secs: u64,
}

impl GlobalArgs {
    /// The policy store, verified to be a readable directory.
    pub fn policy_store(&self) -> Result<PolicyStore> {
        let store = PolicyStore::new(&self.config_dir);
        store
            .ensure_readable()
            .context("policy directory is not usable; set --config-dir or BITBUCKET_ENFORCER_CONFIG_DIR")?;
        Ok(store)
    }

    pub fn credentials(&self) -> Result<Credentials> {
        let username = non_empty(&self.username)
            .context("missing username: set --username or BITBUCKET_ENFORCER_USERNAME")?;
        let api_key = non_empty(&self.api_key)
            .context("missing API key: set --api-key or BITBUCKET_ENFORCER_API_KEY")?;
        Ok(Credentials { username, api_key })
    }

    pub fn client(&self) -> Result<BitbucketClient> {
        let credentials = self.credentials()?;
        let config = ClientConfig {
            base_url: self.api_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        };
        Ok(BitbucketClient::with_config(&credentials, config))
    }

    /// Validate credentials and the policy directory, then assemble the enforcer.
    pub fn enforcer(&self) -> Result<Enforcer<BitbucketClient>> {
        let client = self.client()?;
        let policies = self.policy_store()?;
        let owner = non_empty(&self.owner).unwrap_or_else(|| client.username().to_string());
        Ok(Enforcer::new(client, policies, owner))
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
