//! `enforcer run`: the polling loop.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use super::GlobalArgs;

const DEFAULT_INTERVAL_MS: u64 = 1000;

/// Arguments for `enforcer run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Milliseconds between roster polls.
    #[arg(long, default_value_t = DEFAULT_INTERVAL_MS)]
    pub interval_ms: u64,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }
}

impl RunArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let enforcer = global.enforcer()?;
        enforcer_daemon::start_blocking(enforcer, Duration::from_millis(self.interval_ms.max(1)))
            .context("enforcement loop failed")
    }
}
