//! Roster change detection by revision token (ETag).

use enforcer_client::{ClientError, RemoteDirectory};

/// Compare the roster token against `last_token`.
///
/// Returns whether the roster changed and the token to remember. On error the
/// caller keeps its old token.
pub fn poll<D: RemoteDirectory + ?Sized>(
    directory: &D,
    owner: &str,
    last_token: &str,
) -> Result<(bool, String), ClientError> {
    let token = directory.roster_token(owner)?;
    Ok((token != last_token, token))
}

/// Holds the last observed token for the lifetime of the process.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last_token: String,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_token(&self) -> &str {
        &self.last_token
    }

    /// Poll once. Transport errors are logged and reported as "unchanged".
    pub fn poll<D: RemoteDirectory + ?Sized>(&mut self, directory: &D, owner: &str) -> bool {
        match poll(directory, owner, &self.last_token) {
            Ok((changed, token)) => {
                if token.is_empty() {
                    tracing::debug!(owner, "roster response carried no revision token");
                }
                if changed {
                    tracing::info!(owner, token = %token, "repository roster changed");
                    self.last_token = token;
                }
                changed
            }
            Err(err) => {
                tracing::warn!(owner, error = %err, "roster poll failed; treating as unchanged");
                false
            }
        }
    }
}
