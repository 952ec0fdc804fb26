//! Deploy-key matching.
//!
//! Remote keys are classified against a working copy of the declared keys:
//!
//! 1. `ExactMatch` (same key material and label): the declared entry is
//!    satisfied and leaves the working copy.
//! 2. `ContentMatch` (same material, other label): the remote key is deleted;
//!    the declared entry stays and is re-added with the right label.
//! 3. `None`: the remote key is left alone.
//!
//! Whatever remains in the working copy is added. Deletions run before
//! additions. Keys the policy does not mention are never removed.

use enforcer_client::{RemoteDeployKey, RemoteDirectory};
use enforcer_core::{DeployKeySpec, RepositoryRef};
use serde::Serialize;

use crate::error::{remote, EnforceError, Facet};
use crate::reconcile::Change;

/// Classification of one remote key; ordered by precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    None,
    ContentMatch,
    ExactMatch,
}

/// Mutations needed to bring the remote keys in line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPlan {
    /// Remote key ids to delete, in remote order.
    pub delete: Vec<u64>,
    /// Declared keys to add, in declared order.
    pub add: Vec<DeployKeySpec>,
}

impl KeyPlan {
    pub fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.add.is_empty()
    }
}

/// Best match for `remote` among `working`, with the index of that entry.
pub fn classify(remote: &RemoteDeployKey, working: &[DeployKeySpec]) -> (MatchKind, Option<usize>) {
    working
        .iter()
        .enumerate()
        .filter(|(_, spec)| spec.key == remote.key)
        .map(|(i, spec)| {
            if spec.name == remote.label {
                (MatchKind::ExactMatch, Some(i))
            } else {
                (MatchKind::ContentMatch, Some(i))
            }
        })
        .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
        .unwrap_or((MatchKind::None, None))
}

/// Plan deletions and additions for `declared` against `remote`.
pub fn plan(declared: &[DeployKeySpec], remote: &[RemoteDeployKey]) -> KeyPlan {
    let mut working = declared.to_vec();
    let mut delete = Vec::new();

    for key in remote {
        match classify(key, &working) {
            (MatchKind::ExactMatch, Some(i)) => {
                working.remove(i);
            }
            (MatchKind::ContentMatch, _) => delete.push(key.id),
            _ => {}
        }
    }

    KeyPlan { delete, add: working }
}

/// Fetch the remote keys, then apply the plan: deletions first, then additions.
pub(crate) fn reconcile<D: RemoteDirectory + ?Sized>(
    directory: &D,
    repo: &RepositoryRef,
    declared: &[DeployKeySpec],
) -> Result<Vec<Change>, EnforceError> {
    let remote_keys = directory
        .list_deploy_keys(repo)
        .map_err(remote(Facet::DeployKeys))?;
    let plan = plan(declared, &remote_keys);
    let mut changes = Vec::with_capacity(plan.delete.len() + plan.add.len());

    for id in plan.delete {
        tracing::info!(repo = %repo, id, "deleting mislabelled deploy key");
        directory
            .delete_deploy_key(repo, id)
            .map_err(remote(Facet::DeployKeys))?;
        changes.push(Change::DeleteDeployKey { id });
    }
    for spec in plan.add {
        tracing::info!(repo = %repo, label = %spec.name, "adding deploy key");
        directory
            .add_deploy_key(repo, &spec.name, &spec.key)
            .map_err(remote(Facet::DeployKeys))?;
        changes.push(Change::AddDeployKey { label: spec.name });
    }
    Ok(changes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
