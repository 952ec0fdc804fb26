//! Current-state records as reported by the remote directory.

use std::collections::BTreeMap;

use enforcer_core::{ForkPolicy, IssueTracker, RestrictionKind};
use serde::Serialize;

/// One entry of an owner's roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repository {
    pub full_name: String,
    pub description: String,
}

/// Scalar settings of a repository. `None` means the remote did not report
/// the value, which the reconciler treats as "differs".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RepositorySettings {
    pub private: Option<bool>,
    pub forks: Option<ForkPolicy>,
    pub landing_page: Option<String>,
    pub issue_tracker: Option<IssueTracker>,
    pub main_branch: Option<String>,
    pub description: Option<String>,
}

/// A deploy key attached to a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteDeployKey {
    pub id: u64,
    pub key: String,
    pub label: String,
}

/// A service hook (webhook) attached to a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Webhook {
    pub id: u64,
    pub hook_type: String,
    pub fields: BTreeMap<String, String>,
}

impl Webhook {
    pub const POST: &'static str = "POST";
    pub const URL_FIELD: &'static str = "URL";

    /// Whether this hook posts to `url`.
    pub fn is_post_to(&self, url: &str) -> bool {
        self.hook_type == Self::POST
            && self.fields.get(Self::URL_FIELD).map(String::as_str) == Some(url)
    }
}

/// A branch restriction, either read back or about to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchRestriction {
    pub kind: RestrictionKind,
    pub pattern: String,
    pub users: Vec<String>,
    pub groups: Vec<String>,
}

impl BranchRestriction {
    pub fn new(kind: RestrictionKind, pattern: impl Into<String>) -> Self {
        Self {
            kind,
            pattern: pattern.into(),
            users: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Same kind and pattern; the remote allows one restriction per pair.
    pub fn same_target(&self, other: &BranchRestriction) -> bool {
        self.kind == other.kind && self.pattern == other.pattern
    }
}
