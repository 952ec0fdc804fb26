//! Bitbucket JSON shapes and their mapping onto the crate's types.
//!
//! Everything here is pure so it can be tested without a server.

use std::collections::BTreeMap;

use enforcer_core::{ForkPolicy, IssueTracker, Permission, RestrictionKind};
use serde::{Deserialize, Serialize};

use crate::types::{BranchRestriction, RemoteDeployKey, Repository, RepositorySettings, Webhook};

// ---------------------------------------------------------------------------
// Pagination (2.0 API)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
    #[serde(default)]
    pub pagelen: usize,
    #[serde(default)]
    pub size: Option<usize>,
    #[serde(default)]
    pub next: Option<String>,
}

impl<T> Page<T> {
    /// Whether `page` (1-based) is the final page.
    pub fn is_last(&self, page: usize) -> bool {
        if self.values.is_empty() {
            return true;
        }
        match self.size {
            Some(size) if self.pagelen > 0 => page * self.pagelen >= size,
            _ => self.next.is_none(),
        }
    }
}

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct WireRepository {
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<WireRepository> for Repository {
    fn from(w: WireRepository) -> Self {
        Repository {
            full_name: w.full_name,
            description: w.description.unwrap_or_default(),
        }
    }
}

/// 1.0 repository resource; only the fields the reconciler compares.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireSettings {
    pub is_private: Option<bool>,
    pub no_forks: Option<bool>,
    pub no_public_forks: Option<bool>,
    pub landing_page: Option<String>,
    pub has_issues: Option<bool>,
    #[serde(alias = "mainbranch")]
    pub main_branch: Option<String>,
    pub description: Option<String>,
}

impl From<WireSettings> for RepositorySettings {
    fn from(w: WireSettings) -> Self {
        let forks = match (w.no_forks, w.no_public_forks) {
            (Some(true), _) => Some(ForkPolicy::None),
            (Some(false), Some(true)) => Some(ForkPolicy::Private),
            (Some(false), Some(false)) => Some(ForkPolicy::Public),
            _ => None,
        };
        RepositorySettings {
            private: w.is_private,
            forks,
            landing_page: w.landing_page.filter(|s| !s.is_empty()),
            issue_tracker: w.has_issues.map(IssueTracker::from_has_issues),
            main_branch: w.main_branch.filter(|s| !s.is_empty()),
            description: w.description,
        }
    }
}

/// Form values for the 1.0 `no_forks` / `no_public_forks` pair.
pub(crate) fn fork_policy_form(forks: ForkPolicy) -> [(&'static str, &'static str); 2] {
    match forks {
        ForkPolicy::None => [("no_forks", "True"), ("no_public_forks", "True")],
        ForkPolicy::Private => [("no_forks", "False"), ("no_public_forks", "True")],
        ForkPolicy::Public => [("no_forks", "False"), ("no_public_forks", "False")],
    }
}

// ---------------------------------------------------------------------------
// Deploy keys and services (1.0 API)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct WireDeployKey {
    pub pk: u64,
    pub key: String,
    #[serde(default)]
    pub label: String,
}

impl From<WireDeployKey> for RemoteDeployKey {
    fn from(w: WireDeployKey) -> Self {
        RemoteDeployKey {
            id: w.pk,
            key: w.key,
            label: w.label,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireService {
    pub id: u64,
    pub service: WireServiceBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireServiceBody {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub fields: Vec<WireServiceField>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireServiceField {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl From<WireService> for Webhook {
    fn from(w: WireService) -> Self {
        Webhook {
            id: w.id,
            hook_type: w.service.service_type,
            fields: w
                .service
                .fields
                .into_iter()
                .map(|f| (f.name, f.value))
                .collect::<BTreeMap<_, _>>(),
        }
    }
}

// ---------------------------------------------------------------------------
// Branch restrictions (2.0 API)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct WireUser {
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct WireGroup {
    pub slug: String,
    pub owner: WireUser,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct WireRestriction {
    pub kind: String,
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub users: Vec<WireUser>,
    #[serde(default)]
    pub groups: Vec<WireGroup>,
}

impl WireRestriction {
    /// Request body for a new restriction; groups are owned by the repository owner.
    pub fn outgoing(owner: &str, restriction: &BranchRestriction) -> Self {
        WireRestriction {
            kind: restriction.kind.to_string(),
            pattern: restriction.pattern.clone(),
            users: restriction
                .users
                .iter()
                .map(|u| WireUser { username: u.clone() })
                .collect(),
            groups: restriction
                .groups
                .iter()
                .map(|g| WireGroup {
                    slug: g.clone(),
                    owner: WireUser {
                        username: owner.to_owned(),
                    },
                })
                .collect(),
        }
    }

    /// `None` for restriction kinds the enforcer does not manage.
    pub fn into_restriction(self) -> Option<BranchRestriction> {
        let kind = match self.kind.as_str() {
            "delete" => RestrictionKind::Delete,
            "force" => RestrictionKind::Force,
            "push" => RestrictionKind::Push,
            _ => return None,
        };
        Some(BranchRestriction {
            kind,
            pattern: self.pattern,
            users: self.users.into_iter().map(|u| u.username).collect(),
            groups: self.groups.into_iter().map(|g| g.slug).collect(),
        })
    }
}

// ---------------------------------------------------------------------------
// Privileges (1.0 API)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct WireUserPrivilege {
    pub privilege: String,
    pub user: WireUser,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireGroupPrivilege {
    pub privilege: String,
    pub group: WireGroupRef,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireGroupRef {
    pub slug: String,
}

pub(crate) fn user_permissions(rows: Vec<WireUserPrivilege>) -> BTreeMap<String, Permission> {
    rows.into_iter()
        .filter_map(|row| Some((row.user.username, row.privilege.parse().ok()?)))
        .collect()
}

pub(crate) fn group_permissions(rows: Vec<WireGroupPrivilege>) -> BTreeMap<String, Permission> {
    rows.into_iter()
        .filter_map(|row| Some((row.group.slug, row.privilege.parse().ok()?)))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
