//! Policy documents and the on-disk policy store.
//!
//! # Storage layout
//!
//! ```text
//! <config-dir>/
//!   default.json     (policy "default")
//!   <name>.json      (one file per policy name)
//! ```
//!
//! Policies are read fresh on every [`PolicyStore::load`]; nothing is cached.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{io_err, PolicyError};
use crate::types::ForkPolicy;

// ---------------------------------------------------------------------------
// Policy document
// ---------------------------------------------------------------------------

/// Desired state for the repositories that select it.
///
/// Every field is optional in the JSON document. Scalar settings that are
/// absent (or an empty string) mean "leave the remote value alone".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Policy {
    #[serde(deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub landing_page: Option<String>,
    /// Tri-state: `None` leaves visibility untouched, unlike `Some(false)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    #[serde(deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub forks: Option<ForkPolicy>,
    /// Kept as text; validated when the issue-tracker facet runs.
    #[serde(deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub issue_tracker: Option<String>,
    #[serde(deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub main_branch: Option<String>,
    pub deploy_keys: Vec<DeployKeySpec>,
    pub post_hooks: Vec<String>,
    pub branch_management: BranchManagement,
    pub access_management: AccessManagement,
}

/// A deploy key the policy wants present, under `name` as its label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeployKeySpec {
    pub name: String,
    pub key: String,
}

impl DeployKeySpec {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
        }
    }
}

/// Branch-protection rules, keyed by branch pattern.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BranchManagement {
    pub prevent_delete: Vec<String>,
    pub prevent_rebase: Vec<String>,
    pub allow_pushes: BTreeMap<String, PushAllowance>,
}

/// Users and groups allowed to push to a branch pattern.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PushAllowance {
    pub groups: Vec<String>,
    pub users: Vec<String>,
}

/// Access grants. Permission strings are validated per grant, not on load.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AccessManagement {
    pub users: BTreeMap<String, String>,
    pub groups: BTreeMap<String, String>,
}

impl BranchManagement {
    pub fn is_empty(&self) -> bool {
        self.prevent_delete.is_empty() && self.prevent_rebase.is_empty() && self.allow_pushes.is_empty()
    }
}

impl AccessManagement {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.groups.is_empty()
    }
}

fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Directory of `<name>.json` policy documents.
#[derive(Debug, Clone)]
pub struct PolicyStore {
    dir: PathBuf,
}

impl PolicyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Fail unless the policy directory exists and can be listed. Used at bootstrap.
    pub fn ensure_readable(&self) -> Result<(), PolicyError> {
        if !self.dir.is_dir() {
            return Err(PolicyError::PolicyDirMissing {
                path: self.dir.clone(),
            });
        }
        std::fs::read_dir(&self.dir).map_err(|e| io_err(&self.dir, e))?;
        Ok(())
    }

    /// `<dir>/<name>.json`. No I/O.
    pub fn policy_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Load and parse the named policy.
    ///
    /// Returns `PolicyError::PolicyNotFound` if absent,
    /// `PolicyError::Parse` (with path + line context) if malformed JSON.
    pub fn load(&self, name: &str) -> Result<Policy, PolicyError> {
        let path = self.policy_path(name);
        if !path.is_file() {
            return Err(PolicyError::PolicyNotFound { path });
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        let policy: Policy =
            serde_json::from_str(&contents).map_err(|e| PolicyError::Parse { path, source: e })?;
        tracing::debug!(policy = name, ?policy, "loaded policy");
        Ok(policy)
    }

    /// Names of every `*.json` file in the store, sorted.
    pub fn list(&self) -> Result<Vec<String>, PolicyError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| io_err(&self.dir, e))?;
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|ext| ext.to_str()) == Some("json"))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_owned))
            .collect();
        names.sort();
        Ok(names)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with(name: &str, body: &str) -> (TempDir, PolicyStore) {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join(format!("{name}.json")), body).expect("write");
        let store = PolicyStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn private_is_tri_state() {
        let (_d, store) = store_with("a", r#"{"Private": false}"#);
        assert_eq!(store.load("a").unwrap().private, Some(false));

        let (_d, store) = store_with("b", "{}");
        assert_eq!(store.load("b").unwrap().private, None);
    }

    #[test]
    fn empty_strings_mean_unset() {
        let (_d, store) =
            store_with("p", r#"{"Forks": "", "LandingPage": "", "MainBranch": " ", "IssueTracker": ""}"#);
        let policy = store.load("p").unwrap();
        assert_eq!(policy.forks, None);
        assert_eq!(policy.landing_page, None);
        assert_eq!(policy.main_branch, None);
        assert_eq!(policy.issue_tracker, None);
    }

    #[test]
    fn unknown_fork_policy_is_a_parse_error() {
        let (_d, store) = store_with("p", r#"{"Forks": "sometimes"}"#);
        let err = store.load("p").unwrap_err();
        assert!(matches!(err, PolicyError::Parse { .. }), "got: {err}");
        assert!(err.to_string().contains("p.json"));
    }

    #[test]
    fn empty_name_resolves_to_dot_json() {
        let store = PolicyStore::new("/configs");
        assert_eq!(store.policy_path(""), PathBuf::from("/configs/.json"));
    }

    #[test]
    fn missing_policy_returns_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let store = PolicyStore::new(dir.path());
        let err = store.load("default").unwrap_err();
        assert!(matches!(err, PolicyError::PolicyNotFound { .. }));
        assert!(err.to_string().contains("default.json"));
    }

    #[test]
    fn ensure_readable_rejects_missing_dir() {
        let dir = TempDir::new().expect("tempdir");
        let store = PolicyStore::new(dir.path().join("nope"));
        assert!(matches!(
            store.ensure_readable(),
            Err(PolicyError::PolicyDirMissing { .. })
        ));
        assert!(PolicyStore::new(dir.path()).ensure_readable().is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn ensure_readable_rejects_unlistable_dir() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("tempdir");
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).expect("mkdir");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).expect("chmod");

        // Privileged users can list any directory; nothing to check then.
        if std::fs::read_dir(&locked).is_ok() {
            return;
        }
        let result = PolicyStore::new(&locked).ensure_readable();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).expect("chmod");
        assert!(matches!(result, Err(PolicyError::Io { .. })), "got: {result:?}");
    }

    #[test]
    fn list_returns_sorted_json_stems() {
        let dir = TempDir::new().expect("tempdir");
        for name in ["strict.json", "default.json", "notes.txt"] {
            std::fs::write(dir.path().join(name), "{}").expect("write");
        }
        let names = PolicyStore::new(dir.path()).list().expect("list");
        assert_eq!(names, vec!["default".to_string(), "strict".to_string()]);
    }
}
