//! Domain types shared by the client and the engine.
//!
//! Value enums parse from the lowercase spellings used in policy files and on
//! the wire, and render back to the same spelling with `Display`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{InvalidRepositoryName, InvalidValue};

// ---------------------------------------------------------------------------
// RepositoryRef
// ---------------------------------------------------------------------------

/// Owner + slug pair identifying one hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub owner: String,
    pub slug: String,
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            slug: slug.into(),
        }
    }

    /// Split a full name (`owner/slug`) into its parts.
    pub fn parse(full_name: &str) -> Result<Self, InvalidRepositoryName> {
        match full_name.split_once('/') {
            Some((owner, slug)) if !owner.is_empty() && !slug.is_empty() && !slug.contains('/') => {
                Ok(Self::new(owner, slug))
            }
            _ => Err(InvalidRepositoryName(full_name.to_owned())),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.slug)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.slug)
    }
}

impl FromStr for RepositoryRef {
    type Err = InvalidRepositoryName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Who may fork a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForkPolicy {
    /// No forks at all.
    None,
    /// Only private forks.
    Private,
    /// Public and private forks.
    Public,
}

impl fmt::Display for ForkPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForkPolicy::None => write!(f, "none"),
            ForkPolicy::Private => write!(f, "private"),
            ForkPolicy::Public => write!(f, "public"),
        }
    }
}

impl FromStr for ForkPolicy {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "private" => Ok(Self::Private),
            "public" => Ok(Self::Public),
            other => Err(InvalidValue {
                kind: "fork policy",
                value: other.to_owned(),
                expected: "none, private, public",
            }),
        }
    }
}

/// Issue-tracker visibility. The remote only distinguishes "no tracker" from
/// "public tracker".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueTracker {
    None,
    Public,
}

impl IssueTracker {
    pub fn has_issues(self) -> bool {
        matches!(self, IssueTracker::Public)
    }

    pub fn from_has_issues(has_issues: bool) -> Self {
        if has_issues {
            IssueTracker::Public
        } else {
            IssueTracker::None
        }
    }
}

impl fmt::Display for IssueTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueTracker::None => write!(f, "none"),
            IssueTracker::Public => write!(f, "public"),
        }
    }
}

impl FromStr for IssueTracker {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "public" => Ok(Self::Public),
            other => Err(InvalidValue {
                kind: "issue tracker setting",
                value: other.to_owned(),
                expected: "none, public",
            }),
        }
    }
}

/// Access level granted to a user or group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
    Admin,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Write => "write",
            Permission::Admin => "admin",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "admin" => Ok(Self::Admin),
            other => Err(InvalidValue {
                kind: "permission",
                value: other.to_owned(),
                expected: "read, write, admin",
            }),
        }
    }
}

/// Kind of branch restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestrictionKind {
    /// Prevent branch deletion.
    Delete,
    /// Prevent history rewrites (force push / rebase).
    Force,
    /// Only the listed users and groups may push.
    Push,
}

impl fmt::Display for RestrictionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestrictionKind::Delete => write!(f, "delete"),
            RestrictionKind::Force => write!(f, "force"),
            RestrictionKind::Push => write!(f, "push"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
