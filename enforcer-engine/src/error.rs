//! Error types for enforcer-engine.

use std::fmt;

use enforcer_client::ClientError;
use enforcer_core::{InvalidValue, PolicyError};
use serde::Serialize;
use thiserror::Error;

/// One independently applied slice of a policy, in application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    /// The initial read of the repository's scalar settings.
    Settings,
    Privacy,
    Forks,
    LandingPage,
    MainBranch,
    DeployKeys,
    Webhooks,
    IssueTracker,
    BranchManagement,
    AccessManagement,
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Facet::Settings => "settings",
            Facet::Privacy => "privacy",
            Facet::Forks => "forks",
            Facet::LandingPage => "landing page",
            Facet::MainBranch => "main branch",
            Facet::DeployKeys => "deploy keys",
            Facet::Webhooks => "webhooks",
            Facet::IssueTracker => "issue tracker",
            Facet::BranchManagement => "branch management",
            Facet::AccessManagement => "access management",
        };
        f.write_str(name)
    }
}

/// All errors that abort one repository's reconciliation.
#[derive(Debug, Error)]
pub enum EnforceError {
    /// The selected policy could not be loaded.
    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    /// A remote call failed while applying a facet.
    #[error("{facet} failed: {source}")]
    Remote {
        facet: Facet,
        #[source]
        source: ClientError,
    },

    /// The policy holds a value the facet cannot apply; no call was made.
    #[error("{facet} rejected: {source}")]
    InvalidValue {
        facet: Facet,
        #[source]
        source: InvalidValue,
    },
}

impl EnforceError {
    /// The facet that failed, if the policy loaded at all.
    pub fn facet(&self) -> Option<Facet> {
        match self {
            EnforceError::Policy(_) => None,
            EnforceError::Remote { facet, .. } | EnforceError::InvalidValue { facet, .. } => Some(*facet),
        }
    }
}

/// `map_err` adapter tagging a client error with its facet.
pub(crate) fn remote(facet: Facet) -> impl FnOnce(ClientError) -> EnforceError {
    move |source| EnforceError::Remote { facet, source }
}
