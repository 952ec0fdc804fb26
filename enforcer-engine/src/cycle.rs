//! One detection + enforcement cycle over an owner's roster.
//!
//! [`Enforcer::run_cycle`] is the canonical entrypoint for both the daemon
//! tick loop and `enforcer once`.

use chrono::{DateTime, Utc};
use enforcer_client::{RemoteDirectory, Repository};
use enforcer_core::{PolicyStore, RepositoryRef};
use serde::Serialize;

use crate::detector::ChangeDetector;
use crate::error::{EnforceError, Facet};
use crate::gate::{self, Gate, SkipReason};
use crate::marker;
use crate::reconcile::{Change, Reconciler};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// What happened to one repository in a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RepositoryStatus {
    Skipped {
        reason: SkipReason,
    },
    Enforced {
        policy: String,
        changes: Vec<Change>,
        /// Whether the enforced marker was written back.
        marked: bool,
    },
    Failed {
        policy: String,
        facet: Option<Facet>,
        error: String,
    },
    /// The roster entry has no usable `owner/slug` name.
    Invalid {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryReport {
    pub repository: String,
    #[serde(flatten)]
    pub status: RepositoryStatus,
}

/// Summary of one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    /// Whether the roster changed (always true for forced cycles).
    pub changed: bool,
    pub repositories: Vec<RepositoryReport>,
    /// Set when the roster could not be listed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CycleReport {
    fn unchanged(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            changed: false,
            repositories: Vec::new(),
            error: None,
        }
    }

    pub fn enforced(&self) -> usize {
        self.count(|s| matches!(s, RepositoryStatus::Enforced { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, RepositoryStatus::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, RepositoryStatus::Failed { .. } | RepositoryStatus::Invalid { .. }))
    }

    fn count(&self, pred: impl Fn(&RepositoryStatus) -> bool) -> usize {
        self.repositories.iter().filter(|r| pred(&r.status)).count()
    }
}

// ---------------------------------------------------------------------------
// Enforcer
// ---------------------------------------------------------------------------

/// Owns the remote handle, the policy store and the roster token.
pub struct Enforcer<D> {
    directory: D,
    policies: PolicyStore,
    owner: String,
    detector: ChangeDetector,
}

impl<D: RemoteDirectory> Enforcer<D> {
    pub fn new(directory: D, policies: PolicyStore, owner: impl Into<String>) -> Self {
        Self {
            directory,
            policies,
            owner: owner.into(),
            detector: ChangeDetector::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn policies(&self) -> &PolicyStore {
        &self.policies
    }

    pub fn detector(&self) -> &ChangeDetector {
        &self.detector
    }

    pub fn reconciler(&self) -> Reconciler<'_, D> {
        Reconciler::new(&self.directory, &self.policies)
    }

    /// Poll the roster token and, if it moved, enforce every repository.
    pub fn run_cycle(&mut self) -> CycleReport {
        let started_at = Utc::now();
        if !self.detector.poll(&self.directory, &self.owner) {
            tracing::debug!(owner = %self.owner, "no repository changes");
            return CycleReport::unchanged(started_at);
        }
        self.enforce_roster_from(started_at)
    }

    /// Enforce every repository without consulting the token.
    pub fn enforce_roster(&self) -> CycleReport {
        self.enforce_roster_from(Utc::now())
    }

    fn enforce_roster_from(&self, started_at: DateTime<Utc>) -> CycleReport {
        let repositories = match self.directory.list_repositories(&self.owner) {
            Ok(repositories) => repositories,
            Err(err) => {
                tracing::warn!(owner = %self.owner, error = %err, "listing repositories failed");
                return CycleReport {
                    started_at,
                    changed: true,
                    repositories: Vec::new(),
                    error: Some(err.to_string()),
                };
            }
        };

        let reports: Vec<RepositoryReport> = repositories
            .iter()
            .map(|repository| self.enforce_repository(repository))
            .collect();

        let report = CycleReport {
            started_at,
            changed: true,
            repositories: reports,
            error: None,
        };
        tracing::info!(
            owner = %self.owner,
            repositories = report.repositories.len(),
            enforced = report.enforced(),
            skipped = report.skipped(),
            failed = report.failed(),
            "enforcement cycle completed",
        );
        report
    }

    /// Gate, reconcile and mark a single roster entry.
    pub fn enforce_repository(&self, repository: &Repository) -> RepositoryReport {
        let status = match gate::decide(&repository.description) {
            Gate::Skip(reason) => {
                tracing::info!(
                    repo = %repository.full_name,
                    marker = reason.marker(),
                    "skipping repository",
                );
                RepositoryStatus::Skipped { reason }
            }
            Gate::Enforce { policy } => self.enforce_selected(repository, policy),
        };
        RepositoryReport {
            repository: repository.full_name.clone(),
            status,
        }
    }

    fn enforce_selected(&self, repository: &Repository, policy: String) -> RepositoryStatus {
        let repo = match RepositoryRef::parse(&repository.full_name) {
            Ok(repo) => repo,
            Err(err) => {
                tracing::warn!(error = %err, "skipping roster entry");
                return RepositoryStatus::Invalid {
                    error: err.to_string(),
                };
            }
        };
        if policy.is_empty() {
            tracing::warn!(repo = %repo, "bare -enforce selects the empty policy name");
        }

        match self.reconciler().enforce(&repo, &policy) {
            Ok(outcome) => {
                tracing::info!(
                    repo = %repo,
                    policy = %outcome.policy,
                    changes = outcome.changes.len(),
                    "policy enforced",
                );
                let marked = match marker::write(&self.directory, &repo, &repository.description) {
                    Ok(()) => true,
                    Err(err) => {
                        tracing::warn!(repo = %repo, error = %err, "writing enforced marker failed");
                        false
                    }
                };
                RepositoryStatus::Enforced {
                    policy: outcome.policy,
                    changes: outcome.changes,
                    marked,
                }
            }
            Err(err) => {
                match &err {
                    EnforceError::Policy(_) => {
                        tracing::error!(repo = %repo, policy = %policy, error = %err, "policy could not be loaded");
                    }
                    _ => {
                        tracing::warn!(repo = %repo, policy = %policy, error = %err, "enforcement aborted");
                    }
                }
                RepositoryStatus::Failed {
                    policy,
                    facet: err.facet(),
                    error: err.to_string(),
                }
            }
        }
    }
}
