//! Per-repository reconciliation.
//!
//! Facets are applied in a fixed order:
//!
//! 1. privacy
//! 2. fork policy
//! 3. landing page
//! 4. main branch
//! 5. deploy keys
//! 6. webhooks
//! 7. issue tracker
//! 8. branch management
//! 9. access management
//!
//! Each facet reads the live state it needs and only issues a mutation when
//! that state differs from the policy. The first hard error aborts the
//! remaining facets; facets already applied stay applied.

use std::collections::BTreeMap;

use enforcer_client::{BranchRestriction, RemoteDirectory, RepositorySettings, Webhook};
use enforcer_core::{
    AccessManagement, BranchManagement, ForkPolicy, IssueTracker, Permission, Policy, PolicyStore,
    RepositoryRef, RestrictionKind,
};
use serde::Serialize;

use crate::error::{remote, EnforceError, Facet};
use crate::keys;

// ---------------------------------------------------------------------------
// Change log
// ---------------------------------------------------------------------------

/// One mutating call issued against the remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Change {
    SetPrivacy { private: bool },
    SetForkPolicy { forks: ForkPolicy },
    SetLandingPage { page: String },
    SetMainBranch { branch: String },
    DeleteDeployKey { id: u64 },
    AddDeployKey { label: String },
    AddWebhook { url: String },
    SetIssueTracker { tracker: IssueTracker },
    AddRestriction { kind: RestrictionKind, pattern: String },
    SetUserPermission { user: String, permission: Permission },
    SetGroupPermission { group: String, permission: Permission },
}

impl Change {
    pub fn facet(&self) -> Facet {
        match self {
            Change::SetPrivacy { .. } => Facet::Privacy,
            Change::SetForkPolicy { .. } => Facet::Forks,
            Change::SetLandingPage { .. } => Facet::LandingPage,
            Change::SetMainBranch { .. } => Facet::MainBranch,
            Change::DeleteDeployKey { .. } | Change::AddDeployKey { .. } => Facet::DeployKeys,
            Change::AddWebhook { .. } => Facet::Webhooks,
            Change::SetIssueTracker { .. } => Facet::IssueTracker,
            Change::AddRestriction { .. } => Facet::BranchManagement,
            Change::SetUserPermission { .. } | Change::SetGroupPermission { .. } => {
                Facet::AccessManagement
            }
        }
    }
}

/// What a successful reconciliation did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub policy: String,
    pub changes: Vec<Change>,
}

impl Outcome {
    /// Nothing needed changing.
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Applies policies to repositories through a [`RemoteDirectory`].
pub struct Reconciler<'a, D: RemoteDirectory + ?Sized> {
    directory: &'a D,
    policies: &'a PolicyStore,
}

impl<'a, D: RemoteDirectory + ?Sized> Reconciler<'a, D> {
    pub fn new(directory: &'a D, policies: &'a PolicyStore) -> Self {
        Self {
            directory,
            policies,
        }
    }

    /// Load `policy_name` fresh and apply it to `repo`.
    pub fn enforce(&self, repo: &RepositoryRef, policy_name: &str) -> Result<Outcome, EnforceError> {
        let policy = self.policies.load(policy_name)?;
        let changes = self.apply(repo, &policy)?;
        Ok(Outcome {
            policy: policy_name.to_string(),
            changes,
        })
    }

    /// Apply an already-loaded policy. The policy is never modified.
    pub fn apply(&self, repo: &RepositoryRef, policy: &Policy) -> Result<Vec<Change>, EnforceError> {
        let mut changes = Vec::new();
        let settings = self.settings(repo, policy)?;

        if let Some(private) = policy.private {
            if settings.private != Some(private) {
                self.directory
                    .set_privacy(repo, private)
                    .map_err(remote(Facet::Privacy))?;
                changes.push(Change::SetPrivacy { private });
            }
        }

        if let Some(forks) = policy.forks {
            if settings.forks != Some(forks) {
                self.directory
                    .set_fork_policy(repo, forks)
                    .map_err(remote(Facet::Forks))?;
                changes.push(Change::SetForkPolicy { forks });
            }
        }

        if let Some(page) = &policy.landing_page {
            if settings.landing_page.as_ref() != Some(page) {
                self.directory
                    .set_landing_page(repo, page)
                    .map_err(remote(Facet::LandingPage))?;
                changes.push(Change::SetLandingPage { page: page.clone() });
            }
        }

        if let Some(branch) = &policy.main_branch {
            if settings.main_branch.as_ref() != Some(branch) {
                self.directory
                    .set_main_branch(repo, branch)
                    .map_err(remote(Facet::MainBranch))?;
                changes.push(Change::SetMainBranch {
                    branch: branch.clone(),
                });
            }
        }

        if !policy.deploy_keys.is_empty() {
            changes.extend(keys::reconcile(self.directory, repo, &policy.deploy_keys)?);
        }

        if !policy.post_hooks.is_empty() {
            changes.extend(self.webhooks(repo, &policy.post_hooks)?);
        }

        if let Some(raw) = &policy.issue_tracker {
            let tracker: IssueTracker = raw.parse().map_err(|source| EnforceError::InvalidValue {
                facet: Facet::IssueTracker,
                source,
            })?;
            if settings.issue_tracker != Some(tracker) {
                self.directory
                    .set_issue_tracker(repo, tracker)
                    .map_err(remote(Facet::IssueTracker))?;
                changes.push(Change::SetIssueTracker { tracker });
            }
        }

        if !policy.branch_management.is_empty() {
            changes.extend(self.branches(repo, &policy.branch_management)?);
        }

        if !policy.access_management.is_empty() {
            changes.extend(self.access(repo, &policy.access_management)?);
        }

        Ok(changes)
    }

    /// Live scalar settings, read only when some scalar facet is declared.
    fn settings(&self, repo: &RepositoryRef, policy: &Policy) -> Result<RepositorySettings, EnforceError> {
        let wanted = policy.private.is_some()
            || policy.forks.is_some()
            || policy.landing_page.is_some()
            || policy.main_branch.is_some()
            || policy.issue_tracker.is_some();
        if !wanted {
            return Ok(RepositorySettings::default());
        }
        self.directory
            .repository_settings(repo)
            .map_err(remote(Facet::Settings))
    }

    /// Ensure each URL exists as a POST hook. Hooks are never removed.
    fn webhooks(&self, repo: &RepositoryRef, urls: &[String]) -> Result<Vec<Change>, EnforceError> {
        let mut existing = self
            .directory
            .list_webhooks(repo)
            .map_err(remote(Facet::Webhooks))?;
        let mut changes = Vec::new();

        for url in urls {
            if existing.iter().any(|hook| hook.is_post_to(url)) {
                continue;
            }
            let fields: BTreeMap<String, String> =
                [(Webhook::URL_FIELD.to_string(), url.clone())].into_iter().collect();
            tracing::info!(repo = %repo, url = %url, "adding POST hook");
            self.directory
                .add_webhook(repo, Webhook::POST, &fields)
                .map_err(remote(Facet::Webhooks))?;
            existing.push(Webhook {
                id: 0,
                hook_type: Webhook::POST.to_string(),
                fields,
            });
            changes.push(Change::AddWebhook { url: url.clone() });
        }
        Ok(changes)
    }

    fn branches(
        &self,
        repo: &RepositoryRef,
        management: &BranchManagement,
    ) -> Result<Vec<Change>, EnforceError> {
        let mut existing = self
            .directory
            .list_branch_restrictions(repo)
            .map_err(remote(Facet::BranchManagement))?;

        let wanted = management
            .prevent_delete
            .iter()
            .map(|pattern| BranchRestriction::new(RestrictionKind::Delete, pattern.clone()))
            .chain(
                management
                    .prevent_rebase
                    .iter()
                    .map(|pattern| BranchRestriction::new(RestrictionKind::Force, pattern.clone())),
            )
            .chain(management.allow_pushes.iter().map(|(pattern, allowance)| {
                BranchRestriction {
                    kind: RestrictionKind::Push,
                    pattern: pattern.clone(),
                    users: allowance.users.clone(),
                    groups: allowance.groups.clone(),
                }
            }));

        let mut changes = Vec::new();
        for restriction in wanted {
            if existing.iter().any(|r| r.same_target(&restriction)) {
                continue;
            }
            tracing::info!(
                repo = %repo,
                kind = %restriction.kind,
                pattern = %restriction.pattern,
                "adding branch restriction",
            );
            self.directory
                .add_branch_restriction(repo, &restriction)
                .map_err(remote(Facet::BranchManagement))?;
            changes.push(Change::AddRestriction {
                kind: restriction.kind,
                pattern: restriction.pattern.clone(),
            });
            existing.push(restriction);
        }
        Ok(changes)
    }

    /// Users first, then groups. Each grant is validated before its call.
    fn access(&self, repo: &RepositoryRef, access: &AccessManagement) -> Result<Vec<Change>, EnforceError> {
        let mut changes = Vec::new();

        if !access.users.is_empty() {
            let current = self
                .directory
                .list_user_permissions(repo)
                .map_err(remote(Facet::AccessManagement))?;
            for (user, level) in &access.users {
                let permission = parse_permission(level)?;
                if current.get(user) == Some(&permission) {
                    continue;
                }
                tracing::info!(repo = %repo, user = %user, %permission, "granting user permission");
                self.directory
                    .set_user_permission(repo, user, permission)
                    .map_err(remote(Facet::AccessManagement))?;
                changes.push(Change::SetUserPermission {
                    user: user.clone(),
                    permission,
                });
            }
        }

        if !access.groups.is_empty() {
            let current = self
                .directory
                .list_group_permissions(repo)
                .map_err(remote(Facet::AccessManagement))?;
            for (group, level) in &access.groups {
                let permission = parse_permission(level)?;
                if current.get(group) == Some(&permission) {
                    continue;
                }
                tracing::info!(repo = %repo, group = %group, %permission, "granting group permission");
                self.directory
                    .set_group_permission(repo, group, permission)
                    .map_err(remote(Facet::AccessManagement))?;
                changes.push(Change::SetGroupPermission {
                    group: group.clone(),
                    permission,
                });
            }
        }

        Ok(changes)
    }
}

fn parse_permission(level: &str) -> Result<Permission, EnforceError> {
    level.parse().map_err(|source| EnforceError::InvalidValue {
        facet: Facet::AccessManagement,
        source,
    })
}
