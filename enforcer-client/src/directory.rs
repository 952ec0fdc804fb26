//! The `RemoteDirectory` seam between the engine and the hosting service.

use std::collections::BTreeMap;

use enforcer_core::{ForkPolicy, IssueTracker, Permission, RepositoryRef};

use crate::error::ClientError;
use crate::types::{BranchRestriction, RemoteDeployKey, Repository, RepositorySettings, Webhook};

/// Fetch and mutate operations per resource kind.
///
/// All calls block until the remote answers. Implementations must treat an
/// already-existing branch restriction as success in
/// [`add_branch_restriction`](RemoteDirectory::add_branch_restriction).
pub trait RemoteDirectory {
    // --- roster ---------------------------------------------------------

    /// Every repository owned by `owner`, across all pages.
    fn list_repositories(&self, owner: &str) -> Result<Vec<Repository>, ClientError>;

    /// Opaque revision token of the roster; empty if the remote sends none.
    fn roster_token(&self, owner: &str) -> Result<String, ClientError>;

    // --- repository settings -------------------------------------------

    fn repository_settings(&self, repo: &RepositoryRef) -> Result<RepositorySettings, ClientError>;
    fn set_privacy(&self, repo: &RepositoryRef, private: bool) -> Result<(), ClientError>;
    fn set_fork_policy(&self, repo: &RepositoryRef, forks: ForkPolicy) -> Result<(), ClientError>;
    fn set_landing_page(&self, repo: &RepositoryRef, page: &str) -> Result<(), ClientError>;
    fn set_issue_tracker(&self, repo: &RepositoryRef, tracker: IssueTracker) -> Result<(), ClientError>;
    fn set_main_branch(&self, repo: &RepositoryRef, branch: &str) -> Result<(), ClientError>;
    fn set_description(&self, repo: &RepositoryRef, description: &str) -> Result<(), ClientError>;

    // --- deploy keys ----------------------------------------------------

    fn list_deploy_keys(&self, repo: &RepositoryRef) -> Result<Vec<RemoteDeployKey>, ClientError>;
    fn add_deploy_key(&self, repo: &RepositoryRef, label: &str, key: &str) -> Result<(), ClientError>;
    fn delete_deploy_key(&self, repo: &RepositoryRef, id: u64) -> Result<(), ClientError>;

    // --- webhooks -------------------------------------------------------

    fn list_webhooks(&self, repo: &RepositoryRef) -> Result<Vec<Webhook>, ClientError>;
    fn add_webhook(
        &self,
        repo: &RepositoryRef,
        hook_type: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), ClientError>;

    // --- branch restrictions --------------------------------------------

    fn list_branch_restrictions(&self, repo: &RepositoryRef) -> Result<Vec<BranchRestriction>, ClientError>;
    /// Create a restriction; a conflict ("already exists") is success.
    fn add_branch_restriction(
        &self,
        repo: &RepositoryRef,
        restriction: &BranchRestriction,
    ) -> Result<(), ClientError>;

    // --- access ---------------------------------------------------------

    fn list_user_permissions(&self, repo: &RepositoryRef) -> Result<BTreeMap<String, Permission>, ClientError>;
    fn list_group_permissions(&self, repo: &RepositoryRef) -> Result<BTreeMap<String, Permission>, ClientError>;
    fn set_user_permission(
        &self,
        repo: &RepositoryRef,
        user: &str,
        permission: Permission,
    ) -> Result<(), ClientError>;
    fn set_group_permission(
        &self,
        repo: &RepositoryRef,
        group: &str,
        permission: Permission,
    ) -> Result<(), ClientError>;
}
