//! In-memory `RemoteDirectory` that records every call and keeps state, so a
//! second reconciliation sees the effect of the first.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use enforcer_client::{
    BranchRestriction, ClientError, RemoteDeployKey, RemoteDirectory, Repository,
    RepositorySettings, Webhook,
};
use enforcer_core::{ForkPolicy, IssueTracker, Permission, RepositoryRef};

#[derive(Debug, Default)]
pub struct State {
    pub repositories: Vec<Repository>,
    pub token: String,
    pub settings: RepositorySettings,
    pub keys: Vec<RemoteDeployKey>,
    pub hooks: Vec<Webhook>,
    pub restrictions: Vec<BranchRestriction>,
    pub users: BTreeMap<String, Permission>,
    pub groups: BTreeMap<String, Permission>,
    next_id: u64,
}

#[derive(Debug, Default)]
pub struct FakeDirectory {
    pub state: Mutex<State>,
    calls: Mutex<Vec<(bool, String)>>,
    fail_on: Mutex<Vec<String>>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        let fake = Self::default();
        fake.state.lock().unwrap().next_id = 100;
        fake
    }

    pub fn with_repository(self, full_name: &str, description: &str) -> Self {
        self.state.lock().unwrap().repositories.push(Repository {
            full_name: full_name.into(),
            description: description.into(),
        });
        self
    }

    pub fn set_token(&self, token: &str) {
        self.state.lock().unwrap().token = token.into();
    }

    /// Make every call to `op` fail with a 500 until cleared.
    pub fn fail(&self, op: &str) {
        self.fail_on.lock().unwrap().push(op.into());
    }

    pub fn clear_failures(&self) {
        self.fail_on.lock().unwrap().clear();
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn mutations(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(mutating, _)| *mutating)
            .map(|(_, c)| c.clone())
            .collect()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, mutating: bool, op: &str, call: String) -> Result<(), ClientError> {
        self.calls.lock().unwrap().push((mutating, call));
        if self.fail_on.lock().unwrap().iter().any(|f| f == op) {
            return Err(ClientError::Status {
                method: "POST",
                url: format!("fake://{op}"),
                status: 500,
                body: "injected failure".into(),
            });
        }
        Ok(())
    }

    fn read(&self, op: &str) -> Result<(), ClientError> {
        self.record(false, op, op.to_string())
    }

    fn write(&self, op: &str, call: String) -> Result<(), ClientError> {
        self.record(true, op, call)
    }
}

impl RemoteDirectory for FakeDirectory {
    fn list_repositories(&self, _owner: &str) -> Result<Vec<Repository>, ClientError> {
        self.read("list_repositories")?;
        Ok(self.state.lock().unwrap().repositories.clone())
    }

    fn roster_token(&self, _owner: &str) -> Result<String, ClientError> {
        self.read("roster_token")?;
        Ok(self.state.lock().unwrap().token.clone())
    }

    fn repository_settings(&self, _repo: &RepositoryRef) -> Result<RepositorySettings, ClientError> {
        self.read("repository_settings")?;
        Ok(self.state.lock().unwrap().settings.clone())
    }

    fn set_privacy(&self, _repo: &RepositoryRef, private: bool) -> Result<(), ClientError> {
        self.write("set_privacy", format!("set_privacy({private})"))?;
        self.state.lock().unwrap().settings.private = Some(private);
        Ok(())
    }

    fn set_fork_policy(&self, _repo: &RepositoryRef, forks: ForkPolicy) -> Result<(), ClientError> {
        self.write("set_fork_policy", format!("set_fork_policy({forks})"))?;
        self.state.lock().unwrap().settings.forks = Some(forks);
        Ok(())
    }

    fn set_landing_page(&self, _repo: &RepositoryRef, page: &str) -> Result<(), ClientError> {
        self.write("set_landing_page", format!("set_landing_page({page})"))?;
        self.state.lock().unwrap().settings.landing_page = Some(page.into());
        Ok(())
    }

    fn set_issue_tracker(&self, _repo: &RepositoryRef, tracker: IssueTracker) -> Result<(), ClientError> {
        self.write("set_issue_tracker", format!("set_issue_tracker({tracker})"))?;
        self.state.lock().unwrap().settings.issue_tracker = Some(tracker);
        Ok(())
    }

    fn set_main_branch(&self, _repo: &RepositoryRef, branch: &str) -> Result<(), ClientError> {
        self.write("set_main_branch", format!("set_main_branch({branch})"))?;
        self.state.lock().unwrap().settings.main_branch = Some(branch.into());
        Ok(())
    }

    fn set_description(&self, repo: &RepositoryRef, description: &str) -> Result<(), ClientError> {
        self.write("set_description", format!("set_description({description:?})"))?;
        let mut state = self.state.lock().unwrap();
        let full_name = repo.full_name();
        if let Some(entry) = state.repositories.iter_mut().find(|r| r.full_name == full_name) {
            entry.description = description.into();
        }
        state.settings.description = Some(description.into());
        Ok(())
    }

    fn list_deploy_keys(&self, _repo: &RepositoryRef) -> Result<Vec<RemoteDeployKey>, ClientError> {
        self.read("list_deploy_keys")?;
        Ok(self.state.lock().unwrap().keys.clone())
    }

    fn add_deploy_key(&self, _repo: &RepositoryRef, label: &str, key: &str) -> Result<(), ClientError> {
        self.write("add_deploy_key", format!("add_deploy_key({label},{key})"))?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.keys.push(RemoteDeployKey {
            id,
            key: key.into(),
            label: label.into(),
        });
        Ok(())
    }

    fn delete_deploy_key(&self, _repo: &RepositoryRef, id: u64) -> Result<(), ClientError> {
        self.write("delete_deploy_key", format!("delete_deploy_key({id})"))?;
        self.state.lock().unwrap().keys.retain(|k| k.id != id);
        Ok(())
    }

    fn list_webhooks(&self, _repo: &RepositoryRef) -> Result<Vec<Webhook>, ClientError> {
        self.read("list_webhooks")?;
        Ok(self.state.lock().unwrap().hooks.clone())
    }

    fn add_webhook(
        &self,
        _repo: &RepositoryRef,
        hook_type: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), ClientError> {
        let url = fields.get("URL").cloned().unwrap_or_default();
        self.write("add_webhook", format!("add_webhook({hook_type},{url})"))?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.hooks.push(Webhook {
            id,
            hook_type: hook_type.into(),
            fields: fields.clone(),
        });
        Ok(())
    }

    fn list_branch_restrictions(&self, _repo: &RepositoryRef) -> Result<Vec<BranchRestriction>, ClientError> {
        self.read("list_branch_restrictions")?;
        Ok(self.state.lock().unwrap().restrictions.clone())
    }

    fn add_branch_restriction(
        &self,
        _repo: &RepositoryRef,
        restriction: &BranchRestriction,
    ) -> Result<(), ClientError> {
        self.write(
            "add_branch_restriction",
            format!(
                "add_branch_restriction({},{},users={:?},groups={:?})",
                restriction.kind, restriction.pattern, restriction.users, restriction.groups
            ),
        )?;
        let mut state = self.state.lock().unwrap();
        if !state.restrictions.iter().any(|r| r.same_target(restriction)) {
            state.restrictions.push(restriction.clone());
        }
        Ok(())
    }

    fn list_user_permissions(&self, _repo: &RepositoryRef) -> Result<BTreeMap<String, Permission>, ClientError> {
        self.read("list_user_permissions")?;
        Ok(self.state.lock().unwrap().users.clone())
    }

    fn list_group_permissions(&self, _repo: &RepositoryRef) -> Result<BTreeMap<String, Permission>, ClientError> {
        self.read("list_group_permissions")?;
        Ok(self.state.lock().unwrap().groups.clone())
    }

    fn set_user_permission(
        &self,
        _repo: &RepositoryRef,
        user: &str,
        permission: Permission,
    ) -> Result<(), ClientError> {
        self.write("set_user_permission", format!("set_user_permission({user},{permission})"))?;
        self.state.lock().unwrap().users.insert(user.into(), permission);
        Ok(())
    }

    fn set_group_permission(
        &self,
        _repo: &RepositoryRef,
        group: &str,
        permission: Permission,
    ) -> Result<(), ClientError> {
        self.write("set_group_permission", format!("set_group_permission({group},{permission})"))?;
        self.state.lock().unwrap().groups.insert(group.into(), permission);
        Ok(())
    }
}

/// Write `<dir>/<name>.json`.
pub fn write_policy(dir: &Path, name: &str, body: &str) {
    std::fs::write(dir.join(format!("{name}.json")), body).expect("write policy");
}
