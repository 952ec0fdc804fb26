use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use enforcer_client::{
    BranchRestriction, ClientError, RemoteDeployKey, RemoteDirectory, Repository,
    RepositorySettings, Webhook,
};
use enforcer_core::{ForkPolicy, IssueTracker, Permission, PolicyStore, RepositoryRef};
use enforcer_engine::Enforcer;
use tempfile::TempDir;
use tokio::sync::broadcast;

/// Roster that changes on every poll and never has repositories.
#[derive(Default)]
struct ChurningRoster {
    polls: AtomicUsize,
    listings: AtomicUsize,
}

impl RemoteDirectory for ChurningRoster {
    fn list_repositories(&self, _owner: &str) -> Result<Vec<Repository>, ClientError> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    fn roster_token(&self, _owner: &str) -> Result<String, ClientError> {
        let n = self.polls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("etag-{n}"))
    }

    fn repository_settings(&self, _: &RepositoryRef) -> Result<RepositorySettings, ClientError> {
        Ok(RepositorySettings::default())
    }
    fn set_privacy(&self, _: &RepositoryRef, _: bool) -> Result<(), ClientError> {
        Ok(())
    }
    fn set_fork_policy(&self, _: &RepositoryRef, _: ForkPolicy) -> Result<(), ClientError> {
        Ok(())
    }
    fn set_landing_page(&self, _: &RepositoryRef, _: &str) -> Result<(), ClientError> {
        Ok(())
    }
    fn set_issue_tracker(&self, _: &RepositoryRef, _: IssueTracker) -> Result<(), ClientError> {
        Ok(())
    }
    fn set_main_branch(&self, _: &RepositoryRef, _: &str) -> Result<(), ClientError> {
        Ok(())
    }
    fn set_description(&self, _: &RepositoryRef, _: &str) -> Result<(), ClientError> {
        Ok(())
    }
    fn list_deploy_keys(&self, _: &RepositoryRef) -> Result<Vec<RemoteDeployKey>, ClientError> {
        Ok(Vec::new())
    }
    fn add_deploy_key(&self, _: &RepositoryRef, _: &str, _: &str) -> Result<(), ClientError> {
        Ok(())
    }
    fn delete_deploy_key(&self, _: &RepositoryRef, _: u64) -> Result<(), ClientError> {
        Ok(())
    }
    fn list_webhooks(&self, _: &RepositoryRef) -> Result<Vec<Webhook>, ClientError> {
        Ok(Vec::new())
    }
    fn add_webhook(
        &self,
        _: &RepositoryRef,
        _: &str,
        _: &BTreeMap<String, String>,
    ) -> Result<(), ClientError> {
        Ok(())
    }
    fn list_branch_restrictions(&self, _: &RepositoryRef) -> Result<Vec<BranchRestriction>, ClientError> {
        Ok(Vec::new())
    }
    fn add_branch_restriction(&self, _: &RepositoryRef, _: &BranchRestriction) -> Result<(), ClientError> {
        Ok(())
    }
    fn list_user_permissions(&self, _: &RepositoryRef) -> Result<BTreeMap<String, Permission>, ClientError> {
        Ok(BTreeMap::new())
    }
    fn list_group_permissions(&self, _: &RepositoryRef) -> Result<BTreeMap<String, Permission>, ClientError> {
        Ok(BTreeMap::new())
    }
    fn set_user_permission(&self, _: &RepositoryRef, _: &str, _: Permission) -> Result<(), ClientError> {
        Ok(())
    }
    fn set_group_permission(&self, _: &RepositoryRef, _: &str, _: Permission) -> Result<(), ClientError> {
        Ok(())
    }
}

fn enforcer(dir: &TempDir) -> Enforcer<ChurningRoster> {
    Enforcer::new(ChurningRoster::default(), PolicyStore::new(dir.path()), "acme")
}

#[tokio::test(start_paused = true)]
async fn shutdown_before_first_tick_runs_no_cycle() {
    let dir = TempDir::new().unwrap();
    let (tx, rx) = broadcast::channel(1);
    tx.send(()).unwrap();

    let enforcer = enforcer_daemon::run(enforcer(&dir), Duration::from_millis(1000), rx)
        .await
        .unwrap();

    assert_eq!(enforcer.directory().polls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn loop_polls_until_stopped() {
    let dir = TempDir::new().unwrap();
    let (tx, rx) = broadcast::channel(1);

    let handle = tokio::spawn(enforcer_daemon::run(
        enforcer(&dir),
        Duration::from_millis(1000),
        rx,
    ));
    tokio::time::sleep(Duration::from_millis(3500)).await;
    tx.send(()).unwrap();

    let enforcer = handle.await.unwrap().unwrap();
    let polls = enforcer.directory().polls.load(Ordering::SeqCst);
    assert!(polls >= 1, "expected at least one poll, got {polls}");
    // Every poll saw a new token, so every cycle listed the roster.
    assert_eq!(enforcer.directory().listings.load(Ordering::SeqCst), polls);
}
