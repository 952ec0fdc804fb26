//! Blocking Bitbucket REST client.
//!
//! Property updates, deploy keys, services and privileges go through the 1.0
//! API; the roster and branch restrictions use 2.0. Every request carries HTTP
//! basic auth built once from the [`Credentials`].

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use enforcer_core::{ForkPolicy, IssueTracker, Permission, RepositoryRef};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::directory::RemoteDirectory;
use crate::error::ClientError;
use crate::types::{BranchRestriction, RemoteDeployKey, Repository, RepositorySettings, Webhook};
use crate::wire::{self, Page};

pub const DEFAULT_API_URL: &str = "https://bitbucket.org/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Account name and API key (app password) for basic auth.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Transport knobs; defaults point at bitbucket.org.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Api {
    V1,
    V2,
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Api::V1 => write!(f, "1.0"),
            Api::V2 => write!(f, "2.0"),
        }
    }
}

enum Body<'a, J: Serialize = ()> {
    Empty,
    Form(&'a [(&'a str, &'a str)]),
    Json(&'a J),
    Text(&'a str),
}

/// Authenticated handle to the Bitbucket API. Construct once and share.
pub struct BitbucketClient {
    agent: ureq::Agent,
    base_url: String,
    username: String,
    authorization: String,
}

impl fmt::Debug for BitbucketClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitbucketClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl BitbucketClient {
    pub fn new(credentials: &Credentials) -> Self {
        Self::with_config(credentials, ClientConfig::default())
    }

    pub fn with_config(credentials: &Credentials, config: ClientConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .redirects(0)
            .build();
        let token = STANDARD.encode(format!("{}:{}", credentials.username, credentials.api_key));
        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: credentials.username.clone(),
            authorization: format!("Basic {token}"),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    fn url(&self, api: Api, endpoint: &str) -> String {
        format!("{}/{api}/{endpoint}", self.base_url)
    }

    fn send<J: Serialize>(
        &self,
        method: &'static str,
        url: &str,
        body: Body<'_, J>,
    ) -> Result<ureq::Response, ClientError> {
        tracing::debug!(method, url, "bitbucket request");
        let request = self
            .agent
            .request(method, url)
            .set("Authorization", &self.authorization);
        let result = match body {
            Body::Empty => request.call(),
            Body::Form(fields) => request.send_form(fields),
            Body::Json(value) => request.send_json(value),
            Body::Text(text) => request
                .set("Content-Type", "text/plain; charset=utf-8")
                .send_string(text),
        };
        match result {
            // Redirects are not followed, so a 3xx arrives here and means the
            // request was not applied.
            Ok(response) if !(200..300).contains(&response.status()) => Err(ClientError::Status {
                method,
                url: url.to_owned(),
                status: response.status(),
                body: response.into_string().unwrap_or_default(),
            }),
            Ok(response) => Ok(response),
            Err(ureq::Error::Status(status, response)) => Err(ClientError::Status {
                method,
                url: url.to_owned(),
                status,
                body: response.into_string().unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(transport)) => Err(ClientError::Transport {
                url: url.to_owned(),
                message: transport.to_string(),
            }),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        let response = self.send::<()>("GET", url, Body::Empty)?;
        response.into_json().map_err(|source| ClientError::Decode {
            url: url.to_owned(),
            source,
        })
    }

    fn get_all_pages<T: DeserializeOwned>(&self, api: Api, endpoint: &str) -> Result<Vec<T>, ClientError> {
        let mut values = Vec::new();
        let mut page = 1usize;
        loop {
            let url = self.url(api, &format!("{endpoint}?page={page}"));
            let current: Page<T> = self.get_json(&url)?;
            let last = current.is_last(page);
            values.extend(current.values);
            if last {
                break;
            }
            page += 1;
        }
        Ok(values)
    }

    fn put_repo_form(&self, repo: &RepositoryRef, fields: &[(&str, &str)]) -> Result<(), ClientError> {
        let url = self.url(Api::V1, &format!("repositories/{}/{}", repo.owner, repo.slug));
        self.send::<()>("PUT", &url, Body::Form(fields)).map(drop)
    }
}

impl RemoteDirectory for BitbucketClient {
    fn list_repositories(&self, owner: &str) -> Result<Vec<Repository>, ClientError> {
        let rows: Vec<wire::WireRepository> =
            self.get_all_pages(Api::V2, &format!("repositories/{owner}"))?;
        Ok(rows.into_iter().map(Repository::from).collect())
    }

    fn roster_token(&self, owner: &str) -> Result<String, ClientError> {
        let url = self.url(Api::V2, &format!("repositories/{owner}"));
        let response = self.send::<()>("HEAD", &url, Body::Empty)?;
        Ok(response.header("ETag").unwrap_or_default().to_owned())
    }

    fn repository_settings(&self, repo: &RepositoryRef) -> Result<RepositorySettings, ClientError> {
        let url = self.url(Api::V1, &format!("repositories/{}/{}", repo.owner, repo.slug));
        let wire: wire::WireSettings = self.get_json(&url)?;
        Ok(wire.into())
    }

    fn set_privacy(&self, repo: &RepositoryRef, private: bool) -> Result<(), ClientError> {
        let value = if private { "true" } else { "false" };
        self.put_repo_form(repo, &[("is_private", value)])
    }

    fn set_fork_policy(&self, repo: &RepositoryRef, forks: ForkPolicy) -> Result<(), ClientError> {
        self.put_repo_form(repo, &wire::fork_policy_form(forks))
    }

    fn set_landing_page(&self, repo: &RepositoryRef, page: &str) -> Result<(), ClientError> {
        self.put_repo_form(repo, &[("landing_page", page)])
    }

    fn set_issue_tracker(&self, repo: &RepositoryRef, tracker: IssueTracker) -> Result<(), ClientError> {
        let value = if tracker.has_issues() { "true" } else { "false" };
        self.put_repo_form(repo, &[("has_issues", value)])
    }

    fn set_main_branch(&self, repo: &RepositoryRef, branch: &str) -> Result<(), ClientError> {
        self.put_repo_form(repo, &[("main_branch", branch)])
    }

    fn set_description(&self, repo: &RepositoryRef, description: &str) -> Result<(), ClientError> {
        self.put_repo_form(repo, &[("description", description)])
    }

    fn list_deploy_keys(&self, repo: &RepositoryRef) -> Result<Vec<RemoteDeployKey>, ClientError> {
        let url = self.url(Api::V1, &format!("repositories/{}/{}/deploy-keys", repo.owner, repo.slug));
        let rows: Vec<wire::WireDeployKey> = self.get_json(&url)?;
        Ok(rows.into_iter().map(RemoteDeployKey::from).collect())
    }

    fn add_deploy_key(&self, repo: &RepositoryRef, label: &str, key: &str) -> Result<(), ClientError> {
        let url = self.url(Api::V1, &format!("repositories/{}/{}/deploy-keys", repo.owner, repo.slug));
        self.send::<()>("POST", &url, Body::Form(&[("label", label), ("key", key)]))
            .map(drop)
    }

    fn delete_deploy_key(&self, repo: &RepositoryRef, id: u64) -> Result<(), ClientError> {
        let url = self.url(
            Api::V1,
            &format!("repositories/{}/{}/deploy-keys/{id}", repo.owner, repo.slug),
        );
        self.send::<()>("DELETE", &url, Body::Empty).map(drop)
    }

    fn list_webhooks(&self, repo: &RepositoryRef) -> Result<Vec<Webhook>, ClientError> {
        let url = self.url(Api::V1, &format!("repositories/{}/{}/services", repo.owner, repo.slug));
        let rows: Vec<wire::WireService> = self.get_json(&url)?;
        Ok(rows.into_iter().map(Webhook::from).collect())
    }

    fn add_webhook(
        &self,
        repo: &RepositoryRef,
        hook_type: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), ClientError> {
        let url = self.url(Api::V1, &format!("repositories/{}/{}/services", repo.owner, repo.slug));
        let mut form: Vec<(&str, &str)> = vec![("type", hook_type)];
        form.extend(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        self.send::<()>("POST", &url, Body::Form(&form)).map(drop)
    }

    fn list_branch_restrictions(&self, repo: &RepositoryRef) -> Result<Vec<BranchRestriction>, ClientError> {
        let rows: Vec<wire::WireRestriction> = self.get_all_pages(
            Api::V2,
            &format!("repositories/{}/{}/branch-restrictions", repo.owner, repo.slug),
        )?;
        Ok(rows.into_iter().filter_map(wire::WireRestriction::into_restriction).collect())
    }

    fn add_branch_restriction(
        &self,
        repo: &RepositoryRef,
        restriction: &BranchRestriction,
    ) -> Result<(), ClientError> {
        let url = self.url(
            Api::V2,
            &format!("repositories/{}/{}/branch-restrictions", repo.owner, repo.slug),
        );
        let body = wire::WireRestriction::outgoing(&repo.owner, restriction);
        match self.send("POST", &url, Body::Json(&body)) {
            Ok(_) => Ok(()),
            Err(ClientError::Status { status: 409, .. }) => {
                tracing::debug!(
                    repo = %repo,
                    kind = %restriction.kind,
                    pattern = %restriction.pattern,
                    "branch restriction already exists",
                );
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn list_user_permissions(&self, repo: &RepositoryRef) -> Result<BTreeMap<String, Permission>, ClientError> {
        let url = self.url(Api::V1, &format!("privileges/{}/{}", repo.owner, repo.slug));
        let rows: Vec<wire::WireUserPrivilege> = self.get_json(&url)?;
        Ok(wire::user_permissions(rows))
    }

    fn list_group_permissions(&self, repo: &RepositoryRef) -> Result<BTreeMap<String, Permission>, ClientError> {
        let url = self.url(Api::V1, &format!("group-privileges/{}/{}", repo.owner, repo.slug));
        let rows: Vec<wire::WireGroupPrivilege> = self.get_json(&url)?;
        Ok(wire::group_permissions(rows))
    }

    fn set_user_permission(
        &self,
        repo: &RepositoryRef,
        user: &str,
        permission: Permission,
    ) -> Result<(), ClientError> {
        let url = self.url(Api::V1, &format!("privileges/{}/{}/{user}", repo.owner, repo.slug));
        self.send::<()>("PUT", &url, Body::Text(permission.as_str())).map(drop)
    }

    fn set_group_permission(
        &self,
        repo: &RepositoryRef,
        group: &str,
        permission: Permission,
    ) -> Result<(), ClientError> {
        let url = self.url(
            Api::V1,
            &format!("group-privileges/{}/{}/{}/{group}", repo.owner, repo.slug, repo.owner),
        );
        self.send::<()>("PUT", &url, Body::Text(permission.as_str())).map(drop)
    }
}
