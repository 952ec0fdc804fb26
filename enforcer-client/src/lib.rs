//! # enforcer-client
//!
//! The [`RemoteDirectory`] trait the engine reconciles against, and
//! [`BitbucketClient`], its blocking implementation over the Bitbucket REST API.

pub mod bitbucket;
pub mod directory;
pub mod error;
pub mod types;
mod wire;

pub use bitbucket::{BitbucketClient, ClientConfig, Credentials, DEFAULT_API_URL};
pub use directory::RemoteDirectory;
pub use error::ClientError;
pub use types::{BranchRestriction, RemoteDeployKey, Repository, RepositorySettings, Webhook};
