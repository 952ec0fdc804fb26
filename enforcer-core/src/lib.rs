//! Enforcer core library: policy documents, the policy store and shared domain types.
//!
//! - [`policy`]: the [`Policy`] document and the [`PolicyStore`] loader
//! - [`types`]: repository identity and value enums
//! - [`error`]: [`PolicyError`] and value parse errors

pub mod error;
pub mod policy;
pub mod types;

pub use error::{InvalidRepositoryName, InvalidValue, PolicyError};
pub use policy::{AccessManagement, BranchManagement, DeployKeySpec, Policy, PolicyStore, PushAllowance};
pub use types::{ForkPolicy, IssueTracker, Permission, RepositoryRef, RestrictionKind};
