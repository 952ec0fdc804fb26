//! # enforcer-engine
//!
//! The reconciliation engine: roster change detection, the description gate,
//! per-facet reconciliation, deploy-key matching and the enforced marker.
//!
//! Call [`Enforcer::run_cycle`] once per tick, or [`Reconciler::enforce`] to
//! apply a single policy to a single repository.

pub mod cycle;
pub mod detector;
pub mod error;
pub mod gate;
pub mod keys;
pub mod marker;
pub mod reconcile;

pub use cycle::{CycleReport, Enforcer, RepositoryReport, RepositoryStatus};
pub use detector::ChangeDetector;
pub use error::{EnforceError, Facet};
pub use gate::{Gate, Markers, SkipReason};
pub use keys::{KeyPlan, MatchKind};
pub use reconcile::{Change, Outcome, Reconciler};
