//! Records completed enforcement in the repository description.

use enforcer_client::{ClientError, RemoteDirectory};
use enforcer_core::RepositoryRef;

use crate::gate::ENFORCED_MARKER;

/// `description` trimmed, followed by a blank line and the enforced marker.
pub fn marked_description(description: &str) -> String {
    format!("{}\n\n{ENFORCED_MARKER}", description.trim())
}

/// Write the marker back. The caller logs failures; they never fail a cycle.
pub fn write<D: RemoteDirectory + ?Sized>(
    directory: &D,
    repo: &RepositoryRef,
    description: &str,
) -> Result<(), ClientError> {
    directory.set_description(repo, &marked_description(description))
}
