//! Description markers that decide whether, and with which policy, a
//! repository is enforced.
//!
//! Markers are plain substrings of the repository description:
//!
//! ```text
//! -noenforce          never enforce (until a human removes it)
//! -enforced           already enforced; written by the marker writer
//! -enforce=<name>     enforce with policy <name> (ASCII alphanumerics)
//! -enforce            enforce with the empty policy name
//! (none of the above) enforce with "default"
//! ```
//!
//! Skip markers always win over the selector.

use serde::Serialize;

pub const NO_ENFORCE_MARKER: &str = "-noenforce";
pub const ENFORCED_MARKER: &str = "-enforced";
pub const SELECTOR_MARKER: &str = "-enforce";
pub const DEFAULT_POLICY: &str = "default";

/// Why a repository was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoEnforce,
    AlreadyEnforced,
}

impl SkipReason {
    pub fn marker(self) -> &'static str {
        match self {
            SkipReason::NoEnforce => NO_ENFORCE_MARKER,
            SkipReason::AlreadyEnforced => ENFORCED_MARKER,
        }
    }
}

/// Raw markers found in a description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub skip: Option<SkipReason>,
    /// `None` when no selector is present; `Some("")` for a bare `-enforce`.
    pub selector: Option<String>,
}

/// Outcome of the gate for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    Skip(SkipReason),
    Enforce { policy: String },
}

/// Scan a description for skip markers and the policy selector.
///
/// The selector is only looked for when no skip marker is present.
pub fn scan(description: &str) -> Markers {
    let skip = if description.contains(NO_ENFORCE_MARKER) {
        Some(SkipReason::NoEnforce)
    } else if description.contains(ENFORCED_MARKER) {
        Some(SkipReason::AlreadyEnforced)
    } else {
        None
    };
    if skip.is_some() {
        return Markers { skip, selector: None };
    }

    let selector = description.find(SELECTOR_MARKER).map(|at| {
        let rest = &description[at + SELECTOR_MARKER.len()..];
        match rest.strip_prefix('=') {
            Some(after) => after
                .chars()
                .take_while(char::is_ascii_alphanumeric)
                .collect(),
            None => String::new(),
        }
    });
    Markers { skip: None, selector }
}

/// Resolve the effective decision for a description.
///
/// A bare `-enforce` yields the empty policy name, which then fails to load.
/// That is long-standing behaviour and is kept as is.
pub fn decide(description: &str) -> Gate {
    let markers = scan(description);
    if let Some(reason) = markers.skip {
        return Gate::Skip(reason);
    }
    Gate::Enforce {
        policy: markers
            .selector
            .unwrap_or_else(|| DEFAULT_POLICY.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
