//! Reconciliation decisions.
//!
//! The only criterion is equality between the installed version and the
//! single release selected for the game version. Versions are never ordered.

use std::fmt;

use crate::package::PackageRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceReason {
    /// Nothing is installed.
    Missing,
    /// A different version is installed.
    Outdated { installed: String },
    /// The installed archive is the right version but failed validation.
    Corrupted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// No compatible release is known; leave the mod alone.
    Skip,
    /// The selected release is installed; check its digest.
    Validate,
    /// Download the selected release.
    Replace(ReplaceReason),
}

impl Action {
    /// Feeds a validation result back into the decision table.
    ///
    /// Returns the follow-up action, or `None` when nothing is left to do.
    /// Only a failed `Validate` leads anywhere; a replaced archive that still
    /// fails validation is reported, not downloaded again.
    pub fn after_validation(self, valid: bool) -> Option<Action> {
        match (self, valid) {
            (Action::Validate, false) => Some(Action::Replace(ReplaceReason::Corrupted)),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Skip => write!(f, "skip"),
            Action::Validate => write!(f, "validate"),
            Action::Replace(ReplaceReason::Missing) => write!(f, "install"),
            Action::Replace(ReplaceReason::Outdated { installed }) => {
                write!(f, "replace {}", installed)
            }
            Action::Replace(ReplaceReason::Corrupted) => write!(f, "repair"),
        }
    }
}

/// Decides what to do for one mod. Pure: depends only on the installed
/// version and the selected release's version.
pub fn plan(record: &PackageRecord) -> Action {
    let Some(latest) = &record.latest_release else {
        return Action::Skip;
    };

    match &record.installed_version {
        None => Action::Replace(ReplaceReason::Missing),
        Some(installed) if *installed == latest.version => Action::Validate,
        Some(installed) => Action::Replace(ReplaceReason::Outdated {
            installed: installed.clone(),
        }),
    }
}
