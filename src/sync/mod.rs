//! Reconciliation of local mods against their selected catalog releases.
//!
//! [`plan`] decides, [`SyncExecutor`] acts. Mods are processed strictly one
//! after another.

mod executor;
mod plan;

pub use executor::{PackageSync, SyncExecutor, SyncOutcome};
pub use plan::{Action, ReplaceReason, plan};
