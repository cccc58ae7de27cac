#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Dependency solving for zi
//!
//! Given a root interface, a [`Catalog`] of parsed feeds and a [`Policy`],
//! this crate picks one implementation per required interface so that every
//! version range, command requirement and conflict declaration holds, then
//! works out what would have to be downloaded.
//!
//! The solver is synchronous and performs no I/O apart from asking the
//! catalog's presence oracle whether implementations are cached.

mod diagnostics;
mod fetch;
mod ranker;
mod restrictions;
mod selections;
mod solver;

pub use diagnostics::{
    Conflict, MissingInterfaceError, RejectReason, Rejection, SolveFailure, UnsatisfiableError,
};
pub use fetch::{derive_fetch_plan, FetchItem, FetchPlan, UNKNOWN_SIZE_ESTIMATE};
pub use ranker::{Ranker, Ranking};
pub use restrictions::Restriction;
pub use selections::{Selection, SelectionChange, Selections};
pub use solver::Solver;

use zi_catalog::Catalog;
use zi_types::Policy;

/// Solve for `root` (optionally requiring `command` on it)
///
/// Shorthand for [`Solver::new`] followed by [`Solver::solve`].
///
/// # Errors
///
/// Returns a [`SolveFailure`] describing the interfaces that could not be
/// satisfied.
pub fn solve(
    root: &str,
    command: Option<&str>,
    catalog: &Catalog,
    policy: &Policy,
) -> Result<Selections, SolveFailure> {
    Solver::new(catalog, policy).solve(root, command)
}
