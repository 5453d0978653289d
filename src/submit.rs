//! Submit built commands and keep track of what happened
//!
//! The driver walks the ensembles in order, prints each command before handing it to a launcher,
//! and records one outcome per ensemble. Exit codes are never discarded: a failed submission is
//! recorded and, depending on the failure policy, either the remaining ensembles are still tried
//! or they are skipped.

/// Run a command line through an external process
pub mod launch;

/// Per-ensemble submission outcomes
pub mod report;

/// Iterate ensembles, build and launch
pub mod driver;
