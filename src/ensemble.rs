//! Ensemble lists: what to launch
//!
//! An ensemble file is a JSON document listing one entry per lattice ensemble. Each entry carries
//! the lattice parameters and, optionally, run, storage and scheduler overrides. Anything not
//! overridden is defaulted when the command is built.

/// Typed parameter sets consumed by the command builder
pub mod params;

/// Read and validate ensemble files
pub mod read;

/// Bundled JSON schema for ensemble files
pub mod schema;
