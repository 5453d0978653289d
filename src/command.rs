//! Build launch commands for a stream
//!
//! Everything here is pure: the same parameters always give the same command, and nothing touches
//! the environment, the filesystem or other processes. Running the command belongs to
//! [`crate::submit`].

use std::fmt;

use log::info;

use crate::ensemble::params::{LatticeParams, RunParams, SchedulerParams, StorageParams};
use crate::mode::{StreamNamePolicy, SubmissionMode};

/// Stream name derivation rules
pub mod stream;

/// Render the command line around the positional arguments
pub mod render;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A required lattice key is absent
    MissingField { field: String },
    /// A lattice key is present but holds the wrong JSON type
    InvalidField { field: String, expected: &'static str },
    /// A bundled command template failed to render
    RenderError(String),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BuildError::MissingField { field } => write!(f, "missing lattice field '{field}'"),
            BuildError::InvalidField { field, expected } => {
                write!(f, "lattice field '{field}' must be a {expected}")
            }
            BuildError::RenderError(err) => write!(f, "can't render command: {err}"),
        }
    }
}

impl std::error::Error for BuildError {}

/// Injected settings that used to be literals in the launch scripts
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    pub mode: SubmissionMode,
    pub stream_policy: StreamNamePolicy,
    /// Parent directory of every stream's rootstore
    pub store_root: String,
    /// Run script receiving the positional arguments
    pub script: String,
    /// Default allocation (`qsub -A`)
    pub allocation: String,
    /// Scheduler submission binary
    pub qsub: String,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        LaunchConfig {
            mode: SubmissionMode::Direct,
            stream_policy: StreamNamePolicy::ScriptStyle,
            store_root: "/lqcdproj/multirep/wjay".to_string(),
            script: "run_gauge.sh".to_string(),
            allocation: "multirep".to_string(),
            qsub: "qsub".to_string(),
        }
    }
}

/// A fully built command for one ensemble
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Stream name (`N`), kept for logging and reporting
    pub stream: String,
    /// Positional arguments, in the order the run script reads them
    pub args: String,
    /// Complete command line handed to the launcher
    pub line: String,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.line)
    }
}

pub struct CommandBuilder {
    config: LaunchConfig,
}

impl CommandBuilder {
    pub fn new(config: LaunchConfig) -> CommandBuilder {
        CommandBuilder { config }
    }

    /// Build the command for one ensemble, defaulting every parameter set that isn't supplied
    pub fn build(
        &self,
        lattice: &LatticeParams,
        run: Option<&RunParams>,
        storage: Option<&StorageParams>,
        scheduler: Option<&SchedulerParams>,
    ) -> Result<Command, BuildError> {
        let run = run.cloned().unwrap_or_default();
        let storage = storage.cloned().unwrap_or_else(|| self.default_storage(lattice));
        let scheduler = scheduler.cloned().unwrap_or_else(|| self.default_scheduler(lattice));

        let args = positional_args(lattice, &run, &storage, &scheduler);
        info!("Rendering {} command for stream {}", self.config.mode, scheduler.stream);
        let line = render::render_command(&self.config, &scheduler, &args)?;

        Ok(Command { stream: scheduler.stream, args, line })
    }

    pub fn default_storage(&self, lattice: &LatticeParams) -> StorageParams {
        let root = self.config.store_root.trim_end_matches('/');
        StorageParams {
            rootstore: format!("{}/Run_SU4_Nf2_Nas2_{}{}", root, lattice.nx, lattice.nt),
        }
    }

    pub fn default_scheduler(&self, lattice: &LatticeParams) -> SchedulerParams {
        SchedulerParams {
            allocation: self.config.allocation.clone(),
            stream: stream::stream_name(self.config.stream_policy, lattice),
        }
    }
}

/// Join the 13 positional arguments
///
/// The order is fixed, the run script reads them as $1..$13:
/// nx nt beta k4 k6 exec configs_to_run config_limit nstep2 nstep1 rootstore A N
pub fn positional_args(
    lattice: &LatticeParams,
    run: &RunParams,
    storage: &StorageParams,
    scheduler: &SchedulerParams,
) -> String {
    let fields = [
        lattice.nx.to_string(),
        lattice.nt.to_string(),
        lattice.beta.clone(),
        lattice.k4.clone(),
        lattice.k6.clone(),
        run.exec.clone(),
        run.configs_to_run.to_string(),
        run.config_limit.to_string(),
        run.nstep2.to_string(),
        run.nstep1.to_string(),
        storage.rootstore.clone(),
        scheduler.allocation.clone(),
        scheduler.stream.clone(),
    ];
    fields.join(" ")
}
