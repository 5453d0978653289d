use serde::Deserialize;
use serde_json::{Map, Value};

use crate::command::BuildError;

/// Physical parameters identifying one lattice ensemble
///
/// beta and the hopping parameters are kept as strings: the run script and the stream names use
/// them verbatim, so `7.50` must never become `7.5`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatticeParams {
    pub nx: u32,
    pub nt: u32,
    pub beta: String,
    pub k4: String,
    pub k6: String,
}

impl LatticeParams {
    /// Read lattice parameters from an untyped JSON object
    ///
    /// Every required key is checked for presence before any value is converted, so the first
    /// absent key (in positional order) is the one reported.
    pub fn from_map(map: &Map<String, Value>) -> Result<LatticeParams, BuildError> {
        for field in ["nx", "nt", "beta", "k4", "k6"] {
            if !map.contains_key(field) {
                return Err(BuildError::MissingField { field: field.to_string() });
            }
        }

        Ok(LatticeParams {
            nx: integer_field(map, "nx")?,
            nt: integer_field(map, "nt")?,
            beta: string_field(map, "beta")?,
            k4: string_field(map, "k4")?,
            k6: string_field(map, "k6")?,
        })
    }
}

fn integer_field(map: &Map<String, Value>, field: &str) -> Result<u32, BuildError> {
    map.get(field)
        .and_then(Value::as_u64)
        .and_then(|value| u32::try_from(value).ok())
        .ok_or_else(|| BuildError::InvalidField { field: field.to_string(), expected: "non-negative integer" })
}

fn string_field(map: &Map<String, Value>, field: &str) -> Result<String, BuildError> {
    map.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| BuildError::InvalidField { field: field.to_string(), expected: "string" })
}

/// Executable and iteration counts for one stream
///
/// Missing keys in an ensemble file fall back to the phi-algorithm defaults one by one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RunParams {
    pub configs_to_run: u32,
    pub config_limit: u32,
    pub exec: String,
    pub nstep2: u32,
    pub nstep1: u32,
}

/// By default, run phi-algorithm for 10 configurations = 100 trajectories
impl Default for RunParams {
    fn default() -> Self {
        RunParams {
            configs_to_run: 4,
            config_limit: 10,
            exec: "su4_mrep_phi_bc1_mvapich_wj".to_string(),
            nstep2: 30,
            nstep1: 1,
        }
    }
}

/// Where the stream keeps its configurations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageParams {
    pub rootstore: String,
}

/// qsub options: allocation (`-A`) and stream name (`-N`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerParams {
    pub allocation: String,
    pub stream: String,
}
