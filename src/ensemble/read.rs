use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use jsonschema::JSONSchema;
use log::{info, warn};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::command::{BuildError, Command, CommandBuilder};
use crate::ensemble::params::{LatticeParams, RunParams, SchedulerParams, StorageParams};
use crate::ensemble::schema;

#[derive(Debug)]
pub enum EnsembleError {
    ReadError(String),
    DecodeError(String),
    ValidationError(Vec<String>),
    DeserialisationError(String),
}

impl fmt::Display for EnsembleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EnsembleError::ReadError(err) => write!(f, "can't read ensemble file: {err}"),
            EnsembleError::DecodeError(err) => write!(f, "ensemble file is not valid JSON: {err}"),
            EnsembleError::ValidationError(errors) => {
                write!(f, "ensemble file fails validation: {}", errors.join("; "))
            }
            EnsembleError::DeserialisationError(err) => write!(f, "can't deserialise ensemble file: {err}"),
        }
    }
}

impl std::error::Error for EnsembleError {}

/// One entry of an ensemble file
///
/// The lattice stays untyped until the command is built, so a missing key is reported as a
/// missing field of that ensemble rather than as a generic decoding failure of the whole file.
#[derive(Debug, Clone, Deserialize)]
pub struct Ensemble {
    pub lattice: Map<String, Value>,
    pub run: Option<RunParams>,
    pub storage: Option<StorageOverride>,
    pub scheduler: Option<SchedulerOverride>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageOverride {
    pub rootstore: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchedulerOverride {
    #[serde(rename = "A")]
    pub allocation: Option<String>,
    #[serde(rename = "N")]
    pub stream: Option<String>,
}

impl Ensemble {
    /// Resolve overrides against the builder's defaults and build the command
    pub fn build(&self, builder: &CommandBuilder) -> Result<Command, BuildError> {
        let lattice = LatticeParams::from_map(&self.lattice)?;

        let storage = self.storage.as_ref()
            .and_then(|storage| storage.rootstore.clone())
            .map(|rootstore| StorageParams { rootstore });

        let scheduler = self.scheduler.as_ref().map(|over| {
            let default = builder.default_scheduler(&lattice);
            SchedulerParams {
                allocation: over.allocation.clone().unwrap_or(default.allocation),
                stream: over.stream.clone().unwrap_or(default.stream),
            }
        });

        builder.build(&lattice, self.run.as_ref(), storage.as_ref(), scheduler.as_ref())
    }
}

#[derive(Debug, Deserialize)]
struct EnsembleFile {
    ensembles: Vec<Ensemble>,
}

pub struct EnsembleSource {
    pub path: PathBuf,
    pub compiled_schema: JSONSchema,
}

impl EnsembleSource {
    pub fn new(path: &Path) -> Result<EnsembleSource, EnsembleError> {
        let compiled_schema = schema::load_schema()
            .map_err(|err| EnsembleError::ValidationError(vec![err]))?;
        Ok(EnsembleSource { path: path.to_path_buf(), compiled_schema })
    }

    pub fn read(&self) -> Result<Vec<Ensemble>, EnsembleError> {
        let json: Value = self.parse_untyped_json()?;

        match schema::validate(&self.compiled_schema, &json) {
            Ok(_) => {
                info!("Ensemble file is valid");
                self.parse_json(json)
            }
            Err(errors) => {
                warn!("Ensemble file fails validation");
                for error in &errors {
                    warn!("{error}");
                }
                Err(EnsembleError::ValidationError(errors))
            }
        }
    }

    fn read_file(&self) -> Result<String, EnsembleError> {
        let path: &Path = self.path.as_path();
        info!("Reading ensembles at {}", path.display());
        fs::read_to_string(path).map_err(|err| {
            warn!("Can't read ensemble file at path {}: {}", path.display(), err);
            EnsembleError::ReadError(format!("{}: {}", path.display(), err))
        })
    }

    fn parse_untyped_json(&self) -> Result<Value, EnsembleError> {
        info!("Parsing JSON into untyped structure");
        let json_string = self.read_file()?;
        serde_json::from_str::<Value>(&json_string)
            .map_err(|err| EnsembleError::DecodeError(err.to_string()))
    }

    fn parse_json(&self, value: Value) -> Result<Vec<Ensemble>, EnsembleError> {
        info!("Deserialising valid JSON into typed ensembles");
        let file = serde_json::from_value::<EnsembleFile>(value)
            .map_err(|err| EnsembleError::DeserialisationError(err.to_string()))?;
        info!("Read {} ensemble(s)", file.ensembles.len());
        Ok(file.ensembles)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::command::LaunchConfig;

    fn write_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn read(contents: &str) -> Result<Vec<Ensemble>, EnsembleError> {
        let file = write_file(contents);
        EnsembleSource::new(file.path()).unwrap().read()
    }

    #[test]
    fn reads_bundled_example() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/ensembles/multirep.json");
        let ensembles = EnsembleSource::new(&path).unwrap().read().unwrap();
        assert_eq!(ensembles.len(), 1);
        assert_eq!(ensembles[0].run.as_ref().unwrap().configs_to_run, 7);
        assert!(ensembles[0].storage.is_none());
        assert!(ensembles[0].scheduler.is_none());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let source = EnsembleSource::new(Path::new("/nonexistent/ensembles.json")).unwrap();
        assert!(matches!(source.read(), Err(EnsembleError::ReadError(_))));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(read("ensembles: ["), Err(EnsembleError::DecodeError(_))));
    }

    #[test]
    fn schema_violation_is_a_validation_error() {
        let result = read(r#"{"ensembles": [{"run": {"exec": "x"}}]}"#);
        assert!(matches!(result, Err(EnsembleError::ValidationError(_))));
    }

    #[test]
    fn entry_missing_lattice_field_fails_at_build() {
        let ensembles = read(r#"{"ensembles": [{"lattice": {"nx": 16, "nt": 32, "beta": "7.50", "k4": "0.1290"}}]}"#).unwrap();
        let builder = CommandBuilder::new(LaunchConfig::default());
        let err = ensembles[0].build(&builder).unwrap_err();
        assert_eq!(err, BuildError::MissingField { field: "k6".to_string() });
    }

    #[test]
    fn partial_scheduler_override_keeps_default_stream() {
        let ensembles = read(r#"{"ensembles": [{
            "lattice": {"nx": 16, "nt": 32, "beta": "7.50", "k4": "0.1290", "k6": "0.1308"},
            "scheduler": {"A": "other"}
        }]}"#).unwrap();
        let builder = CommandBuilder::new(LaunchConfig::default());
        let command = ensembles[0].build(&builder).unwrap();
        assert!(command.args.ends_with(" other hmc_7.50_0.1290_0.1308"));
    }

    #[test]
    fn storage_override_replaces_rootstore() {
        let ensembles = read(r#"{"ensembles": [{
            "lattice": {"nx": 16, "nt": 32, "beta": "7.50", "k4": "0.1290", "k6": "0.1308"},
            "storage": {"rootstore": "/scratch/run"}
        }]}"#).unwrap();
        let builder = CommandBuilder::new(LaunchConfig::default());
        let command = ensembles[0].build(&builder).unwrap();
        assert!(command.args.contains(" 1 /scratch/run multirep "));
    }
}
