use jsonschema::JSONSchema;
use log::info;
use serde_json::Value;

/// included ensemble file schema
static ENSEMBLE_SCHEMA: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/schema/ensembles.json"));

/// Compile the bundled ensemble schema
///
/// The schema is self-contained (only `#/definitions` references), so no resolver is needed.
pub fn load_schema() -> Result<JSONSchema, String> {
    info!("Compiling ensemble file schema");
    let schema: Value = serde_json::from_str(ENSEMBLE_SCHEMA)
        .map_err(|err| format!("bundled schema is not JSON: {err}"))?;
    let compiled = JSONSchema::compile(&schema)
        .map_err(|err| format!("bundled schema does not compile: {err}"))?;
    Ok(compiled)
}

/// Validate an untyped ensemble document, collecting every violation
pub fn validate(schema: &JSONSchema, json: &Value) -> Result<(), Vec<String>> {
    schema.validate(json).map_err(|errors| {
        errors
            .map(|err| format!("{}: {}", err.instance_path, err))
            .collect()
    })
}
