use crate::ensemble::params::LatticeParams;
use crate::mode::StreamNamePolicy;

pub fn stream_name(policy: StreamNamePolicy, lattice: &LatticeParams) -> String {
    match policy {
        StreamNamePolicy::ScriptStyle => script_style(lattice),
        StreamNamePolicy::DerivedStyle => derived_style(lattice),
    }
}

/// `hmc_{beta}_{k4}_{k6}`, values verbatim
fn script_style(lattice: &LatticeParams) -> String {
    format!("hmc_{}_{}_{}", lattice.beta, lattice.k4, lattice.k6)
}

/// `g{beta}_{k4}_{k6}` with the dots in beta turned into underscores and only the fractional
/// digits of the hopping parameters, e.g. `g7_55_1300_1325`
fn derived_style(lattice: &LatticeParams) -> String {
    let beta = lattice.beta.replace('.', "_");
    format!("g{}_{}_{}", beta, after_last_dot(&lattice.k4), after_last_dot(&lattice.k6))
}

fn after_last_dot(value: &str) -> &str {
    value.rsplit('.').next().unwrap_or(value)
}
