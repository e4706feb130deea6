//! A fixed allow-list of session environment variables.
//!
//! The list is closed on purpose; dumping the whole environment would leak
//! credentials that tooling commonly parks there.

use crate::domain::report::{EnvironmentVariable, SectionData};
use crate::error::CollectError;
use crate::probe::SystemProbe;

const REPORTED_VARIABLES: [&str; 6] = [
    "USERNAME",
    "COMPUTERNAME",
    "PATH",
    "TEMP",
    "APPDATA",
    "LOGONSERVER",
];

pub async fn collect(probe: &dyn SystemProbe) -> Result<SectionData, CollectError> {
    let variables = REPORTED_VARIABLES
        .iter()
        .map(|&name| EnvironmentVariable {
            name,
            value: probe.env_var(name),
        })
        .collect();

    Ok(SectionData::Environment(variables))
}
