//! Services configured for automatic start.
//!
//! An automatic service that is not running is the interesting case; the
//! collector tags it Caution so the renderer paints it for attention.

use serde::Deserialize;

use crate::collectors::cim;
use crate::domain::report::{SectionData, ServiceStatus, Severity};
use crate::error::CollectError;
use crate::probe::SystemProbe;

const SERVICE_QUERY: &str = "Get-CimInstance Win32_Service | \
     Select-Object Name,DisplayName,State,StartMode,Description | ConvertTo-Json";

#[derive(Debug, Deserialize)]
struct ServiceRecord {
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "DisplayName")]
    display_name: Option<String>,
    #[serde(rename = "State")]
    state: Option<String>,
    #[serde(rename = "StartMode")]
    start_mode: Option<String>,
    #[serde(rename = "Description")]
    description: Option<String>,
}

pub async fn collect(probe: &dyn SystemProbe) -> Result<SectionData, CollectError> {
    let records = cim::query::<ServiceRecord>(probe, SERVICE_QUERY).await?;

    let mut services: Vec<ServiceStatus> = records
        .into_iter()
        .filter(is_automatic)
        .map(build_status)
        .collect();
    services.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(SectionData::Services(services))
}

// Matches both "Auto" and "Automatic (Delayed Start)" style values.
fn is_automatic(record: &ServiceRecord) -> bool {
    record
        .start_mode
        .as_deref()
        .map(|mode| mode.to_lowercase().starts_with("auto"))
        .unwrap_or(false)
}

fn build_status(record: ServiceRecord) -> ServiceStatus {
    let state = record.state.unwrap_or_else(|| "Unknown".into());
    let severity = if state.eq_ignore_ascii_case("running") {
        Severity::Ok
    } else {
        Severity::Caution
    };

    ServiceStatus {
        name: record.name.unwrap_or_else(|| "unknown".into()),
        display_name: record.display_name.unwrap_or_default(),
        state,
        start_mode: record.start_mode.unwrap_or_else(|| "Auto".into()),
        description: record.description.unwrap_or_default(),
        severity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, state: &str, start_mode: &str) -> ServiceRecord {
        ServiceRecord {
            name: Some(name.into()),
            display_name: Some(format!("{name} display")),
            state: Some(state.into()),
            start_mode: Some(start_mode.into()),
            description: None,
        }
    }

    #[test]
    fn only_automatic_services_pass_the_filter() {
        assert!(is_automatic(&record("a", "Running", "Auto")));
        assert!(is_automatic(&record("b", "Running", "Automatic (Delayed Start)")));
        assert!(!is_automatic(&record("c", "Running", "Manual")));
        assert!(!is_automatic(&record("d", "Stopped", "Disabled")));
    }

    #[test]
    fn stopped_automatic_service_is_tagged_caution() {
        let stopped = build_status(record("wuauserv", "Stopped", "Auto"));
        assert_eq!(stopped.severity, Severity::Caution);

        let running = build_status(record("Dhcp", "Running", "Auto"));
        assert_eq!(running.severity, Severity::Ok);
    }

    #[test]
    fn missing_state_is_not_treated_as_running() {
        let mut rec = record("x", "Running", "Auto");
        rec.state = None;
        let status = build_status(rec);
        assert_eq!(status.state, "Unknown");
        assert_eq!(status.severity, Severity::Caution);
    }
}
