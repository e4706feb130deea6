//! Operating system identity, boot time, and domain role.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::collectors::cim::{self, parse_cim_date};
use crate::domain::report::{SectionData, SystemSummary};
use crate::error::CollectError;
use crate::probe::SystemProbe;

const OS_QUERY: &str = "Get-CimInstance Win32_OperatingSystem | \
     Select-Object Caption,OSArchitecture,BuildNumber,LastBootUpTime | ConvertTo-Json";

const ROLE_QUERY: &str =
    "Get-CimInstance Win32_ComputerSystem | Select-Object DomainRole | ConvertTo-Json";

#[derive(Debug, Deserialize)]
struct OsRecord {
    #[serde(rename = "Caption")]
    caption: Option<String>,
    #[serde(rename = "OSArchitecture")]
    architecture: Option<String>,
    #[serde(rename = "BuildNumber")]
    build_number: Option<String>,
    #[serde(rename = "LastBootUpTime")]
    last_boot: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RoleRecord {
    #[serde(rename = "DomainRole")]
    domain_role: Option<u8>,
}

pub async fn collect(probe: &dyn SystemProbe) -> Result<SectionData, CollectError> {
    let os = cim::query::<OsRecord>(probe, OS_QUERY)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            CollectError::InterfaceUnavailable("no operating system instance reported".into())
        })?;

    // The domain role is informational; its absence never fails the section.
    let role = match cim::query::<RoleRecord>(probe, ROLE_QUERY).await {
        Ok(records) => records.into_iter().next().and_then(|r| r.domain_role),
        Err(err) => {
            debug!(error = %err, "domain role lookup failed");
            None
        }
    };

    Ok(SectionData::System(summarize(os, role, Utc::now())))
}

fn summarize(os: OsRecord, role: Option<u8>, now: DateTime<Utc>) -> SystemSummary {
    let boot_time = os.last_boot.as_deref().and_then(parse_cim_date);

    // A boot time later than now means the host clock moved; report the
    // anomaly instead of a nonsense uptime.
    let (uptime_secs, clock_anomaly) = match boot_time {
        Some(boot) if boot <= now => (Some((now - boot).num_seconds() as u64), false),
        Some(_) => (None, true),
        None => (None, false),
    };

    SystemSummary {
        os_name: os.caption.unwrap_or_else(|| "unknown".into()),
        architecture: os.architecture.unwrap_or_else(|| "unknown".into()),
        build_number: os.build_number.unwrap_or_else(|| "unknown".into()),
        boot_time,
        uptime_secs,
        clock_anomaly,
        machine_role: role_name(role).into(),
    }
}

fn role_name(role: Option<u8>) -> &'static str {
    match role {
        Some(0) => "Standalone Workstation",
        Some(1) => "Member Workstation",
        Some(2) => "Standalone Server",
        Some(3) => "Member Server",
        Some(4) => "Backup Domain Controller",
        Some(5) => "Primary Domain Controller",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(boot_millis: i64) -> OsRecord {
        OsRecord {
            caption: Some("Microsoft Windows Server 2022 Standard".into()),
            architecture: Some("64-bit".into()),
            build_number: Some("20348".into()),
            last_boot: Some(format!(r"\/Date({boot_millis})\/")),
        }
    }

    #[test]
    fn uptime_is_derived_from_boot_time() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let summary = summarize(record(1_699_913_600_000), Some(3), now);
        assert_eq!(summary.uptime_secs, Some(86_400));
        assert!(!summary.clock_anomaly);
        assert_eq!(summary.machine_role, "Member Server");
    }

    #[test]
    fn future_boot_time_is_a_clock_anomaly() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let summary = summarize(record(1_700_000_100_000), Some(1), now);
        assert_eq!(summary.uptime_secs, None);
        assert!(summary.clock_anomaly);
        assert!(summary.boot_time.is_some());
    }

    #[test]
    fn missing_boot_time_is_unknown_not_anomalous() {
        let mut os = record(0);
        os.last_boot = None;
        let summary = summarize(os, None, Utc::now());
        assert_eq!(summary.uptime_secs, None);
        assert!(!summary.clock_anomaly);
        assert_eq!(summary.machine_role, "unknown");
    }
}
