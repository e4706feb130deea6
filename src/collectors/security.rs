//! Security posture checks: antivirus, UAC, script execution policy, and
//! the installed update count.
//!
//! These checks fail secure. When a signal cannot be read and the host's
//! true state is unknowable, the reported finding is the less protected
//! state, not the optimistic one. Only an outright access refusal turns
//! into a section failure.

use serde::Deserialize;
use tracing::debug;

use crate::collectors::cim;
use crate::domain::report::{Finding, SectionData, SecurityPosture, Severity};
use crate::error::CollectError;
use crate::probe::{powershell, ProbeError, SystemProbe};

const AV_QUERY: &str = "Get-CimInstance -Namespace root/SecurityCenter2 \
     -ClassName AntiVirusProduct -ErrorAction SilentlyContinue | \
     Select-Object displayName | ConvertTo-Json";

const PATCH_QUERY: &str =
    "Get-CimInstance Win32_QuickFixEngineering | Select-Object HotFixID | ConvertTo-Json";

const UAC_KEY: &str = r"HKLM\SOFTWARE\Microsoft\Windows\CurrentVersion\Policies\System";

#[derive(Debug, Deserialize)]
struct AvRecord {
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PatchRecord {
    #[serde(rename = "HotFixID")]
    _hotfix_id: Option<String>,
}

pub async fn collect(probe: &dyn SystemProbe) -> Result<SectionData, CollectError> {
    Ok(SectionData::Security(SecurityPosture {
        antivirus: antivirus(probe).await?,
        uac: uac(probe).await?,
        execution_policy: execution_policy(probe).await?,
        patch_count: patch_count(probe).await?,
    }))
}

async fn antivirus(probe: &dyn SystemProbe) -> Result<Finding, CollectError> {
    let names: Vec<String> = match cim::query::<AvRecord>(probe, AV_QUERY).await {
        Ok(records) => records
            .into_iter()
            .filter_map(|r| r.display_name)
            .filter(|n| !n.trim().is_empty())
            .collect(),
        Err(CollectError::PermissionDenied(detail)) => {
            return Err(CollectError::PermissionDenied(detail));
        }
        // The SecurityCenter2 namespace does not exist on server SKUs; an
        // unreadable registration is reported as no protection.
        Err(err) => {
            debug!(error = %err, "antivirus registration unreadable");
            Vec::new()
        }
    };

    Ok(if names.is_empty() {
        Finding::new("none detected", Severity::Critical)
    } else {
        Finding::new(names.join(", "), Severity::Ok)
    })
}

async fn uac(probe: &dyn SystemProbe) -> Result<Finding, CollectError> {
    let raw = match probe
        .command_output("reg", &["query", UAC_KEY, "/v", "EnableLUA"])
        .await
    {
        Ok(raw) => raw,
        Err(err @ (ProbeError::Denied { .. } | ProbeError::Missing(_))) => {
            return Err(err.into());
        }
        // `reg` exits nonzero when the value does not exist, which means UAC
        // was never enabled on this host.
        Err(err) => {
            debug!(error = %err, "UAC policy value not readable");
            return Ok(Finding::new("disabled", Severity::Critical));
        }
    };

    Ok(parse_uac(&raw))
}

fn parse_uac(raw: &str) -> Finding {
    let enabled = raw
        .lines()
        .find(|line| line.contains("EnableLUA"))
        .and_then(|line| line.split_whitespace().last())
        .map(|value| value.eq_ignore_ascii_case("0x1"))
        .unwrap_or(false);

    if enabled {
        Finding::new("enabled", Severity::Ok)
    } else {
        Finding::new("disabled", Severity::Critical)
    }
}

async fn execution_policy(probe: &dyn SystemProbe) -> Result<Finding, CollectError> {
    match powershell(probe, "Get-ExecutionPolicy").await {
        Ok(raw) => Ok(classify_policy(raw.trim())),
        Err(err @ ProbeError::Denied { .. }) => Err(err.into()),
        Err(err) => {
            debug!(error = %err, "execution policy not readable");
            Ok(Finding::new("unknown", Severity::Critical))
        }
    }
}

fn classify_policy(policy: &str) -> Finding {
    let severity = match policy {
        "AllSigned" | "RemoteSigned" => Severity::Ok,
        "Restricted" => Severity::Caution,
        // Unrestricted, Bypass, Undefined, and anything unrecognized all
        // leave script execution unconstrained as far as we can tell.
        _ => Severity::Critical,
    };
    let value = if policy.is_empty() { "unknown" } else { policy };
    Finding::new(value, severity)
}

async fn patch_count(probe: &dyn SystemProbe) -> Result<Option<usize>, CollectError> {
    match cim::query::<PatchRecord>(probe, PATCH_QUERY).await {
        Ok(records) => Ok(Some(records.len())),
        Err(CollectError::PermissionDenied(detail)) => {
            Err(CollectError::PermissionDenied(detail))
        }
        Err(err) => {
            debug!(error = %err, "update inventory unreadable");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REG_OUTPUT: &str = "\r\n\
        HKEY_LOCAL_MACHINE\\SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Policies\\System\r\n\
        \x20   EnableLUA    REG_DWORD    0x1\r\n";

    #[test]
    fn uac_is_enabled_only_for_0x1() {
        assert_eq!(parse_uac(REG_OUTPUT).value, "enabled");
        assert_eq!(parse_uac(REG_OUTPUT).severity, Severity::Ok);

        let disabled = REG_OUTPUT.replace("0x1", "0x0");
        assert_eq!(parse_uac(&disabled).value, "disabled");
        assert_eq!(parse_uac(&disabled).severity, Severity::Critical);
    }

    #[test]
    fn uac_without_the_value_line_is_disabled() {
        let finding = parse_uac("no matching value found");
        assert_eq!(finding.value, "disabled");
        assert_eq!(finding.severity, Severity::Critical);
    }

    #[test]
    fn execution_policy_tiers() {
        assert_eq!(classify_policy("RemoteSigned").severity, Severity::Ok);
        assert_eq!(classify_policy("AllSigned").severity, Severity::Ok);
        assert_eq!(classify_policy("Restricted").severity, Severity::Caution);
        assert_eq!(classify_policy("Unrestricted").severity, Severity::Critical);
        assert_eq!(classify_policy("Bypass").severity, Severity::Critical);
        assert_eq!(classify_policy("Undefined").severity, Severity::Critical);
    }

    #[test]
    fn unrecognized_policy_is_treated_as_unconstrained() {
        let finding = classify_policy("SomethingNew");
        assert_eq!(finding.value, "SomethingNew");
        assert_eq!(finding.severity, Severity::Critical);

        let empty = classify_policy("");
        assert_eq!(empty.value, "unknown");
        assert_eq!(empty.severity, Severity::Critical);
    }
}
