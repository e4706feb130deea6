//! Physical disk inventory and fixed-volume capacity.

use serde::Deserialize;

use crate::collectors::cim::{self, CimNumber};
use crate::collectors::percent;
use crate::domain::report::{DiskDevice, SectionData, Severity, StorageReport, VolumeUsage};
use crate::error::CollectError;
use crate::probe::SystemProbe;

const DISK_QUERY: &str = "Get-CimInstance Win32_DiskDrive | \
     Select-Object DeviceID,Model,MediaType,Size | ConvertTo-Json";

const VOLUME_QUERY: &str = "Get-CimInstance Win32_LogicalDisk | \
     Select-Object DeviceID,VolumeName,DriveType,Size,FreeSpace | ConvertTo-Json";

// Win32_LogicalDisk DriveType for a local fixed disk.
const DRIVE_TYPE_FIXED: u32 = 3;

#[derive(Debug, Deserialize)]
struct DiskRecord {
    #[serde(rename = "DeviceID")]
    device_id: Option<String>,
    #[serde(rename = "Model")]
    model: Option<String>,
    #[serde(rename = "MediaType")]
    media_type: Option<String>,
    #[serde(rename = "Size")]
    size: Option<CimNumber>,
}

#[derive(Debug, Deserialize)]
struct VolumeRecord {
    #[serde(rename = "DeviceID")]
    device_id: Option<String>,
    #[serde(rename = "VolumeName")]
    label: Option<String>,
    #[serde(rename = "DriveType")]
    drive_type: Option<CimNumber>,
    #[serde(rename = "Size")]
    size: Option<CimNumber>,
    #[serde(rename = "FreeSpace")]
    free: Option<CimNumber>,
}

pub async fn collect(probe: &dyn SystemProbe) -> Result<SectionData, CollectError> {
    let disks = cim::query::<DiskRecord>(probe, DISK_QUERY).await?;
    let volumes = cim::query::<VolumeRecord>(probe, VOLUME_QUERY).await?;

    Ok(SectionData::Storage(StorageReport {
        devices: disks.into_iter().map(build_device).collect(),
        volumes: volumes
            .into_iter()
            .filter(is_fixed)
            .map(build_volume)
            .collect(),
    }))
}

fn is_fixed(record: &VolumeRecord) -> bool {
    record
        .drive_type
        .as_ref()
        .and_then(CimNumber::as_u32)
        .map(|t| t == DRIVE_TYPE_FIXED)
        .unwrap_or(false)
}

fn build_device(record: DiskRecord) -> DiskDevice {
    DiskDevice {
        device_id: record.device_id.unwrap_or_else(|| "unknown".into()),
        model: record
            .model
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "unknown".into()),
        media_type: record.media_type.unwrap_or_else(|| "unknown".into()),
        capacity_bytes: record
            .size
            .as_ref()
            .and_then(CimNumber::as_u64)
            .unwrap_or(0),
    }
}

fn build_volume(record: VolumeRecord) -> VolumeUsage {
    let total_bytes = record
        .size
        .as_ref()
        .and_then(CimNumber::as_u64)
        .unwrap_or(0);
    let free_bytes = record
        .free
        .as_ref()
        .and_then(CimNumber::as_u64)
        .unwrap_or(0)
        .min(total_bytes);
    let used_percent = percent(total_bytes - free_bytes, total_bytes);

    VolumeUsage {
        device_id: record.device_id.unwrap_or_else(|| "unknown".into()),
        label: record
            .label
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| "(no label)".into()),
        total_bytes,
        free_bytes,
        used_percent,
        severity: usage_severity(used_percent),
    }
}

fn usage_severity(used_percent: Option<f64>) -> Severity {
    match used_percent {
        Some(pct) if pct > 90.0 => Severity::Critical,
        Some(pct) if pct > 75.0 => Severity::Caution,
        _ => Severity::Ok,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume(drive_type: u32, size: u64, free: u64) -> VolumeRecord {
        VolumeRecord {
            device_id: Some("C:".into()),
            label: Some("System".into()),
            drive_type: Some(CimNumber::Int(drive_type as i64)),
            size: Some(CimNumber::Int(size as i64)),
            free: Some(CimNumber::Int(free as i64)),
        }
    }

    #[test]
    fn only_fixed_volumes_are_kept() {
        assert!(is_fixed(&volume(3, 100, 50)));
        assert!(!is_fixed(&volume(5, 100, 50))); // optical
        assert!(!is_fixed(&volume(2, 100, 50))); // removable
        let mut no_type = volume(3, 100, 50);
        no_type.drive_type = None;
        assert!(!is_fixed(&no_type));
    }

    #[test]
    fn usage_thresholds_escalate_severity() {
        assert_eq!(usage_severity(Some(50.0)), Severity::Ok);
        assert_eq!(usage_severity(Some(75.0)), Severity::Ok);
        assert_eq!(usage_severity(Some(80.0)), Severity::Caution);
        assert_eq!(usage_severity(Some(95.0)), Severity::Critical);
        assert_eq!(usage_severity(None), Severity::Ok);
    }

    #[test]
    fn volume_usage_is_computed_from_size_and_free() {
        let usage = build_volume(volume(3, 1000, 250));
        assert_eq!(usage.total_bytes, 1000);
        assert_eq!(usage.free_bytes, 250);
        assert_eq!(usage.used_percent, Some(75.0));
        assert_eq!(usage.severity, Severity::Ok);
    }

    #[test]
    fn unlabeled_volume_gets_a_placeholder() {
        let mut record = volume(3, 1000, 500);
        record.label = Some("".into());
        assert_eq!(build_volume(record).label, "(no label)");
    }
}
