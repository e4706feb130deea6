//! Physical memory totals and per-module inventory.

use serde::Deserialize;
use tracing::debug;

use crate::collectors::cim::{self, CimNumber};
use crate::collectors::percent;
use crate::domain::report::{MemoryModule, MemoryReport, MemorySummary, SectionData};
use crate::error::CollectError;
use crate::probe::SystemProbe;

const TOTALS_QUERY: &str = "Get-CimInstance Win32_OperatingSystem | \
     Select-Object TotalVisibleMemorySize,FreePhysicalMemory | ConvertTo-Json";

const MODULES_QUERY: &str = "Get-CimInstance Win32_PhysicalMemory | \
     Select-Object DeviceLocator,Manufacturer,PartNumber,Capacity,Speed | ConvertTo-Json";

// Win32_OperatingSystem reports memory sizes in KiB.
const KIB: u64 = 1024;

#[derive(Debug, Deserialize)]
struct TotalsRecord {
    #[serde(rename = "TotalVisibleMemorySize")]
    total_kib: Option<CimNumber>,
    #[serde(rename = "FreePhysicalMemory")]
    free_kib: Option<CimNumber>,
}

#[derive(Debug, Deserialize)]
struct ModuleRecord {
    #[serde(rename = "DeviceLocator")]
    slot: Option<String>,
    #[serde(rename = "Manufacturer")]
    manufacturer: Option<String>,
    #[serde(rename = "PartNumber")]
    part_number: Option<String>,
    #[serde(rename = "Capacity")]
    capacity: Option<CimNumber>,
    #[serde(rename = "Speed")]
    speed_mhz: Option<CimNumber>,
}

pub async fn collect(probe: &dyn SystemProbe) -> Result<SectionData, CollectError> {
    let totals = cim::query::<TotalsRecord>(probe, TOTALS_QUERY)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            CollectError::InterfaceUnavailable("no memory totals reported".into())
        })?;

    // Module inventory is best-effort; virtual machines often report none.
    let modules = match cim::query::<ModuleRecord>(probe, MODULES_QUERY).await {
        Ok(records) => records.into_iter().map(build_module).collect(),
        Err(err) => {
            debug!(error = %err, "memory module inventory failed");
            Vec::new()
        }
    };

    Ok(SectionData::Memory(MemoryReport {
        summary: build_summary(&totals),
        modules,
    }))
}

fn build_summary(totals: &TotalsRecord) -> MemorySummary {
    let total_bytes = kib_field(&totals.total_kib);
    let free_bytes = kib_field(&totals.free_kib).min(total_bytes);
    let used_bytes = total_bytes - free_bytes;

    MemorySummary {
        total_bytes,
        free_bytes,
        used_bytes,
        used_percent: percent(used_bytes, total_bytes),
    }
}

fn kib_field(value: &Option<CimNumber>) -> u64 {
    value
        .as_ref()
        .and_then(CimNumber::as_u64)
        .map(|kib| kib * KIB)
        .unwrap_or(0)
}

fn build_module(record: ModuleRecord) -> MemoryModule {
    let clean = |v: Option<String>| {
        v.map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "unknown".into())
    };
    MemoryModule {
        slot: clean(record.slot),
        manufacturer: clean(record.manufacturer),
        part_number: clean(record.part_number),
        capacity_bytes: record
            .capacity
            .as_ref()
            .and_then(CimNumber::as_u64)
            .unwrap_or(0),
        speed_mhz: record.speed_mhz.as_ref().and_then(CimNumber::as_u32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_are_converted_from_kib() {
        let summary = build_summary(&TotalsRecord {
            total_kib: Some(CimNumber::Int(16_777_216)),
            free_kib: Some(CimNumber::Int(4_194_304)),
        });
        assert_eq!(summary.total_bytes, 16_777_216 * 1024);
        assert_eq!(summary.free_bytes, 4_194_304 * 1024);
        assert_eq!(summary.used_bytes, 12_582_912 * 1024);
        assert_eq!(summary.used_percent, Some(75.0));
    }

    #[test]
    fn missing_totals_do_not_produce_a_percentage() {
        let summary = build_summary(&TotalsRecord {
            total_kib: None,
            free_kib: None,
        });
        assert_eq!(summary.total_bytes, 0);
        assert_eq!(summary.used_percent, None);
    }

    #[test]
    fn free_never_exceeds_total() {
        let summary = build_summary(&TotalsRecord {
            total_kib: Some(CimNumber::Int(1000)),
            free_kib: Some(CimNumber::Int(2000)),
        });
        assert_eq!(summary.used_bytes, 0);
    }

    #[test]
    fn module_fields_fall_back_to_unknown() {
        let module = build_module(ModuleRecord {
            slot: Some("DIMM 0".into()),
            manufacturer: None,
            part_number: Some("  ".into()),
            capacity: Some(CimNumber::Text("8589934592".into())),
            speed_mhz: Some(CimNumber::Int(3200)),
        });
        assert_eq!(module.slot, "DIMM 0");
        assert_eq!(module.manufacturer, "unknown");
        assert_eq!(module.part_number, "unknown");
        assert_eq!(module.capacity_bytes, 8_589_934_592);
        assert_eq!(module.speed_mhz, Some(3200));
    }
}
