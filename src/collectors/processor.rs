//! Processor inventory plus a live utilization sample.
//!
//! Inventory comes from `Win32_Processor`; utilization from a two-sample
//! `typeperf` run. The second source is strictly optional: when the counter
//! cannot be read the section still succeeds with usage unknown.

use serde::Deserialize;
use tracing::debug;

use crate::collectors::cim::{self, CimNumber};
use crate::domain::report::{ProcessorInfo, SectionData};
use crate::error::CollectError;
use crate::probe::SystemProbe;

const CPU_QUERY: &str = "Get-CimInstance Win32_Processor | \
     Select-Object Name,NumberOfCores,NumberOfLogicalProcessors,MaxClockSpeed | ConvertTo-Json";

const USAGE_COUNTER: &str = r"\Processor(_Total)\% Processor Time";

#[derive(Debug, Deserialize)]
struct CpuRecord {
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "NumberOfCores")]
    cores: Option<CimNumber>,
    #[serde(rename = "NumberOfLogicalProcessors")]
    logical: Option<CimNumber>,
    #[serde(rename = "MaxClockSpeed")]
    clock_mhz: Option<CimNumber>,
}

pub async fn collect(probe: &dyn SystemProbe) -> Result<SectionData, CollectError> {
    let records = cim::query::<CpuRecord>(probe, CPU_QUERY).await?;
    if records.is_empty() {
        return Err(CollectError::InterfaceUnavailable(
            "no processor instance reported".into(),
        ));
    }

    let usage_percent = match probe
        .command_output("typeperf", &[USAGE_COUNTER, "-sc", "2"])
        .await
    {
        Ok(raw) => parse_typeperf(&raw),
        Err(err) => {
            debug!(error = %err, "processor usage sampling failed");
            None
        }
    };

    Ok(SectionData::Processor(build_info(records, usage_percent)))
}

fn build_info(records: Vec<CpuRecord>, usage_percent: Option<f64>) -> ProcessorInfo {
    let model = records
        .first()
        .and_then(|r| r.name.as_deref())
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or("unknown")
        .to_string();

    let physical: u32 = records
        .iter()
        .filter_map(|r| r.cores.as_ref().and_then(CimNumber::as_u32))
        .sum();
    let logical: u32 = records
        .iter()
        .filter_map(|r| r.logical.as_ref().and_then(CimNumber::as_u32))
        .sum();

    // A host has at least one core, and the logical count is never below
    // the physical count.
    let physical_cores = physical.max(1);
    let logical_cores = logical.max(physical_cores);

    ProcessorInfo {
        model,
        physical_cores,
        logical_cores,
        clock_mhz: records
            .first()
            .and_then(|r| r.clock_mhz.as_ref())
            .and_then(CimNumber::as_u32),
        usage_percent,
    }
}

/// Pull the last sample out of `typeperf` CSV output.
///
/// The first sample of a rate counter is computed against an unknown
/// baseline, so a run that produced fewer than two samples yields nothing.
fn parse_typeperf(raw: &str) -> Option<f64> {
    let samples: Vec<f64> = raw
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('"'))
        .filter_map(|line| {
            let mut fields = line.split("\",\"");
            let _timestamp = fields.next()?;
            let value = fields.next()?.trim_end_matches('"');
            value.parse::<f64>().ok()
        })
        .collect();

    if samples.len() < 2 {
        return None;
    }
    samples.last().map(|v| v.clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TYPEPERF_OUTPUT: &str = "\r\n\
        \"(PDH-CSV 4.0)\",\"\\\\HOST\\Processor(_Total)\\% Processor Time\"\r\n\
        \"11/20/2023 10:00:01.000\",\"57.119026\"\r\n\
        \"11/20/2023 10:00:02.000\",\"12.482064\"\r\n\
        Exiting, please wait...\r\n";

    #[test]
    fn last_sample_wins() {
        let usage = parse_typeperf(TYPEPERF_OUTPUT).unwrap();
        assert!((usage - 12.482064).abs() < 1e-9);
    }

    #[test]
    fn single_sample_is_not_enough() {
        let raw = "\"(PDH-CSV 4.0)\",\"counter\"\r\n\"11/20/2023 10:00:01.000\",\"57.1\"\r\n";
        assert_eq!(parse_typeperf(raw), None);
        assert_eq!(parse_typeperf(""), None);
    }

    #[test]
    fn samples_are_clamped_to_percent_range() {
        let raw = "\"t1\",\"-0.3\"\r\n\"t2\",\"100.2\"\r\n";
        assert_eq!(parse_typeperf(raw), Some(100.0));
    }

    #[test]
    fn multi_socket_counts_are_summed() {
        let records = vec![
            CpuRecord {
                name: Some("Intel Xeon Gold 6338".into()),
                cores: Some(CimNumber::Int(32)),
                logical: Some(CimNumber::Int(64)),
                clock_mhz: Some(CimNumber::Int(2000)),
            },
            CpuRecord {
                name: Some("Intel Xeon Gold 6338".into()),
                cores: Some(CimNumber::Int(32)),
                logical: Some(CimNumber::Int(64)),
                clock_mhz: Some(CimNumber::Int(2000)),
            },
        ];
        let info = build_info(records, Some(41.5));
        assert_eq!(info.physical_cores, 64);
        assert_eq!(info.logical_cores, 128);
        assert_eq!(info.clock_mhz, Some(2000));
        assert_eq!(info.usage_percent, Some(41.5));
    }

    #[test]
    fn core_counts_never_drop_below_one() {
        let records = vec![CpuRecord {
            name: None,
            cores: None,
            logical: None,
            clock_mhz: None,
        }];
        let info = build_info(records, None);
        assert_eq!(info.physical_cores, 1);
        assert_eq!(info.logical_cores, 1);
        assert_eq!(info.model, "unknown");
    }
}
