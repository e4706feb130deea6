//! Listening and established TCP connections with owning-process names.
//!
//! Two phases: enumerate connections, then resolve process names in one
//! batch. A process can exit between the phases; its connections keep their
//! pid and show "unknown" for the name.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use crate::collectors::cim::{self, CimNumber};
use crate::domain::report::{NetworkConnection, SectionData};
use crate::error::CollectError;
use crate::probe::SystemProbe;

const CONNECTION_QUERY: &str = "Get-NetTCPConnection -State Listen,Established | \
     Select-Object LocalAddress,LocalPort,RemoteAddress,RemotePort,State,OwningProcess | \
     ConvertTo-Json";

const PROCESS_QUERY: &str =
    "Get-CimInstance Win32_Process | Select-Object ProcessId,Name | ConvertTo-Json";

#[derive(Debug, Deserialize)]
struct ConnectionRecord {
    #[serde(rename = "LocalAddress")]
    local_address: Option<String>,
    #[serde(rename = "LocalPort")]
    local_port: Option<CimNumber>,
    #[serde(rename = "RemoteAddress")]
    remote_address: Option<String>,
    #[serde(rename = "RemotePort")]
    remote_port: Option<CimNumber>,
    #[serde(rename = "State")]
    state: Option<StateValue>,
    #[serde(rename = "OwningProcess")]
    pid: Option<CimNumber>,
}

// ConvertTo-Json renders the state enum as a number or a name depending on
// the PowerShell version.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StateValue {
    Number(i64),
    Name(String),
}

impl StateValue {
    fn display(&self) -> String {
        match self {
            StateValue::Number(2) => "Listen".into(),
            StateValue::Number(5) => "Established".into(),
            StateValue::Number(n) => format!("State({n})"),
            StateValue::Name(name) => name.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProcessRecord {
    #[serde(rename = "ProcessId")]
    pid: Option<CimNumber>,
    #[serde(rename = "Name")]
    name: Option<String>,
}

pub async fn collect(probe: &dyn SystemProbe) -> Result<SectionData, CollectError> {
    let records = cim::query::<ConnectionRecord>(probe, CONNECTION_QUERY).await?;

    // Process names are a best-effort enrichment of an already-collected
    // connection list.
    let names = match cim::query::<ProcessRecord>(probe, PROCESS_QUERY).await {
        Ok(processes) => process_names(processes),
        Err(err) => {
            debug!(error = %err, "process enumeration failed");
            HashMap::new()
        }
    };

    Ok(SectionData::Connections(build_connections(records, &names)))
}

fn process_names(processes: Vec<ProcessRecord>) -> HashMap<u32, String> {
    processes
        .into_iter()
        .filter_map(|p| Some((p.pid.as_ref().and_then(CimNumber::as_u32)?, p.name?)))
        .collect()
}

fn build_connections(
    records: Vec<ConnectionRecord>,
    names: &HashMap<u32, String>,
) -> Vec<NetworkConnection> {
    let mut connections: Vec<NetworkConnection> = records
        .into_iter()
        .map(|record| {
            let pid = record
                .pid
                .as_ref()
                .and_then(CimNumber::as_u32)
                .unwrap_or(0);
            NetworkConnection {
                pid,
                process: names.get(&pid).cloned().unwrap_or_else(|| "unknown".into()),
                local: endpoint(record.local_address, &record.local_port),
                remote: endpoint(record.remote_address, &record.remote_port),
                state: record
                    .state
                    .map(|s| s.display())
                    .unwrap_or_else(|| "unknown".into()),
            }
        })
        .collect();

    connections.sort_by(|a, b| {
        a.state
            .cmp(&b.state)
            .then(a.local.cmp(&b.local))
            .then(a.pid.cmp(&b.pid))
    });
    connections
}

fn endpoint(address: Option<String>, port: &Option<CimNumber>) -> String {
    let address = address.unwrap_or_else(|| "*".into());
    let port = port.as_ref().and_then(CimNumber::as_u32).unwrap_or(0);
    format!("{address}:{port}")
}
