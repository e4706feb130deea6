//! Terminal rendering of collected sections.
//!
//! The renderer is a pure function of the typed section data. It never
//! decides what is alarming; it only paints the severity the collector
//! already assigned: green for Ok, yellow for Caution, red for Critical.

use std::fmt::Write;

use colored::Colorize;

use crate::collectors::SectionKind;
use crate::domain::report::{
    EnvironmentVariable, Finding, FirmwareInfo, MemoryReport, NetworkConnection,
    NetworkInterfaceAddress, ProcessorInfo, SectionData, SecurityPosture, ServiceStatus, Severity,
    StorageReport, SystemSummary,
};

const DESCRIPTION_WIDTH: usize = 60;

pub fn render_section(kind: SectionKind, data: &SectionData) -> String {
    let mut out = String::new();
    match data {
        SectionData::System(summary) => system(&mut out, summary),
        SectionData::Firmware(info) => firmware(&mut out, info),
        SectionData::Processor(info) => processor(&mut out, info),
        SectionData::Memory(report) => memory(&mut out, report),
        SectionData::Storage(report) => storage(&mut out, report),
        SectionData::Network(addresses) => network(&mut out, addresses),
        SectionData::Security(posture) => security(&mut out, posture),
        SectionData::Services(services) => service_list(&mut out, services),
        SectionData::Environment(variables) => environment(&mut out, variables),
        SectionData::Connections(connections) => connection_list(&mut out, connections),
    }
    debug_assert!(!out.is_empty(), "empty rendering for {:?}", kind);
    out
}

fn paint(text: &str, severity: Severity) -> String {
    match severity {
        Severity::Ok => text.green().to_string(),
        Severity::Caution => text.yellow().to_string(),
        Severity::Critical => text.red().to_string(),
    }
}

fn paint_finding(finding: &Finding) -> String {
    paint(&finding.value, finding.severity)
}

fn system(out: &mut String, summary: &SystemSummary) {
    let _ = writeln!(out, "  OS:            {}", summary.os_name);
    let _ = writeln!(out, "  Architecture:  {}", summary.architecture);
    let _ = writeln!(out, "  Build:         {}", summary.build_number);
    let _ = writeln!(out, "  Role:          {}", summary.machine_role);
    if let Some(boot) = summary.boot_time {
        let _ = writeln!(out, "  Booted:        {}", boot.to_rfc3339());
    }
    match summary.uptime_secs {
        Some(secs) => {
            let _ = writeln!(out, "  Uptime:        {}", fmt_uptime(secs));
        }
        None if summary.clock_anomaly => {
            let _ = writeln!(
                out,
                "  Uptime:        {}",
                "clock anomaly — boot time is in the future".red()
            );
        }
        None => {
            let _ = writeln!(out, "  Uptime:        {}", "unknown".dimmed());
        }
    }
}

fn firmware(out: &mut String, info: &FirmwareInfo) {
    let _ = writeln!(out, "  Manufacturer:  {}", info.manufacturer);
    let _ = writeln!(out, "  Product:       {}", info.product);
    let _ = writeln!(out, "  Version:       {}", info.version);
    let _ = writeln!(out, "  Serial:        {}", info.serial_number);
}

fn processor(out: &mut String, info: &ProcessorInfo) {
    let _ = writeln!(out, "  Model:         {}", info.model);
    let _ = writeln!(
        out,
        "  Cores:         {} physical / {} logical",
        info.physical_cores, info.logical_cores
    );
    if let Some(mhz) = info.clock_mhz {
        let _ = writeln!(out, "  Max Clock:     {} MHz", mhz);
    }
    match info.usage_percent {
        Some(pct) => {
            let _ = writeln!(out, "  Usage:         {:.2}%", pct);
        }
        None => {
            let _ = writeln!(out, "  Usage:         {}", "unknown".dimmed());
        }
    }
}

fn memory(out: &mut String, report: &MemoryReport) {
    let summary = &report.summary;
    let _ = writeln!(out, "  Total:         {}", fmt_bytes(summary.total_bytes));
    let _ = writeln!(out, "  Used:          {}", fmt_bytes(summary.used_bytes));
    let _ = writeln!(out, "  Free:          {}", fmt_bytes(summary.free_bytes));
    match summary.used_percent {
        Some(pct) => {
            let _ = writeln!(out, "  Usage:         {:.2}%", pct);
        }
        None => {
            let _ = writeln!(out, "  Usage:         {}", "unknown".dimmed());
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "  {}", "Modules:".dimmed());
    if report.modules.is_empty() {
        let _ = writeln!(out, "    {}", "none reported".dimmed());
        return;
    }
    for module in &report.modules {
        let mut line = format!(
            "    {}: {} {}",
            module.slot.bold(),
            module.manufacturer,
            module.part_number
        );
        line.push_str(&format!(" — {}", fmt_bytes(module.capacity_bytes)));
        if let Some(speed) = module.speed_mhz {
            line.push_str(&format!(" @ {} MHz", speed));
        }
        let _ = writeln!(out, "{}", line);
    }
}

fn storage(out: &mut String, report: &StorageReport) {
    let _ = writeln!(out, "  {}", "Devices:".dimmed());
    if report.devices.is_empty() {
        let _ = writeln!(out, "    {}", "none reported".dimmed());
    }
    for device in &report.devices {
        let _ = writeln!(
            out,
            "    {} — {} [{}] {}",
            device.device_id.bold(),
            device.model,
            device.media_type,
            fmt_bytes(device.capacity_bytes)
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "  {}", "Fixed Volumes:".dimmed());
    if report.volumes.is_empty() {
        let _ = writeln!(out, "    {}", "none reported".dimmed());
    }
    for volume in &report.volumes {
        let used = match volume.used_percent {
            Some(pct) => paint(&format!("{:.2}% used", pct), volume.severity),
            None => "usage unknown".dimmed().to_string(),
        };
        let _ = writeln!(
            out,
            "    {} ({}) — {} total, {} free, {}",
            volume.device_id.bold(),
            volume.label,
            fmt_bytes(volume.total_bytes),
            fmt_bytes(volume.free_bytes),
            used
        );
    }
}

fn network(out: &mut String, addresses: &[NetworkInterfaceAddress]) {
    if addresses.is_empty() {
        let _ = writeln!(out, "  {}", "no non-loopback IPv4 addresses".dimmed());
        return;
    }
    let width = addresses
        .iter()
        .map(|a| a.interface.len())
        .max()
        .unwrap_or(0);
    for address in addresses {
        let _ = writeln!(
            out,
            "  {:<width$}  {}/{}",
            address.interface.bold(),
            address.address,
            address.prefix_length,
            width = width
        );
    }
}

fn security(out: &mut String, posture: &SecurityPosture) {
    let _ = writeln!(out, "  Antivirus:        {}", paint_finding(&posture.antivirus));
    let _ = writeln!(out, "  UAC:              {}", paint_finding(&posture.uac));
    let _ = writeln!(
        out,
        "  Execution Policy: {}",
        paint_finding(&posture.execution_policy)
    );
    match posture.patch_count {
        Some(count) => {
            let _ = writeln!(out, "  Installed Updates: {}", count);
        }
        None => {
            let _ = writeln!(out, "  Installed Updates: {}", "unavailable".dimmed());
        }
    }
}

fn service_list(out: &mut String, services: &[ServiceStatus]) {
    if services.is_empty() {
        let _ = writeln!(out, "  {}", "no automatic services reported".dimmed());
        return;
    }
    let name_width = services.iter().map(|s| s.name.len()).max().unwrap_or(0);
    let state_width = services.iter().map(|s| s.state.len()).max().unwrap_or(0);

    for service in services {
        let padded_state = format!("{:<state_width$}", service.state);
        let _ = writeln!(
            out,
            "  {:<name_width$}  {}  {}",
            service.name.bold(),
            paint(&padded_state, service.severity),
            service.display_name
        );
        if !service.description.is_empty() {
            for line in wrap(&service.description, DESCRIPTION_WIDTH) {
                let _ = writeln!(out, "      {}", line.dimmed());
            }
        }
    }
}

fn environment(out: &mut String, variables: &[EnvironmentVariable]) {
    let width = variables.iter().map(|v| v.name.len()).max().unwrap_or(0);
    for variable in variables {
        match &variable.value {
            Some(value) => {
                let _ = writeln!(out, "  {:<width$}  {}", variable.name, value);
            }
            None => {
                let _ = writeln!(out, "  {:<width$}  {}", variable.name, "(not set)".dimmed());
            }
        }
    }
}

fn connection_list(out: &mut String, connections: &[NetworkConnection]) {
    if connections.is_empty() {
        let _ = writeln!(out, "  {}", "no TCP connections reported".dimmed());
        return;
    }
    let state_width = connections
        .iter()
        .map(|c| c.state.len())
        .max()
        .unwrap_or(0)
        .max("STATE".len());
    let local_width = connections
        .iter()
        .map(|c| c.local.len())
        .max()
        .unwrap_or(0)
        .max("LOCAL".len());
    let remote_width = connections
        .iter()
        .map(|c| c.remote.len())
        .max()
        .unwrap_or(0)
        .max("REMOTE".len());

    let header = format!(
        "  {:<state_width$}  {:<local_width$}  {:<remote_width$}  {:>7}  PROCESS",
        "STATE", "LOCAL", "REMOTE", "PID"
    );
    let _ = writeln!(out, "{}", header.dimmed());
    for conn in connections {
        let _ = writeln!(
            out,
            "  {:<state_width$}  {:<local_width$}  {:<remote_width$}  {:>7}  {}",
            conn.state, conn.local, conn.remote, conn.pid, conn.process
        );
    }
}

/// Word-wrap without truncation; a single overlong word gets its own line.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

pub fn fmt_bytes(bytes: u64) -> String {
    if bytes >= 1_099_511_627_776 {
        format!("{:.2} TB", bytes as f64 / 1_099_511_627_776.0)
    } else if bytes >= 1_073_741_824 {
        format!("{:.2} GB", bytes as f64 / 1_073_741_824.0)
    } else if bytes >= 1_048_576 {
        format!("{:.2} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

pub fn fmt_uptime(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let mins = (secs % 3600) / 60;
    if days > 0 {
        format!("{}d {}h {}m", days, hours, mins)
    } else if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}
