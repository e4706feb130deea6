//! Report records: one typed value per section, built once per run.
//!
//! Collectors construct these from live management-interface queries; the
//! renderer only reads them. Severity tags are attached here, by collectors,
//! never by the renderer.

use chrono::{DateTime, Utc};

/// Operator-attention tag attached by collectors to noteworthy fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Ok,
    Caution,
    Critical,
}

/// A display value paired with the severity its collector assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub value: String,
    pub severity: Severity,
}

impl Finding {
    pub fn new(value: impl Into<String>, severity: Severity) -> Self {
        Self {
            value: value.into(),
            severity,
        }
    }
}

// ── System ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SystemSummary {
    pub os_name: String,
    pub architecture: String,
    pub build_number: String,
    pub boot_time: Option<DateTime<Utc>>,
    /// None when the boot timestamp is missing or lies in the future.
    pub uptime_secs: Option<u64>,
    /// Set when the reported boot time is later than the collection time.
    pub clock_anomaly: bool,
    pub machine_role: String,
}

// ── Firmware ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct FirmwareInfo {
    pub manufacturer: String,
    pub product: String,
    pub version: String,
    pub serial_number: String,
}

// ── Processor ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorInfo {
    pub model: String,
    pub physical_cores: u32,
    pub logical_cores: u32,
    pub clock_mhz: Option<u32>,
    /// None when the counter interface is unreachable — never coerced to 0.
    pub usage_percent: Option<f64>,
}

// ── Memory ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct MemorySummary {
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub used_bytes: u64,
    /// Defined only when total_bytes > 0.
    pub used_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryModule {
    pub slot: String,
    pub manufacturer: String,
    pub part_number: String,
    pub capacity_bytes: u64,
    pub speed_mhz: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryReport {
    pub summary: MemorySummary,
    pub modules: Vec<MemoryModule>,
}

// ── Storage ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct DiskDevice {
    pub device_id: String,
    pub model: String,
    pub media_type: String,
    pub capacity_bytes: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeUsage {
    pub device_id: String,
    pub label: String,
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub used_percent: Option<f64>,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageReport {
    pub devices: Vec<DiskDevice>,
    pub volumes: Vec<VolumeUsage>,
}

// ── Network ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkInterfaceAddress {
    pub interface: String,
    pub address: String,
    pub prefix_length: u8,
}

// ── Security ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SecurityPosture {
    pub antivirus: Finding,
    pub uac: Finding,
    pub execution_policy: Finding,
    /// None when the update inventory could not be read.
    pub patch_count: Option<usize>,
}

// ── Services ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceStatus {
    pub name: String,
    pub display_name: String,
    pub state: String,
    pub start_mode: String,
    pub description: String,
    /// Caution for an automatic service that is not running.
    pub severity: Severity,
}

// ── Environment ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentVariable {
    pub name: &'static str,
    pub value: Option<String>,
}

// ── Connections ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkConnection {
    pub pid: u32,
    /// "unknown" when the process exited between enumeration and lookup.
    pub process: String,
    pub local: String,
    pub remote: String,
    pub state: String,
}

/// The typed output of one collector, handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionData {
    System(SystemSummary),
    Firmware(FirmwareInfo),
    Processor(ProcessorInfo),
    Memory(MemoryReport),
    Storage(StorageReport),
    Network(Vec<NetworkInterfaceAddress>),
    Security(SecurityPosture),
    Services(Vec<ServiceStatus>),
    Environment(Vec<EnvironmentVariable>),
    Connections(Vec<NetworkConnection>),
}
