//! Collectors, one per report section, invoked in a fixed order.
//!
//! Each collector is a function of the probe alone: it queries one
//! management surface, builds its typed record, and converts any fault into
//! a `CollectError` at its own boundary. No collector aborts the run.

pub mod cim;
pub mod connections;
pub mod environment;
pub mod firmware;
pub mod memory;
pub mod network;
pub mod processor;
pub mod security;
pub mod services;
pub mod storage;
pub mod system;

use crate::domain::report::SectionData;
use crate::error::CollectError;
use crate::probe::SystemProbe;

/// The fixed section order of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    System,
    Firmware,
    Processor,
    Memory,
    Storage,
    Network,
    Security,
    Services,
    Environment,
    Connections,
}

impl SectionKind {
    pub const ORDER: [SectionKind; 10] = [
        SectionKind::System,
        SectionKind::Firmware,
        SectionKind::Processor,
        SectionKind::Memory,
        SectionKind::Storage,
        SectionKind::Network,
        SectionKind::Security,
        SectionKind::Services,
        SectionKind::Environment,
        SectionKind::Connections,
    ];

    pub fn title(self) -> &'static str {
        match self {
            SectionKind::System => "System",
            SectionKind::Firmware => "Firmware",
            SectionKind::Processor => "Processor",
            SectionKind::Memory => "Memory",
            SectionKind::Storage => "Storage",
            SectionKind::Network => "Network Addresses",
            SectionKind::Security => "Security Posture",
            SectionKind::Services => "Automatic Services",
            SectionKind::Environment => "Environment",
            SectionKind::Connections => "TCP Connections",
        }
    }

    pub async fn collect(self, probe: &dyn SystemProbe) -> Result<SectionData, CollectError> {
        match self {
            SectionKind::System => system::collect(probe).await,
            SectionKind::Firmware => firmware::collect(probe).await,
            SectionKind::Processor => processor::collect(probe).await,
            SectionKind::Memory => memory::collect(probe).await,
            SectionKind::Storage => storage::collect(probe).await,
            SectionKind::Network => network::collect(probe).await,
            SectionKind::Security => security::collect(probe).await,
            SectionKind::Services => services::collect(probe).await,
            SectionKind::Environment => environment::collect(probe).await,
            SectionKind::Connections => connections::collect(probe).await,
        }
    }
}

/// Usage percentage at full precision; defined only when `total > 0`.
pub(crate) fn percent(used: u64, total: u64) -> Option<f64> {
    if total > 0 {
        Some((used as f64 / total as f64) * 100.0)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_undefined_for_zero_total() {
        assert_eq!(percent(5, 0), None);
        assert_eq!(percent(0, 10), Some(0.0));
        assert_eq!(percent(3, 4), Some(75.0));
    }

    #[test]
    fn section_order_is_stable_and_complete() {
        assert_eq!(SectionKind::ORDER.len(), 10);
        assert_eq!(SectionKind::ORDER[0], SectionKind::System);
        assert_eq!(SectionKind::ORDER[9], SectionKind::Connections);
    }
}
