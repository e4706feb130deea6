//! BIOS and system product identity.

use serde::Deserialize;
use tracing::debug;

use crate::collectors::cim;
use crate::domain::report::{FirmwareInfo, SectionData};
use crate::error::CollectError;
use crate::probe::SystemProbe;

const BIOS_QUERY: &str = "Get-CimInstance Win32_BIOS | \
     Select-Object Manufacturer,SMBIOSBIOSVersion,SerialNumber | ConvertTo-Json";

const PRODUCT_QUERY: &str =
    "Get-CimInstance Win32_ComputerSystemProduct | Select-Object Name | ConvertTo-Json";

#[derive(Debug, Deserialize)]
struct BiosRecord {
    #[serde(rename = "Manufacturer")]
    manufacturer: Option<String>,
    #[serde(rename = "SMBIOSBIOSVersion")]
    version: Option<String>,
    #[serde(rename = "SerialNumber")]
    serial_number: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProductRecord {
    #[serde(rename = "Name")]
    name: Option<String>,
}

pub async fn collect(probe: &dyn SystemProbe) -> Result<SectionData, CollectError> {
    let bios = cim::query::<BiosRecord>(probe, BIOS_QUERY)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| CollectError::InterfaceUnavailable("no BIOS instance reported".into()))?;

    let product = match cim::query::<ProductRecord>(probe, PRODUCT_QUERY).await {
        Ok(records) => records.into_iter().next().and_then(|r| r.name),
        Err(err) => {
            debug!(error = %err, "product name lookup failed");
            None
        }
    };

    Ok(SectionData::Firmware(FirmwareInfo {
        manufacturer: or_unknown(bios.manufacturer),
        product: or_unknown(product),
        version: or_unknown(bios.version),
        serial_number: or_unknown(bios.serial_number),
    }))
}

fn or_unknown(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_become_unknown() {
        assert_eq!(or_unknown(Some("  ".into())), "unknown");
        assert_eq!(or_unknown(None), "unknown");
        assert_eq!(or_unknown(Some(" Dell Inc. ".into())), "Dell Inc.");
    }
}
