//! IPv4 interface addresses, loopback excluded.

use std::net::Ipv4Addr;

use serde::Deserialize;

use crate::collectors::cim::{self, CimNumber};
use crate::domain::report::{NetworkInterfaceAddress, SectionData};
use crate::error::CollectError;
use crate::probe::SystemProbe;

const ADDRESS_QUERY: &str = "Get-NetIPAddress -AddressFamily IPv4 | \
     Select-Object InterfaceAlias,IPAddress,PrefixLength | ConvertTo-Json";

#[derive(Debug, Deserialize)]
struct AddressRecord {
    #[serde(rename = "InterfaceAlias")]
    interface: Option<String>,
    #[serde(rename = "IPAddress")]
    address: Option<String>,
    #[serde(rename = "PrefixLength")]
    prefix_length: Option<CimNumber>,
}

pub async fn collect(probe: &dyn SystemProbe) -> Result<SectionData, CollectError> {
    let records = cim::query::<AddressRecord>(probe, ADDRESS_QUERY).await?;

    let mut addresses: Vec<NetworkInterfaceAddress> = records
        .into_iter()
        .filter_map(build_address)
        .filter(|a| !is_loopback(a))
        .collect();
    addresses.sort_by(|a, b| a.interface.cmp(&b.interface).then(a.address.cmp(&b.address)));

    Ok(SectionData::Network(addresses))
}

fn build_address(record: AddressRecord) -> Option<NetworkInterfaceAddress> {
    Some(NetworkInterfaceAddress {
        interface: record.interface?,
        address: record.address?,
        prefix_length: record
            .prefix_length
            .as_ref()
            .and_then(CimNumber::as_u32)
            .and_then(|p| u8::try_from(p).ok())
            .unwrap_or(0),
    })
}

fn is_loopback(entry: &NetworkInterfaceAddress) -> bool {
    if let Ok(addr) = entry.address.parse::<Ipv4Addr>() {
        if addr.is_loopback() {
            return true;
        }
    }
    entry.interface.contains("Loopback")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(interface: &str, address: &str) -> NetworkInterfaceAddress {
        NetworkInterfaceAddress {
            interface: interface.into(),
            address: address.into(),
            prefix_length: 24,
        }
    }

    #[test]
    fn loopback_addresses_are_excluded() {
        assert!(is_loopback(&entry("Loopback Pseudo-Interface 1", "127.0.0.1")));
        assert!(is_loopback(&entry("Ethernet", "127.0.0.1")));
        assert!(!is_loopback(&entry("Ethernet", "10.0.0.5")));
    }

    #[test]
    fn records_without_an_address_are_dropped() {
        let record = AddressRecord {
            interface: Some("Ethernet".into()),
            address: None,
            prefix_length: Some(CimNumber::Int(24)),
        };
        assert!(build_address(record).is_none());
    }
}
