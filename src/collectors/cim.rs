//! CIM query plumbing shared by the collectors.
//!
//! Queries go through `Get-CimInstance … | ConvertTo-Json`; PowerShell emits
//! a bare object for a single instance and an array for several, so both
//! shapes deserialize here. CIM datetimes arrive as `\/Date(millis)\/`.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::CollectError;
use crate::probe::{powershell, SystemProbe};

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

/// Run a PowerShell pipeline ending in `ConvertTo-Json` and deserialize the
/// result. Empty output means the query matched no instances.
pub async fn query<T: DeserializeOwned>(
    probe: &dyn SystemProbe,
    script: &str,
) -> Result<Vec<T>, CollectError> {
    let raw = powershell(probe, script).await?;
    parse_instances(&raw)
}

pub fn parse_instances<T: DeserializeOwned>(raw: &str) -> Result<Vec<T>, CollectError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    match serde_json::from_str::<OneOrMany<T>>(trimmed) {
        Ok(OneOrMany::Many(items)) => Ok(items),
        Ok(OneOrMany::One(item)) => Ok(vec![item]),
        Err(err) => Err(CollectError::InterfaceUnavailable(format!(
            "malformed query output: {err}"
        ))),
    }
}

/// Parse a `ConvertTo-Json` CIM datetime (`\/Date(1693526400000)\/`).
pub fn parse_cim_date(value: &str) -> Option<DateTime<Utc>> {
    let inner = value.split("Date(").nth(1)?.split(')').next()?;
    let digits: String = inner
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '-')
        .collect();
    let millis: i64 = digits.parse().ok()?;
    DateTime::from_timestamp_millis(millis)
}

/// CIM numeric fields surface as numbers or quoted strings depending on the
/// provider; accept both.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CimNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

impl CimNumber {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            CimNumber::Int(v) => u64::try_from(*v).ok(),
            CimNumber::Float(v) if *v >= 0.0 => Some(*v as u64),
            CimNumber::Float(_) => None,
            CimNumber::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        self.as_u64().and_then(|v| u32::try_from(v).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        #[serde(rename = "Name")]
        name: String,
    }

    #[test]
    fn single_object_and_array_both_deserialize() {
        let one: Vec<Row> = parse_instances(r#"{"Name":"a"}"#).unwrap();
        let many: Vec<Row> = parse_instances(r#"[{"Name":"a"},{"Name":"b"}]"#).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(many.len(), 2);
        assert_eq!(many[1], Row { name: "b".into() });
    }

    #[test]
    fn empty_output_is_no_instances() {
        let rows: Vec<Row> = parse_instances("   \r\n").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn garbage_output_is_interface_unavailable() {
        let err = parse_instances::<Row>("not json").unwrap_err();
        assert!(matches!(err, CollectError::InterfaceUnavailable(_)));
    }

    #[test]
    fn cim_date_parses_escaped_and_plain_forms() {
        let dt = parse_cim_date(r"\/Date(1693526400000)\/").unwrap();
        assert_eq!(dt.timestamp(), 1_693_526_400);
        assert!(parse_cim_date("/Date(0)/").is_some());
        assert!(parse_cim_date("2023-09-01").is_none());
    }

    #[test]
    fn cim_numbers_accept_numeric_and_quoted_forms() {
        assert_eq!(CimNumber::Int(42).as_u32(), Some(42));
        assert_eq!(CimNumber::Text("17179869184".into()).as_u64(), Some(17_179_869_184));
        assert_eq!(CimNumber::Float(3200.0).as_u32(), Some(3200));
        assert_eq!(CimNumber::Int(-1).as_u64(), None);
    }
}
