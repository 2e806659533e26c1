//! Devices reported by the probing backend and printer inventory records.
//!
//! All wire types use camelCase field names to match the backend's JSON.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// How the backend identified a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMethod {
    Snmp,
    Medical,
    #[serde(untagged)]
    Other(String),
}

impl fmt::Display for ConnectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Snmp => write!(f, "snmp"),
            Self::Medical => write!(f, "medical"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

/// A device found during the protocol probe phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredDevice {
    pub ip: IpAddr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_color: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmp_profile: Option<String>,
    #[serde(default)]
    pub is_printer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_medical: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_method: Option<ConnectionMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    /// Set by the registration filter, never by the backend.
    #[serde(default)]
    pub already_registered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_asset_tag: Option<String>,
}

impl DiscoveredDevice {
    /// Create a device with only its address set.
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            hostname: None,
            brand: None,
            model: None,
            serial_number: None,
            is_color: None,
            snmp_profile: None,
            is_printer: false,
            is_medical: None,
            connection_method: None,
            response_time_ms: None,
            already_registered: false,
            existing_asset_tag: None,
        }
    }

    /// Mark the device as a printer.
    pub fn printer(mut self) -> Self {
        self.is_printer = true;
        self
    }

    /// Set brand and model.
    pub fn with_model(mut self, brand: impl Into<String>, model: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self.model = Some(model.into());
        self
    }

    /// Set the hostname.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Short label for logs: `brand model (ip)` or just the ip.
    pub fn label(&self) -> String {
        match (&self.brand, &self.model) {
            (Some(brand), Some(model)) => format!("{} {} ({})", brand, model, self.ip),
            _ => self.ip.to_string(),
        }
    }
}

/// A printer record as stored by the inventory backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Printer {
    pub id: i64,
    pub asset_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Fields submitted to create a printer record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPrinterRecord {
    pub asset_tag: String,
    pub ip_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    pub brand: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    pub is_color: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snmp_profile: Option<String>,
    pub is_medical: bool,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_device_from_backend_json() {
        let json = r#"{
            "ip": "10.0.0.7",
            "hostname": "floor2-mfp",
            "brand": "Kyocera",
            "model": "TASKalfa 3253ci",
            "isColor": true,
            "isPrinter": true,
            "connectionMethod": "snmp",
            "responseTimeMs": 42
        }"#;
        let device: DiscoveredDevice = serde_json::from_str(json).unwrap();

        assert_eq!(device.ip, IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)));
        assert!(device.is_printer);
        assert!(!device.already_registered);
        assert_eq!(device.connection_method, Some(ConnectionMethod::Snmp));
        assert_eq!(device.response_time_ms, Some(42));
        assert_eq!(device.label(), "Kyocera TASKalfa 3253ci (10.0.0.7)");
    }

    #[test]
    fn test_unknown_connection_method() {
        let json = r#"{"ip": "10.0.0.8", "isPrinter": false, "connectionMethod": "ipp"}"#;
        let device: DiscoveredDevice = serde_json::from_str(json).unwrap();
        assert_eq!(
            device.connection_method,
            Some(ConnectionMethod::Other("ipp".to_string()))
        );
    }

    #[test]
    fn test_printer_tolerates_missing_fields() {
        let json = r#"{"id": 3, "assetTag": "PRT-003"}"#;
        let printer: Printer = serde_json::from_str(json).unwrap();
        assert_eq!(printer.asset_tag, "PRT-003");
        assert!(printer.ip_address.is_none());
    }
}
