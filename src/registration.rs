//! Result merging and bulk registration of discovered printers.
//!
//! Discovered devices are checked against the printer inventory by IP
//! address. Devices already in inventory can never be selected; new ones can
//! be registered in bulk, each record submitted on its own so that one
//! failure does not undo the others.

use crate::backend::InventoryBackend;
use crate::error::{RegistrationError, RegistrationResult};
use crate::types::{DiscoveredDevice, NewPrinterRecord, Printer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::net::IpAddr;
use tracing::{info, warn};

/// Prefix of auto-numbered asset tags.
pub const ASSET_TAG_PREFIX: &str = "PRT-";

/// Inventory printers keyed by IP address.
#[derive(Debug, Clone, Default)]
pub struct InventoryIndex {
    by_ip: HashMap<IpAddr, String>,
}

impl InventoryIndex {
    /// Index printers by their IP. Records without a parseable IP are skipped.
    pub fn from_printers(printers: &[Printer]) -> Self {
        let by_ip = printers
            .iter()
            .filter_map(|p| {
                let ip = p.ip_address.as_deref()?.trim().parse().ok()?;
                Some((ip, p.asset_tag.clone()))
            })
            .collect();
        Self { by_ip }
    }

    /// Asset tag of the printer at `ip`, if registered.
    pub fn asset_tag(&self, ip: &IpAddr) -> Option<&str> {
        self.by_ip.get(ip).map(String::as_str)
    }

    /// Record a printer registered after the index was built.
    pub fn insert(&mut self, ip: IpAddr, asset_tag: impl Into<String>) {
        self.by_ip.insert(ip, asset_tag.into());
    }
}

/// Set `already_registered` and `existing_asset_tag` on every device.
pub fn annotate(devices: &mut [DiscoveredDevice], index: &InventoryIndex) {
    for device in devices {
        let tag = index.asset_tag(&device.ip).map(str::to_string);
        device.already_registered = tag.is_some();
        device.existing_asset_tag = tag;
    }
}

/// Keep the first device seen for each IP, preserving order.
pub fn dedup_by_ip(devices: Vec<DiscoveredDevice>) -> Vec<DiscoveredDevice> {
    let mut seen = HashSet::new();
    devices
        .into_iter()
        .filter(|d| seen.insert(d.ip))
        .collect()
}

/// Devices chosen for registration.
///
/// Registered devices are never admitted, whichever way the selection is
/// built.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    ips: BTreeSet<IpAddr>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select every device not already in inventory.
    pub fn all_new(devices: &[DiscoveredDevice]) -> Self {
        let mut selection = Self::new();
        selection.select_all(devices);
        selection
    }

    /// Replace the selection with every unregistered device.
    pub fn select_all(&mut self, devices: &[DiscoveredDevice]) {
        self.ips = devices
            .iter()
            .filter(|d| !d.already_registered)
            .map(|d| d.ip)
            .collect();
    }

    /// Select one device. Returns `false` if it is registered and so cannot be
    /// selected.
    pub fn select(&mut self, device: &DiscoveredDevice) -> bool {
        if device.already_registered {
            return false;
        }
        self.ips.insert(device.ip);
        true
    }

    /// Flip a device's selection. Registered devices stay unselected.
    pub fn toggle(&mut self, device: &DiscoveredDevice) -> bool {
        if self.ips.remove(&device.ip) {
            return false;
        }
        self.select(device)
    }

    pub fn clear(&mut self) {
        self.ips.clear();
    }

    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.ips.contains(ip)
    }

    pub fn len(&self) -> usize {
        self.ips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ips.is_empty()
    }

    /// Selected addresses in ascending order.
    pub fn ips(&self) -> Vec<IpAddr> {
        self.ips.iter().copied().collect()
    }
}

/// Numeric suffix of a `PRT-NNN` tag. Only plain ASCII digits count.
fn asset_number(tag: &str) -> Option<u32> {
    let suffix = tag.trim().strip_prefix(ASSET_TAG_PREFIX)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Highest numeric suffix among `PRT-NNN` tags, 0 if none.
pub fn max_asset_number(printers: &[Printer]) -> u32 {
    printers
        .iter()
        .filter_map(|p| asset_number(&p.asset_tag))
        .max()
        .unwrap_or(0)
}

/// Format an asset tag, zero-padded to three digits.
pub fn format_asset_tag(number: u32) -> String {
    format!("{}{:03}", ASSET_TAG_PREFIX, number)
}

/// The tag the next registered printer receives, or `None` once the
/// numbering is exhausted.
pub fn next_asset_tag(printers: &[Printer]) -> Option<String> {
    max_asset_number(printers).checked_add(1).map(format_asset_tag)
}

/// Canonical inventory record for a discovered device.
pub fn canonical_record(device: &DiscoveredDevice, asset_tag: String) -> NewPrinterRecord {
    NewPrinterRecord {
        asset_tag,
        ip_address: device.ip.to_string(),
        hostname: device.hostname.clone(),
        brand: device.brand.clone().unwrap_or_else(|| "Unknown".to_string()),
        model: device.model.clone().unwrap_or_else(|| "Unknown".to_string()),
        serial_number: device.serial_number.clone(),
        is_color: device.is_color.unwrap_or(false),
        snmp_profile: device.snmp_profile.clone(),
        is_medical: device.is_medical.unwrap_or(false),
        status: "active".to_string(),
    }
}

/// Outcome of registering one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationOutcome {
    pub ip: IpAddr,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RegistrationOutcome {
    fn registered(ip: IpAddr, asset_tag: String) -> Self {
        Self {
            ip,
            success: true,
            asset_tag: Some(asset_tag),
            error: None,
        }
    }

    fn failed(ip: IpAddr, error: impl Into<String>) -> Self {
        Self {
            ip,
            success: false,
            asset_tag: None,
            error: Some(error.into()),
        }
    }
}

/// Register the devices at `ips`, each with its own create call.
///
/// Inventory is fetched first; devices found in it are refused, and so is a
/// repeat of an address registered earlier in the same call. Tags are
/// numbered consecutively from the current maximum, and a tag is only used up
/// by a successful create. Returns one outcome per requested address.
pub async fn add_selected<I: InventoryBackend + ?Sized>(
    inventory: &I,
    devices: &[DiscoveredDevice],
    ips: &[IpAddr],
) -> RegistrationResult<Vec<RegistrationOutcome>> {
    if ips.is_empty() {
        return Err(RegistrationError::NothingSelected);
    }

    let printers = inventory.list_printers().await?;
    let mut index = InventoryIndex::from_printers(&printers);
    let mut next_number = max_asset_number(&printers).checked_add(1);
    let mut outcomes = Vec::with_capacity(ips.len());

    for ip in ips {
        let Some(device) = devices.iter().find(|d| d.ip == *ip) else {
            outcomes.push(RegistrationOutcome::failed(*ip, "device was not discovered"));
            continue;
        };

        if let Some(tag) = index.asset_tag(ip) {
            outcomes.push(RegistrationOutcome::failed(
                *ip,
                format!("already registered as {}", tag),
            ));
            continue;
        }

        let Some(number) = next_number else {
            outcomes.push(RegistrationOutcome::failed(*ip, "asset tag numbers exhausted"));
            continue;
        };

        let record = canonical_record(device, format_asset_tag(number));
        match inventory.create_printer_record(&record).await {
            Ok(printer) => {
                info!(ip = %ip, asset_tag = %printer.asset_tag, "printer registered");
                next_number = number.checked_add(1);
                index.insert(*ip, printer.asset_tag.clone());
                outcomes.push(RegistrationOutcome::registered(*ip, printer.asset_tag));
            }
            Err(e) => {
                warn!(ip = %ip, error = %e, "registration failed");
                outcomes.push(RegistrationOutcome::failed(*ip, e.to_string()));
            }
        }
    }

    Ok(outcomes)
}
