//! IP range expressions with dash and CIDR support.
//!
//! Operators enter ranges as free text in one of two forms:
//! - Dash notation (`192.168.1.1-192.168.1.100`)
//! - CIDR notation (`192.168.1.0/24`)
//!
//! Anything else is rejected. Rejected expressions are dropped from the
//! working set by the caller and never fail a discovery run.

use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// A range as entered by the operator, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRange {
    /// Caller-assigned identifier, carried through to the range state.
    pub id: String,
    /// Raw user-entered text.
    pub raw: String,
}

impl IpRange {
    /// Create a new raw range.
    pub fn new(id: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            raw: raw.into(),
        }
    }

    /// Build ranges from plain expressions, numbering ids by position.
    pub fn from_expressions<I, S>(exprs: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        exprs
            .into_iter()
            .enumerate()
            .map(|(i, raw)| Self::new((i + 1).to_string(), raw))
            .collect()
    }
}

/// Error type for range parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("invalid range format: {0}")]
    InvalidFormat(String),
    #[error("invalid IPv4 address '{0}'")]
    InvalidAddress(String),
    #[error("invalid CIDR prefix '{0}'")]
    InvalidPrefix(String),
    #[error("range end {end} is before start {start}")]
    Reversed { start: Ipv4Addr, end: Ipv4Addr },
}

/// A syntactically valid range expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RangeExpr {
    /// Inclusive `start-end` span.
    Dash { start: Ipv4Addr, end: Ipv4Addr },
    /// CIDR block.
    Cidr { network: Ipv4Network },
}

impl RangeExpr {
    /// Parse a range expression from a string.
    pub fn parse(s: &str) -> Result<Self, RangeError> {
        let s = s.trim();

        if let Some((start, end)) = s.split_once('-') {
            let start = parse_addr(start)?;
            let end = parse_addr(end)?;
            if u32::from(end) < u32::from(start) {
                return Err(RangeError::Reversed { start, end });
            }
            return Ok(Self::Dash { start, end });
        }

        if let Some((addr, prefix)) = s.split_once('/') {
            let addr = parse_addr(addr)?;
            let prefix: u8 = prefix
                .trim()
                .parse()
                .map_err(|_| RangeError::InvalidPrefix(prefix.to_string()))?;
            let network = Ipv4Network::new(addr, prefix)
                .map_err(|_| RangeError::InvalidPrefix(prefix.to_string()))?;
            return Ok(Self::Cidr { network });
        }

        Err(RangeError::InvalidFormat(s.to_string()))
    }

    /// Estimated number of hosts in the range.
    ///
    /// Dash ranges count only the last octet (`last.D - first.D + 1`); CIDR
    /// blocks exclude network and broadcast (`2^(32-prefix) - 2`). Never
    /// negative.
    pub fn estimate_size(&self) -> u64 {
        match self {
            Self::Dash { start, end } => {
                let first = i64::from(start.octets()[3]);
                let last = i64::from(end.octets()[3]);
                (last - first + 1).max(0) as u64
            }
            Self::Cidr { network } => {
                let host_bits = 32 - u32::from(network.prefix());
                (1u64 << host_bits).saturating_sub(2)
            }
        }
    }
}

impl FromStr for RangeExpr {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RangeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dash { start, end } => write!(f, "{}-{}", start, end),
            Self::Cidr { network } => write!(f, "{}", network),
        }
    }
}

/// A validated range, ready to be scanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidRange {
    pub id: String,
    /// The operator's expression, trimmed. This is what the backend receives.
    pub raw: String,
    pub expr: RangeExpr,
}

impl ValidRange {
    /// Validate a raw range.
    pub fn parse(range: &IpRange) -> Result<Self, RangeError> {
        let raw = range.raw.trim();
        let expr = RangeExpr::parse(raw)?;
        Ok(Self {
            id: range.id.clone(),
            raw: raw.to_string(),
            expr,
        })
    }

    /// Estimated host count, see [`RangeExpr::estimate_size`].
    pub fn estimate_size(&self) -> u64 {
        self.expr.estimate_size()
    }
}

impl fmt::Display for ValidRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Validate every range, silently dropping the malformed ones.
///
/// Input order is preserved.
pub fn validate_ranges(ranges: &[IpRange]) -> Vec<ValidRange> {
    ranges
        .iter()
        .filter_map(|range| match ValidRange::parse(range) {
            Ok(valid) => Some(valid),
            Err(e) => {
                tracing::debug!(range = %range.raw, error = %e, "dropping malformed range");
                None
            }
        })
        .collect()
}

/// Estimate the host count of a raw expression. Malformed input counts as 0.
pub fn estimate_size(expr: &str) -> u64 {
    RangeExpr::parse(expr).map_or(0, |r| r.estimate_size())
}

fn parse_addr(s: &str) -> Result<Ipv4Addr, RangeError> {
    let s = s.trim();
    s.parse::<Ipv4Addr>()
        .map_err(|_| RangeError::InvalidAddress(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dash() {
        let expr = RangeExpr::parse("192.168.1.1-192.168.1.100").unwrap();
        assert_eq!(
            expr,
            RangeExpr::Dash {
                start: Ipv4Addr::new(192, 168, 1, 1),
                end: Ipv4Addr::new(192, 168, 1, 100),
            }
        );
    }

    #[test]
    fn test_parse_cidr() {
        let expr = RangeExpr::parse(" 10.0.0.0/16 ").unwrap();
        if let RangeExpr::Cidr { network } = expr {
            assert_eq!(network.prefix(), 16);
        } else {
            panic!("Expected CIDR");
        }
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(matches!(
            RangeExpr::parse("not-a-range"),
            Err(RangeError::InvalidAddress(_))
        ));
        assert!(matches!(
            RangeExpr::parse("10.0.0.1"),
            Err(RangeError::InvalidFormat(_))
        ));
        assert!(matches!(
            RangeExpr::parse("10.0.0.0/33"),
            Err(RangeError::InvalidPrefix(_))
        ));
        assert!(matches!(
            RangeExpr::parse("10.0.0.9-10.0.0.1"),
            Err(RangeError::Reversed { .. })
        ));
        assert!(RangeExpr::parse("10.0.0/24").is_err());
        assert!(RangeExpr::parse("").is_err());
    }

    #[test]
    fn test_estimate_size() {
        assert_eq!(estimate_size("192.168.1.1-192.168.1.100"), 100);
        assert_eq!(estimate_size("192.168.1.0/24"), 254);
        assert_eq!(estimate_size("10.0.0.5-10.0.0.5"), 1);
        assert_eq!(estimate_size("10.0.0.0/30"), 2);
        assert_eq!(estimate_size("10.0.0.1/32"), 0);
        assert_eq!(estimate_size("garbage"), 0);
    }

    #[test]
    fn test_dash_estimate_uses_last_octet_only() {
        // 10.0.0.250 - 10.0.1.10 spans 17 hosts, but the estimate is
        // last-octet based and clamps at zero.
        assert_eq!(estimate_size("10.0.0.250-10.0.1.10"), 0);
    }

    #[test]
    fn test_validate_drops_malformed_and_keeps_order() {
        let ranges = IpRange::from_expressions([
            "10.0.0.1-10.0.0.2",
            "not-a-range",
            "192.168.0.0/24",
        ]);
        let valid = validate_ranges(&ranges);

        assert_eq!(valid.len(), 2);
        assert_eq!(valid[0].id, "1");
        assert_eq!(valid[0].raw, "10.0.0.1-10.0.0.2");
        assert_eq!(valid[1].id, "3");
    }
}
