//! # Domain Value Objects
//!
//! Immutable value types for Blocklist Rotation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::net::Ipv4Addr;
use std::ops::RangeInclusive;

use super::errors::RotationError;

/// Numbered slot on an ordered rule list.
pub type RuleNumber = u16;

/// Insertion timestamp, seconds since the Unix epoch.
pub type Timestamp = u64;

/// Identifier of an ordered rule-list resource (partition key of the state table).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Wrap a resource identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Contiguous closed interval of rule numbers owned by this system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedRange {
    first: RuleNumber,
    last: RuleNumber,
}

impl ReservedRange {
    /// Lowest slot of the default range.
    pub const DEFAULT_FIRST: RuleNumber = 71;
    /// Highest slot of the default range.
    pub const DEFAULT_LAST: RuleNumber = 80;
    /// Largest rule number an ordered network ACL accepts.
    pub const MAX_RULE_NUMBER: RuleNumber = 32766;

    /// Create a range; rule number 0, numbers above `MAX_RULE_NUMBER` and
    /// inverted bounds are rejected.
    pub fn new(first: RuleNumber, last: RuleNumber) -> Result<Self, RotationError> {
        let range = Self { first, last };
        range.validate()?;
        Ok(range)
    }

    /// Check bounds.
    pub fn validate(&self) -> Result<(), RotationError> {
        if self.first == 0 {
            return Err(RotationError::InvalidConfig(
                "reserved range must start above rule 0".to_string(),
            ));
        }
        if self.first > self.last {
            return Err(RotationError::InvalidConfig(format!(
                "reserved range inverted: {}..={}",
                self.first, self.last
            )));
        }
        if self.last > Self::MAX_RULE_NUMBER {
            return Err(RotationError::InvalidConfig(format!(
                "reserved range {}..={} exceeds rule number {}",
                self.first,
                self.last,
                Self::MAX_RULE_NUMBER
            )));
        }
        Ok(())
    }

    /// Lowest slot.
    pub fn first(&self) -> RuleNumber {
        self.first
    }

    /// Highest slot.
    pub fn last(&self) -> RuleNumber {
        self.last
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        usize::from(self.last - self.first) + 1
    }

    /// Whether `rule_number` lies inside the range.
    pub fn contains(&self, rule_number: RuleNumber) -> bool {
        (self.first..=self.last).contains(&rule_number)
    }

    /// All slots in ascending order.
    pub fn iter(&self) -> RangeInclusive<RuleNumber> {
        self.first..=self.last
    }

    /// Lowest slot not present in `occupied`.
    pub fn lowest_free(&self, occupied: &BTreeSet<RuleNumber>) -> Option<RuleNumber> {
        self.iter().find(|n| !occupied.contains(n))
    }
}

impl Default for ReservedRange {
    fn default() -> Self {
        Self {
            first: Self::DEFAULT_FIRST,
            last: Self::DEFAULT_LAST,
        }
    }
}

impl fmt::Display for ReservedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.last)
    }
}

/// Traffic direction of a rule entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleDirection {
    /// Inbound traffic.
    #[default]
    Ingress,
    /// Outbound traffic.
    Egress,
}

/// Verdict of a rule entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    /// Permit matching traffic.
    Allow,
    /// Drop matching traffic.
    #[default]
    Deny,
}

/// Protocol selector of a rule entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Every protocol.
    #[default]
    All,
    /// TCP only.
    Tcp,
    /// UDP only.
    Udp,
    /// ICMP only.
    Icmp,
}

/// Inclusive port interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    /// First port.
    pub from: u16,
    /// Last port.
    pub to: u16,
}

impl PortRange {
    /// The whole port space.
    pub const ALL: PortRange = PortRange { from: 0, to: 65535 };
}

/// One numbered entry on an ordered rule list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    /// Slot.
    pub rule_number: RuleNumber,
    /// CIDR block the entry matches.
    pub cidr: String,
    /// Direction.
    pub direction: RuleDirection,
    /// Verdict.
    pub action: RuleAction,
    /// Protocol selector.
    pub protocol: Protocol,
    /// Port interval.
    pub port_range: PortRange,
}

impl AclEntry {
    /// Ingress deny of every port and protocol for a single host.
    pub fn deny_host(host_ip: Ipv4Addr, rule_number: RuleNumber) -> Self {
        Self {
            rule_number,
            cidr: host_cidr(host_ip),
            direction: RuleDirection::Ingress,
            action: RuleAction::Deny,
            protocol: Protocol::All,
            port_range: PortRange::ALL,
        }
    }
}

/// `/32` block for a single IPv4 host.
pub fn host_cidr(host_ip: Ipv4Addr) -> String {
    format!("{}/32", host_ip)
}

/// Enforcement layer of a set-based blocklist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlocklistScope {
    /// Global edge (CDN) layer.
    Edge,
    /// Regional load-balancer layer.
    Regional,
}

impl BlocklistScope {
    /// Stable name for logs and metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Edge => "edge",
            Self::Regional => "regional",
        }
    }
}

impl fmt::Display for BlocklistScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
