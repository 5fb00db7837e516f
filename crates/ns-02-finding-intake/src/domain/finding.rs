//! Finding classification and the extracted block request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Finding type whose remote address lives under the port probe branch.
pub const PORT_PROBE_TYPE: &str = "Recon:EC2/PortProbeUnprotectedPort";

/// Where the remote address is located in the event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FindingKind {
    /// `service.action.portProbeAction.portProbeDetails[0]`
    PortProbe,
    /// `service.action.networkConnectionAction`
    NetworkConnection,
}

impl FindingKind {
    /// Classify a finding type. Every type other than the port probe one is
    /// read through the connection branch.
    pub fn classify(finding_type: &str) -> Self {
        if finding_type == PORT_PROBE_TYPE {
            FindingKind::PortProbe
        } else {
            FindingKind::NetworkConnection
        }
    }

    /// Dotted path of the remote address for this kind.
    pub fn host_ip_path(&self) -> &'static str {
        match self {
            FindingKind::PortProbe => {
                "detail.service.action.portProbeAction.portProbeDetails[0].remoteIpDetails.ipAddressV4"
            }
            FindingKind::NetworkConnection => {
                "detail.service.action.networkConnectionAction.remoteIpDetails.ipAddressV4"
            }
        }
    }

    /// Short name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::PortProbe => "port-probe",
            FindingKind::NetworkConnection => "network-connection",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the responder needs from one finding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingContext {
    /// Raw finding type, echoed in notifications.
    pub finding_type: String,
    /// Classification of `finding_type`.
    pub kind: FindingKind,
    /// Region the finding was raised in.
    pub region: String,
    /// Affected instance.
    pub instance_id: String,
    /// Subnet of the first interface, resolved to a rule list later.
    pub boundary_ref: String,
    /// Host to block.
    pub host_ip: Ipv4Addr,
    /// Event id when present.
    pub event_id: Option<String>,
}
