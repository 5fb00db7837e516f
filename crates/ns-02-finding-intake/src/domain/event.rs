//! Wire shape of a threat finding event.
//!
//! Only the fields the responder reads are modelled; everything else in
//! the payload is ignored. All fields are optional so that absence can be
//! reported with the exact path.

use serde::{Deserialize, Serialize};

/// Envelope of a finding event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindingEvent {
    /// Event id, used only for log correlation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Region the finding was raised in.
    #[serde(default)]
    pub region: Option<String>,
    /// Finding body.
    #[serde(default)]
    pub detail: Option<FindingDetail>,
}

/// Finding body.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindingDetail {
    /// Finding type, e.g. `Recon:EC2/PortProbeUnprotectedPort`.
    #[serde(default, rename = "type")]
    pub finding_type: Option<String>,
    /// Affected resource.
    #[serde(default)]
    pub resource: Option<FindingResource>,
    /// Detection details.
    #[serde(default)]
    pub service: Option<FindingService>,
}

/// Affected resource.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindingResource {
    /// Instance the finding is about.
    #[serde(default)]
    pub instance_details: Option<InstanceDetails>,
}

/// Affected instance.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceDetails {
    /// Instance id.
    #[serde(default)]
    pub instance_id: Option<String>,
    /// Attached interfaces; the first one names the subnet.
    #[serde(default)]
    pub network_interfaces: Vec<NetworkInterface>,
}

/// Network interface.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    /// Subnet the interface lives in.
    #[serde(default)]
    pub subnet_id: Option<String>,
}

/// Detection details.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindingService {
    /// Observed action.
    #[serde(default)]
    pub action: Option<FindingAction>,
}

/// Observed action; which branch is set depends on the finding type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindingAction {
    /// Port probe findings.
    #[serde(default)]
    pub port_probe_action: Option<PortProbeAction>,
    /// Connection findings.
    #[serde(default)]
    pub network_connection_action: Option<NetworkConnectionAction>,
}

/// Port probe action.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortProbeAction {
    /// Probes seen; the first one is used.
    #[serde(default)]
    pub port_probe_details: Vec<PortProbeDetail>,
}

/// A single probe.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortProbeDetail {
    /// Prober.
    #[serde(default)]
    pub remote_ip_details: Option<RemoteIpDetails>,
}

/// Network connection action.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConnectionAction {
    /// Remote peer.
    #[serde(default)]
    pub remote_ip_details: Option<RemoteIpDetails>,
}

/// Remote peer address.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteIpDetails {
    /// Dotted-quad address.
    #[serde(default)]
    pub ip_address_v4: Option<String>,
}
