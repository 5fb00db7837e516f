//! Finding extraction.
//!
//! ```text
//! raw JSON ─→ FindingEvent ─→ classify(type) ─→ read host IP branch ─→ FindingContext
//! ```

use std::net::Ipv4Addr;
use tracing::debug;

use crate::domain::{FindingContext, FindingEvent, FindingKind, IntakeError};

const REGION: &str = "region";
const DETAIL: &str = "detail";
const FINDING_TYPE: &str = "detail.type";
const INSTANCE_ID: &str = "detail.resource.instanceDetails.instanceId";
const SUBNET_ID: &str = "detail.resource.instanceDetails.networkInterfaces[0].subnetId";

/// Parse a raw event and extract the block request.
pub fn parse_event(raw: &str) -> Result<FindingContext, IntakeError> {
    let event: FindingEvent = serde_json::from_str(raw)?;
    extract(&event)
}

/// Extract the block request from a decoded event.
pub fn extract(event: &FindingEvent) -> Result<FindingContext, IntakeError> {
    let detail = event
        .detail
        .as_ref()
        .ok_or(IntakeError::MissingField(DETAIL))?;

    let finding_type = match detail.finding_type.as_deref().map(str::trim) {
        None => return Err(IntakeError::MissingField(FINDING_TYPE)),
        Some("") => {
            return Err(IntakeError::UnsupportedShape(
                "finding type is blank".to_string(),
            ))
        }
        Some(t) => t.to_string(),
    };
    let kind = FindingKind::classify(&finding_type);

    let region = required(event.region.as_deref(), REGION)?;

    let instance = detail
        .resource
        .as_ref()
        .and_then(|r| r.instance_details.as_ref());
    let instance_id = required(
        instance.and_then(|i| i.instance_id.as_deref()),
        INSTANCE_ID,
    )?;
    let boundary_ref = required(
        instance
            .and_then(|i| i.network_interfaces.first())
            .and_then(|n| n.subnet_id.as_deref()),
        SUBNET_ID,
    )?;

    let host_ip = host_ip(event, kind)?;

    debug!(
        event_id = ?event.id,
        finding_type = %finding_type,
        kind = %kind,
        host_ip = %host_ip,
        boundary_ref = %boundary_ref,
        "[ns-02] finding extracted"
    );

    Ok(FindingContext {
        finding_type,
        kind,
        region,
        instance_id,
        boundary_ref,
        host_ip,
        event_id: event.id.clone(),
    })
}

fn host_ip(event: &FindingEvent, kind: FindingKind) -> Result<Ipv4Addr, IntakeError> {
    let path = kind.host_ip_path();
    let action = event
        .detail
        .as_ref()
        .and_then(|d| d.service.as_ref())
        .and_then(|s| s.action.as_ref());

    let remote = match kind {
        FindingKind::PortProbe => action
            .and_then(|a| a.port_probe_action.as_ref())
            .and_then(|p| p.port_probe_details.first())
            .and_then(|d| d.remote_ip_details.as_ref()),
        FindingKind::NetworkConnection => action
            .and_then(|a| a.network_connection_action.as_ref())
            .and_then(|n| n.remote_ip_details.as_ref()),
    };

    let raw = required(remote.and_then(|r| r.ip_address_v4.as_deref()), path)?;
    raw.parse::<Ipv4Addr>()
        .map_err(|_| IntakeError::InvalidHostIp { path, value: raw })
}

fn required(value: Option<&str>, path: &'static str) -> Result<String, IntakeError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(IntakeError::MissingField(path)),
    }
}
