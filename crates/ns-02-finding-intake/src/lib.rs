//! # NS-02 Finding Intake
//!
//! Turns threat finding events into block requests.
//!
//! **Subsystem ID:** 02
//! **Architecture:** Domain + pure algorithms, no I/O
//!
//! ## Event Shapes
//!
//! | Finding type | Remote address path |
//! |--------------|---------------------|
//! | `Recon:EC2/PortProbeUnprotectedPort` | `service.action.portProbeAction.portProbeDetails[0]` |
//! | anything else | `service.action.networkConnectionAction` |
//!
//! The boundary reference handed to resolution is the subnet of the first
//! network interface of the affected instance.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod domain;

// Re-exports
pub use algorithms::{extract, parse_event};
pub use domain::{
    FindingAction, FindingContext, FindingDetail, FindingEvent, FindingKind, FindingResource,
    FindingService, InstanceDetails, IntakeError, NetworkConnectionAction, NetworkInterface,
    PortProbeAction, PortProbeDetail, RemoteIpDetails, PORT_PROBE_TYPE,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
