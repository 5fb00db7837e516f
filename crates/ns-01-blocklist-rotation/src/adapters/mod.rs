//! # Adapters Layer (Hexagonal Architecture)
//!
//! In-memory implementations of the outbound ports. They back the local
//! sandbox runtime and double as fakes (with fault injection) in tests.

mod clock;
mod fault;
mod ip_set;
mod rule_list;
mod state_store;

pub use clock::{ManualClock, SystemClock};
pub use fault::FaultInjector;
pub use ip_set::{InMemoryIpSet, IpSetSnapshot};
pub use rule_list::{InMemoryRuleList, RuleListSnapshot};
pub use state_store::InMemoryStateStore;
