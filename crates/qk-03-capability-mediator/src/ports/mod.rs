//! # Ports Layer
//!
//! - **Driving Ports (Inbound)**: [`CapabilityMediatorApi`]
//! - **Driven Ports (Outbound)**: [`OperationRequirements`],
//!   [`TokenAuthority`], [`DecisionAuditor`]
//!
//! The mediator only sees tokens through [`TokenAuthority`] and never
//! depends on a concrete executor or log type.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
