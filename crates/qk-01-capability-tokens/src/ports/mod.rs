//! # Ports Layer
//!
//! - **Driving Ports (Inbound)**: [`CapabilityTokenApi`], the surface the
//!   mediator and the runtime call.
//!
//! The subsystem has no driven ports beyond [`shared_types::TimeSource`].

pub mod inbound;

pub use inbound::*;
