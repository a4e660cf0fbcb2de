//! # Ports Layer
//!
//! - **Driving Ports (Inbound)**: [`AuditLogApi`], used by the runtime and
//!   by the mediator and allocator audit adapters.

pub mod inbound;

pub use inbound::*;
