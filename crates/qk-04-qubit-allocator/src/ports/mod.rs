//! # Ports Layer
//!
//! - **Driving Ports (Inbound)**: [`QubitAllocatorApi`]
//! - **Driven Ports (Outbound)**: [`AllocationAuditSink`]
//!
//! The allocator has no notion of capability tokens; callers compose it
//! with the mediator at the call site.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
