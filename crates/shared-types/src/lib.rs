//! # Shared Types Crate
//!
//! Types shared by every subsystem of the quantum security kernel.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: tenant, session and qubit identifiers are
//!   defined once here so the mediator and the allocator agree on them
//!   without depending on each other.
//! - **Key Material Stays Put**: [`SigningKey`] never hands out its bytes;
//!   callers ask it to compute or verify a MAC instead.
//! - **Injectable Time**: every subsystem reads the clock through
//!   [`TimeSource`] so expiry and audit timestamps are deterministic in tests.

pub mod entities;
pub mod security;
pub mod time;

pub use entities::*;
pub use security::*;
pub use time::*;
