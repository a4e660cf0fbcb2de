//! # Quantum Security Kernel Test Suite
//!
//! Unified test crate exercising the kernel subsystems together.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── integration/      # Cross-subsystem behaviour
//! │   ├── scenarios.rs  # Reference scenarios A, B, C
//! │   └── concurrency.rs
//! │
//! ├── exploits/         # Attack simulations
//! │   ├── token_forgery.rs
//! │   ├── audit_tampering.rs
//! │   └── tenant_isolation.rs
//! │
//! └── properties.rs     # proptest invariants across crates
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p qk-tests
//!
//! # By category
//! cargo test -p qk-tests integration::
//! cargo test -p qk-tests exploits::
//! cargo test -p qk-tests properties::
//! ```

pub mod exploits;
pub mod integration;
pub mod properties;

#[cfg(test)]
mod fixtures;
