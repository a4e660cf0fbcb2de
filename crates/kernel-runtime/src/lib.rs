//! # Kernel Runtime
//!
//! Assembles the quantum security kernel from its four subsystems.
//!
//! | Subsystem | Crate | Role |
//! |-----------|-------|------|
//! | Capability tokens | `qk-01-capability-tokens` | issue, verify, attenuate, revoke |
//! | Audit log | `qk-02-audit-log` | Merkle-accumulated event record |
//! | Mediator | `qk-03-capability-mediator` | operation → capability checks |
//! | Allocator | `qk-04-qubit-allocator` | exclusive qubit ownership |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kernel_runtime::{KernelConfig, SecurityKernel};
//!
//! let config = KernelConfig::from_env()?;
//! config.validate_for_production()?;
//! let kernel = SecurityKernel::new(config)?;
//!
//! let decision = kernel.check_capability(&token, "apply_h");
//! if decision.allowed {
//!     kernel.require_access(token.tenant_id(), qubit)?;
//! }
//! ```

pub mod adapters;
pub mod container;
pub mod errors;

pub use adapters::AuditLogAllocationSink;
pub use container::{ConfigError, KernelConfig, SecurityConfig, SecurityKernel};
pub use errors::{KernelError, KernelResult};
