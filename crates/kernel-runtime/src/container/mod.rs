//! # Kernel Container
//!
//! Configuration and the context object that owns every subsystem.
//!
//! - Subsystems are built in dependency order: audit log, token manager,
//!   mediator, allocator
//! - One `TimeSource` is shared by all of them

pub mod config;
pub mod kernel;

pub use config::{ConfigError, KernelConfig, SecurityConfig};
pub use kernel::SecurityKernel;
