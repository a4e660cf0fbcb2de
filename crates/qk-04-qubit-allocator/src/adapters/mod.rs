//! # Adapters Layer

pub mod audit_sink;

pub use audit_sink::NoOpAuditSink;
