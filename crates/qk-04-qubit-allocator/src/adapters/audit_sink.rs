//! Audit sinks that need nothing from the rest of the kernel.

use crate::domain::AllocationEvent;
use crate::ports::AllocationAuditSink;

/// Drops every event. For standalone use and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpAuditSink;

impl AllocationAuditSink for NoOpAuditSink {
    fn record(&self, _event: &AllocationEvent) {}
}
