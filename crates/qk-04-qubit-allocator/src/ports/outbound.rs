//! # Outbound Ports (Driven Ports)

use crate::domain::AllocationEvent;

/// Receives every auditable allocator outcome, denials included, before
/// the caller sees it.
pub trait AllocationAuditSink: Send + Sync {
    fn record(&self, event: &AllocationEvent);
}
