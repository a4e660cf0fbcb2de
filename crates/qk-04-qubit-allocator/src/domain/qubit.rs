//! # Physical Qubits
//!
//! ```text
//!            allocate              begin_reset
//!   Free ─────────────→ Allocated ───────────→ Resetting
//!    ↑  ←──────────────     │                      │
//!    │      release         │ take_offline         │ complete_reset
//!    │                      ↓                      │
//!    └──── restore ──── Faulty / Maintenance       │
//!    ↑                                             │
//!    └─────────────────────────────────────────────┘
//! ```
//!
//! An owner is present exactly when the state is `Allocated`.

use serde::{Deserialize, Serialize};
use shared_types::{QubitId, TenantId};
use std::fmt;

use super::errors::{AllocationError, AllocationResult};

/// Lifecycle state of a physical qubit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QubitState {
    Free,
    Allocated,
    /// Being purged after release; not yet reusable.
    Resetting,
    Faulty,
    Maintenance,
}

impl QubitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Allocated => "allocated",
            Self::Resetting => "resetting",
            Self::Faulty => "faulty",
            Self::Maintenance => "maintenance",
        }
    }

    /// Out of the pool until restored.
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Faulty | Self::Maintenance)
    }
}

impl fmt::Display for QubitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of quantum hardware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalQubit {
    qubit_id: QubitId,
    state: QubitState,
    owner: Option<TenantId>,
    allocated_at: Option<u64>,
}

impl PhysicalQubit {
    pub fn new(qubit_id: QubitId) -> Self {
        Self {
            qubit_id,
            state: QubitState::Free,
            owner: None,
            allocated_at: None,
        }
    }

    pub fn qubit_id(&self) -> QubitId {
        self.qubit_id
    }

    pub fn state(&self) -> QubitState {
        self.state
    }

    pub fn owner(&self) -> Option<&TenantId> {
        self.owner.as_ref()
    }

    pub fn allocated_at(&self) -> Option<u64> {
        self.allocated_at
    }

    pub fn is_free(&self) -> bool {
        self.state == QubitState::Free
    }

    /// Allocated to exactly `tenant_id`.
    pub fn is_owned_by(&self, tenant_id: &TenantId) -> bool {
        self.state == QubitState::Allocated && self.owner.as_ref() == Some(tenant_id)
    }

    pub(crate) fn allocate(&mut self, tenant_id: TenantId, now: u64) -> AllocationResult<()> {
        self.require_state(QubitState::Free, QubitState::Allocated)?;
        self.state = QubitState::Allocated;
        self.owner = Some(tenant_id);
        self.allocated_at = Some(now);
        Ok(())
    }

    pub(crate) fn begin_reset(&mut self) -> AllocationResult<()> {
        self.require_state(QubitState::Allocated, QubitState::Resetting)?;
        self.clear(QubitState::Resetting);
        Ok(())
    }

    pub(crate) fn release(&mut self) -> AllocationResult<()> {
        self.require_state(QubitState::Allocated, QubitState::Free)?;
        self.clear(QubitState::Free);
        Ok(())
    }

    pub(crate) fn complete_reset(&mut self) -> AllocationResult<()> {
        self.require_state(QubitState::Resetting, QubitState::Free)?;
        self.state = QubitState::Free;
        Ok(())
    }

    /// Pulls the qubit out of service. Returns the evicted owner, if any.
    pub(crate) fn take_offline(&mut self, to: QubitState) -> AllocationResult<Option<TenantId>> {
        if !to.is_offline() || self.state == to {
            return Err(self.invalid(to));
        }
        let previous_owner = self.owner.take();
        self.clear(to);
        Ok(previous_owner)
    }

    pub(crate) fn restore(&mut self) -> AllocationResult<()> {
        if !self.state.is_offline() {
            return Err(self.invalid(QubitState::Free));
        }
        self.state = QubitState::Free;
        Ok(())
    }

    fn clear(&mut self, to: QubitState) {
        self.state = to;
        self.owner = None;
        self.allocated_at = None;
    }

    fn require_state(&self, from: QubitState, to: QubitState) -> AllocationResult<()> {
        if self.state == from {
            Ok(())
        } else {
            Err(self.invalid(to))
        }
    }

    fn invalid(&self, to: QubitState) -> AllocationError {
        AllocationError::InvalidTransition {
            qubit_id: self.qubit_id,
            from: self.state,
            to,
        }
    }
}
