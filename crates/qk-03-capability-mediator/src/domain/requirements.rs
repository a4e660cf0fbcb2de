//! # Operation Requirement Table
//!
//! Maps every protected operation name to the capability set it needs.
//! Measurements need `measurement` whatever the basis, gates need
//! `compute`, channel lifecycle needs `link`, and sending and receiving
//! are distinct rights.

use qk_01_capability_tokens::{Capability, CapabilitySet};
use std::collections::BTreeMap;

use crate::ports::OperationRequirements;

const MEASUREMENT_OPS: &[&str] = &["measure", "measure_x", "measure_y", "measure_z"];

const GATE_OPS: &[&str] = &[
    "apply_h",
    "apply_x",
    "apply_y",
    "apply_z",
    "apply_s",
    "apply_t",
    "apply_rx",
    "apply_ry",
    "apply_rz",
    "apply_cnot",
    "apply_cz",
    "apply_swap",
    "apply_toffoli",
];

const LINK_OPS: &[&str] = &["open_channel", "close_channel", "create_entanglement"];

const MAGIC_STATE_OPS: &[&str] = &["inject_magic_state", "distill_magic_state"];

const ALLOCATION_OPS: &[&str] = &["allocate_qubits", "deallocate_qubits"];

const RESET_OPS: &[&str] = &["reset_qubit", "complete_reset"];

const ADMIN_OPS: &[&str] = &[
    "revoke_token",
    "set_quota",
    "mark_faulty",
    "mark_maintenance",
    "restore_qubit",
    "collect_expired_tokens",
    "read_audit_log",
];

const DELEGATE_OPS: &[&str] = &["delegate_token", "attenuate_token"];

const DEBUG_OPS: &[&str] = &["debug_read_state", "debug_inspect_qubit"];

/// Fixed operation-name table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRequirementTable {
    entries: BTreeMap<String, CapabilitySet>,
}

impl StaticRequirementTable {
    /// Empty table. Every lookup misses.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// The kernel's standard operation vocabulary.
    pub fn standard() -> Self {
        let groups: [(&[&str], Capability); 9] = [
            (MEASUREMENT_OPS, Capability::Measurement),
            (GATE_OPS, Capability::Compute),
            (LINK_OPS, Capability::Link),
            (MAGIC_STATE_OPS, Capability::MagicState),
            (ALLOCATION_OPS, Capability::Allocation),
            (RESET_OPS, Capability::Reset),
            (ADMIN_OPS, Capability::Admin),
            (DELEGATE_OPS, Capability::Delegate),
            (DEBUG_OPS, Capability::Debug),
        ];

        let mut table = Self::empty();
        for (ops, capability) in groups {
            for op in ops {
                table = table.with_operation(*op, CapabilitySet::from([capability]));
            }
        }
        table
            .with_operation("send_qubit", CapabilitySet::from([Capability::Send]))
            .with_operation("receive_qubit", CapabilitySet::from([Capability::Receive]))
            .with_operation("teleport", CapabilitySet::from([Capability::Teleport]))
    }

    /// Adds or replaces the entry for `operation`.
    pub fn with_operation(mut self, operation: impl Into<String>, required: CapabilitySet) -> Self {
        self.entries.insert(operation.into(), required);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mapped operation names, sorted.
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl Default for StaticRequirementTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl OperationRequirements for StaticRequirementTable {
    fn required_capabilities(&self, operation: &str) -> Option<CapabilitySet> {
        self.entries.get(operation).cloned()
    }
}
