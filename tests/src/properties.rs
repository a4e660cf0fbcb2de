//! # Property Tests
//!
//! Invariants checked over generated inputs through the wired kernel.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use qk_01_capability_tokens::{Capability, CapabilitySet, CapabilityToken};
    use qk_02_audit_log::AuditLogApi;
    use qk_03_capability_mediator::{CapabilityMediatorApi, DecisionReason};
    use shared_types::TenantId;

    use crate::fixtures::{kernel, token};

    const OPERATIONS: [&str; 10] = [
        "measure",
        "apply_h",
        "open_channel",
        "inject_magic_state",
        "allocate_qubits",
        "complete_reset",
        "revoke_token",
        "delegate_token",
        "send_qubit",
        "teleport",
    ];

    const SIGNED_FIELDS: [&str; 6] = [
        "tenant_id",
        "session_id",
        "issued_at",
        "expires_at",
        "max_uses",
        "delegation_depth",
    ];

    fn capability_subset() -> impl Strategy<Value = Vec<Capability>> {
        prop::sample::subsequence(Capability::ALL.to_vec(), 1..=Capability::ALL.len())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Allowed iff the token covers the operation's requirement, and
        /// `missing` is exactly the uncovered part.
        #[test]
        fn prop_mediation_matches_set_difference(
            caps in capability_subset(),
            op_index in 0..OPERATIONS.len(),
        ) {
            let (kernel, _) = kernel(4, 2);
            let t = token(&kernel, "t1", &caps, None);
            let op = OPERATIONS[op_index];

            let required = kernel.mediator().required_capabilities(op).unwrap();
            let decision = kernel.check_capability(&t, op);
            let expected_missing = required.difference(t.capabilities());

            prop_assert_eq!(decision.allowed, expected_missing.is_empty());
            prop_assert_eq!(decision.missing, expected_missing);
        }

        /// Editing any signed field breaks the token.
        #[test]
        fn prop_single_field_edit_is_rejected(
            field_index in 0..SIGNED_FIELDS.len(),
            value in 1u64..1_000_000,
        ) {
            let (kernel, _) = kernel(4, 2);
            let t = token(&kernel, "t1", &[Capability::Compute], Some(50));

            let field = SIGNED_FIELDS[field_index];
            let mut map = t.to_field_map();
            let replacement = match field {
                "tenant_id" | "session_id" => format!("forged-{}", value),
                "max_uses" => (50 + value).to_string(),
                "delegation_depth" => (value % 7 + 1).to_string(),
                _ => (t.issued_at() + value).to_string(),
            };
            map.insert(field.to_string(), replacement);
            let forged = CapabilityToken::from_field_map(&map).unwrap();

            let decision = kernel.check_capability(&forged, "apply_h");
            prop_assert!(!decision.allowed);
            prop_assert_eq!(decision.reason, DecisionReason::InvalidSignature);
        }

        /// max_uses = n authorizes exactly min(n, attempts) checks.
        #[test]
        fn prop_use_limit_is_exact(max_uses in 1u32..12, attempts in 0usize..20) {
            let (kernel, _) = kernel(4, 2);
            let t = token(&kernel, "t1", &[Capability::Compute], Some(max_uses));

            let allowed = (0..attempts)
                .filter(|_| kernel.check_capability(&t, "apply_t").allowed)
                .count();
            prop_assert_eq!(allowed, attempts.min(max_uses as usize));
        }

        /// Every audit entry's proof verifies against its own bytes and no
        /// other entry's.
        #[test]
        fn prop_audit_proofs_bind_their_entry(
            counts in prop::collection::vec(1u32..3, 1..12),
        ) {
            let (kernel, _) = kernel(64, 64);
            for (i, count) in counts.iter().enumerate() {
                let tenant = TenantId::new(format!("t{}", i));
                let _ = kernel.allocate(&tenant, *count, &[]);
            }

            let log = kernel.audit_log();
            let root = log.get_root_hash();
            for index in 0..log.len() {
                let proof = log.get_proof(index).unwrap();
                let bytes = log.entry_bytes(index).unwrap();
                prop_assert!(proof.verify_against(&root, &bytes));

                let other = (index + 1) % log.len();
                if other != index {
                    let other_bytes = log.entry_bytes(other).unwrap();
                    prop_assert!(!proof.verify_against(&root, &other_bytes));
                }
            }
        }

        /// Attenuation through the kernel yields exactly the requested
        /// subset, or fails when the subset reaches outside the parent.
        #[test]
        fn prop_attenuation_yields_requested_subset(
            parent_caps in capability_subset(),
            child_caps in capability_subset(),
        ) {
            let (kernel, _) = kernel(4, 2);
            let parent = token(&kernel, "t1", &parent_caps, None);
            let wanted: CapabilitySet = child_caps.iter().copied().collect();

            match kernel.attenuate_token(&parent, wanted.clone()) {
                Ok(child) => {
                    prop_assert!(wanted.is_subset(parent.capabilities()));
                    prop_assert_eq!(child.capabilities(), &wanted);
                    prop_assert_eq!(child.delegation_depth(), parent.delegation_depth() + 1);
                }
                Err(_) => prop_assert!(!wanted.is_subset(parent.capabilities())),
            }
        }
    }
}
