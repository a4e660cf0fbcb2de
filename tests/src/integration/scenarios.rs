//! # Reference Scenarios
//!
//! - **A**: mediation reports the exact missing capability
//! - **B**: quota and pool exhaustion on a four-qubit pool
//! - **C**: audit roots move, proofs verify, tampering breaks them
//!
//! Plus an end-to-end dispatch flow combining all three.

#[cfg(test)]
mod tests {
    use kernel_runtime::KernelError;
    use qk_01_capability_tokens::{Capability, CapabilitySet};
    use qk_02_audit_log::{details, AuditEventType, AuditLogApi, EventQuery};
    use qk_03_capability_mediator::{CapabilityMediatorApi, DecisionReason};
    use qk_04_qubit_allocator::AllocationError;
    use shared_types::TenantId;
    use std::collections::HashSet;

    use crate::fixtures::{kernel, token};

    // =========================================================================
    // SCENARIO A: MISSING CAPABILITY
    // =========================================================================

    #[test]
    fn scenario_a_compute_token_cannot_measure() {
        let (kernel, _) = kernel(4, 2);
        let compute = token(&kernel, "t1", &[Capability::Compute], None);

        let denied = kernel.check_capability(&compute, "measure_z");
        assert!(!denied.allowed);
        assert_eq!(denied.reason, DecisionReason::MissingCapabilities);
        assert_eq!(denied.missing, CapabilitySet::from([Capability::Measurement]));
        assert_eq!(denied.required, CapabilitySet::from([Capability::Measurement]));

        let allowed = kernel.check_capability(&compute, "apply_h");
        assert!(allowed.allowed);
        assert!(allowed.missing.is_empty());

        let stats = kernel.mediator().statistics();
        assert_eq!(stats.checks_performed, 2);
        assert_eq!(stats.allowed, 1);
        assert_eq!(stats.denied, 1);
    }

    // =========================================================================
    // SCENARIO B: QUOTA AND EXHAUSTION
    // =========================================================================

    #[test]
    fn scenario_b_quota_then_exhaustion() {
        let (kernel, _) = kernel(4, 2);
        let (t1, t2, t3) = (TenantId::new("t1"), TenantId::new("t2"), TenantId::new("t3"));

        let first = kernel.allocate(&t1, 2, &[]).unwrap();
        assert_eq!(first.len(), 2);

        assert!(matches!(
            kernel.allocate(&t1, 1, &[]),
            Err(KernelError::Allocation(AllocationError::QuotaExceeded { .. }))
        ));

        let second = kernel.allocate(&t2, 2, &[]).unwrap();
        let a: HashSet<_> = first.iter().collect();
        assert!(second.iter().all(|q| !a.contains(q)));

        assert!(matches!(
            kernel.allocate(&t3, 1, &[]),
            Err(KernelError::Allocation(AllocationError::ResourceExhausted {
                requested: 1,
                available: 0,
            }))
        ));

        let denials = kernel.audit_events(&EventQuery::new().event_type(AuditEventType::AllocationDenied));
        let reasons: Vec<_> = denials.iter().filter_map(|r| r.detail("reason")).collect();
        assert_eq!(reasons, vec!["quota_exceeded", "resource_exhausted"]);
    }

    // =========================================================================
    // SCENARIO C: MERKLE TAMPER EVIDENCE
    // =========================================================================

    #[test]
    fn scenario_c_roots_proofs_and_tampering() {
        let (kernel, _) = kernel(4, 2);
        let log = kernel.audit_log();
        let t1 = TenantId::new("t1");

        let mut roots = Vec::new();
        for i in 0..3 {
            let receipt = log
                .append(
                    AuditEventType::CapabilityGranted,
                    Some(&t1),
                    details([("operation", format!("apply_h_{}", i))]),
                )
                .unwrap();
            roots.push(receipt.root);
        }
        assert_ne!(roots[2], roots[1]);
        assert_ne!(roots[1], roots[0]);

        let original = log.entry_bytes(1).unwrap();
        let proof = log.get_proof(1).unwrap();
        assert!(log.verify_proof(&proof, &original));
        assert_eq!(log.detect_tampering(), None);

        log.tamper_entry_bytes(1, |bytes| bytes[0] ^= 0x01).unwrap();
        let tampered = log.entry_bytes(1).unwrap();
        assert_ne!(tampered, original);
        assert!(!log.verify_proof(&proof, &tampered));
        assert!(log.verify_proof(&proof, &original));
        assert_eq!(log.detect_tampering(), Some(1));
    }

    // =========================================================================
    // END TO END
    // =========================================================================

    #[test]
    fn dispatch_flow_checks_capability_then_ownership() {
        let (kernel, _) = kernel(4, 2);
        let t1 = TenantId::new("t1");
        let t2 = TenantId::new("t2");
        let t1_token = token(&kernel, "t1", &[Capability::Allocation, Capability::Compute], None);
        let t2_token = token(&kernel, "t2", &[Capability::Compute], None);

        // t1 allocates through the mediator.
        kernel.require_capability(&t1_token, "allocate_qubits").unwrap();
        let qubits = kernel.allocate(t1_token.tenant_id(), 1, &[]).unwrap();

        // t1 may run a gate on its own qubit.
        kernel.require_capability(&t1_token, "apply_x").unwrap();
        kernel.require_access(&t1, qubits[0]).unwrap();

        // t2 holds compute but not the qubit.
        kernel.require_capability(&t2_token, "apply_x").unwrap();
        assert!(matches!(
            kernel.require_access(&t2, qubits[0]),
            Err(KernelError::Allocation(AllocationError::OwnershipError { .. }))
        ));

        // t2 cannot allocate at all.
        assert!(kernel.require_capability(&t2_token, "allocate_qubits").is_err());

        let violations = kernel.audit_events(
            &EventQuery::new()
                .tenant(t2.clone())
                .event_type(AuditEventType::OwnershipViolation),
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].detail("action"), Some("access"));
        assert_eq!(kernel.detect_tampering(), None);
    }

    #[test]
    fn revoked_parent_leaves_attenuated_child_usable() {
        let (kernel, _) = kernel(4, 2);
        let parent = token(&kernel, "t1", &[Capability::Compute, Capability::Measurement], None);
        let child = kernel
            .attenuate_token(&parent, CapabilitySet::from([Capability::Compute]))
            .unwrap();

        assert!(kernel.revoke_token(parent.token_id()));
        assert_eq!(
            kernel.check_capability(&parent, "apply_h").reason,
            DecisionReason::TokenRevoked
        );
        // Revocation does not cascade.
        assert!(kernel.check_capability(&child, "apply_h").allowed);
        assert_eq!(
            kernel.tokens().delegation_chain(child.token_id()),
            vec![child.token_id(), parent.token_id()]
        );
    }

    #[test]
    fn expired_tokens_are_denied_then_collected() {
        let (kernel, clock) = kernel(4, 2);
        let short = kernel
            .issue_token(
                qk_01_capability_tokens::TokenRequest::new(
                    CapabilitySet::from([Capability::Link]),
                    "t1",
                )
                .with_ttl(30),
                None,
            )
            .unwrap();

        assert!(kernel.check_capability(&short, "open_channel").allowed);
        clock.advance(31);
        assert_eq!(
            kernel.check_capability(&short, "close_channel").reason,
            DecisionReason::TokenExpired
        );
        assert_eq!(kernel.collect_expired(), 1);
        assert_eq!(
            kernel.check_capability(&short, "close_channel").reason,
            DecisionReason::TokenExpired
        );
    }
}
