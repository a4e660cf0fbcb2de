//! # Tenant Isolation
//!
//! One tenant tries to reach another tenant's physical qubits: by id
//! guessing, by releasing them, or by grabbing them mid-reset.

#[cfg(test)]
mod tests {
    use kernel_runtime::KernelError;
    use qk_02_audit_log::{AuditEventType, EventQuery};
    use qk_04_qubit_allocator::{AllocationError, QubitAllocatorApi, QubitState};
    use shared_types::{QubitId, TenantId};

    use crate::fixtures::kernel;

    #[test]
    fn exploit_id_scan_finds_nothing_and_is_audited() {
        let (kernel, _) = kernel(8, 4);
        let victim = TenantId::new("victim");
        let attacker = TenantId::new("attacker");
        kernel.allocate(&victim, 3, &[]).unwrap();

        let reachable = (0..16)
            .map(QubitId)
            .filter(|q| kernel.verify_access(&attacker, *q))
            .count();
        assert_eq!(reachable, 0);

        let violations = kernel.audit_events(
            &EventQuery::new()
                .tenant(attacker)
                .event_type(AuditEventType::OwnershipViolation),
        );
        assert_eq!(violations.len(), 16);
    }

    #[test]
    fn exploit_release_of_foreign_qubits_is_refused() {
        let (kernel, _) = kernel(8, 4);
        let victim = TenantId::new("victim");
        let attacker = TenantId::new("attacker");
        let held = kernel.allocate(&victim, 2, &[]).unwrap();

        let err = kernel.deallocate(&attacker, &held, false).unwrap_err();
        assert!(matches!(
            err,
            KernelError::Allocation(AllocationError::OwnershipError { .. })
        ));
        assert!(err.is_security_relevant());
        assert_eq!(kernel.allocator().tenant_qubits(&victim), held);
    }

    #[test]
    fn exploit_preferred_ids_do_not_bypass_reset() {
        let (kernel, _) = kernel(2, 2);
        let first = TenantId::new("first");
        let second = TenantId::new("second");
        let held = kernel.allocate(&first, 2, &[]).unwrap();
        kernel.deallocate(&first, &held, true).unwrap();

        assert!(matches!(
            kernel.allocate(&second, 1, &held),
            Err(KernelError::Allocation(AllocationError::ResourceExhausted { .. }))
        ));
        assert_eq!(
            kernel.allocator().qubit(held[0]).unwrap().state(),
            QubitState::Resetting
        );

        kernel.complete_all_resets();
        assert_eq!(kernel.allocate(&second, 1, &held).unwrap(), vec![held[0]]);
    }

    #[test]
    fn exploit_faulty_eviction_does_not_leak_to_next_tenant() {
        let (kernel, _) = kernel(2, 2);
        let first = TenantId::new("first");
        let second = TenantId::new("second");
        let held = kernel.allocate(&first, 1, &[]).unwrap();

        assert_eq!(kernel.mark_faulty(held[0]).unwrap(), Some(first.clone()));
        assert!(!kernel.verify_access(&first, held[0]));

        let got = kernel.allocate(&second, 1, &held).unwrap();
        assert_ne!(got, held);
        assert_eq!(kernel.allocator().quota(&first).allocated_qubits, 0);
    }

    #[test]
    fn exploit_quota_cannot_be_raced_past() {
        let (kernel, _) = kernel(16, 3);
        let greedy = TenantId::new("greedy");
        assert!(kernel.allocate(&greedy, 2, &[]).is_ok());
        assert!(kernel.allocate(&greedy, 2, &[]).is_err());
        assert!(kernel.allocate(&greedy, 1, &[]).is_ok());
        assert!(kernel.allocate(&greedy, 1, &[]).is_err());
        assert!(kernel.set_quota(&greedy, 2).is_err());
        assert_eq!(kernel.allocator().tenant_qubits(&greedy).len(), 3);
    }
}
