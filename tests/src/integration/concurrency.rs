//! # Concurrency Properties
//!
//! - Use-limit exactness under racing mediation checks
//! - Allocator exclusivity under racing tenants
//! - Proofs requested while appends are in flight always verify

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use qk_01_capability_tokens::{Capability, CapabilityTokenApi};
    use qk_02_audit_log::{details, AuditEventType, AuditLogApi};
    use qk_04_qubit_allocator::QubitAllocatorApi;
    use shared_types::{QubitId, TenantId};
    use std::collections::HashSet;
    use std::sync::{Arc, Barrier};
    use std::thread;

    use crate::fixtures::{kernel, token};

    #[test]
    fn single_use_token_authorizes_exactly_once() {
        for _ in 0..20 {
            let (kernel, _) = kernel(4, 2);
            let kernel = Arc::new(kernel);
            let once = token(&kernel, "t1", &[Capability::Teleport], Some(1));
            let barrier = Arc::new(Barrier::new(2));

            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let kernel = Arc::clone(&kernel);
                    let once = once.clone();
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        kernel.check_capability(&once, "teleport").allowed
                    })
                })
                .collect();

            let allowed = handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|allowed| *allowed)
                .count();
            assert_eq!(allowed, 1);
            assert_eq!(
                kernel.tokens().get_token(once.token_id()).unwrap().use_count(),
                1
            );
        }
    }

    #[test]
    fn use_limit_is_exact_across_threads() {
        let (kernel, _) = kernel(4, 2);
        let kernel = Arc::new(kernel);
        let limited = token(&kernel, "t1", &[Capability::Compute], Some(25));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let kernel = Arc::clone(&kernel);
                let limited = limited.clone();
                thread::spawn(move || {
                    (0..10)
                        .filter(|_| kernel.check_capability(&limited, "apply_cnot").allowed)
                        .count()
                })
            })
            .collect();

        let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(allowed, 25);

        let m = kernel.metrics();
        assert_eq!(m.capability_checks.with_label_values(&["allowed"]).get(), 25);
        assert_eq!(m.capability_checks.with_label_values(&["denied"]).get(), 75);
        assert_eq!(
            m.capability_denials
                .with_label_values(&["use_limit_exceeded"])
                .get(),
            75
        );
        // One issue entry plus one per check.
        assert_eq!(kernel.audit_log().len(), 101);
    }

    #[test]
    fn racing_tenants_get_disjoint_qubits() {
        let (kernel, _) = kernel(24, 6);
        let kernel = Arc::new(kernel);
        let claimed: Arc<Mutex<Vec<(TenantId, QubitId)>>> = Arc::new(Mutex::new(Vec::new()));
        let barrier = Arc::new(Barrier::new(6));

        let handles: Vec<_> = (0..6)
            .map(|i| {
                let kernel = Arc::clone(&kernel);
                let claimed = Arc::clone(&claimed);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let tenant = TenantId::new(format!("t{}", i));
                    barrier.wait();
                    for _ in 0..8 {
                        if let Ok(ids) = kernel.allocate(&tenant, 1, &[]) {
                            let mut claimed = claimed.lock();
                            claimed.extend(ids.into_iter().map(|q| (tenant.clone(), q)));
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let claimed = claimed.lock();
        let unique: HashSet<_> = claimed.iter().map(|(_, q)| *q).collect();
        assert_eq!(unique.len(), claimed.len());
        assert_eq!(claimed.len(), 24);
        for (tenant, q) in claimed.iter() {
            assert!(kernel.verify_access(tenant, *q));
            assert!(kernel.allocator().quota(tenant).allocated_qubits <= 6);
        }
        assert_eq!(kernel.pool_statistics().allocated, 24);
    }

    #[test]
    fn proofs_taken_during_appends_verify() {
        let (kernel, _) = kernel(4, 2);
        let kernel = Arc::new(kernel);

        let writers: Vec<_> = (0..4)
            .map(|w| {
                let kernel = Arc::clone(&kernel);
                thread::spawn(move || {
                    let tenant = TenantId::new(format!("writer-{}", w));
                    for i in 0..50 {
                        kernel
                            .audit_log()
                            .append(
                                AuditEventType::CapabilityGranted,
                                Some(&tenant),
                                details([("n", i.to_string())]),
                            )
                            .unwrap();
                    }
                })
            })
            .collect();

        let reader = {
            let kernel = Arc::clone(&kernel);
            thread::spawn(move || {
                let mut checked = 0;
                while checked < 200 {
                    let log = kernel.audit_log();
                    let len = log.len();
                    if len == 0 {
                        thread::yield_now();
                        continue;
                    }
                    let index = checked as u64 % len;
                    // Stored bytes are immutable after append.
                    let bytes = log.entry_bytes(index).unwrap();
                    let proof = log.get_proof(index).unwrap();
                    assert!(proof.verify_against(&proof.root, &bytes));
                    checked += 1;
                }
            })
        };

        for w in writers {
            w.join().unwrap();
        }
        reader.join().unwrap();

        let log = kernel.audit_log();
        assert_eq!(log.len(), 200);
        assert_eq!(log.detect_tampering(), None);
        let sequences: HashSet<_> = (0..200)
            .map(|i| log.record(i).unwrap().sequence_number)
            .collect();
        assert_eq!(sequences.len(), 200);
    }
}
