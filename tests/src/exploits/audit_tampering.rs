//! # Audit Tampering
//!
//! A compromised operator edits stored audit entries after the fact to
//! hide a denial or a skipped reset.

#[cfg(test)]
mod tests {
    use qk_01_capability_tokens::Capability;
    use qk_02_audit_log::{AuditLogApi, AuditRecord};
    use shared_types::TenantId;

    use crate::fixtures::{kernel, token};

    fn populated() -> kernel_runtime::SecurityKernel {
        let (kernel, _) = kernel(4, 2);
        let t = token(&kernel, "t1", &[Capability::Compute], None);
        for op in ["apply_h", "measure", "apply_x", "teleport", "apply_z"] {
            kernel.check_capability(&t, op);
        }
        let q = kernel.allocate(&TenantId::new("t1"), 1, &[]).unwrap();
        kernel.deallocate(&TenantId::new("t1"), &q, false).unwrap();
        kernel
    }

    #[test]
    fn exploit_rewriting_a_denial_as_a_grant_is_detected() {
        let kernel = populated();
        let log = kernel.audit_log();
        // Entry 2 is the denied "measure".
        let record = log.record(2).unwrap();
        assert_eq!(record.detail("reason"), Some("missing_capabilities"));

        let rewritten = String::from_utf8(log.entry_bytes(2).unwrap())
            .unwrap()
            .replace("capability_denied", "capability_granted")
            .replace("missing_capabilities", "granted");
        log.tamper_entry_bytes(2, |bytes| *bytes = rewritten.into_bytes())
            .unwrap();

        // The edited bytes still decode to a plausible record.
        let decoded = AuditRecord::from_bytes(&log.entry_bytes(2).unwrap()).unwrap();
        assert_eq!(decoded.detail("reason"), Some("granted"));

        assert_eq!(log.detect_tampering(), Some(2));
        assert!(!log.verify_entry(2).unwrap());
    }

    #[test]
    fn exploit_integrity_ranges_isolate_the_edit() {
        let kernel = populated();
        let log = kernel.audit_log();
        let len = log.len();
        log.tamper_entry_bytes(4, |bytes| bytes.push(b' ')).unwrap();

        assert!(log.verify_integrity(0, 4).unwrap());
        assert!(!log.verify_integrity(0, 5).unwrap());
        assert!(!log.verify_integrity(4, 5).unwrap());
        assert!(log.verify_integrity(5, len).unwrap());
        assert!(!log.verify_integrity(0, len).unwrap());
    }

    #[test]
    fn exploit_hiding_a_skipped_reset_is_detected() {
        let kernel = populated();
        let log = kernel.audit_log();
        let last = log.len() - 1;
        let skipped = log.record(last).unwrap();
        assert_eq!(skipped.detail("reset"), Some("false"));

        let hidden = String::from_utf8(log.entry_bytes(last).unwrap())
            .unwrap()
            .replace("qubit_reset_skipped", "qubit_deallocated")
            .replace("\"false\"", "\"true\"");
        log.tamper_entry_bytes(last, |bytes| *bytes = hidden.into_bytes())
            .unwrap();

        assert_eq!(kernel.detect_tampering(), Some(last));
    }

    #[test]
    fn exploit_published_root_pins_history() {
        let kernel = populated();
        let log = kernel.audit_log();
        let published = log.get_root_hash();
        let proof = log.get_proof(1).unwrap();
        let original = log.entry_bytes(1).unwrap();

        // Appending more entries moves the root but old proofs still check
        // against the root they were issued under.
        kernel.collect_expired();
        kernel.allocate(&TenantId::new("t2"), 1, &[]).unwrap();
        assert_ne!(log.get_root_hash(), published);
        assert!(proof.verify_against(&published, &original));

        let mut forged = original.clone();
        forged[1] ^= 0x20;
        assert!(!proof.verify_against(&published, &forged));
    }
}
