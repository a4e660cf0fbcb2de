//! # Token Forgery
//!
//! Attacker holds a genuine token in its transport form and edits fields,
//! splices signatures, or mints tokens under a guessed key.

#[cfg(test)]
mod tests {
    use kernel_runtime::{KernelConfig, SecurityKernel};
    use qk_01_capability_tokens::{Capability, CapabilityToken};
    use qk_02_audit_log::{AuditEventType, EventQuery};
    use qk_03_capability_mediator::DecisionReason;
    use shared_types::ManualTimeSource;
    use std::collections::BTreeMap;

    use crate::fixtures::{kernel, token, START_TIME};

    fn edit(token: &CapabilityToken, field: &str, value: &str) -> CapabilityToken {
        let mut map: BTreeMap<String, String> = token.to_field_map();
        map.insert(field.to_string(), value.to_string());
        CapabilityToken::from_field_map(&map).unwrap()
    }

    #[test]
    fn exploit_tenant_swap_is_rejected() {
        let (kernel, _) = kernel(4, 2);
        let victim_token = token(&kernel, "victim", &[Capability::Admin], None);

        let stolen = edit(&victim_token, "tenant_id", "attacker");
        let decision = kernel.check_capability(&stolen, "set_quota");
        assert_eq!(decision.reason, DecisionReason::InvalidSignature);
    }

    #[test]
    fn exploit_expiry_extension_is_rejected() {
        let (kernel, clock) = kernel(4, 2);
        let short = token(&kernel, "t1", &[Capability::Compute], None);
        clock.advance(3_601);

        let extended = edit(&short, "expires_at", &(START_TIME + 100_000).to_string());
        let decision = kernel.check_capability(&extended, "apply_h");
        assert!(!decision.allowed);
        assert_eq!(decision.reason, DecisionReason::InvalidSignature);
    }

    #[test]
    fn exploit_use_count_reset_is_rejected() {
        let (kernel, _) = kernel(4, 2);
        let once = token(&kernel, "t1", &[Capability::Compute], Some(1));
        assert!(kernel.check_capability(&once, "apply_h").allowed);

        // use_count is not signed; the registry record is what counts.
        let reset = edit(&once, "use_count", "0");
        assert_eq!(
            kernel.check_capability(&reset, "apply_h").reason,
            DecisionReason::UseLimitExceeded
        );
    }

    #[test]
    fn exploit_revoked_flag_cleared_is_still_revoked() {
        let (kernel, _) = kernel(4, 2);
        let t = token(&kernel, "t1", &[Capability::Compute], None);
        kernel.revoke_token(t.token_id());

        let cleared = edit(&t, "revoked", "false");
        assert_eq!(
            kernel.check_capability(&cleared, "apply_h").reason,
            DecisionReason::TokenRevoked
        );
    }

    #[test]
    fn exploit_signature_splice_between_tokens() {
        let (kernel, _) = kernel(4, 2);
        let weak = token(&kernel, "t1", &[Capability::Compute], None);
        let strong = token(&kernel, "t1", &[Capability::Admin, Capability::Debug], None);

        let spliced = edit(
            &weak,
            "capability_set",
            &strong.capabilities().to_string(),
        );
        let spliced = edit(
            &spliced,
            "signature",
            &strong.to_field_map()["signature"],
        );
        assert_eq!(
            kernel.check_capability(&spliced, "debug_read_state").reason,
            DecisionReason::InvalidSignature
        );
    }

    #[test]
    fn exploit_token_from_another_kernel() {
        let (kernel, _) = kernel(4, 2);

        let mut rogue_config = KernelConfig::default();
        rogue_config.security.signing_key = Some([0x13; 32]);
        let rogue = SecurityKernel::with_time_source(
            rogue_config,
            ManualTimeSource::new_shared(START_TIME),
        )
        .unwrap();
        let minted = token(&rogue, "t1", &Capability::ALL, None);

        let decision = kernel.check_capability(&minted, "mark_faulty");
        assert!(!decision.allowed);
        assert_eq!(decision.reason, DecisionReason::InvalidSignature);
    }

    #[test]
    fn exploit_self_minted_parent_link_is_rejected() {
        let (kernel, _) = kernel(4, 2);
        let root = token(&kernel, "t1", &[Capability::Compute], None);

        // Claim to be a delegated child of a real token without a signature
        // over the claim.
        let fake_child = edit(&root, "parent_token_id", &root.token_id().to_string());
        assert!(!kernel.check_capability(&fake_child, "apply_h").allowed);
    }

    #[test]
    fn exploit_attempts_are_audited_as_denials() {
        let (kernel, _) = kernel(4, 2);
        let t = token(&kernel, "t1", &[Capability::Compute], None);
        for field in ["tenant_id", "issued_at", "delegation_depth"] {
            let value = if field == "tenant_id" { "x" } else { "7" };
            kernel.check_capability(&edit(&t, field, value), "apply_h");
        }

        let denied = kernel.audit_events(
            &EventQuery::new().event_type(AuditEventType::CapabilityDenied),
        );
        assert_eq!(denied.len(), 3);
        assert!(denied
            .iter()
            .all(|r| r.detail("reason") == Some("invalid_signature")));
    }
}
