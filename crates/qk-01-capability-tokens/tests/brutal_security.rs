//! # Brutal Security Tests for Capability Tokens (qk-01)
//!
//! These tests try to forge, amplify, replay and over-use tokens.
//!
//! ## Test Categories
//!
//! 1. **Forgery** - field tampering, foreign keys, transport edits
//! 2. **Amplification** - attenuation and delegation beyond the source
//! 3. **Replay** - stale copies, revoked and expired tokens
//! 4. **Concurrency** - racing consumers against a use limit

use proptest::prelude::*;
use qk_01_capability_tokens::{
    Capability, CapabilitySet, CapabilityToken, CapabilityTokenApi, TokenConfig, TokenError,
    TokenManager, TokenRequest,
};
use shared_types::{ManualTimeSource, SigningKey};
use std::sync::Arc;
use std::thread;

// =============================================================================
// TEST HELPERS
// =============================================================================

fn make_manager() -> TokenManager {
    TokenManager::with_key(
        SigningKey::from_bytes([0x5A; 32]),
        TokenConfig::default(),
        ManualTimeSource::new_shared(10_000),
    )
}

fn issue(manager: &TokenManager, caps: &[Capability]) -> CapabilityToken {
    manager
        .create(
            TokenRequest::new(caps.iter().copied().collect::<CapabilitySet>(), "tenant-a"),
            None,
        )
        .unwrap()
}

// =============================================================================
// FORGERY
// =============================================================================

#[test]
fn brutal_edited_capability_list_fails_signature() {
    let manager = make_manager();
    let token = issue(&manager, &[Capability::Measurement]);

    let mut map = token.to_field_map();
    map.insert("capability_set".to_string(), "admin,measurement".to_string());
    let forged = CapabilityToken::from_field_map(&map).unwrap();

    assert_eq!(
        manager.check(&forged).unwrap_err(),
        TokenError::InvalidSignature
    );
}

#[test]
fn brutal_edited_tenant_fails_signature() {
    let manager = make_manager();
    let token = issue(&manager, &[Capability::Compute]);

    let mut map = token.to_field_map();
    map.insert("tenant_id".to_string(), "tenant-b".to_string());
    let forged = CapabilityToken::from_field_map(&map).unwrap();

    assert!(!manager.verify(&forged));
}

#[test]
fn brutal_extended_expiry_fails_signature() {
    let manager = make_manager();
    let token = issue(&manager, &[Capability::Compute]);

    let mut map = token.to_field_map();
    let later = token.expires_at() + 1_000_000;
    map.insert("expires_at".to_string(), later.to_string());
    let forged = CapabilityToken::from_field_map(&map).unwrap();

    assert_eq!(
        manager.check(&forged).unwrap_err(),
        TokenError::InvalidSignature
    );
}

#[test]
fn brutal_removed_use_limit_fails_signature() {
    let manager = make_manager();
    let token = manager
        .create(
            TokenRequest::new(CapabilitySet::from([Capability::Compute]), "tenant-a")
                .with_max_uses(1),
            None,
        )
        .unwrap();

    let mut map = token.to_field_map();
    map.remove("max_uses");
    let forged = CapabilityToken::from_field_map(&map).unwrap();

    assert!(!manager.verify(&forged));
}

#[test]
fn brutal_token_from_another_kernel_is_rejected() {
    let ours = make_manager();
    let theirs = TokenManager::with_key(
        SigningKey::from_bytes([0x11; 32]),
        TokenConfig::default(),
        ManualTimeSource::new_shared(10_000),
    );

    let token = issue(&theirs, &[Capability::Admin]);
    assert!(!ours.verify(&token));
}

// =============================================================================
// AMPLIFICATION
// =============================================================================

#[test]
fn brutal_attenuation_cannot_add_capabilities() {
    let manager = make_manager();
    let token = issue(&manager, &[Capability::Compute, Capability::Measurement]);

    let err = manager
        .attenuate(
            &token,
            CapabilitySet::from([Capability::Compute, Capability::Teleport]),
        )
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(manager.statistics().attenuated, 0);
}

#[test]
fn brutal_delegated_create_cannot_escape_parent_expiry() {
    let manager = make_manager();
    let parent = manager
        .create(
            TokenRequest::new(CapabilitySet::from([Capability::Link]), "tenant-a").with_ttl(30),
            None,
        )
        .unwrap();

    let child = manager
        .create(
            TokenRequest::new(CapabilitySet::from([Capability::Link]), "tenant-b")
                .with_ttl(u64::MAX),
            Some(&parent),
        )
        .unwrap();

    assert_eq!(child.expires_at(), parent.expires_at());
}

#[test]
fn brutal_delegation_from_forged_parent_is_refused() {
    let manager = make_manager();
    let parent = issue(&manager, &[Capability::Compute]);

    let mut map = parent.to_field_map();
    map.insert("capability_set".to_string(), "admin,compute".to_string());
    let forged_parent = CapabilityToken::from_field_map(&map).unwrap();

    let err = manager
        .create(
            TokenRequest::new(CapabilitySet::from([Capability::Admin]), "tenant-a"),
            Some(&forged_parent),
        )
        .unwrap_err();
    assert_eq!(err, TokenError::InvalidSignature);
}

// =============================================================================
// REPLAY
// =============================================================================

#[test]
fn brutal_stale_copy_cannot_reset_use_count() {
    let manager = make_manager();
    let token = manager
        .create(
            TokenRequest::new(CapabilitySet::from([Capability::Compute]), "tenant-a")
                .with_max_uses(1),
            None,
        )
        .unwrap();
    let stale = token.clone();

    manager.increment_use_count(&token).unwrap();

    let mut map = stale.to_field_map();
    map.insert("use_count".to_string(), "0".to_string());
    let replayed = CapabilityToken::from_field_map(&map).unwrap();

    assert_eq!(
        manager.check(&replayed).unwrap_err(),
        TokenError::UseLimitExceeded { max_uses: 1 }
    );
}

#[test]
fn brutal_clearing_revoked_flag_does_not_unrevoke() {
    let manager = make_manager();
    let token = issue(&manager, &[Capability::Compute]);
    manager.revoke(token.token_id());

    let mut map = token.to_field_map();
    map.insert("revoked".to_string(), "false".to_string());
    let replayed = CapabilityToken::from_field_map(&map).unwrap();

    assert_eq!(manager.check(&replayed).unwrap_err(), TokenError::Revoked);
}

#[test]
fn brutal_collected_token_stays_dead() {
    let clock = ManualTimeSource::new_shared(0);
    let manager = TokenManager::with_key(
        SigningKey::from_bytes([0x5A; 32]),
        TokenConfig::default(),
        clock.clone(),
    );
    let token = manager
        .create(
            TokenRequest::new(CapabilitySet::from([Capability::Compute]), "tenant-a").with_ttl(5),
            None,
        )
        .unwrap();

    clock.advance(6);
    assert_eq!(manager.collect_expired(), 1);
    assert!(matches!(
        manager.check(&token),
        Err(TokenError::Expired { .. })
    ));
}

// =============================================================================
// CONCURRENCY
// =============================================================================

#[test]
fn brutal_racing_consumers_respect_use_limit() {
    let manager = Arc::new(make_manager());
    let token = manager
        .create(
            TokenRequest::new(CapabilitySet::from([Capability::Compute]), "tenant-a")
                .with_max_uses(5),
            None,
        )
        .unwrap();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let token = token.clone();
            thread::spawn(move || {
                (0..5)
                    .filter(|_| manager.increment_use_count(&token).is_ok())
                    .count()
            })
        })
        .collect();

    let successes: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(successes, 5);
    assert_eq!(
        manager.get_token(token.token_id()).unwrap().use_count(),
        5
    );
}

// =============================================================================
// PROPERTIES
// =============================================================================

fn capability_subset() -> impl Strategy<Value = CapabilitySet> {
    proptest::sample::subsequence(Capability::ALL.to_vec(), 0..=Capability::ALL.len())
        .prop_map(|caps| caps.into_iter().collect())
}

proptest! {
    #[test]
    fn prop_attenuation_never_amplifies(
        source in capability_subset(),
        requested in capability_subset(),
    ) {
        prop_assume!(!source.is_empty());
        let manager = make_manager();
        let token = manager
            .create(TokenRequest::new(source.clone(), "tenant-a"), None)
            .unwrap();

        match manager.attenuate(&token, requested.clone()) {
            Ok(child) => {
                prop_assert!(child.capabilities().is_subset(&source));
                prop_assert_eq!(child.capabilities(), &requested);
                prop_assert_eq!(child.delegation_depth(), 1);
            }
            Err(TokenError::EmptyCapabilitySet) => prop_assert!(requested.is_empty()),
            Err(TokenError::NotASubset { excess }) => {
                prop_assert!(!requested.is_subset(&source));
                prop_assert_eq!(excess, requested.difference(&source));
            }
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    #[test]
    fn prop_attenuation_chains_shrink_monotonically(
        chain in proptest::collection::vec(capability_subset(), 1..6),
    ) {
        let manager = make_manager();
        let mut current = issue(&manager, &Capability::ALL);

        for requested in chain {
            if let Ok(child) = manager.attenuate(&current, requested) {
                prop_assert!(child.capabilities().is_subset(current.capabilities()));
                prop_assert_eq!(child.delegation_depth(), current.delegation_depth() + 1);
                current = child;
            }
        }
        prop_assert!(manager.verify(&current));
    }
}
