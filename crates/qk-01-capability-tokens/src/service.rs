//! # Token Manager Service
//!
//! Issues, verifies, attenuates and revokes capability tokens.
//!
//! The manager keeps a registry of every token it issued. The registry is
//! the source of truth for the mutable fields (`use_count`, `revoked`), so a
//! caller holding a stale or edited copy cannot roll its use count back.
//! Verification and consumption happen under one write lock, which makes a
//! use limit exact under concurrency.

use parking_lot::RwLock;
use shared_types::{SigningKey, SystemTimeSource, TimeSource};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::{
    CapabilitySet, CapabilityToken, TokenConfig, TokenDraft, TokenError, TokenId, TokenResult,
    TokenStatistics,
};
use crate::ports::{CapabilityTokenApi, TokenRequest};

#[derive(Default)]
struct Registry {
    tokens: HashMap<TokenId, CapabilityToken>,
    revoked: HashSet<TokenId>,
    issued: u64,
    attenuated: u64,
    collected: u64,
}

/// Capability token manager.
///
/// Implements [`CapabilityTokenApi`]. Cheap to share behind an `Arc`.
pub struct TokenManager {
    key: SigningKey,
    config: TokenConfig,
    time: Arc<dyn TimeSource>,
    registry: RwLock<Registry>,
}

impl TokenManager {
    /// Manager with a freshly generated key and the system clock.
    pub fn new(config: TokenConfig) -> Self {
        Self::with_key(SigningKey::generate(), config, Arc::new(SystemTimeSource))
    }

    /// Manager with an explicit key and clock.
    pub fn with_key(key: SigningKey, config: TokenConfig, time: Arc<dyn TimeSource>) -> Self {
        Self {
            key,
            config,
            time,
            registry: RwLock::new(Registry::default()),
        }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Current time according to the manager's clock.
    pub fn now(&self) -> u64 {
        self.time.now()
    }

    /// Ids from `token_id` up to its root, starting with `token_id`.
    ///
    /// Stops at the first ancestor no longer in the registry.
    pub fn delegation_chain(&self, token_id: TokenId) -> Vec<TokenId> {
        let registry = self.registry.read();
        let mut chain = Vec::new();
        let mut cursor = registry.tokens.get(&token_id);
        while let Some(token) = cursor {
            chain.push(token.token_id());
            cursor = token
                .parent_token_id()
                .and_then(|parent| registry.tokens.get(&parent));
        }
        chain
    }

    /// Every registered token delegated, directly or transitively, from
    /// `token_id`. Breadth-first order.
    pub fn descendants_of(&self, token_id: TokenId) -> Vec<TokenId> {
        let registry = self.registry.read();
        let mut found = Vec::new();
        let mut queue = VecDeque::from([token_id]);
        while let Some(current) = queue.pop_front() {
            for token in registry.tokens.values() {
                if token.parent_token_id() == Some(current) {
                    found.push(token.token_id());
                    queue.push_back(token.token_id());
                }
            }
        }
        found
    }

    /// Full verification against the registry. Caller holds the lock.
    fn evaluate(&self, registry: &Registry, token: &CapabilityToken, now: u64) -> TokenResult<()> {
        let id = token.token_id();
        let record = registry.tokens.get(&id);

        let revoked = registry.revoked.contains(&id)
            || token.is_revoked()
            || record.is_some_and(CapabilityToken::is_revoked);
        let use_count = record.map_or(token.use_count(), |r| r.use_count().max(token.use_count()));
        let exhausted = matches!(token.max_uses(), Some(max) if use_count >= max);
        let signature_ok = token.signature_matches(&self.key);

        // All checks run; the first failure in this order is reported.
        if revoked {
            return Err(TokenError::Revoked);
        }
        if token.is_expired_at(now) {
            return Err(TokenError::Expired {
                expires_at: token.expires_at(),
            });
        }
        if exhausted {
            return Err(TokenError::UseLimitExceeded {
                max_uses: token.max_uses().unwrap_or_default(),
            });
        }
        if !signature_ok {
            return Err(TokenError::InvalidSignature);
        }

        let record = record.ok_or(TokenError::UnknownToken)?;
        if record.signature() != token.signature() {
            return Err(TokenError::InvalidSignature);
        }

        Self::check_lineage(registry, record)
    }

    fn check_lineage(registry: &Registry, record: &CapabilityToken) -> TokenResult<()> {
        let Some(parent_id) = record.parent_token_id() else {
            return Ok(());
        };
        let Some(parent) = registry.tokens.get(&parent_id) else {
            return Ok(());
        };

        if !record.capabilities().is_subset(parent.capabilities())
            || record.delegation_depth() != parent.delegation_depth().saturating_add(1)
        {
            error!(
                token_id = %record.token_id(),
                parent_id = %parent_id,
                "Delegated token is not contained in its parent"
            );
            return Err(TokenError::LineageViolation);
        }
        Ok(())
    }

    fn check_depth(&self, depth: u32) -> TokenResult<()> {
        if depth > self.config.max_delegation_depth {
            return Err(TokenError::DelegationTooDeep {
                depth,
                max: self.config.max_delegation_depth,
            });
        }
        Ok(())
    }

    fn check_subset(requested: &CapabilitySet, source: &CapabilitySet) -> TokenResult<()> {
        if requested.is_empty() {
            return Err(TokenError::EmptyCapabilitySet);
        }
        if !requested.is_subset(source) {
            return Err(TokenError::NotASubset {
                excess: requested.difference(source),
            });
        }
        Ok(())
    }

    /// Remaining uses from the registry's count, not the caller's copy.
    fn remaining_uses(registry: &Registry, token: &CapabilityToken) -> Option<u32> {
        registry
            .tokens
            .get(&token.token_id())
            .and_then(CapabilityToken::remaining_uses)
    }

    /// A delegated token never outlives its parent's remaining uses.
    fn cap_uses(requested: Option<u32>, parent_remaining: Option<u32>) -> Option<u32> {
        match (requested, parent_remaining) {
            (Some(requested), Some(remaining)) => Some(requested.min(remaining)),
            (requested, None) => requested,
            (None, remaining) => remaining,
        }
    }

    fn register(&self, registry: &mut Registry, token: &CapabilityToken) {
        registry.tokens.insert(token.token_id(), token.clone());
    }
}

impl CapabilityTokenApi for TokenManager {
    fn create(
        &self,
        request: TokenRequest,
        parent: Option<&CapabilityToken>,
    ) -> TokenResult<CapabilityToken> {
        if request.capability_set.is_empty() {
            return Err(TokenError::EmptyCapabilitySet);
        }

        let now = self.time.now();
        let ttl = request.ttl_secs.unwrap_or(self.config.default_ttl_secs);
        let mut expires_at = now.saturating_add(ttl);

        let mut registry = self.registry.write();

        let mut max_uses = request.max_uses;
        let (parent_token_id, delegation_depth) = match parent {
            Some(parent) => {
                Self::check_subset(&request.capability_set, parent.capabilities())?;
                let depth = parent.delegation_depth().saturating_add(1);
                self.check_depth(depth)?;
                self.evaluate(&registry, parent, now)?;
                expires_at = expires_at.min(parent.expires_at());
                max_uses = Self::cap_uses(max_uses, Self::remaining_uses(&registry, parent));
                (Some(parent.token_id()), depth)
            }
            None => (None, 0),
        };

        let token = CapabilityToken::sign_draft(
            TokenDraft {
                capability_set: request.capability_set,
                tenant_id: request.tenant_id,
                session_id: request.session_id,
                issued_at: now,
                expires_at,
                max_uses,
                parent_token_id,
                delegation_depth,
            },
            &self.key,
        )?;

        self.register(&mut registry, &token);
        registry.issued += 1;

        info!(
            token_id = %token.token_id(),
            tenant_id = %token.tenant_id(),
            capabilities = %token.capabilities(),
            depth = token.delegation_depth(),
            "Issued capability token"
        );
        Ok(token)
    }

    fn check(&self, token: &CapabilityToken) -> TokenResult<()> {
        let now = self.time.now();
        let registry = self.registry.read();
        let result = self.evaluate(&registry, token, now);
        if let Err(e) = &result {
            debug!(token_id = %token.token_id(), reason = e.reason_code(), "Token rejected");
        }
        result
    }

    fn attenuate(
        &self,
        token: &CapabilityToken,
        subset: CapabilitySet,
    ) -> TokenResult<CapabilityToken> {
        let now = self.time.now();
        let mut registry = self.registry.write();

        self.evaluate(&registry, token, now)?;
        Self::check_subset(&subset, token.capabilities())?;
        let depth = token.delegation_depth().saturating_add(1);
        self.check_depth(depth)?;

        let remaining = Self::remaining_uses(&registry, token);

        let child = CapabilityToken::sign_draft(
            TokenDraft {
                capability_set: subset,
                tenant_id: token.tenant_id().clone(),
                session_id: token.session_id().cloned(),
                issued_at: now,
                expires_at: token.expires_at(),
                max_uses: remaining,
                parent_token_id: Some(token.token_id()),
                delegation_depth: depth,
            },
            &self.key,
        )?;

        self.register(&mut registry, &child);
        registry.attenuated += 1;

        info!(
            token_id = %child.token_id(),
            parent_id = %token.token_id(),
            capabilities = %child.capabilities(),
            "Attenuated capability token"
        );
        Ok(child)
    }

    fn increment_use_count(&self, token: &CapabilityToken) -> TokenResult<u32> {
        let now = self.time.now();
        let mut registry = self.registry.write();

        self.evaluate(&registry, token, now)?;

        let record = registry
            .tokens
            .get_mut(&token.token_id())
            .ok_or(TokenError::UnknownToken)?;
        record.record_use();
        if record.is_exhausted() {
            debug!(token_id = %record.token_id(), "Token reached its use limit");
        }
        Ok(record.use_count())
    }

    fn revoke(&self, token_id: TokenId) -> bool {
        let mut registry = self.registry.write();
        let newly_revoked = registry.revoked.insert(token_id);
        if let Some(record) = registry.tokens.get_mut(&token_id) {
            record.mark_revoked();
        }

        if newly_revoked {
            info!(token_id = %token_id, "Revoked capability token");
        } else {
            warn!(token_id = %token_id, "Token was already revoked");
        }
        newly_revoked
    }

    fn is_revoked(&self, token_id: TokenId) -> bool {
        self.registry.read().revoked.contains(&token_id)
    }

    fn collect_expired(&self) -> usize {
        let now = self.time.now();
        let mut registry = self.registry.write();

        let expired: Vec<TokenId> = registry
            .tokens
            .values()
            .filter(|t| t.is_expired_at(now))
            .map(CapabilityToken::token_id)
            .collect();

        // Only bodies are dropped; revocation entries are permanent.
        for id in &expired {
            registry.tokens.remove(id);
        }
        registry.collected += expired.len() as u64;

        if !expired.is_empty() {
            info!(count = expired.len(), "Collected expired tokens");
        }
        expired.len()
    }

    fn get_token(&self, token_id: TokenId) -> Option<CapabilityToken> {
        self.registry.read().tokens.get(&token_id).cloned()
    }

    fn statistics(&self) -> TokenStatistics {
        let registry = self.registry.read();
        TokenStatistics {
            issued: registry.issued,
            attenuated: registry.attenuated,
            active: registry.tokens.len(),
            revoked: registry.revoked.len(),
            collected: registry.collected,
        }
    }
}
