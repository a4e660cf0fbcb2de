//! # Inbound Ports (Driving Ports)
//!
//! Public API exposed by the Capability Token subsystem.

use shared_types::{SessionId, TenantId};

use crate::domain::{CapabilitySet, CapabilityToken, TokenId, TokenResult, TokenStatistics};

/// Parameters for issuing a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub capability_set: CapabilitySet,
    pub tenant_id: TenantId,
    /// Lifetime in seconds; `None` uses the manager's default.
    pub ttl_secs: Option<u64>,
    pub max_uses: Option<u32>,
    pub session_id: Option<SessionId>,
}

impl TokenRequest {
    pub fn new(capability_set: impl Into<CapabilitySet>, tenant_id: impl Into<TenantId>) -> Self {
        Self {
            capability_set: capability_set.into(),
            tenant_id: tenant_id.into(),
            ttl_secs: None,
            max_uses: None,
            session_id: None,
        }
    }

    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = Some(ttl_secs);
        self
    }

    pub fn with_max_uses(mut self, max_uses: u32) -> Self {
        self.max_uses = Some(max_uses);
        self
    }

    pub fn with_session(mut self, session_id: impl Into<SessionId>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Primary API for the Capability Token subsystem.
pub trait CapabilityTokenApi: Send + Sync {
    /// Issue a token, optionally delegated from `parent`.
    ///
    /// ## Returns
    ///
    /// - `Err(EmptyCapabilitySet)`: nothing to grant
    /// - `Err(NotASubset)`: delegation would amplify the parent
    /// - `Err(DelegationTooDeep)`: chain longer than configured
    /// - Any denial of `parent` itself
    fn create(
        &self,
        request: TokenRequest,
        parent: Option<&CapabilityToken>,
    ) -> TokenResult<CapabilityToken>;

    /// Boolean form of [`CapabilityTokenApi::check`].
    fn verify(&self, token: &CapabilityToken) -> bool {
        self.check(token).is_ok()
    }

    /// Runs revocation, expiry, use-limit and signature checks, returning
    /// the first failure in that order.
    fn check(&self, token: &CapabilityToken) -> TokenResult<()>;

    /// Derive a token carrying `subset` of the source's capabilities. The
    /// source is untouched.
    fn attenuate(
        &self,
        token: &CapabilityToken,
        subset: CapabilitySet,
    ) -> TokenResult<CapabilityToken>;

    /// Re-verify and consume one use atomically. Returns the new use count.
    fn increment_use_count(&self, token: &CapabilityToken) -> TokenResult<u32>;

    /// Add `token_id` to the revocation set. Returns false if it was
    /// already revoked. Does not cascade to delegated tokens.
    fn revoke(&self, token_id: TokenId) -> bool;

    fn is_revoked(&self, token_id: TokenId) -> bool;

    /// Drop every registered token past its expiry. Returns how many.
    /// Revocation entries survive collection.
    fn collect_expired(&self) -> usize;

    /// Snapshot of the authoritative record for `token_id`.
    fn get_token(&self, token_id: TokenId) -> Option<CapabilityToken>;

    fn statistics(&self) -> TokenStatistics;
}
