//! # Capability Token
//!
//! A self-contained credential naming a capability set, its owning tenant
//! and its delegation lineage, authenticated by an HMAC over every
//! authorization-relevant field.
//!
//! ## Invariants
//!
//! - `capability_set` is never empty and never changes after creation.
//! - If `parent_token_id` is set, the set was a subset of the parent's at
//!   creation and `delegation_depth == parent.delegation_depth + 1`.
//! - Only `use_count` and `revoked` ever change; neither is signed, and
//!   the manager's registry holds the authoritative values.

use serde::{Deserialize, Serialize};
use shared_types::{MacTag, SessionId, SigningKey, TenantId};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::capability::{Capability, CapabilitySet};
use super::errors::{TokenError, TokenResult};

/// Unique identifier of a capability token.
pub type TokenId = Uuid;

/// Domain separator mixed into every signing payload.
const SIGNING_DOMAIN: &str = "qk-capability-token-v1";

/// A signed capability token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityToken {
    token_id: TokenId,
    capability_set: CapabilitySet,
    tenant_id: TenantId,
    session_id: Option<SessionId>,
    issued_at: u64,
    expires_at: u64,
    max_uses: Option<u32>,
    use_count: u32,
    revoked: bool,
    parent_token_id: Option<TokenId>,
    delegation_depth: u32,
    signature: MacTag,
}

/// Fields covered by the signature, in fixed order.
#[derive(Serialize)]
struct SigningPayload<'a> {
    domain: &'static str,
    token_id: [u8; 16],
    capability_set: Vec<&'static str>,
    tenant_id: &'a str,
    session_id: Option<&'a str>,
    issued_at: u64,
    expires_at: u64,
    max_uses: Option<u32>,
    parent_token_id: Option<[u8; 16]>,
    delegation_depth: u32,
}

/// Parameters for a token about to be signed.
#[derive(Debug, Clone)]
pub(crate) struct TokenDraft {
    pub capability_set: CapabilitySet,
    pub tenant_id: TenantId,
    pub session_id: Option<SessionId>,
    pub issued_at: u64,
    pub expires_at: u64,
    pub max_uses: Option<u32>,
    pub parent_token_id: Option<TokenId>,
    pub delegation_depth: u32,
}

impl CapabilityToken {
    /// Signs a draft into a fresh token with a random id.
    pub(crate) fn sign_draft(draft: TokenDraft, key: &SigningKey) -> TokenResult<Self> {
        if draft.capability_set.is_empty() {
            return Err(TokenError::EmptyCapabilitySet);
        }

        let mut token = Self {
            token_id: Uuid::new_v4(),
            capability_set: draft.capability_set,
            tenant_id: draft.tenant_id,
            session_id: draft.session_id,
            issued_at: draft.issued_at,
            expires_at: draft.expires_at,
            max_uses: draft.max_uses,
            use_count: 0,
            revoked: false,
            parent_token_id: draft.parent_token_id,
            delegation_depth: draft.delegation_depth,
            signature: [0u8; 32],
        };
        token.signature = key.mac(&token.signing_bytes()?)?;
        Ok(token)
    }

    /// Canonical bytes covered by the signature.
    ///
    /// `use_count` and `revoked` are deliberately excluded: they are
    /// mutable state tracked by the issuing manager.
    pub fn signing_bytes(&self) -> TokenResult<Vec<u8>> {
        let payload = SigningPayload {
            domain: SIGNING_DOMAIN,
            token_id: *self.token_id.as_bytes(),
            capability_set: self.capability_set.names(),
            tenant_id: self.tenant_id.as_str(),
            session_id: self.session_id.as_ref().map(SessionId::as_str),
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            max_uses: self.max_uses,
            parent_token_id: self.parent_token_id.map(|id| *id.as_bytes()),
            delegation_depth: self.delegation_depth,
        };
        bincode::serialize(&payload).map_err(|e| TokenError::Malformed(e.to_string()))
    }

    /// Recomputes the MAC under `key` and compares in constant time.
    pub fn signature_matches(&self, key: &SigningKey) -> bool {
        match self.signing_bytes() {
            Ok(bytes) => key.verify(&bytes, &self.signature),
            Err(_) => false,
        }
    }

    pub fn token_id(&self) -> TokenId {
        self.token_id
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capability_set
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capability_set.contains(capability)
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn issued_at(&self) -> u64 {
        self.issued_at
    }

    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    pub fn max_uses(&self) -> Option<u32> {
        self.max_uses
    }

    pub fn use_count(&self) -> u32 {
        self.use_count
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    pub fn parent_token_id(&self) -> Option<TokenId> {
        self.parent_token_id
    }

    pub fn delegation_depth(&self) -> u32 {
        self.delegation_depth
    }

    pub fn signature(&self) -> &MacTag {
        &self.signature
    }

    /// Expired strictly after `expires_at`.
    pub fn is_expired_at(&self, now: u64) -> bool {
        now > self.expires_at
    }

    /// Uses left before the limit, or `None` if unlimited.
    pub fn remaining_uses(&self) -> Option<u32> {
        self.max_uses.map(|max| max.saturating_sub(self.use_count))
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        matches!(self.max_uses, Some(max) if self.use_count >= max)
    }

    pub(crate) fn record_use(&mut self) {
        self.use_count = self.use_count.saturating_add(1);
    }

    pub(crate) fn mark_revoked(&mut self) {
        self.revoked = true;
    }

    /// Encodes the token as a plain field map for transport.
    ///
    /// The signature travels as hex; receivers forward the map untouched
    /// and never re-sign.
    pub fn to_field_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("token_id".to_string(), self.token_id.to_string());
        map.insert(
            "capability_set".to_string(),
            self.capability_set.to_string(),
        );
        map.insert("tenant_id".to_string(), self.tenant_id.to_string());
        if let Some(session) = &self.session_id {
            map.insert("session_id".to_string(), session.to_string());
        }
        map.insert("issued_at".to_string(), self.issued_at.to_string());
        map.insert("expires_at".to_string(), self.expires_at.to_string());
        if let Some(max) = self.max_uses {
            map.insert("max_uses".to_string(), max.to_string());
        }
        map.insert("use_count".to_string(), self.use_count.to_string());
        map.insert("revoked".to_string(), self.revoked.to_string());
        if let Some(parent) = self.parent_token_id {
            map.insert("parent_token_id".to_string(), parent.to_string());
        }
        map.insert(
            "delegation_depth".to_string(),
            self.delegation_depth.to_string(),
        );
        map.insert("signature".to_string(), hex::encode(self.signature));
        map
    }

    /// Decodes a token from its transport field map.
    ///
    /// Decoding does not authenticate; pass the result to the manager's
    /// `verify`.
    pub fn from_field_map(map: &BTreeMap<String, String>) -> TokenResult<Self> {
        let capability_set = CapabilitySet::parse_joined(required(map, "capability_set")?)?;
        if capability_set.is_empty() {
            return Err(TokenError::EmptyCapabilitySet);
        }

        let signature_bytes = hex::decode(required(map, "signature")?)
            .map_err(|e| TokenError::Malformed(format!("signature: {}", e)))?;
        let signature: MacTag = signature_bytes
            .as_slice()
            .try_into()
            .map_err(|_| TokenError::Malformed("signature must be 32 bytes".to_string()))?;

        Ok(Self {
            token_id: parse_uuid(required(map, "token_id")?)?,
            capability_set,
            tenant_id: TenantId::new(required(map, "tenant_id")?),
            session_id: map.get("session_id").map(|s| SessionId::new(s.as_str())),
            issued_at: parse_number(map, "issued_at")?,
            expires_at: parse_number(map, "expires_at")?,
            max_uses: map
                .get("max_uses")
                .map(|v| parse_value(v, "max_uses"))
                .transpose()?,
            use_count: map
                .get("use_count")
                .map(|v| parse_value(v, "use_count"))
                .transpose()?
                .unwrap_or(0),
            revoked: map
                .get("revoked")
                .map(|v| parse_value(v, "revoked"))
                .transpose()?
                .unwrap_or(false),
            parent_token_id: map
                .get("parent_token_id")
                .map(|v| parse_uuid(v))
                .transpose()?,
            delegation_depth: parse_number(map, "delegation_depth")?,
            signature,
        })
    }
}

fn required<'a>(map: &'a BTreeMap<String, String>, field: &str) -> TokenResult<&'a str> {
    map.get(field)
        .map(String::as_str)
        .ok_or_else(|| TokenError::Malformed(format!("missing field '{}'", field)))
}

fn parse_number<T: std::str::FromStr>(
    map: &BTreeMap<String, String>,
    field: &str,
) -> TokenResult<T> {
    parse_value(required(map, field)?, field)
}

fn parse_value<T: std::str::FromStr>(value: &str, field: &str) -> TokenResult<T> {
    value
        .parse()
        .map_err(|_| TokenError::Malformed(format!("invalid value for '{}'", field)))
}

fn parse_uuid(value: &str) -> TokenResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| TokenError::Malformed(format!("token id: {}", e)))
}
