//! # Security Kernel
//!
//! One context object holding every kernel subsystem.
//!
//! ## Wiring
//!
//! ```text
//!              ┌────────────────────┐
//!              │ TamperEvidentAudit │ ◄─────────────────────────┐
//!              └────────────────────┘                           │
//!                   ▲            ▲                              │
//!  AuditLogDecision │            │ AuditLogAllocationSink       │ lifecycle
//!          Auditor  │            │                              │ events
//!  ┌──────────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!  │CapabilityMediator│──►│ TokenManager │   │QubitAllocator│   │
//!  └──────────────────┘   └──────────────┘   └──────────────┘   │
//!            ▲                   ▲                  ▲           │
//!            └───────────────────┴── SecurityKernel ┴───────────┘
//! ```
//!
//! Subsystems are `Arc`-shared so callers may hold them directly; going
//! through the kernel additionally audits token lifecycle events and
//! records metrics.

use kernel_telemetry::KernelMetrics;
use qk_01_capability_tokens::{
    CapabilitySet, CapabilityToken, CapabilityTokenApi, TokenError, TokenId, TokenManager,
    TokenRequest,
};
use qk_02_audit_log::{
    details, AuditEventType, AuditLogApi, AuditRecord, AuditStatistics, EventQuery,
    InclusionProof, TamperEvidentAuditLog,
};
use qk_03_capability_mediator::{
    AuditLogDecisionAuditor, CapabilityMediator, CapabilityMediatorApi, Decision,
    StaticRequirementTable,
};
use qk_04_qubit_allocator::{
    AllocationResult, PoolStatistics, QubitAllocator, QubitAllocatorApi, TenantQuota,
};
use shared_types::{Hash, QubitId, SigningKey, SystemTimeSource, TenantId, TimeSource};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::adapters::AuditLogAllocationSink;
use crate::container::KernelConfig;
use crate::errors::KernelResult;

/// The quantum security kernel.
pub struct SecurityKernel {
    config: KernelConfig,
    tokens: Arc<TokenManager>,
    audit: Arc<TamperEvidentAuditLog>,
    mediator: Arc<CapabilityMediator>,
    allocator: Arc<QubitAllocator>,
    metrics: KernelMetrics,
}

impl SecurityKernel {
    /// Kernel on the system clock.
    pub fn new(config: KernelConfig) -> KernelResult<Self> {
        Self::with_time_source(config, Arc::new(SystemTimeSource))
    }

    /// Kernel with an injected clock shared by every subsystem.
    ///
    /// Without a configured signing key an ephemeral one is generated;
    /// tokens then die with the process.
    #[instrument(name = "kernel_init", skip_all)]
    pub fn with_time_source(config: KernelConfig, time: Arc<dyn TimeSource>) -> KernelResult<Self> {
        config.validate()?;

        let key = match config.security.signing_key {
            Some(bytes) => SigningKey::from_bytes(bytes),
            None => {
                warn!("No signing key configured; generating an ephemeral key");
                SigningKey::generate()
            }
        };

        let audit = Arc::new(TamperEvidentAuditLog::with_time_source(
            config.audit,
            time.clone(),
        ));
        let tokens = Arc::new(TokenManager::with_key(
            key,
            config.tokens.clone(),
            time.clone(),
        ));
        let mediator = Arc::new(CapabilityMediator::with_dependencies(
            config.mediator,
            Arc::new(StaticRequirementTable::standard()),
            tokens.clone(),
            Arc::new(AuditLogDecisionAuditor::new(audit.clone())),
            time.clone(),
        ));
        let allocator = Arc::new(QubitAllocator::with_dependencies(
            config.allocator,
            Arc::new(AuditLogAllocationSink::new(audit.clone())),
            time,
        ));
        let metrics = KernelMetrics::new()?;

        info!(
            pool_size = config.allocator.pool_size,
            strict_mode = config.mediator.strict_mode,
            padding = %config.audit.padding,
            "Security kernel initialised"
        );

        let kernel = Self {
            config,
            tokens,
            audit,
            mediator,
            allocator,
            metrics,
        };
        kernel.refresh_gauges();
        Ok(kernel)
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    pub fn audit_log(&self) -> &Arc<TamperEvidentAuditLog> {
        &self.audit
    }

    pub fn mediator(&self) -> &Arc<CapabilityMediator> {
        &self.mediator
    }

    pub fn allocator(&self) -> &Arc<QubitAllocator> {
        &self.allocator
    }

    pub fn metrics(&self) -> &KernelMetrics {
        &self.metrics
    }

    // =========================================================================
    // TOKENS
    // =========================================================================

    /// Mints a root token, or a delegated one when `parent` is given.
    ///
    /// A refused issuance is audited before the error is returned.
    pub fn issue_token(
        &self,
        request: TokenRequest,
        parent: Option<&CapabilityToken>,
    ) -> KernelResult<CapabilityToken> {
        let token = match self.tokens.create(request.clone(), parent) {
            Ok(token) => token,
            Err(e) => {
                self.token_refused(
                    "issue",
                    &request.tenant_id,
                    &request.capability_set,
                    parent,
                    &e,
                );
                return Err(e.into());
            }
        };

        let mut entry = token_details(&token);
        if let Some(parent_id) = token.parent_token_id() {
            entry.insert("parent_token_id".to_string(), parent_id.to_string());
        }
        self.append(AuditEventType::TokenIssued, Some(token.tenant_id()), entry);
        self.metrics.tokens_issued.inc();
        Ok(token)
    }

    /// Derives a narrower child of `token`.
    pub fn attenuate_token(
        &self,
        token: &CapabilityToken,
        subset: CapabilitySet,
    ) -> KernelResult<CapabilityToken> {
        let child = match self.tokens.attenuate(token, subset.clone()) {
            Ok(child) => child,
            Err(e) => {
                self.token_refused("attenuate", token.tenant_id(), &subset, Some(token), &e);
                return Err(e.into());
            }
        };

        let mut entry = token_details(&child);
        entry.insert("parent_token_id".to_string(), token.token_id().to_string());
        self.append(AuditEventType::TokenAttenuated, Some(child.tenant_id()), entry);
        self.metrics.tokens_issued.inc();
        Ok(child)
    }

    /// Revokes one token. Descendants are not revoked with it.
    pub fn revoke_token(&self, token_id: TokenId) -> bool {
        let tenant = self.tokens.get_token(token_id).map(|t| t.tenant_id().clone());
        let revoked = self.tokens.revoke(token_id);
        if revoked {
            self.append(
                AuditEventType::TokenRevoked,
                tenant.as_ref(),
                details([("token_id", token_id.to_string())]),
            );
            self.metrics.tokens_revoked.inc();
        }
        revoked
    }

    /// Garbage-collects expired tokens. Returns how many were removed.
    pub fn collect_expired(&self) -> usize {
        let collected = self.tokens.collect_expired();
        if collected > 0 {
            self.append(
                AuditEventType::TokensCollected,
                None,
                details([("count", collected.to_string())]),
            );
        }
        collected
    }

    // =========================================================================
    // MEDIATION
    // =========================================================================

    pub fn check_capability(&self, token: &CapabilityToken, operation: &str) -> Decision {
        let decision = self.mediator.check_capability(token, operation);
        self.metrics
            .record_check(decision.allowed, decision.reason.as_str());
        self.refresh_gauges();
        decision
    }

    pub fn require_capability(
        &self,
        token: &CapabilityToken,
        operation: &str,
    ) -> KernelResult<Decision> {
        let decision = self.mediator.require_capability(token, operation);
        match &decision {
            Ok(d) => self.metrics.record_check(true, d.reason.as_str()),
            Err(e) => self.metrics.record_check(false, e.reason().as_str()),
        }
        self.refresh_gauges();
        Ok(decision?)
    }

    // =========================================================================
    // QUBITS
    // =========================================================================

    pub fn allocate(
        &self,
        tenant_id: &TenantId,
        count: u32,
        preferred: &[QubitId],
    ) -> KernelResult<Vec<QubitId>> {
        let result = self.allocator.allocate(tenant_id, count, preferred);
        if let Err(e) = &result {
            self.metrics.record_allocation_failure(e.kind());
        }
        self.pool_changed(result)
    }

    pub fn deallocate(
        &self,
        tenant_id: &TenantId,
        qubit_ids: &[QubitId],
        reset: bool,
    ) -> KernelResult<Vec<QubitId>> {
        let result = self.allocator.deallocate(tenant_id, qubit_ids, reset);
        self.pool_changed(result)
    }

    pub fn verify_access(&self, tenant_id: &TenantId, qubit_id: QubitId) -> bool {
        let granted = self.allocator.verify_access(tenant_id, qubit_id);
        self.refresh_gauges();
        granted
    }

    pub fn require_access(&self, tenant_id: &TenantId, qubit_id: QubitId) -> KernelResult<()> {
        let result = self.allocator.require_access(tenant_id, qubit_id);
        self.pool_changed(result)
    }

    pub fn complete_reset(&self, qubit_id: QubitId) -> KernelResult<()> {
        let result = self.allocator.complete_reset(qubit_id);
        self.pool_changed(result)
    }

    pub fn complete_all_resets(&self) -> Vec<QubitId> {
        let freed = self.allocator.complete_all_resets();
        self.refresh_gauges();
        freed
    }

    /// Returns the evicted tenant, if the qubit was allocated.
    pub fn mark_faulty(&self, qubit_id: QubitId) -> KernelResult<Option<TenantId>> {
        let result = self.allocator.mark_faulty(qubit_id);
        self.pool_changed(result)
    }

    pub fn mark_maintenance(&self, qubit_id: QubitId) -> KernelResult<Option<TenantId>> {
        let result = self.allocator.mark_maintenance(qubit_id);
        self.pool_changed(result)
    }

    pub fn restore_qubit(&self, qubit_id: QubitId) -> KernelResult<()> {
        let result = self.allocator.restore_qubit(qubit_id);
        self.pool_changed(result)
    }

    pub fn set_quota(&self, tenant_id: &TenantId, max_qubits: u32) -> KernelResult<TenantQuota> {
        Ok(self.allocator.set_quota(tenant_id, max_qubits)?)
    }

    pub fn release_tenant(&self, tenant_id: &TenantId) -> KernelResult<Vec<QubitId>> {
        let result = self.allocator.release_tenant(tenant_id);
        self.pool_changed(result)
    }

    pub fn pool_statistics(&self) -> PoolStatistics {
        self.allocator.pool_statistics()
    }

    // =========================================================================
    // AUDIT QUERIES
    // =========================================================================

    pub fn audit_events(&self, query: &EventQuery) -> Vec<AuditRecord> {
        self.audit.get_events(query)
    }

    pub fn audit_statistics(&self) -> AuditStatistics {
        self.audit.get_statistics()
    }

    pub fn audit_root(&self) -> Hash {
        self.audit.get_root_hash()
    }

    pub fn audit_proof(&self, index: u64) -> KernelResult<InclusionProof> {
        Ok(self.audit.get_proof(index)?)
    }

    pub fn verify_audit_entry(&self, index: u64) -> KernelResult<bool> {
        Ok(self.audit.verify_entry(index)?)
    }

    /// Index of the first entry that no longer matches the root, if any.
    pub fn detect_tampering(&self) -> Option<u64> {
        self.audit.detect_tampering()
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn append(
        &self,
        event_type: AuditEventType,
        tenant_id: Option<&TenantId>,
        entry: BTreeMap<String, String>,
    ) {
        if let Err(e) = self.audit.append(event_type, tenant_id, entry) {
            error!(event_type = %event_type, error = %e, "Failed to append to audit log");
        }
        self.metrics.set_audit_entries(self.audit.len());
    }

    /// Audits a refused issuance or attenuation. Lineage violations are
    /// recorded as security violations.
    fn token_refused(
        &self,
        action: &str,
        tenant_id: &TenantId,
        requested: &CapabilitySet,
        parent: Option<&CapabilityToken>,
        error: &TokenError,
    ) {
        let mut entry = details([
            ("action", action.to_string()),
            ("reason", error.reason_code().to_string()),
            ("requested", requested.to_string()),
        ]);
        if let Some(parent) = parent {
            entry.insert("parent_token_id".to_string(), parent.token_id().to_string());
        }

        let event_type = if error.is_security_violation() {
            error!(tenant_id = %tenant_id, action, reason = error.reason_code(), "Token lineage violation");
            AuditEventType::SecurityViolation
        } else {
            warn!(tenant_id = %tenant_id, action, reason = error.reason_code(), "Token request refused");
            AuditEventType::CapabilityDenied
        };
        self.append(event_type, Some(tenant_id), entry);
    }

    fn pool_changed<T>(&self, result: AllocationResult<T>) -> KernelResult<T> {
        self.refresh_gauges();
        Ok(result?)
    }

    fn refresh_gauges(&self) {
        let stats = self.allocator.pool_statistics();
        self.metrics.set_pool(stats.allocated, stats.free);
        self.metrics.set_audit_entries(self.audit.len());
    }
}

fn token_details(token: &CapabilityToken) -> BTreeMap<String, String> {
    let mut entry = details([
        ("token_id", token.token_id().to_string()),
        ("capabilities", token.capabilities().to_string()),
        ("expires_at", token.expires_at().to_string()),
        ("delegation_depth", token.delegation_depth().to_string()),
    ]);
    if let Some(max_uses) = token.max_uses() {
        entry.insert("max_uses".to_string(), max_uses.to_string());
    }
    entry
}
