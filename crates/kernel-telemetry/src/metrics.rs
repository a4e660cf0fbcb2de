//! Prometheus metrics for the security kernel.
//!
//! All metrics follow the naming convention: `qk_<area>_<metric>[_total]`.
//! Each [`KernelMetrics`] owns its own registry, so several kernels (or
//! tests) in one process never collide on registration.

use prometheus::{
    core::Collector, Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

use crate::TelemetryError;

/// Kernel metric handles plus the registry they are registered in.
#[derive(Clone)]
pub struct KernelMetrics {
    registry: Registry,

    /// Mediation checks by outcome (allowed / denied)
    pub capability_checks: IntCounterVec,

    /// Denied checks by decision reason
    pub capability_denials: IntCounterVec,

    pub tokens_issued: IntCounter,

    pub tokens_revoked: IntCounter,

    /// Current audit log length
    pub audit_entries: IntGauge,

    pub qubits_allocated: IntGauge,

    pub qubits_free: IntGauge,

    /// Refused allocations by error kind
    pub allocation_failures: IntCounterVec,
}

impl KernelMetrics {
    /// Create and register every kernel metric.
    pub fn new() -> Result<Self, TelemetryError> {
        let registry = Registry::new();

        let capability_checks = IntCounterVec::new(
            Opts::new("qk_capability_checks_total", "Capability checks by outcome"),
            &["outcome"],
        )
        .map_err(metrics_err)?;
        let capability_denials = IntCounterVec::new(
            Opts::new("qk_capability_denials_total", "Capability denials by reason"),
            &["reason"],
        )
        .map_err(metrics_err)?;
        let tokens_issued = IntCounter::new(
            "qk_tokens_issued_total",
            "Capability tokens issued, including attenuated children",
        )
        .map_err(metrics_err)?;
        let tokens_revoked = IntCounter::new("qk_tokens_revoked_total", "Capability tokens revoked")
            .map_err(metrics_err)?;
        let audit_entries = IntGauge::new("qk_audit_entries", "Entries in the audit log")
            .map_err(metrics_err)?;
        let qubits_allocated = IntGauge::new("qk_qubits_allocated", "Qubits owned by a tenant")
            .map_err(metrics_err)?;
        let qubits_free =
            IntGauge::new("qk_qubits_free", "Qubits available for allocation").map_err(metrics_err)?;
        let allocation_failures = IntCounterVec::new(
            Opts::new("qk_allocation_failures_total", "Refused allocations by kind"),
            &["kind"],
        )
        .map_err(metrics_err)?;

        let collectors: Vec<Box<dyn Collector>> = vec![
            Box::new(capability_checks.clone()),
            Box::new(capability_denials.clone()),
            Box::new(tokens_issued.clone()),
            Box::new(tokens_revoked.clone()),
            Box::new(audit_entries.clone()),
            Box::new(qubits_allocated.clone()),
            Box::new(qubits_free.clone()),
            Box::new(allocation_failures.clone()),
        ];
        for collector in collectors {
            registry.register(collector).map_err(metrics_err)?;
        }

        Ok(Self {
            registry,
            capability_checks,
            capability_denials,
            tokens_issued,
            tokens_revoked,
            audit_entries,
            qubits_allocated,
            qubits_free,
            allocation_failures,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Count one mediation outcome. `reason` is only used for denials.
    pub fn record_check(&self, allowed: bool, reason: &str) {
        if allowed {
            self.capability_checks.with_label_values(&["allowed"]).inc();
        } else {
            self.capability_checks.with_label_values(&["denied"]).inc();
            self.capability_denials.with_label_values(&[reason]).inc();
        }
    }

    pub fn record_allocation_failure(&self, kind: &str) {
        self.allocation_failures.with_label_values(&[kind]).inc();
    }

    pub fn set_audit_entries(&self, entries: u64) {
        self.audit_entries.set(saturating_i64(entries));
    }

    pub fn set_pool(&self, allocated: u32, free: u32) {
        self.qubits_allocated.set(i64::from(allocated));
        self.qubits_free.set(i64::from(free));
    }

    /// Render every metric in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, TelemetryError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metrics_err)?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
    }
}

fn metrics_err(e: prometheus::Error) -> TelemetryError {
    TelemetryError::MetricsInit(e.to_string())
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
