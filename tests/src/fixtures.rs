//! Shared fixtures: isolated kernels on a manual clock.

use kernel_runtime::{KernelConfig, SecurityKernel};
use qk_01_capability_tokens::{Capability, CapabilitySet, CapabilityToken, TokenRequest};
use shared_types::ManualTimeSource;
use std::sync::Arc;

pub const TEST_KEY: [u8; 32] = [0x42; 32];
pub const START_TIME: u64 = 1_700_000_000;

/// Kernel with a fixed key, a manual clock and the given pool shape.
pub fn kernel(pool_size: u32, quota: u32) -> (SecurityKernel, Arc<ManualTimeSource>) {
    let clock = ManualTimeSource::new_shared(START_TIME);
    let mut config = KernelConfig::default();
    config.security.signing_key = Some(TEST_KEY);
    config.allocator.pool_size = pool_size;
    config.allocator.default_max_qubits = quota;
    let kernel = SecurityKernel::with_time_source(config, clock.clone()).unwrap();
    (kernel, clock)
}

pub fn token(
    kernel: &SecurityKernel,
    tenant: &str,
    caps: &[Capability],
    max_uses: Option<u32>,
) -> CapabilityToken {
    let mut request = TokenRequest::new(caps.iter().copied().collect::<CapabilitySet>(), tenant);
    request.max_uses = max_uses;
    kernel.issue_token(request, None).unwrap()
}
