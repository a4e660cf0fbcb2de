//! [`TokenAuthority`] over the qk-01 token manager.

use qk_01_capability_tokens::{CapabilityToken, CapabilityTokenApi, TokenManager, TokenResult};

use crate::ports::TokenAuthority;

impl TokenAuthority for TokenManager {
    fn check(&self, token: &CapabilityToken) -> TokenResult<()> {
        CapabilityTokenApi::check(self, token)
    }

    fn consume(&self, token: &CapabilityToken) -> TokenResult<u32> {
        self.increment_use_count(token)
    }
}
