//! # Kernel Configuration
//!
//! Unified configuration for all four subsystems plus the signing key.
//!
//! ## Sources
//!
//! - `KernelConfig::default()`
//! - [`KernelConfig::from_env`] (`QK_*` variables over the defaults)
//! - [`KernelConfig::from_toml_str`] / [`KernelConfig::load`] with sections
//!   `[tokens]`, `[mediator]`, `[audit]`, `[allocator]`, `[security]`
//!
//! ## Security Requirements
//!
//! - `security.signing_key` MUST be set and non-zero in production
//! - The key is never printed; `Debug` redacts it

use qk_01_capability_tokens::TokenConfig;
use qk_02_audit_log::{AuditConfig, PaddingStrategy};
use qk_03_capability_mediator::MediatorConfig;
use qk_04_qubit_allocator::AllocatorConfig;
use serde::{Deserialize, Serialize};
use shared_types::KEY_LEN;
use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Complete kernel configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    pub tokens: TokenConfig,
    pub mediator: MediatorConfig,
    pub audit: AuditConfig,
    pub allocator: AllocatorConfig,
    pub security: SecurityConfig,
}

/// Key material. Wiped from memory on drop.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(default)]
pub struct SecurityConfig {
    /// Token signing key, hex encoded in TOML. `None` makes the kernel
    /// generate an ephemeral key, which is refused in production.
    #[serde(with = "hex_key", skip_serializing_if = "Option::is_none")]
    pub signing_key: Option<[u8; KEY_LEN]>,
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("signing_key", &self.signing_key.map(|_| "<redacted>"))
            .finish()
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error(
        "SECURITY VIOLATION: signing key is missing or all zeros. \
         Set QK_SIGNING_KEY or [security] signing_key."
    )]
    InsecureSigningKey,

    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Failed to read configuration file: {0}")]
    Io(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl KernelConfig {
    /// Defaults overridden by environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QK_SIGNING_KEY`: 64 hex characters
    /// - `QK_STRICT_MODE`: deny unmapped operations (default: true)
    /// - `QK_POOL_SIZE`: physical qubits (default: 64)
    /// - `QK_DEFAULT_QUOTA`: per-tenant qubit quota (default: 8)
    /// - `QK_TOKEN_TTL_SECS`: default token lifetime (default: 3600)
    /// - `QK_MAX_DELEGATION_DEPTH`: delegation bound (default: 8)
    /// - `QK_MERKLE_PADDING`: `duplicate_last` or `sentinel`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`KernelConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(encoded) = lookup("QK_SIGNING_KEY").map(Zeroizing::new) {
            config.security.signing_key = Some(parse_key(&encoded)?);
        }
        if let Some(v) = lookup("QK_STRICT_MODE") {
            config.mediator.strict_mode = parse_bool("QK_STRICT_MODE", &v)?;
        }
        if let Some(v) = lookup("QK_POOL_SIZE") {
            config.allocator.pool_size = parse_number("QK_POOL_SIZE", &v)?;
        }
        if let Some(v) = lookup("QK_DEFAULT_QUOTA") {
            config.allocator.default_max_qubits = parse_number("QK_DEFAULT_QUOTA", &v)?;
        }
        if let Some(v) = lookup("QK_TOKEN_TTL_SECS") {
            config.tokens.default_ttl_secs = parse_number("QK_TOKEN_TTL_SECS", &v)?;
        }
        if let Some(v) = lookup("QK_MAX_DELEGATION_DEPTH") {
            config.tokens.max_delegation_depth = parse_number("QK_MAX_DELEGATION_DEPTH", &v)?;
        }
        if let Some(v) = lookup("QK_MERKLE_PADDING") {
            config.audit.padding = PaddingStrategy::from_str(&v).map_err(ConfigError::Parse)?;
        }

        Ok(config)
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Structural checks every kernel runs at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allocator.pool_size == 0 {
            return Err(ConfigError::Invalid(
                "allocator.pool_size must be positive".to_string(),
            ));
        }
        if self.tokens.max_delegation_depth == 0 {
            return Err(ConfigError::Invalid(
                "tokens.max_delegation_depth must be positive".to_string(),
            ));
        }
        if self.tokens.default_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "tokens.default_ttl_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// [`KernelConfig::validate`] plus key checks.
    ///
    /// # Returns
    ///
    /// Returns `Err` if:
    /// - the signing key is absent
    /// - the signing key is the all-zero value
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        self.validate()?;
        match self.security.signing_key {
            Some(key) if key != [0u8; KEY_LEN] => Ok(()),
            _ => Err(ConfigError::InsecureSigningKey),
        }
    }
}

fn parse_key(encoded: &str) -> Result<[u8; KEY_LEN], ConfigError> {
    let decoded = Zeroizing::new(
        hex::decode(encoded.trim()).map_err(|e| ConfigError::InvalidKey(e.to_string()))?,
    );
    decoded.as_slice().try_into().map_err(|_| {
        ConfigError::InvalidKey(format!("expected {} bytes, got {}", KEY_LEN, decoded.len()))
    })
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Parse(format!("{}: not a boolean: '{}'", name, other))),
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Parse(format!("{}: not a number: '{}'", name, value)))
}

mod hex_key {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use shared_types::KEY_LEN;
    use zeroize::Zeroizing;

    pub fn serialize<S>(key: &Option<[u8; KEY_LEN]>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match key {
            Some(bytes) => serializer.serialize_some(&hex::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<[u8; KEY_LEN]>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded: Option<Zeroizing<String>> =
            Option::<String>::deserialize(deserializer)?.map(Zeroizing::new);
        encoded
            .map(|s| super::parse_key(&s).map_err(D::Error::custom))
            .transpose()
    }
}
