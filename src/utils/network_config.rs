//! Node RPC Configuration
//!
//! Connection settings for the Bitcoin Core wallet endpoint with:
//! - JSON file loading
//! - Environment variable overrides
//! - URL format validation
//! - Credential hygiene (never printed, never embedded in the URL)

use crate::error::{SignerError, SignerResult};
use bitcoin::Network;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const ENV_RPC_URL: &str = "WALLET_GUARD_RPC_URL";
pub const ENV_RPC_USER: &str = "WALLET_GUARD_RPC_USER";
pub const ENV_RPC_PASSWORD: &str = "WALLET_GUARD_RPC_PASSWORD";
pub const ENV_NETWORK: &str = "WALLET_GUARD_NETWORK";

/// Wallet RPC endpoint settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Full endpoint URL, including a `/wallet/<name>` path for multi-wallet nodes
    pub url: String,
    pub user: String,
    pub password: String,
    /// Network addresses handed to the node must belong to
    pub network: Network,
    /// Upper bound for a single RPC round trip
    pub timeout_secs: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:18332".to_string(),
            user: String::new(),
            password: String::new(),
            network: Network::Testnet,
            timeout_secs: 30,
        }
    }
}

// Manual impl so the password never reaches a log line or panic message
impl fmt::Debug for RpcConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcConfig")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("network", &self.network)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Validation result for an RPC endpoint
#[derive(Debug, Clone)]
pub struct EndpointValidation {
    pub is_valid: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl RpcConfig {
    /// Load settings from a JSON file; missing keys fall back to defaults
    pub fn from_file(path: impl AsRef<Path>) -> SignerResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SignerError::config_error(format!("Cannot read config {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> SignerResult<Self> {
        serde_json::from_str(raw)
            .map_err(|e| SignerError::config_error(format!("Invalid config: {}", e)))
    }

    /// Apply `WALLET_GUARD_*` environment overrides
    pub fn with_env_overrides(self) -> SignerResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (the process environment in production)
    pub fn with_overrides<F>(mut self, lookup: F) -> SignerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_RPC_URL) {
            self.url = url;
        }
        if let Some(user) = lookup(ENV_RPC_USER) {
            self.user = user;
        }
        if let Some(password) = lookup(ENV_RPC_PASSWORD) {
            self.password = password;
        }
        if let Some(network) = lookup(ENV_NETWORK) {
            self.network = network.parse::<Network>().map_err(|e| {
                SignerError::config_error(format!("Invalid {}: {}", ENV_NETWORK, e))
            })?;
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the endpoint URL and connection settings
    pub fn validate(&self) -> EndpointValidation {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        let parsed = match Url::parse(&self.url) {
            Ok(u) => u,
            Err(e) => {
                errors.push(format!("Invalid URL format: {}", e));
                return EndpointValidation {
                    is_valid: false,
                    warnings,
                    errors,
                };
            }
        };

        match parsed.scheme() {
            "https" => {}
            "http" => {
                // Core ships without TLS, so plain http is normal on a local node
                if !is_local_host(&parsed) {
                    warnings.push(
                        "Plain HTTP to a remote node sends RPC credentials in the clear".to_string(),
                    );
                }
            }
            other => errors.push(format!("Unsupported URL scheme: {}", other)),
        }

        if parsed.host_str().map(str::is_empty).unwrap_or(true) {
            errors.push("URL has no host".to_string());
        }

        if !parsed.username().is_empty() || parsed.password().is_some() {
            errors.push("Credentials in URL - set user and password separately".to_string());
        }

        if self.user.is_empty() || self.password.is_empty() {
            warnings.push("No RPC credentials configured".to_string());
        }

        if self.timeout_secs == 0 {
            errors.push("timeout_secs must be greater than zero".to_string());
        }

        EndpointValidation {
            is_valid: errors.is_empty(),
            warnings,
            errors,
        }
    }

    /// Validate and fail on the first error
    pub fn ensure_valid(&self) -> SignerResult<EndpointValidation> {
        let validation = self.validate();
        if !validation.is_valid {
            return Err(SignerError::config_error(validation.errors.join("; ")));
        }
        Ok(validation)
    }
}

fn is_local_host(url: &Url) -> bool {
    match url.host() {
        Some(url::Host::Domain(d)) => d == "localhost",
        Some(url::Host::Ipv4(ip)) => ip.is_loopback() || ip.is_private(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}
