//! # Configuration
//!
//! Registrar and resolver endpoints, the target network, and the limits applied
//! to registrar jobs. Configuration is passed to [`crate::DidManager`] at
//! construction rather than read from process-wide defaults.

use std::time::Duration;

use url::Url;

use crate::{Error, Result};

/// Default base URL of the DID registrar.
pub const DEFAULT_REGISTRAR_URL: &str = "http://localhost:3000/1.0/";

/// Default base URL of the DID resolver.
pub const DEFAULT_RESOLVER_URL: &str = "http://localhost:8080/1.0/identifiers/";

/// Verification method type requested when generating draft DID documents.
pub const DEFAULT_VERIFICATION_METHOD: &str = "Ed25519VerificationKey2020";

/// Default network DIDs are created on.
pub const DEFAULT_NETWORK: &str = "testnet";

/// Default maximum number of signing rounds per registrar job.
pub const DEFAULT_MAX_ROUNDS: usize = 10;

/// Configuration for registrar jobs.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the DID registrar.
    pub registrar_url: String,

    /// Base URL of the DID resolver.
    pub resolver_url: String,

    /// Network (`testnet` or `mainnet`) new DIDs are created on.
    pub network: String,

    /// Verification method type of generated DID documents.
    pub verification_method: String,

    /// Maximum number of `action` rounds before a job is abandoned.
    pub max_rounds: usize,

    /// Allow DID keys to be derived from a caller-supplied seed.
    pub allow_insecure_seed: bool,

    /// Timeout applied to each HTTP round-trip.
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registrar_url: DEFAULT_REGISTRAR_URL.to_string(),
            resolver_url: DEFAULT_RESOLVER_URL.to_string(),
            network: DEFAULT_NETWORK.to_string(),
            verification_method: DEFAULT_VERIFICATION_METHOD.to_string(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            allow_insecure_seed: false,
            timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Create a configuration using default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables, falling back to defaults.
    ///
    /// Variables:
    /// - `CHEQD_REGISTRAR_URL` (default: `http://localhost:3000/1.0/`)
    /// - `CHEQD_RESOLVER_URL` (default: `http://localhost:8080/1.0/identifiers/`)
    /// - `CHEQD_NETWORK` (default: `testnet`)
    /// - `CHEQD_MAX_ROUNDS` (default: 10)
    /// - `CHEQD_ALLOW_INSECURE_SEED` (default: false)
    /// - `CHEQD_TIMEOUT_SECS` (default: 30)
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to a value that cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("CHEQD_REGISTRAR_URL") {
            config.registrar_url = url;
        }
        if let Ok(url) = std::env::var("CHEQD_RESOLVER_URL") {
            config.resolver_url = url;
        }
        if let Ok(network) = std::env::var("CHEQD_NETWORK") {
            config.network = network;
        }
        if let Ok(rounds) = std::env::var("CHEQD_MAX_ROUNDS") {
            config.max_rounds = rounds
                .parse()
                .map_err(|e| Error::Config(format!("CHEQD_MAX_ROUNDS: {e}")))?;
        }
        if let Ok(allow) = std::env::var("CHEQD_ALLOW_INSECURE_SEED") {
            config.allow_insecure_seed = allow
                .parse()
                .map_err(|e| Error::Config(format!("CHEQD_ALLOW_INSECURE_SEED: {e}")))?;
        }
        if let Ok(secs) = std::env::var("CHEQD_TIMEOUT_SECS") {
            let secs = secs.parse().map_err(|e| Error::Config(format!("CHEQD_TIMEOUT_SECS: {e}")))?;
            config.timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the registrar base URL.
    #[must_use]
    pub fn registrar_url(mut self, url: impl Into<String>) -> Self {
        self.registrar_url = url.into();
        self
    }

    /// Set the resolver base URL.
    #[must_use]
    pub fn resolver_url(mut self, url: impl Into<String>) -> Self {
        self.resolver_url = url.into();
        self
    }

    /// Set the network new DIDs are created on.
    #[must_use]
    pub fn network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }

    /// Set the maximum number of signing rounds per job.
    #[must_use]
    pub const fn max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Allow DID keys to be derived from a caller-supplied seed.
    #[must_use]
    pub const fn allow_insecure_seed(mut self, allow: bool) -> Self {
        self.allow_insecure_seed = allow;
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check URLs parse and limits are usable.
    ///
    /// # Errors
    ///
    /// Returns an error if either base URL is invalid or `max_rounds` is zero.
    pub fn validate(&self) -> Result<()> {
        base_url(&self.registrar_url)?;
        base_url(&self.resolver_url)?;
        if self.max_rounds == 0 {
            return Err(Error::Config("max_rounds must be greater than zero".to_string()));
        }
        Ok(())
    }
}

// Parse a base URL, ensuring a trailing slash so relative endpoints join beneath it.
pub(crate) fn base_url(url: &str) -> Result<Url> {
    let url = if url.ends_with('/') { url.to_string() } else { format!("{url}/") };
    Url::parse(&url).map_err(|e| Error::Config(format!("invalid base URL {url}: {e}")))
}
