//! # Configuration
//!
//! Configuration for the ledger adapter, cache and server.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SPLITWISE_ACCESS_TOKEN=...                                         │
//! │     BILLSPLIT_CACHE_BACKEND=json                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/billsplit/billsplit.toml (Linux)                         │
//! │     ~/Library/Application Support/com.billsplit.billsplit/... (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │                                                                         │
//! │  Then: access token file, if no token was set above                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # billsplit.toml
//! [ledger]
//! api_base = "https://secure.splitwise.com/api/v3.0"
//! access_token_file = "splitwise_access_token.txt"
//! timeout_secs = 30
//! supports_itemized_shares = true
//!
//! [cache]
//! backend = "sqlite"   # sqlite | json
//! path = "billsplit_cache.db"
//!
//! [reconcile]
//! strict_member_resolution = true
//!
//! [server]
//! bind_addr = "0.0.0.0"
//! port = 8000
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use billsplit_core::{LedgerCapabilities, MemberPolicy};

use crate::error::{LedgerError, LedgerResult};
use crate::splitwise::DEFAULT_API_BASE;

// =============================================================================
// Ledger Settings
// =============================================================================

/// Splitwise connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// API root, without trailing slash.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// OAuth bearer token. Usually supplied by env or the token file.
    #[serde(default)]
    pub access_token: Option<String>,

    /// File the OAuth helper writes the token into.
    #[serde(default = "default_token_file")]
    pub access_token_file: PathBuf,

    /// HTTP request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Whether expenses may carry per-member shares.
    #[serde(default = "default_true")]
    pub supports_itemized_shares: bool,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_token_file() -> PathBuf {
    PathBuf::from("splitwise_access_token.txt")
}

fn default_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for LedgerSettings {
    fn default() -> Self {
        LedgerSettings {
            api_base: default_api_base(),
            access_token: None,
            access_token_file: default_token_file(),
            timeout_secs: default_timeout(),
            supports_itemized_shares: true,
        }
    }
}

impl LedgerSettings {
    pub fn capabilities(&self) -> LedgerCapabilities {
        LedgerCapabilities {
            supports_itemized_shares: self.supports_itemized_shares,
        }
    }
}

// =============================================================================
// Cache Settings
// =============================================================================

/// Where the group-id cache is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    /// `group_cache` table in a SQLite file.
    #[default]
    Sqlite,

    /// Flat JSON object file.
    Json,
}

impl std::fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackend::Sqlite => write!(f, "sqlite"),
            CacheBackend::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for CacheBackend {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" | "db" => Ok(CacheBackend::Sqlite),
            "json" | "file" => Ok(CacheBackend::Json),
            other => Err(LedgerError::Config(format!(
                "Unknown cache backend: '{}'. Valid options: sqlite, json",
                other
            ))),
        }
    }
}

/// Group-id cache settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default)]
    pub backend: CacheBackend,

    /// Cache file. Defaults per backend when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl CacheSettings {
    /// The configured path, or the backend's default file name.
    pub fn resolved_path(&self) -> PathBuf {
        match (&self.path, self.backend) {
            (Some(path), _) => path.clone(),
            (None, CacheBackend::Sqlite) => PathBuf::from("billsplit_cache.db"),
            (None, CacheBackend::Json) => PathBuf::from("group_cache.json"),
        }
    }
}

// =============================================================================
// Reconcile Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileSettings {
    /// Fail when a person on the bill matches no group member.
    /// Off: book their share against member id 0.
    #[serde(default = "default_true")]
    pub strict_member_resolution: bool,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        ReconcileSettings {
            strict_member_resolution: true,
        }
    }
}

impl ReconcileSettings {
    pub fn member_policy(&self) -> MemberPolicy {
        if self.strict_member_resolution {
            MemberPolicy::Strict
        } else {
            MemberPolicy::Sentinel
        }
    }
}

// =============================================================================
// Server Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete billsplit configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub ledger: LedgerSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub reconcile: ReconcileSettings,

    #[serde(default)]
    pub server: ServerSettings,
}

impl LedgerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (billsplit.toml)
    /// 3. Environment variables
    /// 4. Token file, if still no token
    pub fn load(config_path: Option<PathBuf>) -> LedgerResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| LedgerError::Config(format!("{}: {e}", path.display())))?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.load_token_file();
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document; missing sections take their defaults.
    pub fn from_toml(contents: &str) -> LedgerResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> LedgerResult<()> {
        match self.ledger.access_token.as_deref() {
            Some(token) if !token.trim().is_empty() => {}
            _ => {
                return Err(LedgerError::Config(format!(
                    "Splitwise access token not found. Set SPLITWISE_ACCESS_TOKEN or write it to {}",
                    self.ledger.access_token_file.display()
                )))
            }
        }

        let base = url::Url::parse(&self.ledger.api_base)?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(LedgerError::Config(format!(
                "api_base must start with http:// or https://, got: {}",
                self.ledger.api_base
            )));
        }

        if self.ledger.timeout_secs == 0 {
            return Err(LedgerError::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies overrides from an environment lookup.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(base) = var("BILLSPLIT_API_BASE") {
            debug!(api_base = %base, "Overriding API base from environment");
            self.ledger.api_base = base;
        }

        if let Some(token) = var("SPLITWISE_ACCESS_TOKEN") {
            debug!("Using access token from environment");
            self.ledger.access_token = Some(token);
        }

        if let Some(file) = var("BILLSPLIT_TOKEN_FILE") {
            self.ledger.access_token_file = PathBuf::from(file);
        }

        if let Some(backend) = var("BILLSPLIT_CACHE_BACKEND") {
            match backend.parse() {
                Ok(parsed) => self.cache.backend = parsed,
                Err(e) => warn!(backend = %backend, error = %e, "Ignoring cache backend from environment"),
            }
        }

        if let Some(path) = var("BILLSPLIT_CACHE_PATH") {
            self.cache.path = Some(PathBuf::from(path));
        }

        if let Some(strict) = var("BILLSPLIT_STRICT_MEMBERS") {
            match strict.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.reconcile.strict_member_resolution = true,
                "0" | "false" | "no" | "off" => self.reconcile.strict_member_resolution = false,
                _ => warn!(value = %strict, "Unknown BILLSPLIT_STRICT_MEMBERS value"),
            }
        }

        if let Some(port) = var("BILLSPLIT_PORT") {
            if let Ok(p) = port.parse::<u16>() {
                debug!(port = p, "Overriding server port from environment");
                self.server.port = p;
            }
        }
    }

    /// Reads the token file when no token was configured.
    fn load_token_file(&mut self) {
        let has_token = self
            .ledger
            .access_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        if has_token {
            return;
        }

        let path = &self.ledger.access_token_file;
        match std::fs::read_to_string(path) {
            Ok(token) => {
                info!(?path, "Loaded access token from file");
                self.ledger.access_token = Some(token.trim().to_string());
            }
            Err(e) => debug!(?path, error = %e, "No access token file"),
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "billsplit", "billsplit")
            .map(|dirs| dirs.config_dir().join("billsplit.toml"))
    }
}
