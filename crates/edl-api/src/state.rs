//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor. The registry owns the ledger; handlers never
//! touch the ledger directly.

use std::path::PathBuf;
use std::sync::Arc;

use edl_contract::{ContractConfig, Registry};
use edl_core::Clock;
use edl_store::MemoryLedger;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Contract policy (issuer organization, hardened consent mode).
    pub contract: ContractConfig,
    /// JSON ledger snapshot loaded at startup and written back on shutdown.
    pub ledger_snapshot: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            contract: ContractConfig::default(),
            ledger_snapshot: None,
            log_format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Build configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Unset or unparseable values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);
        let issuer_org = lookup("ISSUER_ORG")
            .filter(|org| !org.trim().is_empty())
            .unwrap_or(defaults.contract.issuer_org);
        let enforce_subject_identity = lookup("ENFORCE_SUBJECT_IDENTITY")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.contract.enforce_subject_identity);
        let max_consent_days = lookup("MAX_CONSENT_DAYS")
            .and_then(|d| d.parse().ok())
            .filter(|d: &i64| *d > 0)
            .unwrap_or(defaults.contract.max_consent_days);
        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Self {
            port,
            contract: ContractConfig {
                issuer_org,
                enforce_subject_identity,
                max_consent_days,
            },
            ledger_snapshot: lookup("LEDGER_SNAPSHOT").map(PathBuf::from),
            log_format,
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry<MemoryLedger>>,
    pub config: AppConfig,
}

impl AppState {
    /// State over an empty ledger on the system clock.
    pub fn new(config: AppConfig) -> Self {
        Self::with_ledger(config, MemoryLedger::default())
    }

    /// State over an existing ledger.
    pub fn with_ledger(config: AppConfig, ledger: MemoryLedger) -> Self {
        let registry = Registry::new(ledger, config.contract.clone());
        Self {
            registry: Arc::new(registry),
            config,
        }
    }

    /// State over an empty ledger driven by `clock`.
    pub fn with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_ledger(config, MemoryLedger::new(clock))
    }

    pub fn ledger(&self) -> &MemoryLedger {
        self.registry.ledger()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
