//! # edl-cli — CLI Tool for edu-ledger
//!
//! Provides the `edl` command-line interface for operators and tests. Every
//! command loads a ledger snapshot file, runs one registry operation, and
//! writes the snapshot back if the ledger advanced.
//!
//! ## Subcommands
//!
//! - `edl hash`: SHA-256 content hash of a certificate document.
//! - `edl certificate`: Issue, show, verify, revoke, list, history.
//! - `edl consent`: Grant, show, access, disclose, revoke, list, query, history.
//!
//! ## Identity
//!
//! The caller identity comes from `--org`/`--principal` (or `EDL_ORG` and
//! `EDL_PRINCIPAL`), standing in for the membership layer:
//!
//! ```bash
//! export EDL_LEDGER=ledger.json EDL_ORG=Org1MSP EDL_PRINCIPAL=did:example:uni
//! edl certificate issue --id CERT-1 --subject did:example:alice \
//!     --issuer did:example:uni --document diploma.pdf --field degree=BSc
//! ```

pub mod certificate;
pub mod consent;
pub mod hash;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use edl_contract::{CallerIdentity, ContractConfig, ContractError, Registry};
use edl_core::{Clock, SystemClock};
use edl_store::MemoryLedger;

/// Everything a command needs: where the ledger lives, who is calling,
/// and under which contract policy.
#[derive(Debug, Clone)]
pub struct Session {
    pub ledger_path: PathBuf,
    pub caller: CallerIdentity,
    pub config: ContractConfig,
    clock: Arc<dyn Clock>,
}

impl Session {
    pub fn new(ledger_path: impl Into<PathBuf>, caller: CallerIdentity, config: ContractConfig) -> Self {
        Self {
            ledger_path: ledger_path.into(),
            caller,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock transactions are stamped with.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Load the ledger snapshot, or an empty ledger if the file is absent.
    pub fn load_ledger(&self) -> Result<MemoryLedger> {
        if !self.ledger_path.exists() {
            tracing::debug!(path = %self.ledger_path.display(), "no ledger snapshot, starting empty");
            return Ok(MemoryLedger::new(self.clock.clone()));
        }
        let json = std::fs::read_to_string(&self.ledger_path)
            .with_context(|| format!("failed to read ledger {}", self.ledger_path.display()))?;
        MemoryLedger::from_snapshot(&json, self.clock.clone())
            .with_context(|| format!("failed to load ledger {}", self.ledger_path.display()))
    }

    /// Run `op` against a registry over the ledger file.
    ///
    /// The snapshot is rewritten whenever the ledger height moved, including
    /// for operations that failed after committing (lazy consent expiry).
    pub fn with_registry<T>(
        &self,
        op: impl FnOnce(&Registry<MemoryLedger>, &CallerIdentity) -> Result<T, ContractError>,
    ) -> Result<T> {
        let ledger = self.load_ledger()?;
        let height = ledger.height();
        let registry = Registry::new(ledger, self.config.clone());

        let outcome = op(&registry, &self.caller);

        if registry.ledger().height() != height {
            write_snapshot(&self.ledger_path, registry.ledger())?;
        }
        outcome.map_err(|err| anyhow::anyhow!("{}: {err}", err.kind()))
    }
}

fn write_snapshot(path: &Path, ledger: &MemoryLedger) -> Result<()> {
    let json = ledger.snapshot()?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("failed to replace {}", path.display()))?;
    tracing::debug!(path = %path.display(), height = ledger.height(), "ledger snapshot written");
    Ok(())
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
