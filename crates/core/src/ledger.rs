//! Ledger persistence.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tracing::warn;

use crate::models::Ledger;

/// Storage abstraction over the persisted reservation ledger.
///
/// The whole ledger is loaded and saved as one document. Read failures
/// must degrade to an empty ledger so a missing or corrupt document
/// never takes the service down.
pub trait LedgerStore: Send + Sync {
    /// The current ledger, or an empty one when nothing readable is persisted.
    fn load(&self) -> Ledger;

    /// Persist the full ledger, replacing prior state.
    fn save(&self, ledger: &Ledger) -> Result<()>;
}

/// File-backed store keeping the ledger in a single JSON document.
pub struct JsonLedgerStore {
    path: PathBuf,
}

impl JsonLedgerStore {
    /// Create a store persisting to the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the persisted document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_ledger(&self) -> Result<Option<Ledger>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let ledger = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        Ok(Some(ledger))
    }
}

impl LedgerStore for JsonLedgerStore {
    fn load(&self) -> Ledger {
        match self.read_ledger() {
            Ok(Some(ledger)) => ledger,
            Ok(None) => Ledger::empty(),
            Err(err) => {
                warn!("treating reservation document as empty: {err:#}");
                Ledger::empty()
            }
        }
    }

    fn save(&self, ledger: &Ledger) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let serialised =
            serde_json::to_vec_pretty(ledger).context("failed to serialise ledger")?;
        fs::write(&self.path, serialised)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

/// In-memory store used by tests and local tooling.
#[derive(Default)]
pub struct MemoryLedgerStore {
    ledger: Mutex<Ledger>,
}

impl MemoryLedgerStore {
    /// An empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with the given ledger.
    pub fn with_ledger(ledger: Ledger) -> Self {
        Self {
            ledger: Mutex::new(ledger),
        }
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn load(&self) -> Ledger {
        self.ledger.lock().clone()
    }

    fn save(&self, ledger: &Ledger) -> Result<()> {
        *self.ledger.lock() = ledger.clone();
        Ok(())
    }
}
