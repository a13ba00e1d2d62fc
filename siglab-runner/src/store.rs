//! Snapshot persistence for the live job.
//!
//! The job reads one snapshot (signals plus allocation window) at the start
//! of a run and writes one back at the end. A failed write aborts the run.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use siglab_core::domain::{AllocationWindow, Signal};

/// Current snapshot schema version.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("unsupported snapshot schema version {found} (max supported: {max})")]
    UnsupportedSchema { found: u32, max: u32 },
}

/// Everything the live job persists between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_version: u32,
    #[serde(default)]
    pub signals: Vec<Signal>,
    #[serde(default)]
    pub window: Option<AllocationWindow>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            signals: Vec::new(),
            window: None,
        }
    }
}

impl Snapshot {
    /// Append signals whose ids are not present yet. Returns how many were
    /// added.
    pub fn merge_signals(&mut self, incoming: impl IntoIterator<Item = Signal>) -> usize {
        let mut added = 0;
        for signal in incoming {
            if self.signals.iter().any(|s| s.id == signal.id) {
                debug!(id = %signal.id, "signal already stored");
                continue;
            }
            self.signals.push(signal);
            added += 1;
        }
        added
    }
}

/// Bulk load/save of the live job's state.
pub trait SignalStore {
    fn load(&self) -> Result<Snapshot, StoreError>;
    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

/// Pretty JSON file, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SignalStore for JsonFileStore {
    /// A missing file is an empty snapshot.
    fn load(&self) -> Result<Snapshot, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "no snapshot yet");
                return Ok(Snapshot::default());
            }
            Err(e) => return Err(self.io_error(e)),
        };
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        if snapshot.schema_version > SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchema {
                found: snapshot.schema_version,
                max: SCHEMA_VERSION,
            });
        }
        Ok(snapshot)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(snapshot)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        info!(path = ?self.path, signals = snapshot.signals.len(), "snapshot saved");
        Ok(())
    }
}

/// In-process store, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Snapshot>,
}

impl MemoryStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }

    pub fn current(&self) -> Snapshot {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SignalStore for MemoryStore {
    fn load(&self) -> Result<Snapshot, StoreError> {
        Ok(self.current())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = snapshot.clone();
        Ok(())
    }
}
