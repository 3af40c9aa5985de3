//! Key/value stores for checkpointing scoring state.
//!
//! Each scoring function owns the format of what it stores. Keys are
//! `/`-joined identity paths such as `combiner/network/last_result`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::Result;

/// Opaque checkpoint storage.
pub trait CheckpointStore {
    fn put(&mut self, key: &str, value: Value);

    fn get(&self, key: &str) -> Option<&Value>;

    /// All stored keys, sorted.
    fn keys(&self) -> Vec<String>;
}

/// Join an identity path.
pub fn scoped_key(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{scope}/{name}")
    }
}

// ── In-memory Store ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointStore {
    entries: BTreeMap<String, Value>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn put(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

// ── JSON File Store ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointDocument {
    saved_at: DateTime<Utc>,
    /// Iteration the snapshot was taken after, if the driver recorded one
    #[serde(default)]
    iteration: Option<u32>,
    entries: BTreeMap<String, Value>,
}

/// Store persisted as a single JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileCheckpointStore {
    path: PathBuf,
    iteration: Option<u32>,
    saved_at: Option<DateTime<Utc>>,
    entries: BTreeMap<String, Value>,
}

impl JsonFileCheckpointStore {
    /// Open the store at `path`. A missing file yields an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Ok(Self {
                path,
                iteration: None,
                saved_at: None,
                entries: BTreeMap::new(),
            });
        }
        let content = std::fs::read_to_string(&path)?;
        let doc: CheckpointDocument = serde_json::from_str(&content)?;
        info!(
            "Loaded checkpoint {:?} ({} keys, saved {})",
            path,
            doc.entries.len(),
            doc.saved_at
        );
        Ok(Self {
            path,
            iteration: doc.iteration,
            saved_at: Some(doc.saved_at),
            entries: doc.entries,
        })
    }

    /// Write the current entries to disk.
    pub fn save(&mut self) -> Result<()> {
        let saved_at = Utc::now();
        let doc = CheckpointDocument {
            saved_at,
            iteration: self.iteration,
            entries: self.entries.clone(),
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&doc)?)?;
        self.saved_at = Some(saved_at);
        info!("Saved checkpoint {:?} ({} keys)", self.path, self.entries.len());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn iteration(&self) -> Option<u32> {
        self.iteration
    }

    pub fn set_iteration(&mut self, iteration: u32) {
        self.iteration = Some(iteration);
    }

    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.saved_at
    }
}

impl CheckpointStore for JsonFileCheckpointStore {
    fn put(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}
