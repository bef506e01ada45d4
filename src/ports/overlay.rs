//! The locally persisted overlay of created users.
//!
//! Storage is a key/value slot holding whole JSON documents, read and written
//! in one piece. [`OverlayStore`] layers the overlay semantics on top: a fixed
//! key, fail-soft reads and a storage-change signal on every write.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::domain::OverlayEntry;
use crate::error::StorageError;
use crate::sync::{ContextId, ContextSignal, SignalBus};

/// Storage key of the overlay document.
pub const OVERLAY_KEY: &str = "createdUsers";

/// A persisted key/value slot shared by every context on the same storage.
pub trait StorageSlot: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Process-local slot. Clones share the same values.
#[derive(Clone, Default)]
pub struct MemorySlot {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageSlot for MemorySlot {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().map_err(|_| StorageError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key under `dir`.
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

fn io_error(key: &str, source: io::Error) -> StorageError {
    StorageError::Io {
        key: key.to_string(),
        source,
    }
}

impl StorageSlot for FileSlot {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, e)),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|e| io_error(key, e))?;
        // Write-then-rename so readers never see half a document.
        let target = self.path(key);
        let staging = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&staging, value).map_err(|e| io_error(key, e))?;
        fs::rename(&staging, &target).map_err(|e| io_error(key, e))
    }
}

/// Whole-collection access to the overlay.
pub trait OverlayRepository: Send + Sync {
    fn key(&self) -> &str;

    /// Every readable entry. Fails only when the document as a whole is
    /// unusable.
    fn try_load(&self) -> Result<Vec<OverlayEntry>, StorageError>;

    /// Never fails: unreadable or corrupt content reads as an empty overlay.
    fn load(&self) -> Vec<OverlayEntry> {
        match self.try_load() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(key = self.key(), error = %e, "Overlay unreadable, treating it as empty");
                Vec::new()
            }
        }
    }

    fn save(&self, entries: &[OverlayEntry]) -> Result<(), StorageError>;

    /// Adds `entry`. Refuses to write while the stored document is corrupt.
    fn append(&self, entry: OverlayEntry) -> Result<(), StorageError>;

    /// Removes the entry with `id`. Returns `false`, without writing, when no
    /// such entry exists. Refuses to write while the stored document is
    /// corrupt.
    fn remove(&self, id: i64) -> Result<bool, StorageError>;
}

/// Overlay kept as a JSON array in a [`StorageSlot`].
pub struct OverlayStore {
    slot: Arc<dyn StorageSlot>,
    context: ContextId,
    bus: Option<SignalBus>,
}

impl OverlayStore {
    pub fn new(slot: Arc<dyn StorageSlot>, context: ContextId) -> Self {
        Self {
            slot,
            context,
            bus: None,
        }
    }

    /// Announce every write on `bus` so other contexts can reload.
    pub fn with_bus(mut self, bus: SignalBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// The stored array as raw JSON values, unreadable rows included.
    fn load_document(&self) -> Result<Vec<Value>, StorageError> {
        let raw = self.slot.read(OVERLAY_KEY)?;
        decode_document(raw.as_deref())
    }

    fn write_document(&self, document: &[Value]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(document)?;
        self.slot.write(OVERLAY_KEY, &raw)?;
        debug!(entry_count = document.len(), "Overlay saved");

        if let Some(bus) = &self.bus {
            bus.publish(ContextSignal::StorageChanged {
                key: OVERLAY_KEY.to_string(),
                source: self.context,
            });
        }
        Ok(())
    }
}

impl OverlayRepository for OverlayStore {
    fn key(&self) -> &str {
        OVERLAY_KEY
    }

    fn try_load(&self) -> Result<Vec<OverlayEntry>, StorageError> {
        Ok(self.load_document()?.into_iter().filter_map(decode_entry).collect())
    }

    #[instrument(skip(self, entries), fields(context = %self.context))]
    fn save(&self, entries: &[OverlayEntry]) -> Result<(), StorageError> {
        let document = entries
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        self.write_document(&document)
    }

    // Rows this build cannot read are carried over untouched.
    #[instrument(skip(self, entry), fields(context = %self.context, user_id = entry.id))]
    fn append(&self, entry: OverlayEntry) -> Result<(), StorageError> {
        let mut document = self.load_document()?;
        document.push(serde_json::to_value(entry)?);
        self.write_document(&document)
    }

    #[instrument(skip(self), fields(context = %self.context))]
    fn remove(&self, id: i64) -> Result<bool, StorageError> {
        let mut document = self.load_document()?;
        let before = document.len();
        document.retain(|value| entry_id(value) != Some(id));
        if document.len() == before {
            return Ok(false);
        }
        self.write_document(&document)?;
        Ok(true)
    }
}

fn decode_document(raw: Option<&str>) -> Result<Vec<Value>, StorageError> {
    match raw {
        None => Ok(Vec::new()),
        Some(raw) if raw.trim().is_empty() => Ok(Vec::new()),
        Some(raw) => serde_json::from_str(raw).map_err(|e| StorageError::Corrupt {
            key: OVERLAY_KEY.to_string(),
            message: e.to_string(),
        }),
    }
}

fn decode_entry(value: Value) -> Option<OverlayEntry> {
    match serde_json::from_value(value) {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!(key = OVERLAY_KEY, error = %e, "Skipping unreadable overlay entry");
            None
        }
    }
}

fn entry_id(value: &Value) -> Option<i64> {
    serde_json::from_value::<OverlayEntry>(value.clone())
        .ok()
        .map(|entry| entry.id)
}

/// Convenience for directories holding a [`FileSlot`].
pub fn file_slot(dir: &Path) -> Arc<dyn StorageSlot> {
    Arc::new(FileSlot::new(dir))
}
