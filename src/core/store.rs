//! Durable storage for the conversation log.
//!
//! A store holds exactly one slot: the serialized, ordered message list.
//! It knows nothing about turns or providers.

use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::core::config::data::path_display;
use crate::core::error::ChatError;
use crate::core::message::Message;

#[derive(Debug)]
pub enum StoreError {
    /// Stored bytes exist but do not decode as a message list.
    Corrupt {
        location: String,
        source: serde_json::Error,
    },

    /// Reading, writing or removing the slot failed.
    Io {
        location: String,
        source: std::io::Error,
    },

    /// The message list could not be encoded.
    Encode(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Corrupt { location, source } => {
                write!(f, "conversation log at {location} is unreadable: {source}")
            }
            StoreError::Io { location, source } => {
                write!(f, "conversation log at {location}: {source}")
            }
            StoreError::Encode(source) => write!(f, "failed to encode conversation log: {source}"),
        }
    }
}

impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            StoreError::Corrupt { source, .. } => Some(source),
            StoreError::Io { source, .. } => Some(source),
            StoreError::Encode(source) => Some(source),
        }
    }
}

impl From<StoreError> for ChatError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Corrupt { .. } => ChatError::CorruptState(err.to_string()),
            StoreError::Io { .. } | StoreError::Encode(_) => ChatError::Persistence(err.to_string()),
        }
    }
}

/// Load/save/clear of the single conversation slot.
///
/// `save` replaces the whole log; readers never observe a half-written
/// slot. Every operation is idempotent.
pub trait MessageStore: Send + Sync {
    /// Returns an empty list when nothing has been saved yet.
    fn load(&self) -> Result<Vec<Message>, StoreError>;

    fn save(&self, messages: &[Message]) -> Result<(), StoreError>;

    fn clear(&self) -> Result<(), StoreError>;
}

fn decode(bytes: &[u8], location: &str) -> Result<Vec<Message>, StoreError> {
    serde_json::from_slice(bytes).map_err(|source| StoreError::Corrupt {
        location: location.to_string(),
        source,
    })
}

/// Keeps the log as a JSON array in a single file.
#[derive(Debug, Clone)]
pub struct FileMessageStore {
    path: PathBuf,
}

impl FileMessageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn location(&self) -> String {
        path_display(&self.path)
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            location: self.location(),
            source,
        }
    }
}

impl MessageStore for FileMessageStore {
    fn load(&self) -> Result<Vec<Message>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(self.io_err(err)),
        };
        let messages = decode(&bytes, &self.location())?;
        debug!(path = %self.location(), count = messages.len(), "Loaded conversation log");
        Ok(messages)
    }

    fn save(&self, messages: &[Message]) -> Result<(), StoreError> {
        let parent = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());

        if let Some(dir) = parent {
            fs::create_dir_all(dir).map_err(|err| self.io_err(err))?;
        }

        let contents = serde_json::to_vec_pretty(messages).map_err(StoreError::Encode)?;

        // Temp file in the same directory so the final rename is atomic.
        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new_in("."),
        }
        .map_err(|err| self.io_err(err))?;

        temp_file
            .write_all(&contents)
            .map_err(|err| self.io_err(err))?;
        temp_file
            .as_file_mut()
            .sync_all()
            .map_err(|err| self.io_err(err))?;
        temp_file
            .persist(&self.path)
            .map_err(|err| self.io_err(err.error))?;

        debug!(path = %self.location(), count = messages.len(), "Saved conversation log");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.io_err(err)),
        }
    }
}

/// Process-local slot holding the encoded log, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryMessageStore {
    slot: Mutex<Option<Vec<u8>>>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose slot already contains `bytes`, valid or not.
    pub fn with_raw(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            slot: Mutex::new(Some(bytes.into())),
        }
    }

    pub fn with_messages(messages: &[Message]) -> Result<Self, StoreError> {
        let store = Self::new();
        store.save(messages)?;
        Ok(store)
    }

    pub fn is_empty(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_none()
    }
}

impl MessageStore for MemoryMessageStore {
    fn load(&self) -> Result<Vec<Message>, StoreError> {
        let slot = self
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match slot.as_deref() {
            Some(bytes) => decode(bytes, "memory"),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, messages: &[Message]) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec(messages).map_err(StoreError::Encode)?;
        *self
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(encoded);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::sample_history;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileMessageStore::new(temp_dir.path().join("messages.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_replaces_whole_log() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileMessageStore::new(temp_dir.path().join("state").join("messages.json"));

        let history = sample_history();
        store.save(&history).unwrap();
        assert_eq!(store.load().unwrap(), history);

        store.save(&history[..2]).unwrap();
        assert_eq!(store.load().unwrap(), history[..2].to_vec());

        // Saving the same log twice is harmless.
        store.save(&history[..2]).unwrap();
        assert_eq!(store.load().unwrap(), history[..2].to_vec());
    }

    #[test]
    fn save_leaves_no_temp_files_behind() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileMessageStore::new(temp_dir.path().join("messages.json"));
        store.save(&sample_history()).unwrap();

        let entries: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("messages.json")]);
    }

    #[test]
    fn malformed_bytes_are_corrupt_state() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("messages.json");
        fs::write(&path, b"{not json").unwrap();

        let err = FileMessageStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        assert!(matches!(ChatError::from(err), ChatError::CorruptState(_)));
    }

    #[test]
    fn legacy_boolean_role_logs_are_corrupt() {
        let store = MemoryMessageStore::with_raw(r#"[{"user":true,"content":"hello"}]"#);
        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn clear_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileMessageStore::new(temp_dir.path().join("messages.json"));
        store.save(&sample_history()).unwrap();

        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryMessageStore::new();
        assert!(store.is_empty());
        store.save(&sample_history()).unwrap();
        assert_eq!(store.load().unwrap(), sample_history());
        store.clear().unwrap();
        assert!(store.is_empty());
        assert!(store.load().unwrap().is_empty());
    }
}
