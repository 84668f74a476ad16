//! # Pattern Store
//!
//! Owns the process-wide [`PatternLibrary`] and keeps it persisted.
//!
//! ## Lifecycle
//! 1. [`PatternStore::open`] reads the library through a [`LibraryStorage`] port.
//!    Missing or corrupt content yields the built-in default library.
//! 2. Every mutation (`upsert_song`, `delete_song`, `replace`) changes the
//!    in-memory library and then writes it back synchronously.
//! 3. Write failures are logged and dropped. The in-memory library stays
//!    authoritative for the rest of the session.
//!
//! ## Storage Ports
//! - [`FileStorage`] - JSON file on disk
//! - [`MemoryStorage`] - Shared in-memory slot, with optional write failure for tests

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

use crate::error::PatternError;
use crate::model::{PatternEvent, PatternLibrary, SongPattern};

/// Where the serialized library lives between sessions.
pub trait LibraryStorage {
    /// Returns `Ok(None)` when nothing has been stored yet.
    fn read(&self) -> Result<Option<String>, PatternError>;
    fn write(&mut self, contents: &str) -> Result<(), PatternError>;
}

/// Library persisted as a JSON file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LibraryStorage for FileStorage {
    fn read(&self) -> Result<Option<String>, PatternError> {
        if !self.path.exists() {
            return Ok(None);
        }
        std::fs::read_to_string(&self.path)
            .map(Some)
            .map_err(|source| PatternError::Io {
                path: self.path.clone(),
                source,
            })
    }

    fn write(&mut self, contents: &str) -> Result<(), PatternError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| PatternError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.path, contents).map_err(|source| PatternError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// In-memory storage slot.
///
/// Clones share the same slot, so a test can keep a handle after moving one
/// into a store and inspect what was written.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    contents: Rc<RefCell<Option<String>>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        let storage = Self::default();
        *storage.contents.borrow_mut() = Some(contents.into());
        storage
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.borrow().clone()
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl LibraryStorage for MemoryStorage {
    fn read(&self) -> Result<Option<String>, PatternError> {
        Ok(self.contents.borrow().clone())
    }

    fn write(&mut self, contents: &str) -> Result<(), PatternError> {
        if self.fail_writes.get() {
            return Err(PatternError::Io {
                path: PathBuf::from("<memory>"),
                source: std::io::Error::new(std::io::ErrorKind::Other, "write disabled"),
            });
        }
        *self.contents.borrow_mut() = Some(contents.to_string());
        Ok(())
    }
}

/// Owner of the pattern library.
pub struct PatternStore {
    library: PatternLibrary,
    storage: Box<dyn LibraryStorage>,
}

impl PatternStore {
    /// Open a store, loading whatever `storage` holds.
    pub fn open(storage: impl LibraryStorage + 'static) -> Self {
        let storage: Box<dyn LibraryStorage> = Box::new(storage);
        let library = Self::read_library(storage.as_ref());
        Self { library, storage }
    }

    fn read_library(storage: &dyn LibraryStorage) -> PatternLibrary {
        match storage.read() {
            Ok(Some(contents)) => match PatternLibrary::from_json(&contents) {
                Ok(library) => {
                    log::info!("Loaded pattern library ({} songs)", library.songs.len());
                    library
                }
                Err(e) => {
                    log::warn!("Stored pattern library is invalid: {}, using defaults", e);
                    PatternLibrary::default()
                }
            },
            Ok(None) => {
                log::info!("No stored pattern library, using defaults");
                PatternLibrary::default()
            }
            Err(e) => {
                log::warn!("Failed to read pattern library: {}, using defaults", e);
                PatternLibrary::default()
            }
        }
    }

    /// The current library. Storage is only read by [`PatternStore::open`];
    /// afterwards the in-memory copy is authoritative, even when writes fail.
    pub fn load(&self) -> &PatternLibrary {
        &self.library
    }

    /// Write `library` to storage. Failures are logged, never returned.
    pub fn save(&mut self) {
        let json = match self.library.to_json() {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to serialize pattern library: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.write(&json) {
            log::warn!("Failed to save pattern library: {}", e);
        }
    }

    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    pub fn get_pattern(&self, track_id: &str) -> Option<&SongPattern> {
        self.library.songs.get(track_id)
    }

    pub fn default_pattern(&self) -> &[PatternEvent] {
        &self.library.default_pattern
    }

    /// Insert or replace the pattern stored under its track id.
    ///
    /// Patterns without events are not stored.
    pub fn upsert_song(&mut self, pattern: SongPattern) {
        if pattern.events.is_empty() {
            log::debug!("Not storing empty pattern for {}", pattern.track_id);
            return;
        }
        log::info!(
            "Saved pattern for: {} ({} events)",
            pattern.track_name,
            pattern.events.len()
        );
        self.library.songs.insert(pattern.track_id.clone(), pattern);
        self.save();
    }

    /// Remove a stored pattern. Returns it if one existed.
    pub fn delete_song(&mut self, track_id: &str) -> Option<SongPattern> {
        let removed = self.library.songs.remove(track_id);
        if removed.is_some() {
            log::info!("Deleted pattern for track {}", track_id);
            self.save();
        }
        removed
    }

    /// Swap in a whole new library.
    pub fn replace(&mut self, library: PatternLibrary) {
        log::info!("Replacing pattern library ({} songs)", library.songs.len());
        self.library = library;
        self.save();
    }
}
