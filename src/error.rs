//! # Error Types
//!
//! This module defines the error type shared by every part of the pattern engine.
//!
//! Most failures never reach a caller: a corrupt persisted library is replaced
//! by the built-in default, and a failed write is logged while the in-memory
//! library stays authoritative. The errors below are the ones that do.
//!
//! ## Error Types
//! - `Io` - Reading or writing a library/config file failed
//! - `Json` - Library JSON could not be serialized or parsed
//! - `InvalidLibrary` - Parsed JSON is not a usable pattern library
//! - `AlreadyRecording` / `NotRecording` - Recorder used from the wrong state
//! - `NoActiveTrack` - Recording requested with nothing playing
//! - `Config` - YAML configuration could not be parsed or written
//!
//! ## Usage
//! ```rust
//! use cadence::{import_library, MemoryStorage, PatternError, PatternStore};
//!
//! let mut store = PatternStore::open(MemoryStorage::new());
//! match import_library(&mut store, "{\"songs\": {}}") {
//!     Ok(()) => println!("Imported"),
//!     Err(PatternError::InvalidLibrary(reason)) => eprintln!("Rejected: {}", reason),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatternError {
    /// File I/O failure on a persistence or config path.
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failure.
    ///
    /// # Example
    /// ```
    /// # use cadence::PatternError;
    /// let err: PatternError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    /// assert!(err.to_string().starts_with("JSON error:"));
    /// ```
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON was well-formed but is not a pattern library.
    ///
    /// # Example
    /// ```
    /// # use cadence::PatternError;
    /// let err = PatternError::InvalidLibrary("missing `version`".to_string());
    /// assert_eq!(err.to_string(), "Invalid pattern library: missing `version`");
    /// ```
    #[error("Invalid pattern library: {0}")]
    InvalidLibrary(String),

    /// `start` was called while a recording is already in progress.
    #[error("Already recording track '{track_id}'")]
    AlreadyRecording { track_id: String },

    /// `rotate` was called while the recorder is idle.
    #[error("Recorder is not recording")]
    NotRecording,

    /// Recording was requested before the playback feed reported a track.
    #[error("No active track to record")]
    NoActiveTrack,

    /// YAML configuration failure.
    #[error("Invalid config: {0}")]
    Config(String),
}
