//! # Library Transfer
//!
//! Whole-library export and import.
//!
//! Export is a pure serialization of the current library. Import is
//! all-or-nothing: the text must parse, carry a `version` and a `songs`
//! mapping, and fit the typed model. Only then is the store's library replaced
//! wholesale (not merged). Any failure leaves the store untouched.
//!
//! ## Example
//! ```rust
//! use cadence::{export_library, import_library, MemoryStorage, PatternStore};
//!
//! let mut store = PatternStore::open(MemoryStorage::new());
//! let json = export_library(store.library())?;
//!
//! assert!(import_library(&mut store, "{\"version\": \"1.0\"}").is_err());
//! import_library(&mut store, &json)?;
//! # Ok::<(), cadence::PatternError>(())
//! ```

use crate::error::PatternError;
use crate::model::PatternLibrary;
use crate::store::PatternStore;

/// Serialize the full library as pretty-printed JSON.
pub fn export_library(library: &PatternLibrary) -> Result<String, PatternError> {
    library.to_json()
}

/// Validate `json` and replace the store's library with it.
pub fn import_library(store: &mut PatternStore, json: &str) -> Result<(), PatternError> {
    match PatternLibrary::from_json(json) {
        Ok(library) => {
            store.replace(library);
            Ok(())
        }
        Err(e) => {
            log::warn!("Failed to import library: {}", e);
            Err(e)
        }
    }
}

/// Suggested file name for an export made today, e.g. `workout_patterns_2024-06-01.json`.
pub fn export_file_name() -> String {
    format!(
        "workout_patterns_{}.json",
        chrono::Local::now().format("%Y-%m-%d")
    )
}
