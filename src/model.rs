//! # Pattern Data Model
//!
//! Types for recorded workout cue patterns and the library that holds them.
//!
//! ## Key Types
//! - [`PatternEvent`] - One timestamped cue (intensity change or message)
//! - [`SongPattern`] - All events captured for one track, plus track metadata
//! - [`PatternLibrary`] - Every stored pattern plus the default fallback pattern
//! - [`TrackInfo`] - Track descriptor as reported by the playback feed
//!
//! ## JSON Format
//!
//! The serde layout matches the library file format exactly:
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "songs": {
//!     "abc": {
//!       "trackId": "abc",
//!       "trackName": "Eye of the Tiger",
//!       "artistName": "Survivor",
//!       "duration": 245000,
//!       "events": [
//!         { "timestamp": 5000, "type": "intensity", "data": { "level": 7 } },
//!         { "timestamp": 12000, "type": "message", "data": { "text": "PUSH IT!", "key": "Enter" } }
//!       ],
//!       "recordedAt": 1718000000000,
//!       "playCount": 0
//!     }
//!   },
//!   "defaultPattern": []
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PatternError;

/// Library format version written by this crate.
pub const LIBRARY_VERSION: &str = "1.0";

/// Lowest and highest intensity levels a cue can carry.
pub const MIN_INTENSITY: u8 = 1;
pub const MAX_INTENSITY: u8 = 10;

/// What a pattern event does when it is applied.
///
/// Serialized adjacently tagged so an event reads as
/// `{"type": "intensity", "data": {"level": 7}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum EventAction {
    /// Set the workout intensity (1-10).
    Intensity { level: u8 },
    /// Flash a motivational message. `key` is the key that triggered it.
    Message {
        text: String,
        #[serde(default)]
        key: String,
    },
}

/// A single cue relative to the start of a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternEvent {
    /// Milliseconds from track start.
    pub timestamp: u64,
    #[serde(flatten)]
    pub action: EventAction,
}

impl PatternEvent {
    /// Intensity cue. `level` is clamped into 1..=10.
    pub fn intensity(timestamp: u64, level: u8) -> Self {
        Self {
            timestamp,
            action: EventAction::Intensity {
                level: level.clamp(MIN_INTENSITY, MAX_INTENSITY),
            },
        }
    }

    pub fn message(timestamp: u64, text: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            timestamp,
            action: EventAction::Message {
                text: text.into(),
                key: key.into(),
            },
        }
    }
}

/// Track descriptor from the playback feed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackInfo {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub duration_ms: u64,
}

impl TrackInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, artists: &[&str], duration_ms: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            artists: artists.iter().map(|a| a.to_string()).collect(),
            duration_ms,
        }
    }

    /// Artists joined the way they are shown and stored: "A, B".
    pub fn artist_name(&self) -> String {
        self.artists.join(", ")
    }
}

/// The event sequence captured for one track.
///
/// # Fields
/// - `track_id`: Unique key in the library
/// - `duration_ms`: Track length, serialized as `duration`
/// - `events`: Capture order; not re-sorted, so imported data may be out of order
/// - `recorded_at`: Wall-clock capture start in epoch milliseconds
/// - `play_count`: Carried through storage and transfer untouched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongPattern {
    pub track_id: String,
    pub track_name: String,
    pub artist_name: String,
    #[serde(rename = "duration")]
    pub duration_ms: u64,
    pub events: Vec<PatternEvent>,
    pub recorded_at: i64,
    #[serde(default)]
    pub play_count: u32,
}

impl SongPattern {
    /// Empty pattern for `track`, stamped with the current wall-clock time.
    pub fn new_for(track: &TrackInfo) -> Self {
        Self {
            track_id: track.id.clone(),
            track_name: track.name.clone(),
            artist_name: track.artist_name(),
            duration_ms: track.duration_ms,
            events: Vec::new(),
            recorded_at: chrono::Utc::now().timestamp_millis(),
            play_count: 0,
        }
    }
}

/// Every stored pattern plus the fallback used for unknown tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternLibrary {
    pub version: String,
    pub songs: BTreeMap<String, SongPattern>,
    #[serde(default = "default_pattern")]
    pub default_pattern: Vec<PatternEvent>,
}

impl Default for PatternLibrary {
    fn default() -> Self {
        Self {
            version: LIBRARY_VERSION.to_string(),
            songs: BTreeMap::new(),
            default_pattern: default_pattern(),
        }
    }
}

/// Built-in fallback: moderate start, push at one minute, recover at two.
pub fn default_pattern() -> Vec<PatternEvent> {
    vec![
        PatternEvent::intensity(0, 5),
        PatternEvent::intensity(60_000, 7),
        PatternEvent::intensity(120_000, 3),
    ]
}

impl PatternLibrary {
    /// Parse and validate library JSON.
    ///
    /// The top-level object must carry a non-empty `version` string and a
    /// `songs` object. Everything below that is trusted structurally, but it
    /// still has to deserialize into the typed model; nothing is coerced.
    pub fn from_json(json: &str) -> Result<Self, PatternError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let object = value
            .as_object()
            .ok_or_else(|| PatternError::InvalidLibrary("top level is not an object".to_string()))?;

        match object.get("version").and_then(|v| v.as_str()) {
            Some(version) if !version.is_empty() => {}
            _ => return Err(PatternError::InvalidLibrary("missing `version`".to_string())),
        }
        if !object.get("songs").map_or(false, |s| s.is_object()) {
            return Err(PatternError::InvalidLibrary("missing `songs`".to_string()));
        }

        serde_json::from_value(value).map_err(|e| PatternError::InvalidLibrary(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, PatternError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
