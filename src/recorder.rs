//! # Pattern Recorder
//!
//! Captures cue events for the track that is playing.
//!
//! The recorder is a two-state machine. While `Idle` it ignores events. While
//! `Recording` it appends every event to an in-progress [`SongPattern`] that
//! is not visible in the store until the recording is finalized by
//! [`Recorder::stop`] or [`Recorder::rotate`].

use crate::error::PatternError;
use crate::model::{PatternEvent, SongPattern, TrackInfo};
use crate::store::PatternStore;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RecorderState {
    #[default]
    Idle,
    Recording(SongPattern),
}

#[derive(Debug, Default)]
pub struct Recorder {
    state: RecorderState,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RecorderState {
        &self.state
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording(_))
    }

    /// The pattern being captured, if any.
    pub fn in_progress(&self) -> Option<&SongPattern> {
        match &self.state {
            RecorderState::Recording(pattern) => Some(pattern),
            RecorderState::Idle => None,
        }
    }

    /// Begin capturing for `track`. Only valid while idle.
    pub fn start(&mut self, track: &TrackInfo) -> Result<(), PatternError> {
        if let RecorderState::Recording(pattern) = &self.state {
            return Err(PatternError::AlreadyRecording {
                track_id: pattern.track_id.clone(),
            });
        }
        self.state = RecorderState::Recording(SongPattern::new_for(track));
        log::info!("Started recording: {}", track.name);
        Ok(())
    }

    /// Append `event` in call order. Returns false (and does nothing) when idle.
    pub fn record(&mut self, event: PatternEvent) -> bool {
        match &mut self.state {
            RecorderState::Recording(pattern) => {
                log::debug!("Recorded {:?} at {}ms", event.action, event.timestamp);
                pattern.events.push(event);
                true
            }
            RecorderState::Idle => false,
        }
    }

    /// Finish the recording and go idle.
    ///
    /// The pattern is handed to the store only if it captured at least one
    /// event. Returns the id of the stored track, if any. Safe to call while idle.
    pub fn stop(&mut self, store: &mut PatternStore) -> Option<String> {
        match std::mem::take(&mut self.state) {
            RecorderState::Recording(pattern) => Self::finalize(pattern, store),
            RecorderState::Idle => None,
        }
    }

    /// Finalize the current track and keep recording on `track`.
    ///
    /// Callers never observe an idle state between the two recordings.
    pub fn rotate(
        &mut self,
        track: &TrackInfo,
        store: &mut PatternStore,
    ) -> Result<Option<String>, PatternError> {
        let outgoing = match std::mem::replace(
            &mut self.state,
            RecorderState::Recording(SongPattern::new_for(track)),
        ) {
            RecorderState::Recording(pattern) => pattern,
            RecorderState::Idle => {
                self.state = RecorderState::Idle;
                return Err(PatternError::NotRecording);
            }
        };
        let saved = Self::finalize(outgoing, store);
        log::info!("Started recording new track: {}", track.name);
        Ok(saved)
    }

    fn finalize(pattern: SongPattern, store: &mut PatternStore) -> Option<String> {
        if pattern.events.is_empty() {
            log::info!("Discarding empty recording for: {}", pattern.track_name);
            return None;
        }
        let track_id = pattern.track_id.clone();
        store.upsert_song(pattern);
        Some(track_id)
    }
}
