//! # Track Change Coordinator
//!
//! Ties the playback feed, user input, recorder, scheduler and store together.
//!
//! ## Responsibilities
//! 1. **Track changes** - when the feed reports a different track, rotate the
//!    recording (while recording) or load the new track's pattern (while idle)
//! 2. **Replay** - forward position ticks to the scheduler, except while
//!    recording, where capture and replay are mutually exclusive
//! 3. **Input** - resolve key presses into live cues, capture them while
//!    recording, toggle recording, and turn transport keys into requests
//! 4. **Library management** - import, export and delete, reloading the
//!    scheduler when the pattern behind the current track changes
//!
//! Every notification is handled to completion before the next one. A
//! playback update applies its track change before its position tick.
//!
//! ## Example
//! ```rust
//! use cadence::{Cue, InputEvent, KeyBindings, MemoryStorage, PatternStore};
//! use cadence::{PlaybackState, TrackChangeCoordinator, TrackInfo};
//!
//! let store = PatternStore::open(MemoryStorage::new());
//! let mut session = TrackChangeCoordinator::new(store, KeyBindings::default());
//! let mut cues: Vec<Cue> = Vec::new();
//!
//! let track = TrackInfo::new("A", "Song A", &["Artist"], 180_000);
//! session.on_playback(PlaybackState::playing(track, 0), &mut cues);
//! session.handle_input(InputEvent::StartRecording, &mut cues);
//! assert!(session.is_recording());
//! ```

use crate::config::KeyBindings;
use crate::error::PatternError;
use crate::input::{InputEvent, KeyAction, TransportCommand};
use crate::model::{PatternEvent, TrackInfo};
use crate::recorder::Recorder;
use crate::scheduler::{CueSink, Scheduler};
use crate::store::PatternStore;
use crate::transfer;


/// One snapshot from the playback feed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlaybackState {
    pub track: Option<TrackInfo>,
    pub position_ms: u64,
    pub is_playing: bool,
}

impl PlaybackState {
    pub fn playing(track: TrackInfo, position_ms: u64) -> Self {
        Self {
            track: Some(track),
            position_ms,
            is_playing: true,
        }
    }

    pub fn paused(track: TrackInfo, position_ms: u64) -> Self {
        Self {
            track: Some(track),
            position_ms,
            is_playing: false,
        }
    }
}

pub struct TrackChangeCoordinator {
    store: PatternStore,
    recorder: Recorder,
    scheduler: Scheduler,
    bindings: KeyBindings,
    current_track: Option<TrackInfo>,
    position_ms: u64,
}

impl TrackChangeCoordinator {
    pub fn new(store: PatternStore, bindings: KeyBindings) -> Self {
        Self {
            store,
            recorder: Recorder::new(),
            scheduler: Scheduler::new(),
            bindings,
            current_track: None,
            position_ms: 0,
        }
    }

    pub fn store(&self) -> &PatternStore {
        &self.store
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn current_track(&self) -> Option<&TrackInfo> {
        self.current_track.as_ref()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Last playback position seen, used to stamp captured cues.
    pub fn position_ms(&self) -> u64 {
        self.position_ms
    }

    /// Apply a playback feed update: track change first, then the position tick.
    pub fn on_playback(&mut self, state: PlaybackState, sink: &mut dyn CueSink) -> usize {
        self.on_track_change(state.track);
        self.tick(state.position_ms, state.is_playing, sink)
    }

    /// Observe the feed's current track. Only an identity change has an effect.
    pub fn on_track_change(&mut self, track: Option<TrackInfo>) {
        let previous_id = self.current_track.as_ref().map(|t| t.id.as_str());
        let next_id = track.as_ref().map(|t| t.id.as_str());
        if previous_id == next_id {
            // Same track; keep the freshest metadata.
            if track.is_some() {
                self.current_track = track;
            }
            return;
        }

        // Key presses before the next tick belong to the start of the new track.
        if track.is_some() {
            self.position_ms = 0;
        }

        match &track {
            Some(next) if self.recorder.is_recording() => {
                if let Err(e) = self.recorder.rotate(next, &mut self.store) {
                    log::warn!("Failed to rotate recording: {}", e);
                }
            }
            Some(next) => {
                self.scheduler.load_for_track(&self.store, &next.id);
            }
            None if self.recorder.is_recording() => {
                log::info!("Track ended while recording; keeping the recording open");
            }
            None => self.scheduler.unload(),
        }

        // Recording continues for the last known track when the feed goes empty.
        if track.is_some() || !self.recorder.is_recording() {
            self.current_track = track;
        }
    }

    /// Forward a position update to the scheduler, unless recording.
    pub fn tick(&mut self, position_ms: u64, is_playing: bool, sink: &mut dyn CueSink) -> usize {
        self.position_ms = position_ms;
        if self.recorder.is_recording() {
            return 0;
        }
        self.scheduler.tick(position_ms, is_playing, sink)
    }

    /// Single entry point for user input.
    ///
    /// Returns a transport request when the input asks for one.
    pub fn handle_input(
        &mut self,
        event: InputEvent,
        sink: &mut dyn CueSink,
    ) -> Option<TransportCommand> {
        match event {
            InputEvent::Key(key) => {
                match self.bindings.resolve(&key) {
                    Some(KeyAction::Intensity(level)) => {
                        self.trigger(PatternEvent::intensity(self.position_ms, level), sink);
                    }
                    Some(KeyAction::Message(text)) => {
                        self.trigger(PatternEvent::message(self.position_ms, text, key), sink);
                    }
                    Some(KeyAction::ToggleRecording) => self.toggle_recording(),
                    None => log::trace!("Ignoring unbound key {:?}", key),
                }
                None
            }
            InputEvent::StartRecording => {
                if let Err(e) = self.start_recording() {
                    log::warn!("Cannot start recording: {}", e);
                }
                None
            }
            InputEvent::StopRecording => {
                self.stop_recording();
                None
            }
            InputEvent::ToggleRecording => {
                self.toggle_recording();
                None
            }
            InputEvent::PlayPause if self.current_track.is_none() => {
                Some(TransportCommand::StartPlaylist)
            }
            InputEvent::PlayPause => Some(TransportCommand::TogglePlay),
            InputEvent::SkipNext => Some(TransportCommand::SkipNext),
            InputEvent::SkipPrevious => Some(TransportCommand::SkipPrevious),
        }
    }

    /// Apply a manual cue live and capture it if recording.
    fn trigger(&mut self, event: PatternEvent, sink: &mut dyn CueSink) {
        crate::scheduler::dispatch(&event.action, sink);
        self.recorder.record(event);
    }

    fn toggle_recording(&mut self) {
        if self.recorder.is_recording() {
            self.stop_recording();
        } else if let Err(e) = self.start_recording() {
            log::warn!("Cannot start recording: {}", e);
        }
    }

    /// Start recording the current track.
    pub fn start_recording(&mut self) -> Result<(), PatternError> {
        let track = self.current_track.as_ref().ok_or(PatternError::NoActiveTrack)?;
        self.recorder.start(track)
    }

    /// Stop recording and resume replay for the current track.
    ///
    /// Returns the id of the track whose pattern was saved, if any.
    pub fn stop_recording(&mut self) -> Option<String> {
        let was_recording = self.recorder.is_recording();
        let saved = self.recorder.stop(&mut self.store);
        if was_recording {
            self.reload_current();
        }
        saved
    }

    pub fn export_library(&self) -> Result<String, PatternError> {
        transfer::export_library(self.store.library())
    }

    /// Replace the whole library. On failure nothing changes.
    pub fn import_library(&mut self, json: &str) -> Result<(), PatternError> {
        transfer::import_library(&mut self.store, json)?;
        if !self.recorder.is_recording() {
            self.reload_current();
        }
        Ok(())
    }

    /// Delete a stored pattern. Returns whether one existed.
    pub fn delete_pattern(&mut self, track_id: &str) -> bool {
        let removed = self.store.delete_song(track_id).is_some();
        if removed
            && !self.recorder.is_recording()
            && self.scheduler.loaded_track() == Some(track_id)
        {
            self.reload_current();
        }
        removed
    }

    fn reload_current(&mut self) {
        match &self.current_track {
            Some(track) => {
                self.scheduler.load_for_track(&self.store, &track.id);
            }
            None => self.scheduler.unload(),
        }
    }
}
