//! # Pattern Scheduler
//!
//! Replays a loaded pattern against the live playback position.
//!
//! ## Due Window
//! An event is due while the position is inside
//! `[timestamp, timestamp + DUE_WINDOW_MS)`. The position feed is polled at
//! roughly 1 Hz, so the window has to cover one polling interval. Each event
//! index fires at most once per [`Scheduler::load_for_track`].
//!
//! ## Seeking
//! A position jump that skips over a window entirely never fires that event
//! later. A backward seek does not re-fire events that already fired, while
//! events that were never reached fire normally once their window is entered.
//! Only a fresh load (or [`Scheduler::reset_applied`]) clears the applied set.

use std::collections::{BTreeSet, HashSet};

use crate::model::{EventAction, PatternEvent};
use crate::store::PatternStore;

/// Width of the window in which an event may fire, in milliseconds.
pub const DUE_WINDOW_MS: u64 = 1000;

/// Receiver for cues produced by replay (and by live input).
pub trait CueSink {
    fn on_intensity(&mut self, level: u8);
    fn on_message(&mut self, text: &str);
}

/// A cue as a value, for sinks that collect rather than react.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cue {
    Intensity(u8),
    Message(String),
}

impl CueSink for Vec<Cue> {
    fn on_intensity(&mut self, level: u8) {
        self.push(Cue::Intensity(level));
    }

    fn on_message(&mut self, text: &str) {
        self.push(Cue::Message(text.to_string()));
    }
}

/// Send one event's action to `sink`.
pub fn dispatch(action: &EventAction, sink: &mut dyn CueSink) {
    match action {
        EventAction::Intensity { level } => sink.on_intensity(*level),
        EventAction::Message { text, .. } => sink.on_message(text),
    }
}

/// Where the loaded events came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternSource {
    Recorded,
    Default,
}

#[derive(Debug, Clone)]
struct LoadedPattern {
    track_id: String,
    source: PatternSource,
    events: Vec<PatternEvent>,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    loaded: Option<LoadedPattern>,
    applied: HashSet<usize>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the stored pattern for `track_id`, or the default pattern.
    pub fn load_for_track(&mut self, store: &PatternStore, track_id: &str) -> PatternSource {
        self.applied.clear();
        let (source, events) = match store.get_pattern(track_id) {
            Some(pattern) => {
                log::info!(
                    "Loaded pattern for: {} ({} events)",
                    pattern.track_name,
                    pattern.events.len()
                );
                (PatternSource::Recorded, pattern.events.clone())
            }
            None => {
                log::info!("Using default pattern for track {}", track_id);
                (PatternSource::Default, store.default_pattern().to_vec())
            }
        };
        self.loaded = Some(LoadedPattern {
            track_id: track_id.to_string(),
            source,
            events,
        });
        source
    }

    /// Drop the loaded pattern; ticks do nothing until the next load.
    pub fn unload(&mut self) {
        self.loaded = None;
        self.applied.clear();
    }

    pub fn loaded_track(&self) -> Option<&str> {
        self.loaded.as_ref().map(|p| p.track_id.as_str())
    }

    pub fn loaded_source(&self) -> Option<PatternSource> {
        self.loaded.as_ref().map(|p| p.source)
    }

    pub fn loaded_events(&self) -> &[PatternEvent] {
        match &self.loaded {
            Some(pattern) => &pattern.events,
            None => &[],
        }
    }

    /// Positions a feed polling every `interval_ms` from 0 would report inside
    /// the due window of some loaded event, ascending and deduplicated.
    ///
    /// `interval_ms` must be non-zero and no wider than [`DUE_WINDOW_MS`].
    pub fn poll_positions(&self, interval_ms: u64) -> Vec<u64> {
        let interval_ms = interval_ms.clamp(1, DUE_WINDOW_MS);
        let positions: BTreeSet<u64> = self
            .loaded_events()
            .iter()
            .filter_map(|event| {
                let first_poll =
                    event.timestamp.checked_add(interval_ms - 1)? / interval_ms * interval_ms;
                (first_poll < event.timestamp.saturating_add(DUE_WINDOW_MS)).then_some(first_poll)
            })
            .collect();
        positions.into_iter().collect()
    }

    /// Allow every event of the current load to fire again.
    pub fn reset_applied(&mut self) {
        self.applied.clear();
    }

    pub fn is_applied(&self, index: usize) -> bool {
        self.applied.contains(&index)
    }

    /// Fire every due, not yet applied event in index order.
    ///
    /// Returns the number of events fired.
    pub fn tick(&mut self, position_ms: u64, is_playing: bool, sink: &mut dyn CueSink) -> usize {
        if !is_playing {
            return 0;
        }
        let Some(pattern) = &self.loaded else {
            return 0;
        };

        let mut fired = 0;
        for (index, event) in pattern.events.iter().enumerate() {
            if self.applied.contains(&index) {
                continue;
            }
            let due_end = event.timestamp.saturating_add(DUE_WINDOW_MS);
            if position_ms >= event.timestamp && position_ms < due_end {
                self.applied.insert(index);
                log::debug!("Applying event {} at {}ms: {:?}", index, position_ms, event.action);
                dispatch(&event.action, sink);
                fired += 1;
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SongPattern, TrackInfo};
    use crate::store::MemoryStorage;

    fn store_with_a() -> PatternStore {
        let mut store = PatternStore::open(MemoryStorage::new());
        let mut pattern = SongPattern::new_for(&TrackInfo::new("A", "Song A", &["X"], 180_000));
        pattern.events = vec![
            PatternEvent::intensity(5000, 7),
            PatternEvent::message(12000, "PUSH IT!", "Enter"),
        ];
        store.upsert_song(pattern);
        store
    }

    #[test]
    fn test_unknown_track_uses_default_pattern() {
        let store = store_with_a();
        let mut scheduler = Scheduler::new();
        assert_eq!(scheduler.load_for_track(&store, "nope"), PatternSource::Default);
        assert_eq!(scheduler.loaded_events(), store.default_pattern());
    }

    #[test]
    fn test_fires_once_within_window() {
        let store = store_with_a();
        let mut scheduler = Scheduler::new();
        assert_eq!(scheduler.load_for_track(&store, "A"), PatternSource::Recorded);

        let mut cues: Vec<Cue> = Vec::new();
        assert_eq!(scheduler.tick(5200, true, &mut cues), 1);
        assert_eq!(scheduler.tick(5600, true, &mut cues), 0);
        assert_eq!(cues, vec![Cue::Intensity(7)]);
        assert!(scheduler.is_applied(0));
    }

    #[test]
    fn test_window_bounds() {
        let store = store_with_a();
        let mut scheduler = Scheduler::new();
        scheduler.load_for_track(&store, "A");

        let mut cues: Vec<Cue> = Vec::new();
        scheduler.tick(4999, true, &mut cues);
        scheduler.tick(6000, true, &mut cues);
        assert!(cues.is_empty());

        scheduler.tick(12000, true, &mut cues);
        assert_eq!(cues, vec![Cue::Message("PUSH IT!".to_string())]);
    }

    #[test]
    fn test_not_playing_or_unloaded_is_noop() {
        let store = store_with_a();
        let mut scheduler = Scheduler::new();
        let mut cues: Vec<Cue> = Vec::new();
        assert_eq!(scheduler.tick(5000, true, &mut cues), 0);

        scheduler.load_for_track(&store, "A");
        assert_eq!(scheduler.tick(5000, false, &mut cues), 0);
        assert!(cues.is_empty());
        assert!(!scheduler.is_applied(0));

        scheduler.unload();
        assert_eq!(scheduler.tick(5000, true, &mut cues), 0);
    }

    #[test]
    fn test_multiple_due_events_fire_in_index_order() {
        let mut store = PatternStore::open(MemoryStorage::new());
        let mut pattern = SongPattern::new_for(&TrackInfo::new("B", "Song B", &["X"], 60_000));
        pattern.events = vec![
            PatternEvent::message(2500, "SECOND", "s"),
            PatternEvent::intensity(2000, 9),
            PatternEvent::intensity(9000, 1),
        ];
        store.upsert_song(pattern);

        let mut scheduler = Scheduler::new();
        scheduler.load_for_track(&store, "B");
        let mut cues: Vec<Cue> = Vec::new();
        assert_eq!(scheduler.tick(2600, true, &mut cues), 2);
        assert_eq!(cues, vec![Cue::Message("SECOND".to_string()), Cue::Intensity(9)]);
    }

    #[test]
    fn test_each_event_fires_at_most_once_per_load() {
        let store = store_with_a();
        let mut scheduler = Scheduler::new();
        scheduler.load_for_track(&store, "A");

        let mut cues: Vec<Cue> = Vec::new();
        for position in (0..20_000).step_by(250) {
            scheduler.tick(position, true, &mut cues);
        }
        assert_eq!(cues.len(), 2);
    }

    #[test]
    fn test_skipped_window_never_fires() {
        let store = store_with_a();
        let mut scheduler = Scheduler::new();
        scheduler.load_for_track(&store, "A");

        let mut cues: Vec<Cue> = Vec::new();
        scheduler.tick(4000, true, &mut cues);
        scheduler.tick(8000, true, &mut cues);
        assert!(cues.is_empty());
        assert!(!scheduler.is_applied(0));
    }

    #[test]
    fn test_backward_seek_only_fires_unreached_events() {
        let store = store_with_a();
        let mut scheduler = Scheduler::new();
        scheduler.load_for_track(&store, "A");

        let mut cues: Vec<Cue> = Vec::new();
        scheduler.tick(5100, true, &mut cues);
        // Seek back into the first window: already applied, stays silent.
        scheduler.tick(5050, true, &mut cues);
        scheduler.tick(12100, true, &mut cues);
        assert_eq!(cues.len(), 2);
    }

    #[test]
    fn test_reload_and_reset_clear_applied() {
        let store = store_with_a();
        let mut scheduler = Scheduler::new();
        scheduler.load_for_track(&store, "A");

        let mut cues: Vec<Cue> = Vec::new();
        scheduler.tick(5100, true, &mut cues);
        scheduler.reset_applied();
        scheduler.tick(5200, true, &mut cues);
        scheduler.load_for_track(&store, "A");
        scheduler.tick(5300, true, &mut cues);
        assert_eq!(cues, vec![Cue::Intensity(7); 3]);
    }

    #[test]
    fn test_poll_positions_cover_every_event() {
        let mut store = PatternStore::open(MemoryStorage::new());
        let mut pattern = SongPattern::new_for(&TrackInfo::new("C", "Song C", &["X"], 10_000));
        pattern.events = vec![
            PatternEvent::intensity(12_345, 4),
            PatternEvent::intensity(2000, 6),
            PatternEvent::message(2500, "GO", "g"),
            PatternEvent::intensity(u64::MAX - 10, 2),
        ];
        store.upsert_song(pattern);

        let mut scheduler = Scheduler::new();
        assert!(scheduler.poll_positions(1000).is_empty());
        scheduler.load_for_track(&store, "C");
        let positions = scheduler.poll_positions(1000);
        // Past the track duration still counts; a timestamp with no reachable poll is skipped.
        assert_eq!(positions, vec![2000, 3000, 13_000]);

        let mut cues: Vec<Cue> = Vec::new();
        for position in positions {
            scheduler.tick(position, true, &mut cues);
        }
        assert_eq!(
            cues,
            vec![Cue::Intensity(6), Cue::Message("GO".to_string()), Cue::Intensity(4)]
        );
    }
}
