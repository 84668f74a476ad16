//! Integration tests for the pattern engine
//!
//! Drives a full session through the public API: record, persist, reopen,
//! replay, and move the library between installs.

use cadence::{
    export_library, import_library, open_session, Config, Cue, FileStorage, InputEvent,
    KeyBindings, MemoryStorage, PatternEvent, PatternSource, PatternStore, PlaybackState,
    TrackChangeCoordinator, TrackInfo,
};

fn track(id: &str, duration_ms: u64) -> TrackInfo {
    TrackInfo::new(id, format!("Track {}", id), &["Band"], duration_ms)
}

#[test]
fn test_record_then_replay_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        library_path: dir.path().join("library.json"),
        keybindings: KeyBindings::default(),
    };

    {
        let mut session = open_session(&config);
        let mut cues: Vec<Cue> = Vec::new();
        session.on_playback(PlaybackState::paused(track("A", 180_000), 0), &mut cues);
        session.handle_input(InputEvent::StartRecording, &mut cues);
        session.on_playback(PlaybackState::playing(track("A", 180_000), 5000), &mut cues);
        session.handle_input(InputEvent::key("7"), &mut cues);
        session.on_playback(PlaybackState::playing(track("A", 180_000), 12000), &mut cues);
        session.handle_input(InputEvent::key("Enter"), &mut cues);
        session.handle_input(InputEvent::StopRecording, &mut cues);
    }

    let mut session = open_session(&config);
    let mut cues: Vec<Cue> = Vec::new();
    for position in (0..20_000).step_by(1000) {
        session.on_playback(PlaybackState::playing(track("A", 180_000), position), &mut cues);
    }
    assert_eq!(session.scheduler().loaded_source(), Some(PatternSource::Recorded));
    assert_eq!(
        cues,
        vec![Cue::Intensity(7), Cue::Message("PUSH IT!".to_string())]
    );
}

#[test]
fn test_recording_across_playlist() {
    let storage = MemoryStorage::new();
    let mut session =
        TrackChangeCoordinator::new(PatternStore::open(storage.clone()), KeyBindings::default());
    let mut cues: Vec<Cue> = Vec::new();

    session.on_playback(PlaybackState::paused(track("A", 60_000), 0), &mut cues);
    session.handle_input(InputEvent::key("r"), &mut cues);
    session.on_playback(PlaybackState::playing(track("A", 60_000), 30_000), &mut cues);
    session.handle_input(InputEvent::key("9"), &mut cues);

    // Next track starts without an event: it is dropped when recording stops.
    session.on_playback(PlaybackState::playing(track("B", 60_000), 0), &mut cues);
    assert!(session.is_recording());
    session.on_playback(PlaybackState::playing(track("C", 60_000), 0), &mut cues);
    session.on_playback(PlaybackState::playing(track("C", 60_000), 4000), &mut cues);
    session.handle_input(InputEvent::key("f"), &mut cues);
    session.handle_input(InputEvent::key("r"), &mut cues);

    let reopened = PatternStore::open(storage);
    let songs = &reopened.library().songs;
    assert_eq!(songs.len(), 2);
    assert_eq!(songs["A"].events, vec![PatternEvent::intensity(30_000, 9)]);
    assert!(!songs.contains_key("B"));
    assert_eq!(
        songs["C"].events,
        vec![PatternEvent::message(4000, "🔥 BURN 🔥", "f")]
    );
}

#[test]
fn test_library_moves_between_installs() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = PatternStore::open(FileStorage::new(dir.path().join("a.json")));
    let mut session = TrackChangeCoordinator::new(
        PatternStore::open(MemoryStorage::new()),
        KeyBindings::default(),
    );
    let mut cues: Vec<Cue> = Vec::new();
    session.on_track_change(Some(track("X", 90_000)));
    session.start_recording().unwrap();
    session.handle_input(InputEvent::key("2"), &mut cues);
    session.stop_recording();

    let exported = session.export_library().unwrap();
    import_library(&mut source, &exported).unwrap();
    assert_eq!(source.library(), session.store().library());

    let reopened = PatternStore::open(FileStorage::new(dir.path().join("a.json")));
    assert_eq!(
        export_library(reopened.library()).unwrap(),
        exported
    );
}

#[test]
fn test_rejected_import_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.json");

    let mut store = PatternStore::open(FileStorage::new(&path));
    let mut pattern = cadence::SongPattern::new_for(&track("A", 1000));
    pattern.events.push(PatternEvent::intensity(0, 6));
    store.upsert_song(pattern);

    assert!(import_library(&mut store, r#"{"songs": {}}"#).is_err());
    assert!(import_library(&mut store, "[]").is_err());

    let reopened = PatternStore::open(FileStorage::new(&path));
    assert!(reopened.get_pattern("A").is_some());
}

#[test]
fn test_corrupt_library_file_falls_back_to_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = PatternStore::open(FileStorage::new(&path));
    assert!(store.library().songs.is_empty());
    assert_eq!(store.default_pattern().len(), 3);
}
