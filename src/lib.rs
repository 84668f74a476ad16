pub mod config;
pub mod coordinator;
pub mod error;
pub mod input;
pub mod model;
pub mod recorder;
pub mod scheduler;
pub mod store;
pub mod transfer;

pub use config::{load_config, save_config, Config, KeyBindings};
pub use coordinator::{PlaybackState, TrackChangeCoordinator};
pub use error::*;
pub use input::{InputEvent, KeyAction, TransportCommand};
pub use model::*;
pub use recorder::{Recorder, RecorderState};
pub use scheduler::{Cue, CueSink, PatternSource, Scheduler, DUE_WINDOW_MS};
pub use store::{FileStorage, LibraryStorage, MemoryStorage, PatternStore};
pub use transfer::{export_library, import_library};

/// Open a session backed by the library file named in `config`.
/// This is the main entry point for hosting applications.
pub fn open_session(config: &Config) -> TrackChangeCoordinator {
    let store = PatternStore::open(FileStorage::new(&config.library_path));
    TrackChangeCoordinator::new(store, config.keybindings.clone())
}
