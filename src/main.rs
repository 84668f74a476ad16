use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;

use cadence::config::default_config_path;
use cadence::transfer::export_file_name;
use cadence::{
    export_library, import_library, load_config, CueSink, FileStorage, PatternStore, Scheduler,
};

const USAGE: &str = "Usage: cadence [--config <config.yaml>] <command>

Commands:
  list                  List recorded patterns
  export [out.json]     Export the pattern library (default: workout_patterns_<date>.json)
  import <in.json>      Replace the pattern library with a file
  delete <track-id>     Delete the pattern for a track
  replay <track-id>     Print the cues a replay of the track would fire";

const POLL_INTERVAL_MS: u64 = 1000;

/// Prints cues as a replay would show them.
struct PrintSink {
    position_ms: u64,
}

impl CueSink for PrintSink {
    fn on_intensity(&mut self, level: u8) {
        println!("{:>8}  intensity {}", format_time(self.position_ms), level);
    }

    fn on_message(&mut self, text: &str) {
        println!("{:>8}  message   {}", format_time(self.position_ms), text);
    }
}

fn format_time(ms: u64) -> String {
    let seconds = ms / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn fail(message: String) -> ! {
    eprintln!("{}", message);
    process::exit(1);
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut config_path = default_config_path();
    if args.first().map(String::as_str) == Some("--config") {
        if args.len() < 2 {
            fail(USAGE.to_string());
        }
        config_path = PathBuf::from(&args[1]);
        args = args.split_off(2);
    }

    let config = load_config(&config_path);
    let mut store = PatternStore::open(FileStorage::new(&config.library_path));

    let command = args.first().map(String::as_str);
    let argument = args.get(1);

    match (command, argument) {
        (Some("list"), _) => {
            let songs = &store.library().songs;
            println!("{} song{} recorded", songs.len(), if songs.len() == 1 { "" } else { "s" });
            for pattern in songs.values() {
                println!(
                    "{}  {} - {}  ({} events)",
                    pattern.track_id,
                    pattern.track_name,
                    pattern.artist_name,
                    pattern.events.len()
                );
            }
        }
        (Some("export"), output) => {
            let json = match export_library(store.library()) {
                Ok(json) => json,
                Err(e) => fail(format!("Export failed: {}", e)),
            };
            let path = output.cloned().unwrap_or_else(export_file_name);
            if let Err(e) = fs::write(&path, &json) {
                fail(format!("Error writing to '{}': {}", path, e));
            }
            eprintln!("Wrote pattern library to {}", path);
        }
        (Some("import"), Some(path)) => {
            let json = match fs::read_to_string(path) {
                Ok(json) => json,
                Err(e) => fail(format!("Error reading file '{}': {}", path, e)),
            };
            match import_library(&mut store, &json) {
                Ok(()) => eprintln!("Library imported successfully!"),
                Err(e) => fail(format!("Failed to import library. {}", e)),
            }
        }
        (Some("delete"), Some(track_id)) => {
            if store.delete_song(track_id).is_none() {
                fail(format!("No pattern recorded for '{}'", track_id));
            }
            eprintln!("Deleted pattern for {}", track_id);
        }
        (Some("replay"), Some(track_id)) => {
            let mut scheduler = Scheduler::new();
            let source = scheduler.load_for_track(&store, track_id);
            println!("Replaying {} ({:?} pattern)", track_id, source);

            // The playback feed polls about once a second.
            let mut sink = PrintSink { position_ms: 0 };
            for position_ms in scheduler.poll_positions(POLL_INTERVAL_MS) {
                sink.position_ms = position_ms;
                scheduler.tick(position_ms, true, &mut sink);
            }
        }
        _ => fail(USAGE.to_string()),
    }
}
