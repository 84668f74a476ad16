//! # Input Events
//!
//! Discrete notifications delivered to the session's `handle_input` entry
//! point, and the transport requests it can emit in response.

use crate::config::KeyBindings;

/// A user input notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A key press, named like `KeyboardEvent.key`.
    Key(String),
    StartRecording,
    StopRecording,
    ToggleRecording,
    PlayPause,
    SkipNext,
    SkipPrevious,
}

impl InputEvent {
    pub fn key(name: impl Into<String>) -> Self {
        InputEvent::Key(name.into())
    }
}

/// What a key press means under the current bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Intensity(u8),
    Message(String),
    ToggleRecording,
}

/// Requests for the playback/transport collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCommand {
    TogglePlay,
    SkipNext,
    SkipPrevious,
    /// Nothing is loaded yet; start the workout playlist.
    StartPlaylist,
}

impl KeyBindings {
    /// Resolve a key name. Unbound keys yield `None`.
    pub fn resolve(&self, key: &str) -> Option<KeyAction> {
        if self.toggle_recording.iter().any(|k| k == key) {
            return Some(KeyAction::ToggleRecording);
        }
        if self.digit_intensity {
            if let Some(level) = digit_level(key) {
                return Some(KeyAction::Intensity(level));
            }
        }
        self.messages.get(key).map(|text| KeyAction::Message(text.clone()))
    }
}

/// `1`..`9` map to their value, `0` maps to 10.
fn digit_level(key: &str) -> Option<u8> {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some('0'), None) => Some(10),
        (Some(c), None) => c.to_digit(10).map(|d| d as u8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_map_to_intensity() {
        let bindings = KeyBindings::default();
        assert_eq!(bindings.resolve("1"), Some(KeyAction::Intensity(1)));
        assert_eq!(bindings.resolve("9"), Some(KeyAction::Intensity(9)));
        assert_eq!(bindings.resolve("0"), Some(KeyAction::Intensity(10)));
        assert_eq!(bindings.resolve("10"), None);
    }

    #[test]
    fn test_message_and_toggle_keys() {
        let bindings = KeyBindings::default();
        assert_eq!(bindings.resolve("Enter"), Some(KeyAction::Message("PUSH IT!".to_string())));
        assert_eq!(bindings.resolve(" "), Some(KeyAction::Message("KEEP GOING!".to_string())));
        assert_eq!(bindings.resolve("r"), Some(KeyAction::ToggleRecording));
        assert_eq!(bindings.resolve("q"), None);
    }

    #[test]
    fn test_digits_can_be_disabled() {
        let bindings = KeyBindings {
            digit_intensity: false,
            ..KeyBindings::default()
        };
        assert_eq!(bindings.resolve("5"), None);
    }
}
