//! Core types for the control surface

use crate::media::{MediaKind, ReadyState};
use serde::{Deserialize, Serialize};

/// Playback state as driven by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Paused (the initial state)
    #[default]
    Paused,

    /// Playing
    Playing,
}

/// State of one bound media source
///
/// The controller is the only writer. Event handlers see a shared
/// reference to it as their context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSession {
    /// Kind of the bound media element
    pub kind: MediaKind,

    /// Whether the last play/pause request (or source event) was a play
    pub playing: bool,

    /// Whether the container is currently fullscreen
    pub is_fullscreen: bool,

    /// Volume cached by the mute toggle, restored on unmute
    pub previous_volume: Option<f64>,

    /// Mirror of the source-reported readiness
    pub ready_state: ReadyState,
}

impl PlaybackSession {
    pub fn new(kind: MediaKind, ready_state: ReadyState) -> Self {
        Self {
            kind,
            playing: false,
            is_fullscreen: false,
            previous_volume: None,
            ready_state,
        }
    }

    pub fn state(&self) -> PlaybackState {
        if self.playing {
            PlaybackState::Playing
        } else {
            PlaybackState::Paused
        }
    }
}

/// Text shown on the toggle controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlLabels {
    pub play: String,
    pub pause: String,
    pub mute: String,
    pub unmute: String,
    pub fullscreen: String,
    pub exit_fullscreen: String,
}

impl Default for ControlLabels {
    fn default() -> Self {
        Self {
            play: "Play".to_string(),
            pause: "Pause".to_string(),
            mute: "Mute".to_string(),
            unmute: "Unmute".to_string(),
            fullscreen: "Fullscreen".to_string(),
            exit_fullscreen: "Exit Fullscreen".to_string(),
        }
    }
}

/// Configuration for the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Control label text (default: English)
    pub labels: ControlLabels,

    /// Multiplier applied to the toolbar siblings' extent before the
    /// scrubber gets the remainder (default: 1.1)
    pub scrubber_safety_factor: f64,

    /// Volume restored by unmute when nothing was cached (default: 1.0)
    pub unmute_fallback_volume: f64,

    /// Deepest nested emission allowed before the bus drops events (default: 8)
    pub max_emit_depth: usize,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            labels: ControlLabels::default(),
            scrubber_safety_factor: 1.1,
            unmute_fallback_volume: 1.0,
            max_emit_depth: 8,
        }
    }
}
