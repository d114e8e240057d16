//! Platform-agnostic media source trait
//!
//! Abstracts the playable audio/video object the control surface wraps
//! (an HTML media element in browsers, a decoder handle elsewhere).

use crate::error::ControlsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform-agnostic media source
///
/// The controller observes and drives the source but never owns playback
/// itself. Times are seconds; volume is linear in [0, 1].
pub trait MediaSource {
    /// Request playback
    fn play(&mut self);

    /// Request pause
    fn pause(&mut self);

    /// Reload the media resource
    fn load(&mut self);

    /// Current playback position in seconds
    fn current_time(&self) -> f64;

    /// Move the playback position (no bounds validation)
    fn set_current_time(&mut self, seconds: f64);

    /// Current volume in [0, 1]
    fn volume(&self) -> f64;

    /// Set the volume (already validated by the controller)
    fn set_volume(&mut self, volume: f64);

    /// Total duration in seconds
    ///
    /// May be NaN while metadata is loading; consumers treat that as 0.
    fn duration(&self) -> f64;

    /// Whether the source reports itself paused
    fn is_paused(&self) -> bool;

    /// Source-reported readiness
    fn ready_state(&self) -> ReadyState;

    /// Buffered time ranges in ascending order
    fn buffered(&self) -> Vec<TimeRange>;

    /// Kind of media element, or `None` if this is not a recognised media element
    fn kind(&self) -> Option<MediaKind>;
}

/// Kind of bound media element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// Presentation flag applied to the container
    pub fn flag(self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }

    /// Whether fullscreen makes sense for this kind of media
    pub fn supports_fullscreen(self) -> bool {
        matches!(self, MediaKind::Video)
    }
}

/// Media readiness, mirroring the five HTML media ready states
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ReadyState {
    #[default]
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

impl From<u16> for ReadyState {
    fn from(code: u16) -> Self {
        match code {
            1 => ReadyState::HaveMetadata,
            2 => ReadyState::HaveCurrentData,
            3 => ReadyState::HaveFutureData,
            4 => ReadyState::HaveEnoughData,
            _ => ReadyState::HaveNothing,
        }
    }
}

/// A buffered span of media, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

/// Events relayed from the media source onto the event bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaEvent {
    Abort,
    CanPlay,
    CanPlayThrough,
    Click,
    DurationChange,
    Emptied,
    Ended,
    Error,
    LoadedData,
    LoadedMetadata,
    LoadStart,
    Pause,
    Play,
    Playing,
    Progress,
    RateChange,
    Seeked,
    Seeking,
    Stalled,
    Suspend,
    TimeUpdate,
    VolumeChange,
    Waiting,
}

impl MediaEvent {
    /// Every relayed event, in the order hosts should attach listeners
    pub const ALL: [MediaEvent; 23] = [
        MediaEvent::Abort,
        MediaEvent::CanPlay,
        MediaEvent::CanPlayThrough,
        MediaEvent::Click,
        MediaEvent::DurationChange,
        MediaEvent::Emptied,
        MediaEvent::Ended,
        MediaEvent::Error,
        MediaEvent::LoadedData,
        MediaEvent::LoadedMetadata,
        MediaEvent::LoadStart,
        MediaEvent::Pause,
        MediaEvent::Play,
        MediaEvent::Playing,
        MediaEvent::Progress,
        MediaEvent::RateChange,
        MediaEvent::Seeked,
        MediaEvent::Seeking,
        MediaEvent::Stalled,
        MediaEvent::Suspend,
        MediaEvent::TimeUpdate,
        MediaEvent::VolumeChange,
        MediaEvent::Waiting,
    ];

    /// Event name as emitted on the bus
    pub fn as_str(self) -> &'static str {
        match self {
            MediaEvent::Abort => "abort",
            MediaEvent::CanPlay => "canplay",
            MediaEvent::CanPlayThrough => "canplaythrough",
            MediaEvent::Click => "click",
            MediaEvent::DurationChange => "durationchange",
            MediaEvent::Emptied => "emptied",
            MediaEvent::Ended => "ended",
            MediaEvent::Error => "error",
            MediaEvent::LoadedData => "loadeddata",
            MediaEvent::LoadedMetadata => "loadedmetadata",
            MediaEvent::LoadStart => "loadstart",
            MediaEvent::Pause => "pause",
            MediaEvent::Play => "play",
            MediaEvent::Playing => "playing",
            MediaEvent::Progress => "progress",
            MediaEvent::RateChange => "ratechange",
            MediaEvent::Seeked => "seeked",
            MediaEvent::Seeking => "seeking",
            MediaEvent::Stalled => "stalled",
            MediaEvent::Suspend => "suspend",
            MediaEvent::TimeUpdate => "timeupdate",
            MediaEvent::VolumeChange => "volumechange",
            MediaEvent::Waiting => "waiting",
        }
    }
}

impl fmt::Display for MediaEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaEvent {
    type Err = ControlsError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        MediaEvent::ALL
            .iter()
            .copied()
            .find(|event| event.as_str() == name)
            .ok_or_else(|| ControlsError::UnknownMediaEvent(name.to_string()))
    }
}

/// In-memory media source for unit tests
#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct DummyMedia {
    pub current_time: f64,
    pub duration: f64,
    pub volume: f64,
    pub paused: bool,
    pub buffered: Vec<TimeRange>,
    pub ready_state: ReadyState,
    pub kind: Option<MediaKind>,
    pub loads: usize,
}

#[cfg(test)]
impl DummyMedia {
    pub fn new(duration: f64) -> Self {
        Self {
            current_time: 0.0,
            duration,
            volume: 1.0,
            paused: true,
            buffered: Vec::new(),
            ready_state: ReadyState::HaveEnoughData,
            kind: Some(MediaKind::Video),
            loads: 0,
        }
    }
}

#[cfg(test)]
impl MediaSource for DummyMedia {
    fn play(&mut self) {
        self.paused = false;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn load(&mut self) {
        self.loads += 1;
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.current_time = seconds;
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    fn buffered(&self) -> Vec<TimeRange> {
        self.buffered.clone()
    }

    fn kind(&self) -> Option<MediaKind> {
        self.kind
    }
}
