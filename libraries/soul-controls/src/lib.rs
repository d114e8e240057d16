//! Soul Player - Media Controls
//!
//! Platform-agnostic control surface for a media element: play/pause,
//! scrubber, volume slider, mute and fullscreen, kept in sync with the
//! underlying media source.
//!
//! This crate provides:
//! - Drag mapping (pointer motion to a clamped, normalized value)
//! - UI synchronization (progress, buffering, volume and toolbar layout)
//! - A name-keyed publish/subscribe event bus
//! - The playback controller state machine tying them together
//!
//! # Architecture
//!
//! `soul-controls` never touches a real widget toolkit. The host provides:
//! - a [`MediaSource`] (the playable object)
//! - a [`View`] (measurement via [`Layout`], presentation via [`Presenter`])
//! - a [`SlotMap`] naming which element is the scrubber, the toolbar, ...
//! - optionally a [`Fullscreen`] capability
//!
//! Everything is synchronous and callback-driven: the host forwards media
//! events, window resizes and pointer input, and the controller applies
//! the results before returning.
//!
//! # Example: Event Bus
//!
//! ```rust
//! use soul_controls::{EventBus, MediaKind, PlaybackSession, ReadyState};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let bus = EventBus::new();
//! let ended = Arc::new(AtomicUsize::new(0));
//!
//! let counter = Arc::clone(&ended);
//! bus.subscribe("ended", move |_| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! })
//! .unwrap();
//!
//! // Names outside [a-z0-9.*-] are refused
//! assert!(bus.subscribe("not valid", |_| {}).is_err());
//!
//! let session = PlaybackSession::new(MediaKind::Video, ReadyState::HaveNothing);
//! bus.emit("ended", &[], &session);
//! bus.emit("nobody-listens", &[], &session);
//!
//! assert_eq!(ended.load(Ordering::SeqCst), 1);
//! ```
//!
//! # Example: Drag Mapping
//!
//! ```rust
//! use soul_controls::{drag::map_point, Measurement};
//!
//! // A 400px scrubber starting 100px from the left
//! let scrubber = Measurement { width: 400.0, height: 10.0, left: 100.0, top: 500.0 };
//!
//! assert_eq!(map_point(&scrubber, 200.0, 505.0).x, 0.25);
//! // Far outside the surface clamps to the edge
//! assert_eq!(map_point(&scrubber, 9000.0, 505.0).x, 1.0);
//! ```

mod controller;
pub mod drag;
mod error;
pub mod events;
pub mod media;
pub mod sync;
pub mod types;
pub mod view;

#[cfg(feature = "wasm")]
pub mod wasm;

// Public exports
pub use controller::{PlaybackController, SurfaceTarget};
pub use drag::{DragMapper, DragPoint, PointerButton, PointerEvent, PointerKind};
pub use error::{ControlsError, Result};
pub use events::{EventBus, EventContext, Handler, SubscriptionId, UPDATE_UI_EVENT};
pub use media::{MediaEvent, MediaKind, MediaSource, ReadyState, TimeRange};
pub use sync::{UiSnapshot, UiSynchronizer};
pub use types::{ControlLabels, ControlsConfig, PlaybackSession, PlaybackState};
pub use view::{
    ElementBox, ElementId, Extent, Fullscreen, Layout, Measurement, Orientation, Presenter, Slot,
    SlotMap, View,
};
