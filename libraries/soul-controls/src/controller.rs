//! Playback controller - core orchestration
//!
//! Owns the bound media source and coordinates the drag mapper, the UI
//! synchronizer and the event bus. Hosts feed it media events, window
//! resizes and pointer input; it drives the source and the presentation.

use crate::{
    drag::{DragMapper, PointerEvent, SurfaceId},
    error::{ControlsError, Result},
    events::{EventBus, EventContext, SubscriptionId, UPDATE_UI_EVENT},
    media::{MediaEvent, MediaSource},
    sync::{SurfaceState, UiSnapshot, UiSynchronizer},
    types::{ControlsConfig, PlaybackSession, PlaybackState},
    view::{ElementId, Extent, Fullscreen, Slot, SlotMap, View},
};
use serde_json::Value;

/// Presentation flag set on the container while playing
const PLAYING_FLAG: &str = "playing";

/// Presentation flag set on the container while fullscreen
const FULLSCREEN_FLAG: &str = "fullscreen";

/// What a draggable surface controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceTarget {
    /// Scrubber: position within the media
    Seek,
    /// Volume slider: output level
    Volume,
}

/// Elements the controller writes to directly
#[derive(Debug, Clone, Copy)]
struct Controls {
    container: ElementId,
    play_pause: ElementId,
    mute: ElementId,
    play_progress: ElementId,
    volume_fill: ElementId,
    fullscreen: Option<ElementId>,
}

/// Playback controller
///
/// State machine over `Paused`/`Playing` with mute and fullscreen flags.
/// Chaining methods return `&mut Self`.
pub struct PlaybackController<M, V> {
    media: M,
    view: V,
    slots: SlotMap,
    controls: Controls,
    config: ControlsConfig,
    session: PlaybackSession,
    bus: EventBus,
    drag: DragMapper<SurfaceTarget>,
    scrubber: SurfaceId,
    volume_slider: SurfaceId,
    synchronizer: UiSynchronizer,
    fullscreen: Option<Box<dyn Fullscreen>>,
    last_snapshot: UiSnapshot,
}

impl<M: MediaSource, V: View> PlaybackController<M, V> {
    /// Bind a media source to a placed set of controls
    ///
    /// Fails with [`ControlsError::InvalidMediaSource`] if the source is not
    /// a recognised media element and [`ControlsError::MissingSlot`] if a
    /// required control was never placed. Runs one synchronizer pass.
    pub fn bind(media: M, mut view: V, slots: SlotMap, config: ControlsConfig) -> Result<Self> {
        let kind = media.kind().ok_or(ControlsError::InvalidMediaSource)?;

        for slot in Slot::REQUIRED {
            slots.require(slot)?;
        }

        let controls = Controls {
            container: slots.require(Slot::Container)?,
            play_pause: slots.require(Slot::PlayPause)?,
            mute: slots.require(Slot::Mute)?,
            play_progress: slots.require(Slot::PlayProgress)?,
            volume_fill: slots.require(Slot::VolumeSliderInner)?,
            fullscreen: slots.get(Slot::Fullscreen),
        };

        let synchronizer = UiSynchronizer::new(&slots, config.scrubber_safety_factor)?;

        let mut drag = DragMapper::new();
        let scrubber = drag.bind(slots.require(Slot::Scrubber)?, SurfaceTarget::Seek, &view);
        let volume_slider = drag.bind(
            slots.require(Slot::VolumeSlider)?,
            SurfaceTarget::Volume,
            &view,
        );

        view.set_flag(controls.container, kind.flag(), true);
        view.set_label(controls.play_pause, &config.labels.play);
        view.set_label(controls.mute, &config.labels.mute);

        let session = PlaybackSession::new(kind, media.ready_state());
        let bus = EventBus::with_max_depth(config.max_emit_depth);

        tracing::debug!(?kind, "Bound media source");

        let mut controller = Self {
            media,
            view,
            slots,
            controls,
            config,
            session,
            bus,
            drag,
            scrubber,
            volume_slider,
            synchronizer,
            fullscreen: None,
            last_snapshot: UiSnapshot::default(),
        };
        controller.sync();
        Ok(controller)
    }

    /// Attach the host's fullscreen capability
    ///
    /// Only takes effect for video, and only while the capability reports
    /// itself available.
    pub fn with_fullscreen(mut self, fullscreen: Box<dyn Fullscreen>) -> Self {
        self.fullscreen = Some(fullscreen);
        if self.fullscreen_enabled() {
            if let Some(button) = self.controls.fullscreen {
                self.view.set_label(button, &self.config.labels.fullscreen);
            }
        }
        self
    }

    /// Tear down the session and hand back the collaborators
    ///
    /// Drops every subscription and drag surface.
    pub fn into_parts(self) -> (M, V) {
        self.bus.clear();
        (self.media, self.view)
    }

    // ===== Playback =====

    /// Start playback
    pub fn play(&mut self) -> &mut Self {
        self.media.play();
        self.apply_playing(true);
        self
    }

    /// Pause playback
    pub fn pause(&mut self) -> &mut Self {
        self.media.pause();
        self.apply_playing(false);
        self
    }

    /// Play if the source reports paused, pause otherwise
    pub fn playpause(&mut self) -> &mut Self {
        if self.media.is_paused() {
            self.play()
        } else {
            self.pause()
        }
    }

    /// Reload the media resource
    pub fn load(&mut self) -> &mut Self {
        self.media.load();
        self
    }

    /// Seek to `seconds` (fractional allowed, not checked against the duration)
    pub fn jump_to(&mut self, seconds: f64) -> &mut Self {
        self.media.set_current_time(seconds);
        self.sync()
    }

    /// Record the play/pause state and reflect it in the presentation
    fn apply_playing(&mut self, playing: bool) {
        if self.session.playing != playing {
            tracing::debug!(playing, "Playback state changed");
        }
        self.session.playing = playing;

        let label = if playing {
            &self.config.labels.pause
        } else {
            &self.config.labels.play
        };
        self.view.set_label(self.controls.play_pause, label);
        self.view
            .set_flag(self.controls.container, PLAYING_FLAG, playing);
    }

    // ===== Volume =====

    /// Current volume
    pub fn volume(&self) -> f64 {
        self.media.volume()
    }

    /// Set the volume
    ///
    /// Fails with [`ControlsError::InvalidVolume`] for NaN, infinite or
    /// out-of-range levels, leaving everything unchanged. Setting exactly 0
    /// relabels the mute control; positive levels do not relabel it back.
    pub fn set_volume(&mut self, volume: f64) -> Result<&mut Self> {
        if !volume.is_finite() || !(0.0..=1.0).contains(&volume) {
            return Err(ControlsError::InvalidVolume(volume));
        }

        if volume == 0.0 {
            self.view
                .set_label(self.controls.mute, &self.config.labels.unmute);
        }

        self.media.set_volume(volume);
        Ok(self)
    }

    /// Whether the volume is at 0
    pub fn is_muted(&self) -> bool {
        self.media.volume() <= 0.0
    }

    /// Mute, caching the current level, or restore the cached level
    ///
    /// Unmuting with nothing cached restores
    /// [`ControlsConfig::unmute_fallback_volume`].
    pub fn toggle_mute(&mut self) -> Result<&mut Self> {
        let current = self.media.volume();
        if current > 0.0 {
            self.session.previous_volume = Some(current);
            self.set_volume(0.0)?;
            tracing::debug!(previous = current, "Muted");
        } else {
            let restore = self
                .session
                .previous_volume
                .unwrap_or(self.config.unmute_fallback_volume);
            self.set_volume(restore)?;
            self.view
                .set_label(self.controls.mute, &self.config.labels.mute);
            tracing::debug!(restored = restore, "Unmuted");
        }
        Ok(self)
    }

    // ===== Fullscreen =====

    /// Whether fullscreen is offered for this session
    pub fn fullscreen_enabled(&self) -> bool {
        self.session.kind.supports_fullscreen()
            && self
                .fullscreen
                .as_ref()
                .is_some_and(|fullscreen| fullscreen.is_available())
    }

    /// Enter or leave fullscreen
    ///
    /// A no-op when fullscreen is not offered.
    pub fn toggle_fullscreen(&mut self) -> &mut Self {
        if !self.fullscreen_enabled() {
            tracing::debug!(kind = ?self.session.kind, "Fullscreen not available, ignoring toggle");
            return self;
        }
        let Some(fullscreen) = self.fullscreen.as_mut() else {
            return self;
        };

        let entering = !self.session.is_fullscreen;
        if entering {
            fullscreen.request(self.controls.container);
        } else {
            fullscreen.cancel();
        }
        self.session.is_fullscreen = entering;

        self.view
            .set_flag(self.controls.container, FULLSCREEN_FLAG, entering);
        if let Some(button) = self.controls.fullscreen {
            let label = if entering {
                &self.config.labels.exit_fullscreen
            } else {
                &self.config.labels.fullscreen
            };
            self.view.set_label(button, label);
        }

        tracing::debug!(fullscreen = entering, "Fullscreen toggled");
        self
    }

    // ===== Events =====

    /// Subscribe a handler and keep its id for [`Self::off`]
    ///
    /// The bus methods only need `&self`, so handlers can be registered
    /// while other parts of the controller are borrowed.
    pub fn subscribe<F>(&self, name: &str, handler: F) -> Result<SubscriptionId>
    where
        F: Fn(&EventContext<'_>) + Send + Sync + 'static,
    {
        self.bus.subscribe(name, handler)
    }

    /// Subscribe a handler to a named event
    pub fn on<F>(&self, name: &str, handler: F) -> Result<&Self>
    where
        F: Fn(&EventContext<'_>) + Send + Sync + 'static,
    {
        self.bus.subscribe(name, handler)?;
        Ok(self)
    }

    /// Remove a handler
    pub fn off(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Emit a named event to every subscribed handler
    pub fn emit(&self, name: &str, args: &[Value]) -> &Self {
        self.bus.emit(name, args, &self.session);
        self
    }

    /// Another handle onto this controller's event bus
    pub fn events(&self) -> EventBus {
        self.bus.clone()
    }

    /// Relay one media-source event
    ///
    /// Refreshes the mirrored session state, runs a synchronizer pass,
    /// toggles playback on `click`, then re-emits the event by name.
    pub fn handle_media_event(&mut self, event: MediaEvent) -> &mut Self {
        self.session.ready_state = self.media.ready_state();

        match event {
            MediaEvent::Play | MediaEvent::Playing => self.apply_playing(true),
            MediaEvent::Pause => self.apply_playing(false),
            MediaEvent::Error => tracing::warn!("Media source reported an error"),
            _ => {}
        }

        self.sync();

        if event == MediaEvent::Click {
            self.playpause();
        }

        self.bus.emit(event.as_str(), &[], &self.session);
        self
    }

    /// Relay a media-source event by its DOM name
    pub fn handle_media_event_name(&mut self, name: &str) -> Result<&mut Self> {
        let event = name.parse::<MediaEvent>()?;
        Ok(self.handle_media_event(event))
    }

    /// Relayout after the host window changed size
    pub fn handle_resize(&mut self) -> &mut Self {
        self.sync()
    }

    // ===== Pointer =====

    /// Feed pointer input to the scrubber and volume slider
    ///
    /// `target` is the element under the pointer. Values produced by a
    /// drag are written back as a seek or a volume change, and the
    /// dragged fill is updated directly.
    pub fn handle_pointer(
        &mut self,
        event: PointerEvent,
        target: Option<ElementId>,
    ) -> Result<&mut Self> {
        let updates = self.drag.handle_pointer(&event, target, &self.view);

        for update in updates {
            let value = update.value();
            match update.target {
                SurfaceTarget::Seek => {
                    self.view.set_extent(
                        self.controls.play_progress,
                        update.orientation,
                        Extent::Percent(value * 100.0),
                    );
                    let duration = self.media.duration();
                    if duration.is_finite() && duration > 0.0 {
                        self.jump_to(value * duration);
                    }
                }
                SurfaceTarget::Volume => {
                    self.view.set_extent(
                        self.controls.volume_fill,
                        update.orientation,
                        Extent::Percent(value * 100.0),
                    );
                    self.set_volume(value)?;
                }
            }
        }

        Ok(self)
    }

    /// Whether a surface is mid-drag
    pub fn is_dragging(&self, target: SurfaceTarget) -> bool {
        let id = match target {
            SurfaceTarget::Seek => self.scrubber,
            SurfaceTarget::Volume => self.volume_slider,
        };
        self.drag.is_dragging(id)
    }

    /// End any drag in progress (for blur / visibility loss)
    pub fn cancel_drags(&mut self) -> &mut Self {
        self.drag.cancel_all();
        self
    }

    // ===== Synchronization =====

    fn surface_state(&self, id: SurfaceId) -> SurfaceState {
        self.drag
            .surface(id)
            .map(|surface| SurfaceState {
                orientation: surface.orientation(),
                dragging: surface.is_dragging(),
            })
            .unwrap_or_default()
    }

    /// Run one synchronizer pass and announce it with `"updateui"`
    pub fn sync(&mut self) -> &mut Self {
        let scrubber = self.surface_state(self.scrubber);
        let volume = self.surface_state(self.volume_slider);

        self.last_snapshot = self
            .synchronizer
            .sync(&self.media, &mut self.view, scrubber, volume);
        self.bus.emit(UPDATE_UI_EVENT, &[], &self.session);
        self
    }

    // ===== Accessors =====

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn state(&self) -> PlaybackState {
        self.session.state()
    }

    /// Snapshot computed by the most recent synchronizer pass
    pub fn last_snapshot(&self) -> &UiSnapshot {
        &self.last_snapshot
    }

    pub fn config(&self) -> &ControlsConfig {
        &self.config
    }

    pub fn slots(&self) -> &SlotMap {
        &self.slots
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    /// Direct access to the source; call [`Self::sync`] after changing it
    pub fn media_mut(&mut self) -> &mut M {
        &mut self.media
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }
}
