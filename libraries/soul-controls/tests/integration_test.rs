//! Integration tests for the playback controller
//!
//! These tests drive the controller through its public surface only,
//! with in-memory collaborators standing in for the host.

use soul_controls::{
    ControlsConfig, ControlsError, ElementBox, ElementId, Extent, Fullscreen, Layout, MediaEvent,
    MediaKind, MediaSource, Orientation, PlaybackController, PlaybackState, PointerButton,
    PointerEvent, Presenter, ReadyState, Slot, SlotMap, SurfaceTarget, TimeRange,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ===== Test Helpers =====

/// Mock media element
#[derive(Debug, Clone)]
struct MockMedia {
    current_time: f64,
    duration: f64,
    volume: f64,
    paused: bool,
    buffered: Vec<TimeRange>,
    ready_state: ReadyState,
    kind: Option<MediaKind>,
}

impl MockMedia {
    fn video(duration: f64) -> Self {
        Self {
            current_time: 0.0,
            duration,
            volume: 1.0,
            paused: true,
            buffered: Vec::new(),
            ready_state: ReadyState::HaveMetadata,
            kind: Some(MediaKind::Video),
        }
    }
}

impl MediaSource for MockMedia {
    fn play(&mut self) {
        self.paused = false;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn load(&mut self) {
        self.current_time = 0.0;
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

/// Mock element tree recording everything applied to it
#[derive(Debug, Default)]
struct MockView {
    boxes: HashMap<ElementId, ElementBox>,
    parents: HashMap<ElementId, ElementId>,
    children: HashMap<ElementId, Vec<ElementId>>,
    extents: HashMap<ElementId, Extent>,
    labels: HashMap<ElementId, String>,
    flags: HashMap<ElementId, Vec<String>>,
}

impl MockView {
    fn add(&mut self, id: u32, parent: Option<u32>, width: f64, height: f64, left: f64, top: f64) {
        let element = ElementId(id);
        self.boxes.insert(
            element,
            ElementBox {
                width,
                height,
                offset_left: left,
                offset_top: top,
            },
        );
        if let Some(parent) = parent {
            self.parents.insert(element, ElementId(parent));
            self.children
                .entry(ElementId(parent))
                .or_default()
                .push(element);
        }
    }

    fn extent(&self, element: ElementId) -> Option<Extent> {
        self.extents.get(&element).copied()
    }

    fn label(&self, element: ElementId) -> Option<&str> {
        self.labels.get(&element).map(String::as_str)
    }

    fn has_flag(&self, element: ElementId, flag: &str) -> bool {
        self.flags
            .get(&element)
            .is_some_and(|flags| flags.iter().any(|f| f == flag))
    }
}

impl Layout for MockView {
    fn element_box(&self, element: ElementId) -> Option<ElementBox> {
        self.boxes.get(&element).copied()
    }

    fn offset_parent(&self, element: ElementId) -> Option<ElementId> {
        self.parents.get(&element).copied()
    }

    fn parent_element(&self, element: ElementId) -> Option<ElementId> {
        self.parents.get(&element).copied()
    }

    fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.children.get(&element).cloned().unwrap_or_default()
    }
}

impl Presenter for MockView {
    fn set_extent(&mut self, element: ElementId, _orientation: Orientation, extent: Extent) {
        self.extents.insert(element, extent);
    }

    fn set_label(&mut self, element: ElementId, text: &str) {
        self.labels.insert(element, text.to_string());
    }

    fn set_flag(&mut self, element: ElementId, flag: &str, on: bool) {
        let flags = self.flags.entry(element).or_default();
        flags.retain(|f| f != flag);
        if on {
            flags.push(flag.to_string());
        }
    }
}

struct MockFullscreen {
    calls: Arc<Mutex<Vec<String>>>,
}

impl Fullscreen for MockFullscreen {
    fn is_available(&self) -> bool {
        true
    }

    fn request(&mut self, element: ElementId) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("request:{}", element.0));
    }

    fn cancel(&mut self) {
        self.calls.lock().unwrap().push("cancel".to_string());
    }
}

const CONTAINER: ElementId = ElementId(1);
const TOOLBAR: ElementId = ElementId(2);
const PLAY_PAUSE: ElementId = ElementId(3);
const ELAPSED: ElementId = ElementId(4);
const SCRUBBER: ElementId = ElementId(5);
const LOAD: ElementId = ElementId(6);
const PLAYED: ElementId = ElementId(7);
const THUMB: ElementId = ElementId(8);
const REMAINING: ElementId = ElementId(9);
const VOLUME_GROUP: ElementId = ElementId(10);
const MUTE: ElementId = ElementId(11);
const VOLUME_SLIDER: ElementId = ElementId(12);
const VOLUME_FILL: ElementId = ElementId(13);
const FULLSCREEN: ElementId = ElementId(14);

/// Standard layout: an 800px toolbar at y=410 holding a play button, the
/// elapsed label, a 400px scrubber at x=100, the remaining label and a
/// volume group with a vertical 100px slider at x=700.
fn standard_controls() -> (SlotMap, MockView) {
    let mut slots = SlotMap::new();
    for (slot, element) in [
        (Slot::Container, CONTAINER),
        (Slot::Toolbar, TOOLBAR),
        (Slot::PlayPause, PLAY_PAUSE),
        (Slot::Elapsed, ELAPSED),
        (Slot::Scrubber, SCRUBBER),
        (Slot::LoadProgress, LOAD),
        (Slot::PlayProgress, PLAYED),
        (Slot::Thumb, THUMB),
        (Slot::Remaining, REMAINING),
        (Slot::VolumeGroup, VOLUME_GROUP),
        (Slot::Mute, MUTE),
        (Slot::VolumeSlider, VOLUME_SLIDER),
        (Slot::VolumeSliderInner, VOLUME_FILL),
        (Slot::Fullscreen, FULLSCREEN),
    ] {
        slots.place(slot, element).unwrap();
    }

    let mut view = MockView::default();
    view.add(1, None, 800.0, 450.0, 0.0, 0.0);
    view.add(2, Some(1), 800.0, 40.0, 0.0, 410.0);
    view.add(3, Some(2), 50.0, 40.0, 0.0, 0.0);
    view.add(4, Some(2), 40.0, 40.0, 50.0, 0.0);
    view.add(5, Some(2), 400.0, 10.0, 100.0, 15.0);
    view.add(8, Some(5), 10.0, 10.0, 0.0, 0.0);
    view.add(9, Some(2), 40.0, 40.0, 510.0, 0.0);
    view.add(10, Some(2), 120.0, 40.0, 600.0, 0.0);
    view.add(12, Some(10), 10.0, 100.0, 100.0, -60.0);
    view.add(14, Some(2), 60.0, 40.0, 740.0, 0.0);
    (slots, view)
}

fn bind(media: MockMedia) -> PlaybackController<MockMedia, MockView> {
    let (slots, view) = standard_controls();
    PlaybackController::bind(media, view, slots, ControlsConfig::default()).unwrap()
}

fn counter(
    controller: &PlaybackController<MockMedia, MockView>,
    name: &str,
) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    controller
        .on(name, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    count
}

// ===== Binding =====

#[test]
fn bind_then_jump_updates_progress_and_announces() {
    let mut media = MockMedia::video(200.0);
    media.current_time = 50.0;
    let mut controller = bind(media);

    assert_eq!(controller.last_snapshot().play_percentage, 25.0);
    assert_eq!(controller.view().extent(PLAYED), Some(Extent::Percent(25.0)));

    let updates = counter(&controller, "updateui");
    controller.jump_to(150.0);

    assert_eq!(controller.last_snapshot().play_percentage, 75.0);
    assert_eq!(controller.view().extent(PLAYED), Some(Extent::Percent(75.0)));
    assert_eq!(updates.load(Ordering::SeqCst), 1);
}

#[test]
fn non_media_source_is_rejected() {
    let mut media = MockMedia::video(10.0);
    media.kind = None;
    let (slots, view) = standard_controls();

    let result = PlaybackController::bind(media, view, slots, ControlsConfig::default());
    assert!(matches!(result, Err(ControlsError::InvalidMediaSource)));
}

#[test]
fn reused_slot_is_rejected() {
    let (mut slots, _view) = standard_controls();
    let err = slots.place(Slot::Scrubber, ElementId(99)).unwrap_err();
    assert_eq!(err, ControlsError::DuplicatePlacement(Slot::Scrubber));
}

#[test]
fn buffered_progress_uses_furthest_range() {
    let mut media = MockMedia::video(100.0);
    media.buffered = vec![TimeRange::new(0.0, 10.0), TimeRange::new(20.0, 55.0)];
    let controller = bind(media);

    assert_eq!(controller.last_snapshot().load_percentage, 55.0);
    assert_eq!(controller.view().extent(LOAD), Some(Extent::Percent(55.0)));
}

#[test]
fn toolbar_space_goes_to_scrubber() {
    let controller = bind(MockMedia::video(100.0));

    // Siblings: 50 + 40 + 40 + 120 + 60 = 310, inflated by 1.1 = 341
    let space = controller.last_snapshot().available_scrubber_space;
    assert!((space - 459.0).abs() < 1e-9);
    assert_eq!(controller.view().extent(SCRUBBER), Some(Extent::Pixels(space)));
}

#[test]
fn clock_labels_follow_playback() {
    let mut media = MockMedia::video(3725.0);
    media.current_time = 65.0;
    let controller = bind(media);

    assert_eq!(controller.view().label(ELAPSED), Some("1:05"));
    assert_eq!(controller.view().label(REMAINING), Some("1:01:00"));
}

// ===== Playback =====

#[test]
fn play_pause_cycle_updates_presentation() {
    let mut controller = bind(MockMedia::video(100.0));

    controller.play();
    assert_eq!(controller.state(), PlaybackState::Playing);
    assert_eq!(controller.view().label(PLAY_PAUSE), Some("Pause"));
    assert!(controller.view().has_flag(CONTAINER, "playing"));

    controller.pause();
    assert_eq!(controller.state(), PlaybackState::Paused);
    assert_eq!(controller.view().label(PLAY_PAUSE), Some("Play"));
    assert!(!controller.view().has_flag(CONTAINER, "playing"));
}

#[test]
fn chained_calls() {
    let mut controller = bind(MockMedia::video(100.0));
    controller.play().jump_to(30.0).pause().load();

    assert_eq!(controller.state(), PlaybackState::Paused);
    assert_eq!(controller.media().current_time, 0.0);
}

#[test]
fn clicking_the_media_toggles_playback_before_relay() {
    let mut controller = bind(MockMedia::video(100.0));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);
    controller
        .on("click", move |ctx| s.lock().unwrap().push(ctx.session.playing))
        .unwrap();

    controller.handle_media_event(MediaEvent::Click);
    controller.handle_media_event(MediaEvent::Click);

    assert_eq!(*seen.lock().unwrap(), vec![true, false]);
}

#[test]
fn every_media_event_is_relayed() {
    let mut controller = bind(MockMedia::video(100.0));
    let seen = Arc::new(Mutex::new(Vec::new()));

    for event in MediaEvent::ALL {
        let s = Arc::clone(&seen);
        controller
            .on(event.as_str(), move |ctx| s.lock().unwrap().push(ctx.name.to_string()))
            .unwrap();
    }

    let updates = counter(&controller, "updateui");
    for event in MediaEvent::ALL {
        controller.handle_media_event(event);
    }

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), MediaEvent::ALL.len());
    assert_eq!(seen[7], "error");
    // One synchronizer pass per relayed event
    assert_eq!(updates.load(Ordering::SeqCst), MediaEvent::ALL.len());
}

#[test]
fn ready_state_mirrors_source() {
    let mut controller = bind(MockMedia::video(100.0));
    assert_eq!(controller.session().ready_state, ReadyState::HaveMetadata);

    controller.media_mut().ready_state = ReadyState::HaveEnoughData;
    controller.handle_media_event(MediaEvent::CanPlayThrough);
    assert_eq!(controller.session().ready_state, ReadyState::HaveEnoughData);
}

#[test]
fn ended_source_resyncs_through_pause_event() {
    let mut controller = bind(MockMedia::video(100.0));
    controller.play();

    controller.media_mut().paused = true;
    controller.handle_media_event(MediaEvent::Ended);
    controller.handle_media_event(MediaEvent::Pause);

    assert_eq!(controller.state(), PlaybackState::Paused);
    assert_eq!(controller.view().label(PLAY_PAUSE), Some("Play"));
}

// ===== Volume =====

#[test]
fn volume_bounds() {
    let mut controller = bind(MockMedia::video(100.0));

    assert!(matches!(
        controller.set_volume(-0.1),
        Err(ControlsError::InvalidVolume(_))
    ));
    assert!(matches!(
        controller.set_volume(1.1),
        Err(ControlsError::InvalidVolume(_))
    ));
    assert!(controller.set_volume(0.0).is_ok());
    assert!(controller.set_volume(1.0).is_ok());
}

#[test]
fn rejected_volume_leaves_state_unchanged() {
    let mut controller = bind(MockMedia::video(100.0));
    controller.set_volume(0.4).unwrap();

    assert!(controller.set_volume(f64::NAN).is_err());
    assert_eq!(controller.volume(), 0.4);
    assert_eq!(controller.view().label(MUTE), Some("Mute"));
}

#[test]
fn mute_twice_restores_exact_volume() {
    let mut media = MockMedia::video(100.0);
    media.volume = 0.6;
    let mut controller = bind(media);
    assert_eq!(controller.session().previous_volume, None);

    controller.toggle_mute().unwrap();
    assert_eq!(controller.volume(), 0.0);
    assert_eq!(controller.view().label(MUTE), Some("Unmute"));

    controller.toggle_mute().unwrap();
    assert_eq!(controller.volume(), 0.6);
    assert_eq!(controller.view().label(MUTE), Some("Mute"));
}

#[test]
fn unmute_fallback_is_configurable() {
    let mut media = MockMedia::video(100.0);
    media.volume = 0.0;
    let (slots, view) = standard_controls();
    let config = ControlsConfig {
        unmute_fallback_volume: 0.5,
        ..ControlsConfig::default()
    };
    let mut controller = PlaybackController::bind(media, view, slots, config).unwrap();

    controller.toggle_mute().unwrap();
    assert_eq!(controller.volume(), 0.5);
}

// ===== Dragging =====

#[test]
fn scrubbing_seeks_and_holds_fill_against_sync() {
    let mut controller = bind(MockMedia::video(200.0));

    // Scrubber spans x 100..500
    controller
        .handle_pointer(PointerEvent::down(300.0, 430.0), Some(SCRUBBER))
        .unwrap();
    assert!(controller.is_dragging(SurfaceTarget::Seek));
    assert_eq!(controller.media().current_time, 100.0);

    // Playback keeps reporting time while the user holds the thumb
    controller.media_mut().current_time = 180.0;
    controller.handle_media_event(MediaEvent::TimeUpdate);
    controller.jump_to(20.0);
    assert_eq!(controller.view().extent(PLAYED), Some(Extent::Percent(50.0)));

    controller
        .handle_pointer(PointerEvent::moved(450.0, 0.0), None)
        .unwrap();
    assert_eq!(controller.media().current_time, 175.0);
    assert_eq!(controller.view().extent(PLAYED), Some(Extent::Percent(87.5)));

    controller
        .handle_pointer(PointerEvent::up(450.0, 0.0), None)
        .unwrap();
    controller.handle_media_event(MediaEvent::TimeUpdate);
    assert_eq!(controller.view().extent(PLAYED), Some(Extent::Percent(87.5)));
    assert!(!controller.is_dragging(SurfaceTarget::Seek));
}

#[test]
fn pressing_the_thumb_scrubs() {
    let mut controller = bind(MockMedia::video(100.0));
    controller
        .handle_pointer(PointerEvent::down(100.0, 430.0), Some(THUMB))
        .unwrap();
    assert!(controller.is_dragging(SurfaceTarget::Seek));
    assert_eq!(controller.media().current_time, 0.0);
}

#[test]
fn vertical_volume_slider_reads_upwards() {
    let mut controller = bind(MockMedia::video(100.0));

    // Slider spans y 350..450 (toolbar 410 + group 0 - 60)
    controller
        .handle_pointer(PointerEvent::down(705.0, 425.0), Some(VOLUME_SLIDER))
        .unwrap();
    assert!((controller.volume() - 0.25).abs() < 1e-9);

    controller
        .handle_pointer(PointerEvent::moved(705.0, 350.0), None)
        .unwrap();
    assert_eq!(controller.volume(), 1.0);

    controller
        .handle_pointer(PointerEvent::moved(705.0, 999.0), None)
        .unwrap();
    assert_eq!(controller.volume(), 0.0);
    assert_eq!(controller.view().label(MUTE), Some("Unmute"));
}

#[test]
fn secondary_button_never_starts_a_drag() {
    let mut controller = bind(MockMedia::video(100.0));
    let event = PointerEvent::down(300.0, 430.0).with_button(PointerButton::Auxiliary);
    controller.handle_pointer(event, Some(SCRUBBER)).unwrap();

    assert!(!controller.is_dragging(SurfaceTarget::Seek));
    assert_eq!(controller.media().current_time, 0.0);
}

#[test]
fn lost_pointer_up_can_be_recovered() {
    let mut controller = bind(MockMedia::video(100.0));
    controller
        .handle_pointer(PointerEvent::down(300.0, 430.0), Some(SCRUBBER))
        .unwrap();

    controller.cancel_drags();
    assert!(!controller.is_dragging(SurfaceTarget::Seek));

    controller
        .handle_pointer(PointerEvent::moved(100.0, 430.0), None)
        .unwrap();
    assert_eq!(controller.media().current_time, 50.0);
}

#[test]
fn scrubbing_unknown_duration_does_not_seek() {
    let mut media = MockMedia::video(f64::NAN);
    media.current_time = 3.0;
    let mut controller = bind(media);

    controller
        .handle_pointer(PointerEvent::down(300.0, 430.0), Some(SCRUBBER))
        .unwrap();
    assert_eq!(controller.media().current_time, 3.0);
}

// ===== Fullscreen =====

#[test]
fn fullscreen_round_trip() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut controller = bind(MockMedia::video(100.0)).with_fullscreen(Box::new(MockFullscreen {
        calls: Arc::clone(&calls),
    }));
    assert!(controller.fullscreen_enabled());

    controller.toggle_fullscreen();
    assert!(controller.session().is_fullscreen);
    assert!(controller.view().has_flag(CONTAINER, "fullscreen"));
    assert_eq!(controller.view().label(FULLSCREEN), Some("Exit Fullscreen"));

    controller.toggle_fullscreen();
    assert!(!controller.view().has_flag(CONTAINER, "fullscreen"));
    assert_eq!(*calls.lock().unwrap(), vec!["request:1", "cancel"]);
}

#[test]
fn audio_never_goes_fullscreen() {
    let mut media = MockMedia::video(100.0);
    media.kind = Some(MediaKind::Audio);
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut controller = bind(media).with_fullscreen(Box::new(MockFullscreen {
        calls: Arc::clone(&calls),
    }));

    assert!(controller.view().has_flag(CONTAINER, "audio"));
    assert!(!controller.fullscreen_enabled());
    controller.toggle_fullscreen();
    assert!(calls.lock().unwrap().is_empty());
}

// ===== Events =====

#[test]
fn handlers_fire_in_order_once_each() {
    let controller = bind(MockMedia::video(100.0));
    let order = Arc::new(Mutex::new(Vec::new()));

    for tag in ["a", "b"] {
        let o = Arc::clone(&order);
        controller
            .on("play", move |_| o.lock().unwrap().push(tag))
            .unwrap();
    }

    controller.emit("play", &[]);
    assert_eq!(*order.lock().unwrap(), vec!["a", "b"]);
}

#[test]
fn emit_without_handlers_is_harmless() {
    let controller = bind(MockMedia::video(100.0));
    controller.emit("nobody-home", &[]).emit("also.nobody", &[]);
}

#[test]
fn bad_subscriptions_are_refused() {
    let controller = bind(MockMedia::video(100.0));
    assert!(matches!(
        controller.on("time update", |_| {}),
        Err(ControlsError::InvalidEventName(_))
    ));
    assert!(matches!(
        controller.on("", |_| {}),
        Err(ControlsError::InvalidEventName(_))
    ));
}

#[test]
fn off_removes_only_that_handler() {
    let mut controller = bind(MockMedia::video(100.0));
    let kept = counter(&controller, "seeked");

    let dropped = Arc::new(AtomicUsize::new(0));
    let d = Arc::clone(&dropped);
    let id = controller
        .subscribe("seeked", move |_| {
            d.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    assert!(controller.off(id));
    controller.handle_media_event(MediaEvent::Seeked);

    assert_eq!(kept.load(Ordering::SeqCst), 1);
    assert_eq!(dropped.load(Ordering::SeqCst), 0);
}

#[test]
fn handlers_can_emit_through_a_bus_handle() {
    let mut controller = bind(MockMedia::video(100.0));
    let bus = controller.events();
    let follow_ups = counter(&controller, "playlist.next");

    controller
        .on("ended", move |ctx| {
            bus.emit("playlist.next", &[], ctx.session);
        })
        .unwrap();

    controller.handle_media_event(MediaEvent::Ended);
    assert_eq!(follow_ups.load(Ordering::SeqCst), 1);
}
