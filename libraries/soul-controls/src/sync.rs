//! UI synchronization
//!
//! One synchronizer pass recomputes every derived visual value from the
//! media source and the measured layout, then applies it. Fills that
//! belong to a surface the user is dragging are left alone so the pass
//! never fights the pointer.

use crate::error::Result;
use crate::media::{MediaSource, TimeRange};
use crate::view::{ElementId, Extent, Orientation, Slot, SlotMap, View};
use serde::{Deserialize, Serialize};

/// Derived visual state from one synchronizer pass
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UiSnapshot {
    /// Played portion, 0-100
    pub play_percentage: f64,

    /// Buffered portion (furthest buffered end), 0-100
    pub load_percentage: f64,

    /// Volume, 0-100
    pub volume_percentage: f64,

    /// Pixels handed to the scrubber along its own axis
    pub available_scrubber_space: f64,

    /// Elapsed clock text (`m:ss` or `h:mm:ss`)
    pub elapsed: String,

    /// Remaining clock text (`m:ss` or `h:mm:ss`)
    pub remaining: String,
}

impl UiSnapshot {
    /// Compute the media-derived values (layout space is left at 0)
    pub fn compute<M: MediaSource + ?Sized>(media: &M) -> Self {
        let duration = usable_duration(media.duration());
        let current_time = clamped_time(media.current_time(), duration);

        Self {
            play_percentage: play_percentage(current_time, duration),
            load_percentage: load_percentage(&media.buffered(), duration),
            volume_percentage: media.volume() * 100.0,
            available_scrubber_space: 0.0,
            elapsed: format_clock(current_time),
            remaining: format_clock(duration - current_time),
        }
    }
}

/// NaN, infinite and negative durations count as 0
fn usable_duration(duration: f64) -> f64 {
    if duration.is_finite() && duration > 0.0 {
        duration
    } else {
        0.0
    }
}

/// Times past the end, zero or NaN count as 0
fn clamped_time(current_time: f64, duration: f64) -> f64 {
    if current_time > duration || current_time.is_nan() || current_time <= 0.0 {
        0.0
    } else {
        current_time
    }
}

/// Played percentage; 0 when the duration is unknown
pub fn play_percentage(current_time: f64, duration: f64) -> f64 {
    let duration = usable_duration(duration);
    if duration == 0.0 {
        return 0.0;
    }
    (clamped_time(current_time, duration) * 100.0 / duration).min(100.0)
}

/// Furthest buffered end as a percentage of the duration
///
/// Takes the maximum end over all ranges, not the range containing the
/// playhead.
pub fn load_percentage(buffered: &[TimeRange], duration: f64) -> f64 {
    let duration = usable_duration(duration);
    if duration == 0.0 {
        return 0.0;
    }
    let loaded_to = buffered
        .iter()
        .map(|range| range.end)
        .filter(|end| end.is_finite())
        .fold(0.0_f64, f64::max);

    loaded_to * 100.0 / duration
}

/// Space left for the scrubber after its toolbar siblings
///
/// Siblings' summed extent is inflated by `safety_factor` so the scrubber
/// does not overflow when they grow. Never negative.
pub fn available_scrubber_space<I>(toolbar_extent: f64, sibling_extents: I, safety_factor: f64) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let siblings: f64 = sibling_extents.into_iter().sum();
    (toolbar_extent - siblings * safety_factor).max(0.0)
}

/// Format seconds as `m:ss`, or `h:mm:ss` past the hour
pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours}:{mins:02}:{secs:02}")
    } else {
        format!("{mins}:{secs:02}")
    }
}

/// Drag-relevant state of one control surface at sync time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceState {
    pub orientation: Orientation,
    pub dragging: bool,
}

/// Applies snapshots to the presentation layer
#[derive(Debug, Clone)]
pub struct UiSynchronizer {
    toolbar: ElementId,
    scrubber: ElementId,
    play_progress: ElementId,
    load_progress: ElementId,
    volume_fill: ElementId,
    elapsed: Option<ElementId>,
    remaining: Option<ElementId>,
    safety_factor: f64,
}

impl UiSynchronizer {
    /// Resolve the elements a pass touches
    pub fn new(slots: &SlotMap, safety_factor: f64) -> Result<Self> {
        Ok(Self {
            toolbar: slots.require(Slot::Toolbar)?,
            scrubber: slots.require(Slot::Scrubber)?,
            play_progress: slots.require(Slot::PlayProgress)?,
            load_progress: slots.require(Slot::LoadProgress)?,
            volume_fill: slots.require(Slot::VolumeSliderInner)?,
            elapsed: slots.get(Slot::Elapsed),
            remaining: slots.get(Slot::Remaining),
            safety_factor,
        })
    }

    /// Run one pass and return what was computed
    pub fn sync<M, V>(
        &self,
        media: &M,
        view: &mut V,
        scrubber: SurfaceState,
        volume: SurfaceState,
    ) -> UiSnapshot
    where
        M: MediaSource + ?Sized,
        V: View + ?Sized,
    {
        let mut snapshot = UiSnapshot::compute(media);

        if !scrubber.dragging {
            view.set_extent(
                self.play_progress,
                scrubber.orientation,
                Extent::Percent(snapshot.play_percentage),
            );
            view.set_extent(
                self.load_progress,
                scrubber.orientation,
                Extent::Percent(snapshot.load_percentage),
            );
        }

        if !volume.dragging {
            view.set_extent(
                self.volume_fill,
                volume.orientation,
                Extent::Percent(snapshot.volume_percentage),
            );
        }

        if let Some(elapsed) = self.elapsed {
            view.set_label(elapsed, &snapshot.elapsed);
        }
        if let Some(remaining) = self.remaining {
            view.set_label(remaining, &snapshot.remaining);
        }

        snapshot.available_scrubber_space = self.allocate_scrubber(view, scrubber.orientation);

        snapshot
    }

    /// Size the scrubber to whatever its toolbar siblings leave over
    fn allocate_scrubber<V: View + ?Sized>(&self, view: &mut V, orientation: Orientation) -> f64 {
        let toolbar = view.measure(self.toolbar);
        let toolbar_extent = orientation.extent_of(toolbar.width, toolbar.height);

        let siblings: Vec<f64> = view
            .children(self.toolbar)
            .into_iter()
            .filter(|child| *child != self.scrubber)
            .filter_map(|child| view.element_box(child))
            .map(|b| orientation.extent_of(b.width, b.height))
            .collect();

        let space = available_scrubber_space(toolbar_extent, siblings, self.safety_factor);
        view.set_extent(self.scrubber, orientation, Extent::Pixels(space));
        space
    }
}
