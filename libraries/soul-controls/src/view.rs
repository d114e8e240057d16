//! Presentation collaborators
//!
//! The control surface never builds or styles elements itself. The host
//! provides a [`View`] that can measure elements and apply presentation
//! changes, and a [`SlotMap`] naming which element plays which role.

use crate::error::{ControlsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Walking more offset parents than this means the host handed us a cycle
const MAX_OFFSET_DEPTH: usize = 256;

/// Opaque handle to a host element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u32);

/// Named role of an element within the control surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Container,
    MediaWrapper,
    Toolbar,
    PlayPause,
    Elapsed,
    Scrubber,
    LoadProgress,
    PlayProgress,
    Thumb,
    Remaining,
    VolumeGroup,
    Mute,
    VolumeSlider,
    VolumeSliderInner,
    VolumeThumb,
    Fullscreen,
}

impl Slot {
    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Container => "container",
            Slot::MediaWrapper => "mediawrapper",
            Slot::Toolbar => "toolbar",
            Slot::PlayPause => "playpause",
            Slot::Elapsed => "elapsed",
            Slot::Scrubber => "scrubber",
            Slot::LoadProgress => "loadprogress",
            Slot::PlayProgress => "playprogress",
            Slot::Thumb => "thumb",
            Slot::Remaining => "remaining",
            Slot::VolumeGroup => "volumegroup",
            Slot::Mute => "mute",
            Slot::VolumeSlider => "volumeslider",
            Slot::VolumeSliderInner => "volumesliderinner",
            Slot::VolumeThumb => "volumethumb",
            Slot::Fullscreen => "fullscreen",
        }
    }

    pub const ALL: [Slot; 16] = [
        Slot::Container,
        Slot::MediaWrapper,
        Slot::Toolbar,
        Slot::PlayPause,
        Slot::Elapsed,
        Slot::Scrubber,
        Slot::LoadProgress,
        Slot::PlayProgress,
        Slot::Thumb,
        Slot::Remaining,
        Slot::VolumeGroup,
        Slot::Mute,
        Slot::VolumeSlider,
        Slot::VolumeSliderInner,
        Slot::VolumeThumb,
        Slot::Fullscreen,
    ];

    /// Slots the controller cannot work without
    pub const REQUIRED: [Slot; 9] = [
        Slot::Container,
        Slot::Toolbar,
        Slot::PlayPause,
        Slot::Scrubber,
        Slot::LoadProgress,
        Slot::PlayProgress,
        Slot::Mute,
        Slot::VolumeSlider,
        Slot::VolumeSliderInner,
    ];
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping from slot to the element that fills it
#[derive(Debug, Clone, Default)]
pub struct SlotMap {
    slots: HashMap<Slot, ElementId>,
    elements: HashMap<ElementId, Slot>,
}

impl SlotMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an element into a slot
    ///
    /// Fails with [`ControlsError::DuplicatePlacement`] if the slot is taken.
    pub fn place(&mut self, slot: Slot, element: ElementId) -> Result<&mut Self> {
        if self.slots.contains_key(&slot) {
            return Err(ControlsError::DuplicatePlacement(slot));
        }
        self.slots.insert(slot, element);
        self.elements.insert(element, slot);
        Ok(self)
    }

    pub fn get(&self, slot: Slot) -> Option<ElementId> {
        self.slots.get(&slot).copied()
    }

    /// Get a slot the caller cannot proceed without
    pub fn require(&self, slot: Slot) -> Result<ElementId> {
        self.get(slot).ok_or(ControlsError::MissingSlot(slot))
    }

    pub fn contains(&self, slot: Slot) -> bool {
        self.slots.contains_key(&slot)
    }

    /// Reverse lookup: which slot does this element fill?
    pub fn slot_of(&self, element: ElementId) -> Option<Slot> {
        self.elements.get(&element).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Axis a control is laid out along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Orientation implied by a rendered size: taller than wide is vertical
    pub fn from_size(width: f64, height: f64) -> Self {
        if height > width {
            Orientation::Vertical
        } else {
            Orientation::Horizontal
        }
    }

    /// Style dimension this orientation drives
    pub fn dimension(self) -> &'static str {
        match self {
            Orientation::Horizontal => "width",
            Orientation::Vertical => "height",
        }
    }

    /// Extent of a box along this axis
    pub fn extent_of(self, width: f64, height: f64) -> f64 {
        match self {
            Orientation::Horizontal => width,
            Orientation::Vertical => height,
        }
    }
}

/// Size applied to an element along one axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Extent {
    Percent(f64),
    Pixels(f64),
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extent::Percent(value) => write!(f, "{value}%"),
            Extent::Pixels(value) => write!(f, "{value}px"),
        }
    }
}

/// Rendered box of one element, relative to its offset parent
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementBox {
    pub width: f64,
    pub height: f64,
    pub offset_left: f64,
    pub offset_top: f64,
}

/// Rendered size plus cumulative offset from the document origin
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Measurement {
    pub width: f64,
    pub height: f64,
    pub left: f64,
    pub top: f64,
}

/// Layout measurement collaborator
pub trait Layout {
    /// Rendered box of an element, or `None` if the element is unknown
    fn element_box(&self, element: ElementId) -> Option<ElementBox>;

    /// Element that `element`'s offsets are relative to
    ///
    /// Only used for measuring; it may skip unpositioned ancestors.
    fn offset_parent(&self, element: ElementId) -> Option<ElementId>;

    /// Element that directly contains `element`
    fn parent_element(&self, element: ElementId) -> Option<ElementId>;

    /// Direct child elements, in document order
    fn children(&self, element: ElementId) -> Vec<ElementId>;

    /// Size of `element` and its offset summed up the offset-parent chain
    fn measure(&self, element: ElementId) -> Measurement {
        let Some(own) = self.element_box(element) else {
            return Measurement::default();
        };

        let mut measurement = Measurement {
            width: own.width,
            height: own.height,
            left: own.offset_left,
            top: own.offset_top,
        };

        let mut node = self.offset_parent(element);
        let mut depth = 0;
        while let Some(parent) = node {
            depth += 1;
            if depth > MAX_OFFSET_DEPTH {
                tracing::warn!(?element, "Offset parent chain too deep, stopping walk");
                break;
            }
            if let Some(parent_box) = self.element_box(parent) {
                measurement.left += parent_box.offset_left;
                measurement.top += parent_box.offset_top;
            }
            node = self.offset_parent(parent);
        }

        measurement
    }
}

/// Presentation collaborator
pub trait Presenter {
    /// Size an element along one axis
    fn set_extent(&mut self, element: ElementId, orientation: Orientation, extent: Extent);

    /// Set an element's visible text and title
    fn set_label(&mut self, element: ElementId, text: &str);

    /// Add or remove a presentation flag (a class, a state bit)
    fn set_flag(&mut self, element: ElementId, flag: &str, on: bool);
}

/// Everything the controller needs from the host's presentation layer
pub trait View: Layout + Presenter {}

impl<T: Layout + Presenter> View for T {}

/// Host fullscreen capability
pub trait Fullscreen {
    /// Whether the host can enter fullscreen at all
    fn is_available(&self) -> bool;

    /// Enter fullscreen with `element` filling the screen
    fn request(&mut self, element: ElementId);

    /// Leave fullscreen
    fn cancel(&mut self);
}

/// In-memory element tree for unit tests
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct DummyView {
    pub boxes: HashMap<ElementId, ElementBox>,
    pub parents: HashMap<ElementId, ElementId>,
    pub offset_parents: HashMap<ElementId, ElementId>,
    pub children: HashMap<ElementId, Vec<ElementId>>,
    pub extents: HashMap<ElementId, (Orientation, Extent)>,
    pub labels: HashMap<ElementId, String>,
    pub flags: HashMap<ElementId, Vec<String>>,
}

#[cfg(test)]
impl DummyView {
    pub fn add(&mut self, element: ElementId, parent: Option<ElementId>, element_box: ElementBox) {
        self.boxes.insert(element, element_box);
        if let Some(parent) = parent {
            self.parents.insert(element, parent);
            self.children.entry(parent).or_default().push(element);
        }
    }

    /// Make `element`'s offsets relative to `offset_parent` instead of its container
    pub fn set_offset_parent(&mut self, element: ElementId, offset_parent: ElementId) {
        self.offset_parents.insert(element, offset_parent);
    }

    pub fn has_flag(&self, element: ElementId, flag: &str) -> bool {
        self.flags
            .get(&element)
            .is_some_and(|flags| flags.iter().any(|f| f == flag))
    }
}

#[cfg(test)]
impl Layout for DummyView {
    fn element_box(&self, element: ElementId) -> Option<ElementBox> {
        self.boxes.get(&element).copied()
    }

    fn offset_parent(&self, element: ElementId) -> Option<ElementId> {
        self.offset_parents
            .get(&element)
            .or_else(|| self.parents.get(&element))
            .copied()
    }

    fn parent_element(&self, element: ElementId) -> Option<ElementId> {
        self.parents.get(&element).copied()
    }

    fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.children.get(&element).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
impl Presenter for DummyView {
    fn set_extent(&mut self, element: ElementId, orientation: Orientation, extent: Extent) {
        self.extents.insert(element, (orientation, extent));
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
