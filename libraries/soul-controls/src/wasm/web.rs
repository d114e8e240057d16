//! DOM implementations of the collaborator traits

use crate::error::{ControlsError, Result};
use crate::media::{MediaKind, MediaSource, ReadyState, TimeRange};
use crate::view::{ElementBox, ElementId, Extent, Fullscreen, Layout, Orientation, Presenter};
use js_sys::WeakMap;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlAudioElement, HtmlElement, HtmlMediaElement, HtmlVideoElement};

/// `<audio>` / `<video>` element as a media source
pub struct WebMedia {
    element: HtmlMediaElement,
    kind: MediaKind,
}

impl WebMedia {
    /// Wrap an element, refusing anything that is not audio or video
    pub fn from_element(element: Element) -> Result<Self> {
        let kind = if element.is_instance_of::<HtmlVideoElement>() {
            MediaKind::Video
        } else if element.is_instance_of::<HtmlAudioElement>() {
            MediaKind::Audio
        } else {
            return Err(ControlsError::InvalidMediaSource);
        };

        let element = element
            .dyn_into::<HtmlMediaElement>()
            .map_err(|_| ControlsError::InvalidMediaSource)?;

        Ok(Self { element, kind })
    }

    pub fn element(&self) -> &HtmlMediaElement {
        &self.element
    }
}

impl MediaSource for WebMedia {
    fn play(&mut self) {
        // The returned promise rejects on autoplay refusal; the source then
        // stays paused and the following "pause" event resyncs the session.
        if let Err(err) = self.element.play() {
            tracing::warn!(?err, "Media element refused to play");
        }
    }

    fn pause(&mut self) {
        if let Err(err) = self.element.pause() {
            tracing::warn!(?err, "Media element refused to pause");
        }
    }

    fn load(&mut self) {
        self.element.load();
    }

    fn current_time(&self) -> f64 {
        self.element.current_time()
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.element.set_current_time(seconds);
    }

    fn volume(&self) -> f64 {
        self.element.volume()
    }

    fn set_volume(&mut self, volume: f64) {
        self.element.set_volume(volume);
    }

    fn duration(&self) -> f64 {
        self.element.duration()
    }

    fn is_paused(&self) -> bool {
        self.element.paused()
    }

    fn ready_state(&self) -> ReadyState {
        ReadyState::from(self.element.ready_state())
    }

    fn buffered(&self) -> Vec<TimeRange> {
        let ranges = self.element.buffered();
        (0..ranges.length())
            .filter_map(|index| {
                let start = ranges.start(index).ok()?;
                let end = ranges.end(index).ok()?;
                Some(TimeRange::new(start, end))
            })
            .collect()
    }

    fn kind(&self) -> Option<MediaKind> {
        Some(self.kind)
    }
}

type Registry = Rc<RefCell<Vec<HtmlElement>>>;

/// DOM elements addressed by [`ElementId`]
///
/// Elements are interned on first sight; ids are indices into the registry.
/// A `WeakMap` keyed on the element object finds known ids without a scan.
#[derive(Clone)]
pub struct WebView {
    elements: Registry,
    ids: WeakMap,
}

impl Default for WebView {
    fn default() -> Self {
        Self::new()
    }
}

impl WebView {
    pub fn new() -> Self {
        Self {
            elements: Registry::default(),
            ids: WeakMap::new(),
        }
    }

    /// Id for `element`, registering it if needed
    pub fn intern(&self, element: &HtmlElement) -> ElementId {
        if let Some(index) = self.ids.get(element).as_f64() {
            return ElementId(index as u32);
        }

        let mut elements = self.elements.borrow_mut();
        let id = ElementId(elements.len() as u32);
        elements.push(element.clone());
        self.ids.set(element, &JsValue::from(id.0));
        id
    }

    pub fn element(&self, id: ElementId) -> Option<HtmlElement> {
        self.elements.borrow().get(id.0 as usize).cloned()
    }

    /// Fullscreen capability sharing this view's registry
    pub fn fullscreen(&self, document: Document) -> WebFullscreen {
        WebFullscreen {
            document,
            elements: Rc::clone(&self.elements),
        }
    }
}

impl Layout for WebView {
    fn element_box(&self, element: ElementId) -> Option<ElementBox> {
        let element = self.element(element)?;
        Some(ElementBox {
            width: f64::from(element.offset_width()),
            height: f64::from(element.offset_height()),
            offset_left: f64::from(element.offset_left()),
            offset_top: f64::from(element.offset_top()),
        })
    }

    fn offset_parent(&self, element: ElementId) -> Option<ElementId> {
        let parent = self
            .element(element)?
            .offset_parent()?
            .dyn_into::<HtmlElement>()
            .ok()?;
        Some(self.intern(&parent))
    }

    fn parent_element(&self, element: ElementId) -> Option<ElementId> {
        let parent = self
            .element(element)?
            .parent_element()?
            .dyn_into::<HtmlElement>()
            .ok()?;
        Some(self.intern(&parent))
    }

    fn children(&self, element: ElementId) -> Vec<ElementId> {
        let Some(element) = self.element(element) else {
            return Vec::new();
        };
        let children = element.children();
        (0..children.length())
            .filter_map(|index| children.item(index))
            .filter_map(|child| child.dyn_into::<HtmlElement>().ok())
            .map(|child| self.intern(&child))
            .collect()
    }
}

impl Presenter for WebView {
    fn set_extent(&mut self, element: ElementId, orientation: Orientation, extent: Extent) {
        let Some(element) = self.element(element) else {
            return;
        };
        if let Err(err) = element
            .style()
            .set_property(orientation.dimension(), &extent.to_string())
        {
            tracing::warn!(?err, "Failed to size element");
        }
    }

    fn set_label(&mut self, element: ElementId, text: &str) {
        let Some(element) = self.element(element) else {
            return;
        };
        element.set_text_content(Some(text));
        if let Err(err) = element.set_attribute("title", text) {
            tracing::warn!(?err, "Failed to set title");
        }
    }

    fn set_flag(&mut self, element: ElementId, flag: &str, on: bool) {
        let Some(element) = self.element(element) else {
            return;
        };
        let classes = element.class_list();
        let result = if on {
            classes.add_1(flag)
        } else {
            classes.remove_1(flag)
        };
        if let Err(err) = result {
            tracing::warn!(?err, flag, "Failed to toggle class");
        }
    }
}

/// The document's Fullscreen API
pub struct WebFullscreen {
    document: Document,
    elements: Registry,
}

impl Fullscreen for WebFullscreen {
    fn is_available(&self) -> bool {
        self.document.fullscreen_enabled()
    }

    fn request(&mut self, element: ElementId) {
        let Some(element) = self.elements.borrow().get(element.0 as usize).cloned() else {
            return;
        };
        if let Err(err) = element.request_fullscreen() {
            tracing::warn!(?err, "Fullscreen request refused");
        }
    }

    fn cancel(&mut self) {
        self.document.exit_fullscreen();
    }
}
