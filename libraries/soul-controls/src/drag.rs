//! Drag mapping for scrubber and volume slider
//!
//! Turns pointer motion over a rectangular surface into a normalized
//! point clamped to [0, 1] on both axes. The y axis is inverted so that
//! moving up increases the value, matching how vertical sliders read.
//!
//! Surfaces live in an arena owned by [`DragMapper`]. Pointer-down is
//! scoped to the surface's element; move and up are delivered to every
//! bound surface, the way window-level listeners behave, and each
//! surface filters them through its own `dragging` flag.

use crate::view::{ElementId, Layout, Measurement, Orientation};
use serde::{Deserialize, Serialize};

/// Index of a surface within its [`DragMapper`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceId(usize);

/// Pointer button, numbered like DOM `MouseEvent.button`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerButton {
    Primary,
    Auxiliary,
    Secondary,
    Other(i16),
}

impl From<i16> for PointerButton {
    fn from(code: i16) -> Self {
        match code {
            0 => PointerButton::Primary,
            1 => PointerButton::Auxiliary,
            2 => PointerButton::Secondary,
            other => PointerButton::Other(other),
        }
    }
}

/// Phase of a pointer interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerKind {
    Down,
    Move,
    Up,
}

/// Pointer input with absolute client coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub button: PointerButton,
    pub client_x: f64,
    pub client_y: f64,
}

impl PointerEvent {
    pub fn down(client_x: f64, client_y: f64) -> Self {
        Self {
            kind: PointerKind::Down,
            button: PointerButton::Primary,
            client_x,
            client_y,
        }
    }

    pub fn moved(client_x: f64, client_y: f64) -> Self {
        Self {
            kind: PointerKind::Move,
            button: PointerButton::Primary,
            client_x,
            client_y,
        }
    }

    pub fn up(client_x: f64, client_y: f64) -> Self {
        Self {
            kind: PointerKind::Up,
            button: PointerButton::Primary,
            client_x,
            client_y,
        }
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }
}

/// Normalized pointer position over a surface
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DragPoint {
    /// 0 at the left edge, 1 at the right edge
    pub x: f64,
    /// 0 at the bottom edge, 1 at the top edge
    pub y: f64,
}

impl DragPoint {
    /// Component along `orientation`
    pub fn along(self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::Horizontal => self.x,
            Orientation::Vertical => self.y,
        }
    }
}

/// Value delivered to the surface's bound target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragUpdate<T> {
    pub surface: SurfaceId,
    pub element: ElementId,
    pub target: T,
    pub orientation: Orientation,
    pub point: DragPoint,
}

impl<T> DragUpdate<T> {
    /// The point's component along the surface's orientation
    pub fn value(&self) -> f64 {
        self.point.along(self.orientation)
    }
}

/// One draggable control
#[derive(Debug, Clone)]
pub struct ControlSurface<T> {
    element: ElementId,
    target: T,
    orientation: Orientation,
    dragging: bool,
    value: f64,
    measurement: Measurement,
}

impl<T: Copy> ControlSurface<T> {
    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn target(&self) -> T {
        self.target
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Last committed position along the orientation axis, in [0, 1]
    pub fn value(&self) -> f64 {
        self.value
    }

    fn deliver(&mut self, id: SurfaceId, client_x: f64, client_y: f64) -> DragUpdate<T> {
        let point = map_point(&self.measurement, client_x, client_y);
        self.value = point.along(self.orientation);

        DragUpdate {
            surface: id,
            element: self.element,
            target: self.target,
            orientation: self.orientation,
            point,
        }
    }
}

/// Clamp to [0, 1], sending NaN to 0
fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Map client coordinates onto a measured surface
///
/// A zero (or negative) width or height maps that axis to 0.
pub fn map_point(measurement: &Measurement, client_x: f64, client_y: f64) -> DragPoint {
    let x = if measurement.width > 0.0 {
        clamp01((client_x - measurement.left) / measurement.width)
    } else {
        0.0
    };

    let y = if measurement.height > 0.0 {
        clamp01(1.0 - (client_y - measurement.top) / measurement.height)
    } else {
        0.0
    };

    DragPoint { x, y }
}

/// Arena of draggable surfaces
#[derive(Debug, Clone)]
pub struct DragMapper<T> {
    surfaces: Vec<Option<ControlSurface<T>>>,
}

impl<T> Default for DragMapper<T> {
    fn default() -> Self {
        Self {
            surfaces: Vec::new(),
        }
    }
}

impl<T: Copy> DragMapper<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `element` as a draggable surface delivering to `target`
    ///
    /// Orientation is decided here, once, from the rendered size.
    pub fn bind<L: Layout + ?Sized>(
        &mut self,
        element: ElementId,
        target: T,
        layout: &L,
    ) -> SurfaceId {
        let measurement = layout.measure(element);
        let orientation = Orientation::from_size(measurement.width, measurement.height);

        let id = SurfaceId(self.surfaces.len());
        self.surfaces.push(Some(ControlSurface {
            element,
            target,
            orientation,
            dragging: false,
            value: 0.0,
            measurement,
        }));

        tracing::debug!(?element, ?orientation, ?id, "Bound drag surface");
        id
    }

    /// Stop delivering pointer input to a surface
    pub fn unbind(&mut self, id: SurfaceId) -> Option<ControlSurface<T>> {
        self.surfaces.get_mut(id.0).and_then(Option::take)
    }

    pub fn surface(&self, id: SurfaceId) -> Option<&ControlSurface<T>> {
        self.surfaces.get(id.0).and_then(Option::as_ref)
    }

    pub fn is_dragging(&self, id: SurfaceId) -> bool {
        self.surface(id).is_some_and(ControlSurface::is_dragging)
    }

    pub fn len(&self) -> usize {
        self.surfaces.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the surface that `element` belongs to
    ///
    /// Walks the containment chain so a press on any descendant (a fill,
    /// a thumb) lands on its surface.
    fn surface_at<L: Layout + ?Sized>(&self, element: ElementId, layout: &L) -> Option<SurfaceId> {
        let mut node = Some(element);
        let mut depth = 0;
        while let Some(current) = node {
            let found = self.surfaces.iter().position(|surface| {
                surface
                    .as_ref()
                    .is_some_and(|surface| surface.element == current)
            });
            if let Some(index) = found {
                return Some(SurfaceId(index));
            }
            depth += 1;
            if depth > 64 {
                return None;
            }
            node = layout.parent_element(current);
        }
        None
    }

    /// Feed one pointer event through every bound surface
    ///
    /// `target` is the element under the pointer; only down events use it.
    /// Returns the values to deliver, in surface order.
    pub fn handle_pointer<L: Layout + ?Sized>(
        &mut self,
        event: &PointerEvent,
        target: Option<ElementId>,
        layout: &L,
    ) -> Vec<DragUpdate<T>> {
        match event.kind {
            PointerKind::Down => {
                if event.button != PointerButton::Primary {
                    return Vec::new();
                }
                let Some(id) = target.and_then(|element| self.surface_at(element, layout)) else {
                    return Vec::new();
                };
                let Some(surface) = self.surfaces[id.0].as_mut() else {
                    return Vec::new();
                };

                surface.measurement = layout.measure(surface.element);
                surface.dragging = true;
                let update = surface.deliver(id, event.client_x, event.client_y);
                tracing::debug!(surface = ?id, value = update.value(), "Drag started");
                vec![update]
            }
            PointerKind::Move => self
                .surfaces
                .iter_mut()
                .enumerate()
                .filter_map(|(index, surface)| {
                    let surface = surface.as_mut().filter(|s| s.dragging)?;
                    let update = surface.deliver(SurfaceId(index), event.client_x, event.client_y);
                    tracing::trace!(surface = index, x = update.point.x, y = update.point.y, "Drag moved");
                    Some(update)
                })
                .collect(),
            PointerKind::Up => {
                self.cancel_all();
                Vec::new()
            }
        }
    }

    /// End a drag without a pointer-up
    pub fn cancel(&mut self, id: SurfaceId) {
        if let Some(surface) = self.surfaces.get_mut(id.0).and_then(Option::as_mut) {
            surface.dragging = false;
        }
    }

    /// End every drag (the host's blur / visibility recovery path)
    pub fn cancel_all(&mut self) {
        for surface in self.surfaces.iter_mut().flatten() {
            if surface.dragging {
                tracing::debug!(element = ?surface.element, "Drag ended");
            }
            surface.dragging = false;
        }
    }
}
