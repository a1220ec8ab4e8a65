//! Boundary to the rendering layer.
//!
//! Everything the layout engine knows about rendered output comes through
//! [`Measure`]. A web view implements it by reading element boxes; tests and the
//! CLI use [`StaticMeasure`].

use crate::common::collections::HashMap;
use crate::layout_engine::PlacedWidget;
use crate::model::widget::WidgetId;
use crate::sys::geometry::{Point, Rect, Size};

pub trait Measure {
    /// Live on-screen box of a mounted widget. Already includes the widget's
    /// visual scale transform. `None` when the widget is not mounted.
    fn measured_rect(&self, id: &WidgetId) -> Option<Rect>;

    /// Unscaled intrinsic box of the widget's content.
    fn intrinsic_size(&self, id: &WidgetId) -> Option<Size>;

    /// Ids of widgets currently mounted, in a stable order.
    fn mounted(&self) -> Vec<WidgetId>;
}

/// A rendering layer that can also be told where widgets go.
pub trait Surface: Measure {
    fn present(&mut self, widgets: &[PlacedWidget]);
}

#[derive(Clone, Copy, Debug)]
struct Element {
    intrinsic: Size,
    scale: f64,
    origin: Point,
    mounted: bool,
}

/// In-memory rendering layer. Inserted widgets are mounted at the origin and
/// report `intrinsic * scale` as their on-screen size.
#[derive(Clone, Debug, Default)]
pub struct StaticMeasure {
    elements: HashMap<WidgetId, Element>,
    order: Vec<WidgetId>,
}

impl StaticMeasure {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, id: impl Into<WidgetId>, intrinsic: Size) {
        let id = id.into();
        if !self.elements.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.elements.insert(
            id,
            Element {
                intrinsic,
                scale: 1.0,
                origin: Point::ZERO,
                mounted: true,
            },
        );
    }

    pub fn with(mut self, id: impl Into<WidgetId>, width: f64, height: f64) -> Self {
        self.insert(id, Size::new(width, height));
        self
    }

    pub fn set_scale(&mut self, id: &WidgetId, scale: f64) {
        if let Some(el) = self.elements.get_mut(id) {
            el.scale = scale;
        }
    }

    /// Moves the widget to `rect`'s origin. The size is always derived from
    /// the intrinsic size and scale.
    pub fn place(&mut self, id: &WidgetId, rect: Rect) {
        if let Some(el) = self.elements.get_mut(id) {
            el.origin = rect.origin();
        }
    }

    pub fn mount(&mut self, id: &WidgetId) {
        if let Some(el) = self.elements.get_mut(id) {
            el.mounted = true;
        }
    }

    pub fn unmount(&mut self, id: &WidgetId) {
        if let Some(el) = self.elements.get_mut(id) {
            el.mounted = false;
        }
    }

    fn mounted_element(&self, id: &WidgetId) -> Option<&Element> {
        self.elements.get(id).filter(|el| el.mounted)
    }
}

impl Measure for StaticMeasure {
    fn measured_rect(&self, id: &WidgetId) -> Option<Rect> {
        self.mounted_element(id)
            .map(|el| Rect::from_parts(el.origin, el.intrinsic.scaled(el.scale)))
    }

    fn intrinsic_size(&self, id: &WidgetId) -> Option<Size> {
        self.mounted_element(id).map(|el| el.intrinsic)
    }

    fn mounted(&self) -> Vec<WidgetId> {
        self.order
            .iter()
            .filter(|id| self.mounted_element(id).is_some())
            .cloned()
            .collect()
    }
}

impl Surface for StaticMeasure {
    fn present(&mut self, widgets: &[PlacedWidget]) {
        for widget in widgets {
            self.set_scale(&widget.id, widget.scale);
            self.place(&widget.id, widget.rect);
        }
    }
}
