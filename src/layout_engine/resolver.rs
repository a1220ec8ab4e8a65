use serde::ser::{Serialize, SerializeMap, Serializer};

use super::LayoutContext;
use crate::common::collections::HashMap;
use crate::model::widget::WidgetId;
use crate::sys::geometry::{Point, Rect, Size, rects_distance};
use crate::sys::measure::Measure;

/// Computes a widget's default top-left corner.
///
/// Must be deterministic in its inputs. `resolver` only exposes widgets that
/// were processed earlier in the descriptor list; everything else reads as
/// `None` and the function has to fall back to something sensible.
pub type PositionFn = fn(&WidgetId, Size, &LayoutContext, &PositionResolver<'_>) -> Point;

/// Insertion-ordered map from widget id to its resolved rect.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedLayout {
    entries: Vec<(WidgetId, Rect)>,
    index: HashMap<WidgetId, usize>,
}

impl ResolvedLayout {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, id: WidgetId, rect: Rect) {
        match self.index.get(&id) {
            Some(&i) => self.entries[i].1 = rect,
            None => {
                self.index.insert(id.clone(), self.entries.len());
                self.entries.push((id, rect));
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<Rect> { self.index.get(id).map(|&i| self.entries[i].1) }

    pub fn contains(&self, id: &str) -> bool { self.index.contains_key(id) }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&WidgetId, &Rect)> {
        self.entries.iter().map(|(id, rect)| (id, rect))
    }
}

impl Serialize for ResolvedLayout {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, rect) in &self.entries {
            map.serialize_entry(id, rect)?;
        }
        map.end()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NearbyWidget {
    pub id: WidgetId,
    pub rect: Rect,
    pub distance: f64,
}

/// Read-only view of layout state handed to position functions.
pub struct PositionResolver<'a> {
    resolved: &'a ResolvedLayout,
    measure: &'a dyn Measure,
    scales: &'a HashMap<WidgetId, f64>,
    is_hidden: &'a dyn Fn(&WidgetId) -> bool,
    screen: Size,
    ready: bool,
}

impl<'a> PositionResolver<'a> {
    pub fn new(
        resolved: &'a ResolvedLayout,
        measure: &'a dyn Measure,
        scales: &'a HashMap<WidgetId, f64>,
        is_hidden: &'a dyn Fn(&WidgetId) -> bool,
        screen: Size,
        ready: bool,
    ) -> Self {
        Self {
            resolved,
            measure,
            scales,
            is_hidden,
            screen,
            ready,
        }
    }

    /// Rect of a widget resolved earlier in this pass.
    pub fn widget_rect(&self, id: &str) -> Option<Rect> { self.resolved.get(id) }

    /// Provisional rect before the HUD is ready; afterwards the measured
    /// on-screen rect, falling back to the provisional one when unmounted.
    pub fn widget_current_rect(&self, id: &str) -> Option<Rect> {
        if !self.ready {
            return self.resolved.get(id);
        }
        self.measure
            .measured_rect(&WidgetId::from(id))
            .or_else(|| self.resolved.get(id))
    }

    pub fn widget_scale(&self, id: &str) -> f64 { self.scales.get(id).copied().unwrap_or(1.0) }

    pub fn widget_size(&self, id: &str) -> Size {
        super::widget_size(self.measure, &WidgetId::from(id), self.widget_scale(id), self.ready)
    }

    pub fn screen(&self) -> Size { self.screen }

    pub fn is_ready(&self) -> bool { self.ready }

    /// Disabled by the host or not visible. Hidden widgets still have a
    /// resolved rect but should not be laid out against.
    pub fn is_hidden(&self, id: &str) -> bool { (self.is_hidden)(&WidgetId::from(id)) }

    /// Widgets whose nearest edge lies within `max_distance` of `reference`,
    /// in scan order. Excluded and hidden ids are skipped.
    pub fn find_nearby_widgets(
        &self,
        reference: &Rect,
        max_distance: f64,
        exclude: &[WidgetId],
    ) -> Vec<NearbyWidget> {
        let known: Vec<(WidgetId, Rect)> = if self.ready {
            self.measure
                .mounted()
                .into_iter()
                .filter_map(|id| self.widget_current_rect(id.as_str()).map(|r| (id, r)))
                .collect()
        } else {
            self.resolved.iter().map(|(id, r)| (id.clone(), *r)).collect()
        };

        known
            .into_iter()
            .filter(|(id, _)| !exclude.contains(id) && !(self.is_hidden)(id))
            .filter_map(|(id, rect)| {
                let distance = rects_distance(reference, &rect);
                (distance <= max_distance).then_some(NearbyWidget { id, rect, distance })
            })
            .collect()
    }
}
