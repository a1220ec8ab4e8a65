use serde::Serialize;
use tracing::{trace, warn};

use super::overlap::resolve_status_overlaps;
use super::resolver::{PositionResolver, ResolvedLayout};
use super::{ContextFlags, LayoutContext};
use crate::common::collections::{HashMap, HashSet};
use crate::common::config::StatusRowSettings;
use crate::common::log::trace_frames;
use crate::model::registry::WidgetRegistry;
use crate::model::widget::{WidgetDescriptor, WidgetId, WidgetKind};
use crate::sys::geometry::{Rect, Size};
use crate::sys::measure::Measure;

/// Size a widget occupies for layout purposes.
///
/// Once the HUD is ready a mounted widget's measured box is used as-is (it
/// already carries the scale transform). Before that, or when the widget is
/// not on screen, the unscaled intrinsic box times `scale`. A widget the
/// rendering layer knows nothing about is zero-sized.
pub fn widget_size(measure: &dyn Measure, id: &WidgetId, scale: f64, ready: bool) -> Size {
    if ready {
        if let Some(rect) = measure.measured_rect(id) {
            return rect.size();
        }
    }
    measure.intrinsic_size(id).map(|s| s.scaled(scale)).unwrap_or(Size::ZERO)
}

/// Default rect for every descriptor, processed strictly in slice order.
///
/// Each rect is stored before the next descriptor runs, so a position function
/// can depend on anything earlier in the list and nothing later.
pub fn resolve_layout(
    descriptors: &[WidgetDescriptor],
    is_hidden: &dyn Fn(&WidgetId) -> bool,
    has_signaled_ready: bool,
    screen: Size,
    flags: ContextFlags,
    measure: &dyn Measure,
) -> ResolvedLayout {
    let ctx = LayoutContext {
        screen,
        ready: has_signaled_ready,
        flags,
    };
    let scales: HashMap<WidgetId, f64> =
        descriptors.iter().map(|d| (d.id.clone(), d.scale)).collect();

    let mut layout = ResolvedLayout::new();
    for descriptor in descriptors {
        let size = widget_size(measure, &descriptor.id, descriptor.scale, has_signaled_ready);
        let origin = {
            let resolver = PositionResolver::new(
                &layout,
                measure,
                &scales,
                is_hidden,
                screen,
                has_signaled_ready,
            );
            (descriptor.position)(&descriptor.id, size, &ctx, &resolver)
        };
        if !origin.is_finite() {
            warn!(id = %descriptor.id, ?origin, "position function returned non-finite coordinates");
            debug_assert!(origin.is_finite(), "non-finite position for {}", descriptor.id);
        }
        let rect = Rect::from_parts(origin, size);
        if trace_frames() {
            trace!(id = %descriptor.id, ?rect, "resolved");
        }
        layout.insert(descriptor.id.clone(), rect);
    }
    layout
}

/// Final geometry of one widget after all layout passes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlacedWidget {
    pub id: WidgetId,
    pub kind: WidgetKind,
    pub rect: Rect,
    pub scale: f64,
    pub visible: bool,
    pub disabled: bool,
    pub sub_widget: bool,
}

impl PlacedWidget {
    /// Visible and not disabled by the host.
    pub fn is_shown(&self) -> bool { self.visible && !self.disabled }
}

/// Default resolution, then the player's saved positions, then status-row
/// overlap repair. Output follows descriptor order.
pub fn compute_hud_layout(
    registry: &WidgetRegistry,
    measure: &dyn Measure,
    screen: Size,
    ready: bool,
    flags: ContextFlags,
    status: &StatusRowSettings,
) -> Vec<PlacedWidget> {
    let descriptors = registry.effective_descriptors(flags);
    let hidden: HashSet<WidgetId> = descriptors
        .iter()
        .filter(|d| !d.visible || registry.is_disabled(&d.id))
        .map(|d| d.id.clone())
        .collect();
    let is_hidden = |id: &WidgetId| hidden.contains(id);
    let defaults = resolve_layout(&descriptors, &is_hidden, ready, screen, flags, measure);

    let placed: Vec<PlacedWidget> = descriptors
        .iter()
        .map(|d| {
            let default_rect = defaults.get(d.id.as_str()).unwrap_or_default();
            let rect = match registry.saved_position(&d.id) {
                Some(origin) => default_rect.with_origin(origin),
                None => default_rect,
            };
            PlacedWidget {
                id: d.id.clone(),
                kind: d.kind,
                rect,
                scale: d.scale,
                visible: d.visible,
                disabled: registry.is_disabled(&d.id),
                sub_widget: d.sub_widget,
            }
        })
        .collect();

    resolve_status_overlaps(&placed, screen.width, status)
}
