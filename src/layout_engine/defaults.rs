//! The stock HUD: which widgets exist, in what order they resolve, and where
//! each one goes by default.
//!
//! Order matters. Status icons pack rightward from the minimap, the voice
//! indicator trails the last enabled icon, vehicle gauges hang off the
//! speedometer, and the progress bar is placed last so it can steer clear of
//! everything else.

use super::resolver::PositionResolver;
use super::{ContextFlags, LayoutContext};
use crate::model::widget::{WidgetDescriptor, WidgetId, WidgetKind};
use crate::sys::geometry::{Point, Rect, Size};
use crate::sys::measure::StaticMeasure;

/// Distance kept from the screen edges.
pub const MARGIN: f64 = 20.0;
/// Horizontal space between neighbouring status icons.
pub const STATUS_SPACING: f64 = 4.0;
const VOICE_SPACING: f64 = 8.0;
const STACK_SPACING: f64 = 12.0;
const GAUGE_SPACING: f64 = 8.0;
const PROGRESS_LIFT: f64 = 140.0;
const PROGRESS_CLEARANCE: f64 = 16.0;

pub const STATUS_ORDER: [WidgetKind; 7] = [
    WidgetKind::Health,
    WidgetKind::Armor,
    WidgetKind::Hunger,
    WidgetKind::Thirst,
    WidgetKind::Stamina,
    WidgetKind::Stress,
    WidgetKind::Oxygen,
];

pub fn default_widgets() -> Vec<WidgetDescriptor> {
    let mut widgets = vec![WidgetDescriptor::new(
        WidgetKind::Minimap.name(),
        WidgetKind::Minimap,
        minimap,
    )];
    widgets.extend(
        STATUS_ORDER
            .iter()
            .map(|&kind| WidgetDescriptor::new(kind.name(), kind, status_icon)),
    );
    widgets.extend([
        WidgetDescriptor::new(WidgetKind::Voice.name(), WidgetKind::Voice, voice),
        WidgetDescriptor::new(WidgetKind::Compass.name(), WidgetKind::Compass, compass),
        WidgetDescriptor::new(WidgetKind::Speedometer.name(), WidgetKind::Speedometer, speedometer),
        WidgetDescriptor::new(WidgetKind::Fuel.name(), WidgetKind::Fuel, fuel),
        WidgetDescriptor::new(WidgetKind::Seatbelt.name(), WidgetKind::Seatbelt, seatbelt)
            .sub_widget(),
        WidgetDescriptor::new(WidgetKind::Money.name(), WidgetKind::Money, money),
        WidgetDescriptor::new(
            WidgetKind::Notifications.name(),
            WidgetKind::Notifications,
            notifications,
        ),
        WidgetDescriptor::new(WidgetKind::Chat.name(), WidgetKind::Chat, chat),
        WidgetDescriptor::new(WidgetKind::Progress.name(), WidgetKind::Progress, progress),
    ]);
    widgets
}

/// Unscaled content box of each stock widget.
pub fn intrinsic_size(kind: WidgetKind) -> Size {
    use WidgetKind::*;
    match kind {
        Health | Armor | Hunger | Thirst | Stamina | Stress | Oxygen => Size::new(48.0, 48.0),
        Voice => Size::new(32.0, 32.0),
        Minimap => Size::new(260.0, 180.0),
        Compass => Size::new(320.0, 40.0),
        Speedometer => Size::new(220.0, 120.0),
        Fuel => Size::new(40.0, 120.0),
        Seatbelt => Size::new(32.0, 32.0),
        Money => Size::new(200.0, 60.0),
        Chat => Size::new(480.0, 300.0),
        Notifications => Size::new(320.0, 200.0),
        Progress => Size::new(360.0, 24.0),
    }
}

/// Rendering stand-in with every stock widget mounted at its intrinsic size.
pub fn default_measure() -> StaticMeasure {
    let mut measure = StaticMeasure::new();
    for descriptor in default_widgets() {
        measure.insert(descriptor.id, intrinsic_size(descriptor.kind));
    }
    measure
}

fn minimap(_: &WidgetId, size: Size, ctx: &LayoutContext, _: &PositionResolver<'_>) -> Point {
    Point::new(MARGIN, ctx.screen.height - MARGIN - size.height)
}

/// Where the leftmost status icon goes: beside the minimap, bottom-aligned,
/// when the minimap is shown; otherwise the bottom-left corner.
fn status_row_start(size: Size, ctx: &LayoutContext, r: &PositionResolver<'_>) -> Point {
    let minimap = WidgetKind::Minimap.name();
    match r.widget_rect(minimap) {
        Some(map) if ctx.flags.contains(ContextFlags::MINIMAP) && !r.is_hidden(minimap) => {
            Point::new(map.right() + STACK_SPACING, map.bottom() - size.height)
        }
        _ => Point::new(MARGIN, ctx.screen.height - MARGIN - size.height),
    }
}

/// Nearest shown status icon before `index` in the row.
fn previous_status(index: usize, r: &PositionResolver<'_>) -> Option<Rect> {
    STATUS_ORDER[..index]
        .iter()
        .rev()
        .map(|kind| kind.name())
        .filter(|id| !r.is_hidden(id))
        .find_map(|id| r.widget_rect(id))
}

fn status_icon(id: &WidgetId, size: Size, ctx: &LayoutContext, r: &PositionResolver<'_>) -> Point {
    let index = STATUS_ORDER
        .iter()
        .position(|kind| kind.name() == id.as_str())
        .unwrap_or(0);
    match previous_status(index, r) {
        Some(prev) => Point::new(prev.right() + STATUS_SPACING, prev.y),
        None => status_row_start(size, ctx, r),
    }
}

fn voice(_: &WidgetId, size: Size, ctx: &LayoutContext, r: &PositionResolver<'_>) -> Point {
    match previous_status(STATUS_ORDER.len(), r) {
        Some(last) => Point::new(
            last.right() + VOICE_SPACING,
            last.y + (last.height() - size.height) / 2.0,
        ),
        None => status_row_start(size, ctx, r),
    }
}

fn compass(_: &WidgetId, size: Size, ctx: &LayoutContext, _: &PositionResolver<'_>) -> Point {
    Point::new((ctx.screen.width - size.width) / 2.0, MARGIN)
}

fn bottom_right(size: Size, ctx: &LayoutContext) -> Point {
    Point::new(
        ctx.screen.width - MARGIN - size.width,
        ctx.screen.height - MARGIN - size.height,
    )
}

fn speedometer(_: &WidgetId, size: Size, ctx: &LayoutContext, _: &PositionResolver<'_>) -> Point {
    bottom_right(size, ctx)
}

fn fuel(_: &WidgetId, size: Size, ctx: &LayoutContext, r: &PositionResolver<'_>) -> Point {
    match r.widget_rect(WidgetKind::Speedometer.name()) {
        Some(speedo) => Point::new(
            speedo.x - GAUGE_SPACING - size.width,
            speedo.bottom() - size.height,
        ),
        None => bottom_right(size, ctx),
    }
}

fn seatbelt(_: &WidgetId, size: Size, ctx: &LayoutContext, r: &PositionResolver<'_>) -> Point {
    match r.widget_rect(WidgetKind::Speedometer.name()) {
        Some(speedo) => Point::new(
            speedo.right() - size.width,
            speedo.y - GAUGE_SPACING - size.height,
        ),
        None => bottom_right(size, ctx),
    }
}

fn top_right(size: Size, ctx: &LayoutContext) -> Point {
    Point::new(ctx.screen.width - MARGIN - size.width, MARGIN)
}

fn money(_: &WidgetId, size: Size, ctx: &LayoutContext, _: &PositionResolver<'_>) -> Point {
    top_right(size, ctx)
}

fn notifications(_: &WidgetId, size: Size, ctx: &LayoutContext, r: &PositionResolver<'_>) -> Point {
    let money = WidgetKind::Money.name();
    match r.widget_rect(money) {
        Some(rect) if !r.is_hidden(money) => {
            Point::new(ctx.screen.width - MARGIN - size.width, rect.bottom() + STACK_SPACING)
        }
        _ => top_right(size, ctx),
    }
}

fn chat(_: &WidgetId, _: Size, _: &LayoutContext, _: &PositionResolver<'_>) -> Point {
    Point::new(MARGIN, MARGIN)
}

/// Bottom centre, raised above anything it would otherwise sit on or crowd.
fn progress(id: &WidgetId, size: Size, ctx: &LayoutContext, r: &PositionResolver<'_>) -> Point {
    let origin = Point::new(
        (ctx.screen.width - size.width) / 2.0,
        ctx.screen.height - PROGRESS_LIFT - size.height,
    );
    let nearby = r.find_nearby_widgets(
        &Rect::from_parts(origin, size),
        PROGRESS_CLEARANCE,
        std::slice::from_ref(id),
    );
    let top = nearby.iter().map(|n| n.rect.y).fold(f64::INFINITY, f64::min);
    if top.is_finite() {
        Point::new(origin.x, top - PROGRESS_CLEARANCE - size.height)
    } else {
        origin
    }
}
