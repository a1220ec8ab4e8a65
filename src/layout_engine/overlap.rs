use tracing::debug;

use super::engine::PlacedWidget;
use crate::common::config::StatusRowSettings;
use crate::sys::geometry::rects_overlap;

/// Pushes overlapping status indicators apart horizontally.
///
/// Shown status widgets are walked left to right (stable on ties, so input
/// order decides). When one overlaps its left neighbour it is moved to just
/// past that neighbour's right edge, and the moved rect is what the next
/// widget is checked against. Vertical positions are never touched, and x is
/// clamped so the widget does not start past `screen_width - width`; clamping
/// can bring an overlap back at the right edge of the screen.
pub fn resolve_status_overlaps(
    widgets: &[PlacedWidget],
    screen_width: f64,
    settings: &StatusRowSettings,
) -> Vec<PlacedWidget> {
    let mut row: Vec<usize> = widgets
        .iter()
        .enumerate()
        .filter(|(_, w)| w.kind.is_status() && w.is_shown())
        .map(|(i, _)| i)
        .collect();

    let mut out = widgets.to_vec();
    if row.len() <= 1 {
        return out;
    }

    row.sort_by(|&a, &b| widgets[a].rect.x.total_cmp(&widgets[b].rect.x));

    for pair in row.windows(2) {
        let prev = out[pair[0]].rect;
        let current = out[pair[1]].rect;
        if !rects_overlap(&prev, &current, settings.padding) {
            continue;
        }
        let max_x = (screen_width - current.width()).max(0.0);
        let x = (prev.right() + settings.gap).min(max_x);
        debug!(
            id = %out[pair[1]].id,
            against = %out[pair[0]].id,
            from = current.x,
            to = x,
            "status overlap"
        );
        out[pair[1]].rect = current.with_x(x);
    }

    out
}
