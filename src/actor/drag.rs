use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::layout_engine::{
    Direction, PlacedWidget, SnapLine, SnapResult, compute_snap, dedupe_snap_lines,
};
use crate::model::widget::WidgetId;
use crate::sys::geometry::Rect;
use crate::sys::timer::Timer;

#[derive(Debug, Clone, PartialEq)]
pub enum SnapState {
    /// Modifier up; drags pass through.
    Idle,
    /// Modifier down. `targets` is frozen until the key is released so guides
    /// do not flicker as the dragged widget moves.
    Armed { targets: Vec<WidgetId> },
    Snapping {
        widget: WidgetId,
        targets: Vec<WidgetId>,
    },
}

#[derive(Debug)]
pub struct SnapSession {
    state: SnapState,
    threshold: f64,
    selection: Vec<WidgetId>,
}

impl SnapSession {
    pub fn new(threshold: f64) -> Self {
        Self {
            state: SnapState::Idle,
            threshold,
            selection: Vec::new(),
        }
    }

    pub fn state(&self) -> &SnapState { &self.state }

    pub fn is_snapping(&self) -> bool { matches!(self.state, SnapState::Snapping { .. }) }

    /// Co-selected widgets move together and never snap to each other.
    pub fn set_selection(&mut self, ids: Vec<WidgetId>) { self.selection = ids; }

    pub fn modifier_down(&mut self, layout: &[PlacedWidget], simple_mode: bool) {
        if !matches!(self.state, SnapState::Idle) {
            return;
        }
        let targets: Vec<WidgetId> = layout
            .iter()
            .filter(|w| w.is_shown() && !(simple_mode && w.sub_widget))
            .map(|w| w.id.clone())
            .collect();
        debug!(targets = targets.len(), "snap armed");
        self.state = SnapState::Armed { targets };
    }

    pub fn modifier_up(&mut self) {
        if !matches!(self.state, SnapState::Idle) {
            debug!("snap disarmed");
        }
        self.state = SnapState::Idle;
    }

    /// Snaps `proposed` (the dragged widget's rect at the pointer) against
    /// the frozen targets, looking their live rects up in `layout`.
    pub fn drag_move(
        &mut self,
        widget: &WidgetId,
        proposed: Rect,
        layout: &[PlacedWidget],
    ) -> SnapResult {
        let targets = match std::mem::replace(&mut self.state, SnapState::Idle) {
            SnapState::Idle => return SnapResult::passthrough(proposed.origin()),
            SnapState::Armed { targets } | SnapState::Snapping { targets, .. } => targets,
        };

        let excluded = |id: &WidgetId| {
            id == widget || (self.selection.contains(widget) && self.selection.contains(id))
        };
        let others: Vec<Rect> = targets
            .iter()
            .filter(|id| !excluded(id))
            .filter_map(|id| layout.iter().find(|w| &w.id == id).map(|w| w.rect))
            .collect();

        let result = compute_snap(proposed, &others, self.threshold);
        trace!(%widget, position = ?result.position, lines = result.lines.len(), "snap");
        self.state = SnapState::Snapping { widget: widget.clone(), targets };
        result
    }

    /// Back to armed while the modifier is still held.
    pub fn drag_end(&mut self) {
        if let SnapState::Snapping { targets, .. } = std::mem::replace(&mut self.state, SnapState::Idle)
        {
            self.state = SnapState::Armed { targets };
        }
    }
}

/// Moves `current` one step in `direction` without snapping, and reports
/// the guides the moved rect now sits on.
pub fn nudge(
    widget: &WidgetId,
    current: Rect,
    direction: Direction,
    step: f64,
    layout: &[PlacedWidget],
) -> SnapResult {
    let moved = current.with_origin(direction.offset(current.origin(), step));
    let others: Vec<Rect> = layout
        .iter()
        .filter(|w| &w.id != widget && w.is_shown())
        .map(|w| w.rect)
        .collect();
    compute_snap(moved, &others, 0.0)
}

#[derive(Debug, Default)]
struct Guides {
    lines: Vec<SnapLine>,
    generation: u64,
}

/// The guide lines currently on screen.
///
/// Every change bumps a generation; a clear timer only acts if nothing has
/// changed since it was scheduled.
#[derive(Debug)]
pub struct GuideOverlay {
    guides: Arc<Mutex<Guides>>,
    timer: Option<Timer>,
    display: Duration,
}

impl GuideOverlay {
    pub fn new(display: Duration) -> Self {
        Self {
            guides: Arc::default(),
            timer: None,
            display,
        }
    }

    fn replace(&mut self, lines: Vec<SnapLine>) -> u64 {
        self.timer = None;
        let mut guides = self.guides.lock();
        guides.lines = lines;
        guides.generation += 1;
        guides.generation
    }

    pub fn show(&mut self, lines: &[SnapLine]) { self.replace(dedupe_snap_lines(lines)); }

    /// Shows `lines` until the display time runs out or something else
    /// replaces them.
    pub fn show_temporarily(&mut self, lines: &[SnapLine]) {
        let generation = self.replace(dedupe_snap_lines(lines));
        let guides = self.guides.clone();
        self.timer = Some(Timer::after(self.display, move || {
            let mut guides = guides.lock();
            if guides.generation == generation {
                guides.lines.clear();
                guides.generation += 1;
            }
        }));
    }

    pub fn clear(&mut self) { self.replace(Vec::new()); }

    pub fn lines(&self) -> Vec<SnapLine> { self.guides.lock().lines.clone() }

    pub fn is_empty(&self) -> bool { self.guides.lock().lines.is_empty() }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::layout_engine::{Orientation, SnapKind};
    use crate::model::widget::WidgetKind;
    use crate::sys::geometry::Point;

    fn placed(id: &str, rect: Rect) -> PlacedWidget {
        PlacedWidget {
            id: WidgetId::from(id),
            kind: WidgetKind::Money,
            rect,
            scale: 1.0,
            visible: true,
            disabled: false,
            sub_widget: false,
        }
    }

    fn layout() -> Vec<PlacedWidget> {
        vec![
            placed("anchor", Rect::new(100.0, 100.0, 50.0, 50.0)),
            placed("dragged", Rect::new(400.0, 400.0, 40.0, 40.0)),
        ]
    }

    #[test]
    fn idle_drags_pass_through() {
        let mut session = SnapSession::new(5.0);
        let result = session.drag_move(
            &WidgetId::from("dragged"),
            Rect::new(153.0, 300.0, 40.0, 40.0),
            &layout(),
        );
        assert_eq!(result, SnapResult::passthrough(Point::new(153.0, 300.0)));
        assert_eq!(session.state(), &SnapState::Idle);
    }

    #[test]
    fn armed_drag_snaps_then_key_release_goes_idle() {
        let layout = layout();
        let dragged = WidgetId::from("dragged");
        let mut session = SnapSession::new(5.0);
        session.modifier_down(&layout, false);

        let result = session.drag_move(&dragged, Rect::new(153.0, 300.0, 40.0, 40.0), &layout);
        assert_eq!(result.position, Point::new(150.0, 300.0));
        assert!(session.is_snapping());

        session.drag_end();
        assert!(matches!(session.state(), SnapState::Armed { .. }));
        session.modifier_up();
        assert_eq!(session.state(), &SnapState::Idle);
    }

    #[test]
    fn targets_are_frozen_at_key_down() {
        let mut layout = layout();
        let mut session = SnapSession::new(5.0);
        session.modifier_down(&layout, false);

        // shows up after the key went down, so it is not a target
        layout.push(placed("late", Rect::new(0.0, 600.0, 10.0, 10.0)));
        let result = session.drag_move(
            &WidgetId::from("dragged"),
            Rect::new(3.0, 700.0, 40.0, 40.0),
            &layout,
        );
        assert!(!result.snapped_x);
    }

    #[test]
    fn simple_mode_and_selection_exclude_targets() {
        let mut layout = layout();
        layout[0].sub_widget = true;
        let mut session = SnapSession::new(5.0);
        session.modifier_down(&layout, true);
        let dragged = WidgetId::from("dragged");
        let result = session.drag_move(&dragged, Rect::new(153.0, 300.0, 40.0, 40.0), &layout);
        assert!(!result.snapped_x);

        let layout = self::layout();
        let mut session = SnapSession::new(5.0);
        session.set_selection(vec![WidgetId::from("anchor"), dragged.clone()]);
        session.modifier_down(&layout, false);
        let result = session.drag_move(&dragged, Rect::new(153.0, 300.0, 40.0, 40.0), &layout);
        assert!(!result.snapped_x);
    }

    #[test]
    fn nudge_moves_exactly_one_step_and_reports_guides() {
        let layout = layout();
        let result = nudge(
            &WidgetId::from("dragged"),
            Rect::new(151.0, 300.0, 40.0, 40.0),
            Direction::Left,
            1.0,
            &layout,
        );
        assert_eq!(result.position, Point::new(150.0, 300.0));
        assert_eq!(
            result.lines,
            [SnapLine {
                orientation: Orientation::Vertical,
                position: 150.0,
                kind: SnapKind::Edge
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn temporary_guides_clear_after_the_display_time() {
        let mut overlay = GuideOverlay::new(Duration::from_millis(1000));
        let line = SnapLine::vertical(10.0, SnapKind::Edge);
        overlay.show_temporarily(&[line, SnapLine::vertical(10.5, SnapKind::Edge)]);
        assert_eq!(overlay.lines(), [line]);

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert!(!overlay.is_empty());
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(overlay.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn a_newer_call_supersedes_the_pending_clear() {
        let mut overlay = GuideOverlay::new(Duration::from_millis(1000));
        overlay.show_temporarily(&[SnapLine::vertical(10.0, SnapKind::Edge)]);
        tokio::time::sleep(Duration::from_millis(600)).await;
        overlay.show_temporarily(&[SnapLine::horizontal(20.0, SnapKind::Gap)]);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(overlay.lines(), [SnapLine::horizontal(20.0, SnapKind::Gap)]);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(overlay.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_clear_cancels_the_timer() {
        let mut overlay = GuideOverlay::new(Duration::from_millis(100));
        overlay.show_temporarily(&[SnapLine::vertical(10.0, SnapKind::Edge)]);
        overlay.clear();
        overlay.show(&[SnapLine::vertical(30.0, SnapKind::Center)]);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(overlay.lines(), [SnapLine::vertical(30.0, SnapKind::Center)]);
    }
}
