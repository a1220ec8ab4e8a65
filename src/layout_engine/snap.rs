use serde::{Deserialize, Serialize};

use super::axis::Orientation;
use crate::sys::geometry::{Point, Rect};

/// Guides closer than this are drawn as one.
pub const MERGE_TOLERANCE: f64 = 1.0;

/// A snapped edge counts as sitting on a guide within this distance.
const MATCH_EPSILON: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapKind {
    Edge,
    Center,
    Gap,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapLine {
    #[serde(rename = "type")]
    pub orientation: Orientation,
    pub position: f64,
    #[serde(rename = "snapType")]
    pub kind: SnapKind,
}

impl SnapLine {
    pub fn vertical(position: f64, kind: SnapKind) -> Self {
        Self {
            orientation: Orientation::Vertical,
            position,
            kind,
        }
    }

    pub fn horizontal(position: f64, kind: SnapKind) -> Self {
        Self {
            orientation: Orientation::Horizontal,
            position,
            kind,
        }
    }
}

/// Which part of the dragged rect a candidate line would align.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Center,
    End,
}

impl Anchor {
    fn offset(self, len: f64) -> f64 {
        match self {
            Anchor::Start => 0.0,
            Anchor::Center => len / 2.0,
            Anchor::End => len,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub anchor: Anchor,
    pub line: SnapLine,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SnapResult {
    pub position: Point,
    pub lines: Vec<SnapLine>,
    pub snapped_x: bool,
    pub snapped_y: bool,
}

impl SnapResult {
    pub fn passthrough(position: Point) -> Self {
        Self {
            position,
            lines: Vec::new(),
            snapped_x: false,
            snapped_y: false,
        }
    }
}

fn line(orientation: Orientation, position: f64, kind: SnapKind) -> SnapLine {
    SnapLine { orientation, position, kind }
}

fn extents_overlap((a0, a1): (f64, f64), (b0, b1): (f64, f64)) -> bool { a0 < b1 && b0 < a1 }

/// Guides `dragged` could align with along one axis.
///
/// Edges align with edges and centers with centers. Gap guides continue the
/// spacing between two widgets that share a row (or column) with the dragged
/// one, on either outer side of the pair.
pub fn snap_candidates(dragged: &Rect, others: &[Rect], orientation: Orientation) -> Vec<Candidate> {
    let mut out = Vec::with_capacity(others.len() * 5);

    for other in others {
        let (start, len) = orientation.span(other);
        let end = start + len;
        for position in [start, end] {
            for anchor in [Anchor::Start, Anchor::End] {
                out.push(Candidate {
                    anchor,
                    line: line(orientation, position, SnapKind::Edge),
                });
            }
        }
        out.push(Candidate {
            anchor: Anchor::Center,
            line: line(orientation, start + len / 2.0, SnapKind::Center),
        });
    }

    let dragged_cross = orientation.cross_extent(dragged);
    for a in others {
        for b in others {
            let (a_start, a_len) = orientation.span(a);
            let (b_start, b_len) = orientation.span(b);
            let gap = b_start - (a_start + a_len);
            if gap <= 0.0
                || !extents_overlap(orientation.cross_extent(a), orientation.cross_extent(b))
            {
                continue;
            }
            if extents_overlap(dragged_cross, orientation.cross_extent(b)) {
                out.push(Candidate {
                    anchor: Anchor::Start,
                    line: line(orientation, b_start + b_len + gap, SnapKind::Gap),
                });
            }
            if extents_overlap(dragged_cross, orientation.cross_extent(a)) {
                out.push(Candidate {
                    anchor: Anchor::End,
                    line: line(orientation, a_start - gap, SnapKind::Gap),
                });
            }
        }
    }

    out
}

/// Snaps `dragged` to the nearest guide within `threshold` on each axis
/// independently, and reports every guide the result sits on.
///
/// A rect already on a guide stays where it is.
pub fn compute_snap(dragged: Rect, others: &[Rect], threshold: f64) -> SnapResult {
    let mut origin = dragged.origin();
    let mut snapped = [false; 2];

    for (i, orientation) in [Orientation::Vertical, Orientation::Horizontal].into_iter().enumerate() {
        let (start, len) = orientation.span(&dragged);
        let best = snap_candidates(&dragged, others, orientation)
            .into_iter()
            .map(|c| c.line.position - (start + c.anchor.offset(len)))
            .filter(|delta| delta.abs() <= threshold)
            .min_by(|a, b| a.abs().total_cmp(&b.abs()));
        if let Some(delta) = best {
            snapped[i] = true;
            match orientation {
                Orientation::Vertical => origin.x += delta,
                Orientation::Horizontal => origin.y += delta,
            }
        }
    }

    let result = dragged.with_origin(origin);
    let mut lines = Vec::new();
    for orientation in [Orientation::Vertical, Orientation::Horizontal] {
        let (start, len) = orientation.span(&result);
        lines.extend(
            snap_candidates(&result, others, orientation)
                .into_iter()
                .filter(|c| {
                    (c.line.position - (start + c.anchor.offset(len))).abs() <= MATCH_EPSILON
                })
                .map(|c| c.line),
        );
    }

    SnapResult {
        position: origin,
        lines,
        snapped_x: snapped[0],
        snapped_y: snapped[1],
    }
}

/// Collapses guides of the same orientation and kind that are within
/// [`MERGE_TOLERANCE`] of an earlier one.
pub fn dedupe_snap_lines(lines: &[SnapLine]) -> Vec<SnapLine> {
    let mut kept: Vec<SnapLine> = Vec::with_capacity(lines.len());
    for line in lines {
        let duplicate = kept.iter().any(|k| {
            k.orientation == line.orientation
                && k.kind == line.kind
                && (k.position - line.position).abs() <= MERGE_TOLERANCE
        });
        if !duplicate {
            kept.push(*line);
        }
    }
    kept
}
