use serde::{Deserialize, Serialize};

use crate::sys::geometry::{Point, Rect};

/// Orientation of a guide line. A vertical line sits at an x position and
/// constrains horizontal movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Start and length of `rect` along the axis this orientation's lines are
    /// positioned on.
    pub(crate) fn span(self, rect: &Rect) -> (f64, f64) {
        match self {
            Orientation::Vertical => (rect.x, rect.width()),
            Orientation::Horizontal => (rect.y, rect.height()),
        }
    }

    /// Start and end of `rect` on the other axis.
    pub(crate) fn cross_extent(self, rect: &Rect) -> (f64, f64) {
        match self {
            Orientation::Vertical => (rect.y, rect.bottom()),
            Orientation::Horizontal => (rect.x, rect.right()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn offset(self, point: Point, step: f64) -> Point {
        match self {
            Direction::Left => Point::new(point.x - step, point.y),
            Direction::Right => Point::new(point.x + step, point.y),
            Direction::Up => Point::new(point.x, point.y - step),
            Direction::Down => Point::new(point.x, point.y + step),
        }
    }
}
