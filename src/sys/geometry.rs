use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self { Self { x, y } }

    pub fn is_finite(&self) -> bool { self.x.is_finite() && self.y.is_finite() }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Size = Size { width: 0.0, height: 0.0 };

    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: non_negative(width),
            height: non_negative(height),
        }
    }

    pub fn scaled(self, scale: f64) -> Self { Self::new(self.width * scale, self.height * scale) }

    pub fn is_empty(&self) -> bool { self.width <= 0.0 || self.height <= 0.0 }
}

/// Axis-aligned box in screen pixels, origin at the top-left.
///
/// Width and height are never negative; `right()` and `bottom()` are derived so
/// they always agree with the origin and size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "RectRepr", from = "RectRepr")]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    width: f64,
    height: f64,
}

#[derive(Clone, Copy, Serialize, Deserialize)]
struct RectRepr {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    #[serde(default)]
    right: f64,
    #[serde(default)]
    bottom: f64,
}

impl From<Rect> for RectRepr {
    fn from(r: Rect) -> Self {
        RectRepr {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
            right: r.right(),
            bottom: r.bottom(),
        }
    }
}

impl From<RectRepr> for Rect {
    fn from(r: RectRepr) -> Self { Rect::new(r.x, r.y, r.width, r.height) }
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: non_negative(width),
            height: non_negative(height),
        }
    }

    pub fn from_parts(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn width(&self) -> f64 { self.width }

    pub fn height(&self) -> f64 { self.height }

    pub fn right(&self) -> f64 { self.x + self.width }

    pub fn bottom(&self) -> f64 { self.y + self.height }

    pub fn origin(&self) -> Point { Point::new(self.x, self.y) }

    pub fn size(&self) -> Size { Size::new(self.width, self.height) }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn with_origin(self, origin: Point) -> Self {
        Self { x: origin.x, y: origin.y, ..self }
    }

    pub fn with_x(self, x: f64) -> Self { Self { x, ..self } }

    pub fn translate(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    pub fn overlaps(&self, other: &Rect, padding: f64) -> bool {
        rects_overlap(self, other, padding)
    }

    pub fn distance_to(&self, other: &Rect) -> f64 { rects_distance(self, other) }
}

fn non_negative(v: f64) -> f64 { if v.is_finite() && v > 0.0 { v } else { 0.0 } }

/// True unless `a` lies entirely to one side of `b` with more than `padding`
/// clearance. Touching edges count as overlapping.
pub fn rects_overlap(a: &Rect, b: &Rect, padding: f64) -> bool {
    !(a.right() + padding < b.x
        || b.right() + padding < a.x
        || a.bottom() + padding < b.y
        || b.bottom() + padding < a.y)
}

/// Minimum Euclidean separation between the edges of two rects; 0 when they
/// overlap or touch.
pub fn rects_distance(a: &Rect, b: &Rect) -> f64 {
    let gap_x = (b.x - a.right()).max(a.x - b.right()).max(0.0);
    let gap_y = (b.y - a.bottom()).max(a.y - b.bottom()).max(0.0);
    (gap_x * gap_x + gap_y * gap_y).sqrt()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Rect { Rect::new(x, y, w, h) }

    #[test]
    fn derived_edges_follow_origin_and_size() {
        let r = rect(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.right(), 40.0);
        assert_eq!(r.bottom(), 60.0);
        assert_eq!(r.center(), Point::new(25.0, 40.0));

        let moved = r.translate(5.0, -5.0);
        assert_eq!(moved.right(), 45.0);
        assert_eq!(moved.bottom(), 55.0);
    }

    #[test]
    fn negative_and_nan_sizes_collapse_to_zero() {
        let r = rect(0.0, 0.0, -10.0, f64::NAN);
        assert_eq!(r.width(), 0.0);
        assert_eq!(r.height(), 0.0);
        assert!(Size::new(20.0, f64::INFINITY).is_empty());
    }

    #[test]
    fn overlap_is_symmetric_and_inclusive_of_touching_edges() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let touching = rect(10.0, 0.0, 10.0, 10.0);
        let apart = rect(15.0, 0.0, 10.0, 10.0);

        assert!(rects_overlap(&a, &touching, 0.0));
        assert!(rects_overlap(&touching, &a, 0.0));
        assert!(!rects_overlap(&a, &apart, 0.0));
        assert!(!rects_overlap(&apart, &a, 0.0));

        // 5px of clearance is not enough when 5px of padding is required.
        assert!(rects_overlap(&a, &apart, 5.0));
        assert!(!rects_overlap(&a, &apart, 4.0));
    }

    #[test]
    fn distance_is_zero_for_overlapping_and_touching_rects() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        assert_eq!(rects_distance(&a, &rect(5.0, 5.0, 10.0, 10.0)), 0.0);
        assert_eq!(rects_distance(&a, &rect(10.0, 0.0, 10.0, 10.0)), 0.0);
        // corners touching
        assert_eq!(rects_distance(&a, &rect(10.0, 10.0, 5.0, 5.0)), 0.0);
    }

    #[test]
    fn distance_measures_nearest_edges() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        // horizontal only
        assert_eq!(rects_distance(&a, &rect(17.0, 2.0, 10.0, 4.0)), 7.0);
        // vertical only, b above a
        assert_eq!(rects_distance(&a, &rect(0.0, -25.0, 10.0, 5.0)), 20.0);
        // diagonal: 3-4-5 triangle between nearest corners
        assert_eq!(rects_distance(&a, &rect(13.0, 14.0, 10.0, 10.0)), 5.0);
        assert_eq!(rects_distance(&rect(13.0, 14.0, 10.0, 10.0), &a), 5.0);
    }

    #[test]
    fn distance_is_not_center_to_center() {
        let wide = rect(0.0, 0.0, 1000.0, 10.0);
        let small = rect(0.0, 12.0, 10.0, 10.0);
        assert_eq!(rects_distance(&wide, &small), 2.0);
    }

    #[test]
    fn serialized_rect_carries_right_and_bottom() {
        let json = serde_json::to_value(rect(1.0, 2.0, 3.0, 4.0)).unwrap();
        assert_eq!(json["right"], 4.0);
        assert_eq!(json["bottom"], 6.0);

        let back: Rect =
            serde_json::from_str(r#"{"x":1,"y":2,"width":3,"height":4,"right":99}"#).unwrap();
        assert_eq!(back.right(), 4.0);
    }
}
