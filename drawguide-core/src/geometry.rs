//! Shape outlines and freehand smoothing.
//!
//! Everything here is a pure function of its inputs, so the interactive and
//! export renderers produce identical geometry for the same element.

use std::f32::consts::PI;

use crate::element::{DrawingElement, Point, Tool};

/// Curve tension applied to freehand strokes.
pub const FREEHAND_TENSION: f32 = 0.5;

/// Geometry to stroke for a single element.
#[derive(Debug, Clone, PartialEq)]
pub enum Outline {
    /// A circle outline.
    Circle {
        /// Circle center.
        center: Point,
        /// Circle radius.
        radius: f32,
    },
    /// A closed polygon through the given vertices.
    Polygon(Vec<Point>),
    /// An open freehand path made of smoothed segments.
    Path(Vec<PathSegment>),
}

/// One drawing command of a smoothed path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    /// Start a new sub-path.
    MoveTo(Point),
    /// Straight segment to a point.
    LineTo(Point),
    /// Quadratic Bezier with one control point.
    QuadTo(Point, Point),
    /// Cubic Bezier with two control points.
    CubicTo(Point, Point, Point),
}

/// Axis-aligned box spanned by two anchors, normalized to positive extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Left edge.
    pub left: f32,
    /// Top edge.
    pub top: f32,
    /// Width (never negative).
    pub width: f32,
    /// Height (never negative).
    pub height: f32,
}

impl BoundingBox {
    /// Box with corners at `a` and `b`.
    #[must_use]
    pub fn from_anchors(a: Point, b: Point) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

/// Radius of a circle dragged from `start` to `end`.
#[must_use]
pub fn circle_radius(start: Point, end: Point) -> f32 {
    start.distance_to(end)
}

/// Rectangle corners, clockwise from the top-left.
#[must_use]
pub fn rectangle_vertices(start: Point, end: Point) -> [Point; 4] {
    let b = BoundingBox::from_anchors(start, end);
    [
        Point::new(b.left, b.top),
        Point::new(b.right(), b.top),
        Point::new(b.right(), b.bottom()),
        Point::new(b.left, b.bottom()),
    ]
}

/// Isosceles triangle inscribed in the drag box: apex at the center of the
/// top edge, base along the bottom edge.
#[must_use]
pub fn triangle_vertices(start: Point, end: Point) -> [Point; 3] {
    let b = BoundingBox::from_anchors(start, end);
    [
        Point::new(b.left + b.width / 2.0, b.top),
        Point::new(b.left, b.bottom()),
        Point::new(b.right(), b.bottom()),
    ]
}

/// Regular hexagon centered in the drag box with radius half the smaller box
/// side. Vertex `i` sits at `i * 60° - 30°`.
#[must_use]
pub fn hexagon_vertices(start: Point, end: Point) -> [Point; 6] {
    let b = BoundingBox::from_anchors(start, end);
    let center = b.center();
    let radius = b.width.min(b.height) / 2.0;

    std::array::from_fn(|i| {
        #[allow(clippy::cast_precision_loss)]
        let angle = (i as f32) * PI / 3.0 - PI / 6.0;
        Point::new(
            center.x + radius * angle.cos(),
            center.y + radius * angle.sin(),
        )
    })
}

/// Outline for a shape tool dragged from `start` to `end`.
///
/// Returns `None` for freehand tools.
#[must_use]
pub fn shape_outline(tool: Tool, start: Point, end: Point) -> Option<Outline> {
    match tool {
        Tool::Circle => Some(Outline::Circle {
            center: start,
            radius: circle_radius(start, end),
        }),
        Tool::Square => Some(Outline::Polygon(rectangle_vertices(start, end).to_vec())),
        Tool::Triangle => Some(Outline::Polygon(triangle_vertices(start, end).to_vec())),
        Tool::Hexagon => Some(Outline::Polygon(hexagon_vertices(start, end).to_vec())),
        Tool::Brush | Tool::Eraser => None,
    }
}

/// Outline to stroke for an element, or `None` if it has too little data to
/// draw anything.
#[must_use]
pub fn element_outline(element: &DrawingElement) -> Option<Outline> {
    if element.tool.is_shape() {
        let (start, end) = element.anchors()?;
        return shape_outline(element.tool, start, end);
    }
    if element.points.len() < 2 {
        return None;
    }
    Some(Outline::Path(smooth_polyline(
        &element.points,
        FREEHAND_TENSION,
    )))
}

/// Total length of a polyline: the sum of its segment lengths.
#[must_use]
pub fn polyline_length(points: &[Point]) -> f32 {
    points
        .windows(2)
        .map(|pair| pair[0].distance_to(pair[1]))
        .sum()
}

/// A smoothed interior point with its incoming and outgoing control points.
#[derive(Debug, Clone, Copy)]
struct Knot {
    before: Point,
    at: Point,
    after: Point,
}

/// Control points for the middle point of three, scaled by tension and by
/// the relative lengths of the adjoining segments.
fn control_points(p0: Point, p1: Point, p2: Point, tension: f32) -> Option<(Point, Point)> {
    let d01 = p0.distance_to(p1);
    let d12 = p1.distance_to(p2);
    let total = d01 + d12;
    if total <= f32::EPSILON {
        return None;
    }
    let fa = tension * d01 / total;
    let fb = tension * d12 / total;
    let dx = p2.x - p0.x;
    let dy = p2.y - p0.y;
    Some((
        Point::new(p1.x - fa * dx, p1.y - fa * dy),
        Point::new(p1.x + fb * dx, p1.y + fb * dy),
    ))
}

/// Turn a freehand polyline into a smooth path.
///
/// Interior points get Catmull-Rom style control points; the first and last
/// segments are quadratic and the rest cubic. Fewer than three points, or a
/// zero tension, yields straight segments.
#[must_use]
pub fn smooth_polyline(points: &[Point], tension: f32) -> Vec<PathSegment> {
    let Some(&first) = points.first() else {
        return Vec::new();
    };

    let knots: Vec<Knot> = if points.len() > 2 && tension != 0.0 {
        points
            .windows(3)
            .filter_map(|w| {
                control_points(w[0], w[1], w[2], tension).map(|(before, after)| Knot {
                    before,
                    at: w[1],
                    after,
                })
            })
            .collect()
    } else {
        Vec::new()
    };

    let mut segments = vec![PathSegment::MoveTo(first)];
    let (Some(head), Some(tail), Some(&last)) = (knots.first(), knots.last(), points.last())
    else {
        segments.extend(points.iter().skip(1).map(|&p| PathSegment::LineTo(p)));
        return segments;
    };

    segments.push(PathSegment::QuadTo(head.before, head.at));
    for pair in knots.windows(2) {
        segments.push(PathSegment::CubicTo(pair[0].after, pair[1].before, pair[1].at));
    }
    segments.push(PathSegment::QuadTo(tail.after, last));
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::StrokeStyle;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_circle_radius_is_euclidean() {
        let r = circle_radius(Point::new(0.0, 0.0), Point::new(3.0, 4.0));
        assert!(approx(r, 5.0));
    }

    #[test]
    fn test_rectangle_normalizes_negative_drag() {
        let corners = rectangle_vertices(Point::new(10.0, 10.0), Point::new(2.0, 4.0));
        assert_eq!(corners[0], Point::new(2.0, 4.0));
        assert_eq!(corners[2], Point::new(10.0, 10.0));
    }

    #[test]
    fn test_triangle_apex_on_top_edge() {
        let [apex, left, right] = triangle_vertices(Point::new(0.0, 0.0), Point::new(10.0, 20.0));
        assert_eq!(apex, Point::new(5.0, 0.0));
        assert_eq!(left, Point::new(0.0, 20.0));
        assert_eq!(right, Point::new(10.0, 20.0));

        // Dragging upward still puts the apex at the top.
        let [apex, ..] = triangle_vertices(Point::new(10.0, 20.0), Point::new(0.0, 0.0));
        assert_eq!(apex, Point::new(5.0, 0.0));
    }

    #[test]
    fn test_hexagon_is_regular_and_centered() {
        let verts = hexagon_vertices(Point::new(0.0, 0.0), Point::new(40.0, 20.0));
        let center = Point::new(20.0, 10.0);
        for v in verts {
            assert!(approx(v.distance_to(center), 10.0));
        }
        // First vertex at -30 degrees.
        assert!(approx(verts[0].x, 20.0 + 10.0 * (PI / 6.0).cos()));
        assert!(approx(verts[0].y, 10.0 - 5.0));
    }

    #[test]
    fn test_freehand_outline_requires_two_points() {
        let style = StrokeStyle::default();
        let dot = DrawingElement::freehand(Tool::Brush, vec![Point::new(1.0, 1.0)], &style);
        assert!(element_outline(&dot).is_none());

        let line = DrawingElement::freehand(
            Tool::Brush,
            vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0)],
            &style,
        );
        assert!(matches!(element_outline(&line), Some(Outline::Path(_))));
    }

    #[test]
    fn test_polyline_length() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(3.0, 4.0),
            Point::new(3.0, 10.0),
        ];
        assert!(approx(polyline_length(&pts), 11.0));
        assert!(approx(polyline_length(&pts[..1]), 0.0));
    }

    #[test]
    fn test_smooth_two_points_is_straight() {
        let segs = smooth_polyline(&[Point::new(0.0, 0.0), Point::new(4.0, 0.0)], 0.5);
        assert_eq!(
            segs,
            vec![
                PathSegment::MoveTo(Point::new(0.0, 0.0)),
                PathSegment::LineTo(Point::new(4.0, 0.0)),
            ]
        );
    }

    #[test]
    fn test_smooth_curve_shape() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(20.0, 0.0),
            Point::new(30.0, 10.0),
        ];
        let segs = smooth_polyline(&pts, 0.5);
        // move, quad, one cubic between the two interior knots, quad
        assert_eq!(segs.len(), 4);
        assert!(matches!(segs[1], PathSegment::QuadTo(_, p) if p == pts[1]));
        assert!(matches!(segs[2], PathSegment::CubicTo(_, _, p) if p == pts[2]));
        assert!(matches!(segs[3], PathSegment::QuadTo(_, p) if p == pts[3]));
    }

    #[test]
    fn test_smooth_skips_duplicate_points() {
        let p = Point::new(2.0, 2.0);
        let segs = smooth_polyline(&[p, p, p], 0.5);
        assert_eq!(segs.len(), 3);
        assert!(matches!(segs[1], PathSegment::LineTo(_)));
    }
}
