//! SVG path data as absolute drawing commands.
//!
//! Supports the `M L H V C Z` commands in both absolute and relative form,
//! including implicit repeated argument groups. Every command is returned in
//! absolute coordinates.

use svgtypes::{PathParser, PathSegment};

use crate::element::Point;
use crate::error::{CanvasError, CanvasResult};

/// A path command with absolute coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    /// Start a new sub-path.
    MoveTo(Point),
    /// Straight line (also produced by `H` and `V`).
    LineTo(Point),
    /// Cubic Bezier curve.
    CurveTo {
        /// First control point.
        c1: Point,
        /// Second control point.
        c2: Point,
        /// End point.
        end: Point,
    },
    /// Close the current sub-path.
    ClosePath,
}

impl PathCommand {
    /// The point the pen ends up at, if the command moves it explicitly.
    #[must_use]
    pub fn end_point(&self) -> Option<Point> {
        match *self {
            Self::MoveTo(p) | Self::LineTo(p) | Self::CurveTo { end: p, .. } => Some(p),
            Self::ClosePath => None,
        }
    }
}

/// Parse path data into absolute commands.
///
/// Tokenizing is done by [`svgtypes::PathParser`]; this layer resolves
/// relative coordinates and restricts the input to `M L H V C Z`.
///
/// # Errors
///
/// Returns [`CanvasError::PathSyntax`] on malformed data or on a segment
/// kind outside the supported subset.
pub fn parse_path(data: &str) -> CanvasResult<Vec<PathCommand>> {
    let mut commands = Vec::new();
    let mut current = Point::default();
    let mut subpath_start = Point::default();

    for (index, segment) in PathParser::from(data).enumerate() {
        let segment = segment.map_err(|e| CanvasError::PathSyntax {
            segment: index,
            message: e.to_string(),
        })?;
        let base = |abs: bool| if abs { Point::default() } else { current };

        let command = match segment {
            PathSegment::MoveTo { abs, x, y } => {
                let p = offset(base(abs), x, y);
                subpath_start = p;
                PathCommand::MoveTo(p)
            }
            PathSegment::LineTo { abs, x, y } => PathCommand::LineTo(offset(base(abs), x, y)),
            PathSegment::HorizontalLineTo { abs, x } => {
                let p = offset(base(abs), x, 0.0);
                PathCommand::LineTo(Point::new(p.x, current.y))
            }
            PathSegment::VerticalLineTo { abs, y } => {
                let p = offset(base(abs), 0.0, y);
                PathCommand::LineTo(Point::new(current.x, p.y))
            }
            PathSegment::CurveTo {
                abs,
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                let origin = base(abs);
                PathCommand::CurveTo {
                    c1: offset(origin, x1, y1),
                    c2: offset(origin, x2, y2),
                    end: offset(origin, x, y),
                }
            }
            PathSegment::ClosePath { .. } => PathCommand::ClosePath,
            other => {
                return Err(CanvasError::PathSyntax {
                    segment: index,
                    message: format!("unsupported segment {other:?}"),
                });
            }
        };

        current = command.end_point().unwrap_or(subpath_start);
        commands.push(command);
    }

    Ok(commands)
}

#[allow(clippy::cast_possible_truncation)]
fn offset(base: Point, dx: f64, dy: f64) -> Point {
    Point::new(base.x + dx as f32, base.y + dy as f32)
}
