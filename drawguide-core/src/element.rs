//! Drawing elements - the strokes and shapes a user commits to the canvas.

use serde::{Deserialize, Serialize};

/// Default stroke color for new drawings and merged AI strokes.
pub const DEFAULT_COLOR: &str = "#000000";

/// Color recorded for eraser strokes.
pub const ERASER_COLOR: &str = "#ffffff";

/// Default stroke width in pixels.
pub const DEFAULT_STROKE_WIDTH: f32 = 2.0;

/// A coordinate in canvas pixel space.
///
/// Points are not clamped: dragging off the canvas produces coordinates
/// outside `[0, canvas_size]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X position (pixels from left).
    pub x: f32,
    /// Y position (pixels from top).
    pub y: f32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// The drawing tool that produced an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Freehand pen.
    #[default]
    Brush,
    /// Freehand eraser (destructive compositing).
    Eraser,
    /// Circle centered on the drag start.
    Circle,
    /// Axis-aligned rectangle.
    Square,
    /// Isosceles triangle inscribed in the drag box.
    Triangle,
    /// Regular hexagon centered in the drag box.
    Hexagon,
}

impl Tool {
    /// All tools, in toolbar order.
    pub const ALL: [Tool; 6] = [
        Tool::Brush,
        Tool::Eraser,
        Tool::Circle,
        Tool::Square,
        Tool::Triangle,
        Tool::Hexagon,
    ];

    /// Whether this tool is defined by two anchors rather than a path.
    #[must_use]
    pub const fn is_shape(self) -> bool {
        matches!(
            self,
            Tool::Circle | Tool::Square | Tool::Triangle | Tool::Hexagon
        )
    }

    /// Lowercase name used in persisted drawings.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Tool::Brush => "brush",
            Tool::Eraser => "eraser",
            Tool::Circle => "circle",
            Tool::Square => "square",
            Tool::Triangle => "triangle",
            Tool::Hexagon => "hexagon",
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tool::ALL
            .into_iter()
            .find(|tool| tool.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown tool '{s}'"))
    }
}

/// Color and width applied to strokes as they are drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    /// Stroke color as a CSS hex string.
    pub color: String,
    /// Line thickness in pixels.
    pub width: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR.to_string(),
            width: DEFAULT_STROKE_WIDTH,
        }
    }
}

/// One committed user action: a freehand path or a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingElement {
    /// Tool that produced the element.
    pub tool: Tool,
    /// Freehand path, or the two shape anchors.
    pub points: Vec<Point>,
    /// Stroke color as a CSS hex string.
    pub color: String,
    /// Line thickness in pixels.
    pub stroke_width: f32,
    /// Drag-start anchor (shape tools only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_point: Option<Point>,
    /// Drag-release anchor (shape tools only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_point: Option<Point>,
}

impl DrawingElement {
    /// Create a freehand element from a captured path.
    ///
    /// Eraser elements always record [`ERASER_COLOR`].
    #[must_use]
    pub fn freehand(tool: Tool, points: Vec<Point>, style: &StrokeStyle) -> Self {
        let color = if tool == Tool::Eraser {
            ERASER_COLOR.to_string()
        } else {
            style.color.clone()
        };
        Self {
            tool,
            points,
            color,
            stroke_width: style.width,
            start_point: None,
            end_point: None,
        }
    }

    /// Create a shape element from its drag anchors.
    #[must_use]
    pub fn shape(tool: Tool, start: Point, end: Point, style: &StrokeStyle) -> Self {
        Self {
            tool,
            points: vec![start, end],
            color: style.color.clone(),
            stroke_width: style.width,
            start_point: Some(start),
            end_point: Some(end),
        }
    }

    /// The shape anchors, falling back to the first and last points when the
    /// explicit anchors are missing.
    #[must_use]
    pub fn anchors(&self) -> Option<(Point, Point)> {
        match (self.start_point, self.end_point) {
            (Some(start), Some(end)) => Some((start, end)),
            _ if self.points.len() >= 2 => {
                let first = self.points.first().copied()?;
                let last = self.points.last().copied()?;
                Some((first, last))
            }
            _ => None,
        }
    }

    /// Whether the element destructively erases underlying pixels.
    #[must_use]
    pub fn is_eraser(&self) -> bool {
        self.tool == Tool::Eraser
    }
}

/// Parse a CSS hex color (`#rgb`, `#rrggbb` or `#rrggbbaa`) into RGBA bytes.
#[must_use]
pub fn parse_hex_color(color: &str) -> Option<[u8; 4]> {
    let hex = color.trim().strip_prefix('#')?;
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();

    match hex.len() {
        3 => {
            let mut rgba = [255; 4];
            for (slot, c) in rgba.iter_mut().zip(hex.chars()) {
                let v = u8::try_from(c.to_digit(16)?).ok()?;
                *slot = v * 17;
            }
            Some(rgba)
        }
        6 => Some([channel(0)?, channel(2)?, channel(4)?, 255]),
        8 => Some([channel(0)?, channel(2)?, channel(4)?, channel(6)?]),
        _ => None,
    }
}
