//! Vector path processing.
//!
//! Turns the path data returned by a vectorizer into a short list of clean
//! strokes that can be merged into the drawing:
//!
//! ```text
//! path data -> point runs -> simplify -> length filter -> reading order -> merge
//! ```

use serde::{Deserialize, Serialize};

use crate::element::Point;
use crate::error::CanvasResult;
use crate::geometry::polyline_length;
use crate::path::{parse_path, PathCommand};
use crate::simplify::simplify;

/// Douglas-Peucker tolerance, in pixels.
pub const SIMPLIFICATION_TOLERANCE: f32 = 2.0;

/// Strokes shorter than this are discarded as noise.
pub const MIN_STROKE_LENGTH: f32 = 10.0;

/// Simplified strokes with at least this many points are curves.
pub const MIN_POINTS_FOR_CURVE: usize = 3;

/// Strokes starting within this vertical distance of a row's first stroke
/// belong to that row.
pub const ROW_TOLERANCE: f32 = 50.0;

/// Strokes are joined when the gap between them is below this distance.
pub const MERGE_DISTANCE: f32 = 10.0;

/// Whether a stroke is a straight segment or a multi-point curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeKind {
    /// Two points.
    Line,
    /// Three or more points.
    Curve,
}

impl StrokeKind {
    /// Classify a simplified point list.
    #[must_use]
    pub fn classify(points: &[Point]) -> Self {
        if points.len() >= MIN_POINTS_FOR_CURVE {
            Self::Curve
        } else {
            Self::Line
        }
    }
}

/// A processed stroke extracted from vector path data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Line or curve.
    #[serde(rename = "type")]
    pub kind: StrokeKind,
    /// Simplified points.
    pub points: Vec<Point>,
}

impl Stroke {
    /// Create a stroke, classifying it from its point count.
    #[must_use]
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            kind: StrokeKind::classify(&points),
            points,
        }
    }

    /// Sum of segment lengths.
    #[must_use]
    pub fn length(&self) -> f32 {
        polyline_length(&self.points)
    }

    fn start(&self) -> Point {
        self.points.first().copied().unwrap_or_default()
    }

    fn end(&self) -> Point {
        self.points.last().copied().unwrap_or_default()
    }
}

/// Split commands into point runs. Only end points are kept; curve control
/// points are ignored.
#[must_use]
pub fn point_runs(commands: &[PathCommand]) -> Vec<Vec<Point>> {
    let mut runs = Vec::new();
    let mut current: Vec<Point> = Vec::new();

    for command in commands {
        match *command {
            PathCommand::MoveTo(p) => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
                current.push(p);
            }
            PathCommand::LineTo(p) | PathCommand::CurveTo { end: p, .. } => current.push(p),
            PathCommand::ClosePath => {
                if let Some(&first) = current.first() {
                    current.push(first);
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Parse, simplify and length-filter path data into classified strokes, in
/// path order.
///
/// # Errors
///
/// Returns [`crate::CanvasError::PathSyntax`] if the path data is malformed.
pub fn clean_and_simplify_strokes(path_data: &str) -> CanvasResult<Vec<Stroke>> {
    let commands = parse_path(path_data)?;
    let runs = point_runs(&commands);
    let run_count = runs.len();

    let strokes: Vec<Stroke> = runs
        .into_iter()
        .filter(|run| run.len() >= 2)
        .map(|run| Stroke::new(simplify(&run, SIMPLIFICATION_TOLERANCE, true)))
        .filter(|stroke| stroke.length() >= MIN_STROKE_LENGTH)
        .collect();

    tracing::debug!(
        "Extracted {} stroke(s) from {run_count} path run(s)",
        strokes.len()
    );
    Ok(strokes)
}

/// Order strokes like text: rows top to bottom, left to right within a row.
///
/// Strokes are taken in order of their first point's y. A stroke joins the
/// current row while its start is less than [`ROW_TOLERANCE`] below the
/// row's first stroke; otherwise it opens a new row.
pub fn sort_reading_order(strokes: &mut Vec<Stroke>) {
    strokes.sort_by(|a, b| a.start().y.total_cmp(&b.start().y));

    let mut ordered = Vec::with_capacity(strokes.len());
    let mut row: Vec<Stroke> = Vec::new();
    let mut row_top = 0.0;

    for stroke in strokes.drain(..) {
        if !row.is_empty() && stroke.start().y - row_top >= ROW_TOLERANCE {
            flush_row(&mut row, &mut ordered);
        }
        if row.is_empty() {
            row_top = stroke.start().y;
        }
        row.push(stroke);
    }
    flush_row(&mut row, &mut ordered);

    *strokes = ordered;
}

fn flush_row(row: &mut Vec<Stroke>, out: &mut Vec<Stroke>) {
    row.sort_by(|a, b| a.start().x.total_cmp(&b.start().x));
    out.append(row);
}

/// Join consecutive strokes whose gap is shorter than [`MERGE_DISTANCE`].
/// Joined strokes are re-classified.
#[must_use]
pub fn merge_short_strokes(strokes: Vec<Stroke>) -> Vec<Stroke> {
    let mut merged: Vec<Stroke> = Vec::with_capacity(strokes.len());

    for stroke in strokes {
        match merged.last_mut() {
            Some(prev) if prev.end().distance_to(stroke.start()) < MERGE_DISTANCE => {
                prev.points.extend(stroke.points);
                prev.kind = StrokeKind::classify(&prev.points);
            }
            _ => merged.push(stroke),
        }
    }
    merged
}

/// Full pipeline: clean, simplify, sort into reading order and merge.
///
/// # Errors
///
/// Returns [`crate::CanvasError::PathSyntax`] if the path data is malformed.
pub fn process_vector_output(path_data: &str) -> CanvasResult<Vec<Stroke>> {
    let mut strokes = clean_and_simplify_strokes(path_data)?;
    sort_reading_order(&mut strokes);
    let strokes = merge_short_strokes(strokes);
    tracing::debug!("Vector output reduced to {} stroke(s)", strokes.len());
    Ok(strokes)
}
