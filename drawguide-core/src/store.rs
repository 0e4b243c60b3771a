//! Stroke capture and the committed stroke collection.
//!
//! [`StrokeStore`] turns pointer input into [`DrawingElement`]s and keeps the
//! undo history in step with every commit.
//!
//! ```
//! use drawguide_core::{Point, StrokeStore, Tool};
//!
//! let mut store = StrokeStore::new();
//! store.begin_stroke(Tool::Brush, Point::new(0.0, 0.0));
//! store.extend_stroke(Point::new(10.0, 10.0));
//! assert!(store.commit_stroke(Point::new(10.0, 10.0)));
//! assert_eq!(store.elements().len(), 1);
//!
//! store.undo();
//! assert!(store.elements().is_empty());
//! ```

use crate::element::{DrawingElement, Point, StrokeStyle, Tool};
use crate::history::History;
use crate::vector::Stroke;

/// Minimum number of points a freehand stroke needs to be committed.
pub const MIN_FREEHAND_POINTS: usize = 2;

/// Stroke currently being captured.
#[derive(Debug, Clone, PartialEq)]
enum InProgress {
    /// Brush or eraser: every pointer position is kept.
    Freehand { tool: Tool, points: Vec<Point> },
    /// Shape tool: only the anchor and the latest drag position matter.
    Shape {
        tool: Tool,
        start: Point,
        current: Option<Point>,
    },
}

/// The ordered stroke collection, its history, and in-progress capture.
#[derive(Debug, Clone)]
pub struct StrokeStore {
    elements: Vec<DrawingElement>,
    history: History,
    in_progress: Option<InProgress>,
    style: StrokeStyle,
}

impl StrokeStore {
    /// Create an empty store with the default stroke style.
    #[must_use]
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            history: History::new(),
            in_progress: None,
            style: StrokeStyle::default(),
        }
    }

    /// Style applied to strokes begun from now on.
    pub fn set_style(&mut self, style: StrokeStyle) {
        self.style = style;
    }

    /// Current stroke style.
    #[must_use]
    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }

    /// Start capturing a stroke.
    ///
    /// Shape tools record `point` as the drag anchor; freehand tools seed
    /// the point buffer with it. Any stroke already in progress is dropped.
    pub fn begin_stroke(&mut self, tool: Tool, point: Point) {
        self.in_progress = Some(if tool.is_shape() {
            InProgress::Shape {
                tool,
                start: point,
                current: None,
            }
        } else {
            InProgress::Freehand {
                tool,
                points: vec![point],
            }
        });
    }

    /// Feed a pointer move into the stroke in progress.
    ///
    /// Freehand strokes accumulate the point; shapes only keep the latest
    /// drag position for live preview.
    pub fn extend_stroke(&mut self, point: Point) {
        match &mut self.in_progress {
            Some(InProgress::Freehand { points, .. }) => points.push(point),
            Some(InProgress::Shape { current, .. }) => *current = Some(point),
            None => {}
        }
    }

    /// Finish the stroke in progress and append it to the collection.
    ///
    /// Shapes are built from the anchor and `final_point`. Freehand strokes
    /// use the accumulated buffer and are dropped when it holds fewer than
    /// [`MIN_FREEHAND_POINTS`]. Returns whether an element was committed.
    pub fn commit_stroke(&mut self, final_point: Point) -> bool {
        let element = match self.in_progress.take() {
            Some(InProgress::Shape { tool, start, .. }) => {
                DrawingElement::shape(tool, start, final_point, &self.style)
            }
            Some(InProgress::Freehand { tool, points }) => {
                if points.len() < MIN_FREEHAND_POINTS {
                    tracing::trace!("Dropping {tool} stroke with {} point(s)", points.len());
                    return false;
                }
                DrawingElement::freehand(tool, points, &self.style)
            }
            None => return false,
        };

        tracing::debug!(
            "Committed {} stroke with {} point(s)",
            element.tool,
            element.points.len()
        );
        self.elements.push(element);
        self.history.push(self.elements.clone());
        true
    }

    /// Discard the stroke in progress without committing it.
    pub fn cancel_stroke(&mut self) {
        if self.in_progress.take().is_some() {
            tracing::trace!("Stroke cancelled");
        }
    }

    /// Whether a stroke is being captured.
    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.in_progress.is_some()
    }

    /// The stroke in progress as it should be drawn, if there is anything
    /// to show yet.
    #[must_use]
    pub fn preview(&self) -> Option<DrawingElement> {
        match self.in_progress.as_ref()? {
            InProgress::Freehand { tool, points } => {
                Some(DrawingElement::freehand(*tool, points.clone(), &self.style))
            }
            InProgress::Shape {
                tool,
                start,
                current,
            } => current.map(|end| DrawingElement::shape(*tool, *start, end, &self.style)),
        }
    }

    /// Step back one history snapshot. Returns whether anything changed.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.elements = snapshot.to_vec();
                true
            }
            None => false,
        }
    }

    /// Step forward one history snapshot. Returns whether anything changed.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.elements = snapshot.to_vec();
                true
            }
            None => false,
        }
    }

    /// Remove every stroke and reset history to a single empty snapshot.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.history.reset();
        self.in_progress = None;
        tracing::debug!("Stroke store cleared");
    }

    /// Append processed vector strokes as brush elements in the default
    /// style, as a single undoable step.
    ///
    /// Returns the number of elements added. Strokes with too few points are
    /// skipped; if nothing is left, no history snapshot is recorded.
    pub fn merge_external_strokes(&mut self, strokes: &[Stroke]) -> usize {
        let style = StrokeStyle::default();
        let before = self.elements.len();
        self.elements.extend(
            strokes
                .iter()
                .filter(|s| s.points.len() >= MIN_FREEHAND_POINTS)
                .map(|s| DrawingElement::freehand(Tool::Brush, s.points.clone(), &style)),
        );

        let added = self.elements.len() - before;
        if added > 0 {
            self.history.push(self.elements.clone());
            tracing::debug!("Merged {added} external stroke(s)");
        }
        added
    }

    /// Replace the collection with a loaded drawing. History restarts from
    /// the loaded state.
    pub fn load_elements(&mut self, elements: Vec<DrawingElement>) {
        self.history = History::with_initial(elements.clone());
        self.elements = elements;
        self.in_progress = None;
    }

    /// Committed elements in drawing order.
    #[must_use]
    pub fn elements(&self) -> &[DrawingElement] {
        &self.elements
    }

    /// The undo history.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }
}

impl Default for StrokeStore {
    fn default() -> Self {
        Self::new()
    }
}
