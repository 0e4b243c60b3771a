//! # DrawGuide Core
//!
//! Drawing model and stroke processing for the DrawGuide canvas.
//! Everything here is synchronous and renderer-agnostic.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               drawguide-core                │
//! ├─────────────────────────────────────────────┤
//! │  Stroke Store     │  Geometry               │
//! │  - Capture        │  - Shape outlines       │
//! │  - Undo / redo    │  - Freehand smoothing   │
//! │  - AI merge       │  - Polyline length      │
//! ├─────────────────────────────────────────────┤
//! │  Vector Paths     │  Library                │
//! │  - Path parser    │  - drawings.json        │
//! │  - Simplify       │  - Named records        │
//! │  - Sort / merge   │                         │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod element;
pub mod error;
pub mod geometry;
pub mod history;
pub mod library;
pub mod path;
pub mod simplify;
pub mod store;
pub mod vector;

pub use element::{
    parse_hex_color, DrawingElement, Point, StrokeStyle, Tool, DEFAULT_COLOR,
    DEFAULT_STROKE_WIDTH, ERASER_COLOR,
};
pub use error::{CanvasError, CanvasResult};
pub use geometry::{element_outline, polyline_length, shape_outline, Outline, PathSegment};
pub use history::History;
pub use library::{AiGeneratedStroke, DrawingLibrary, DrawingRecord, SavedAt};
pub use path::{parse_path, PathCommand};
pub use store::StrokeStore;
pub use vector::{process_vector_output, Stroke, StrokeKind};

/// Drawguide core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
