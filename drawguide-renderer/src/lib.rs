//! # DrawGuide Renderer
//!
//! CPU raster renderer built on tiny-skia. One [`Renderer`] draws a
//! [`Scene`] to either target:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            Renderer::draw(scene, target)    │
//! ├──────────────────────┬──────────────────────┤
//! │ Interactive          │ Export               │
//! │ white + grid         │ white, scaled        │
//! │ guide @ 0.3          │ guide on request     │
//! │ strokes + preview    │ strokes + preview    │
//! └──────────────────────┴──────────────────────┘
//!                        │
//!                 FrameRecorder → GIF
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod guide;
pub mod recorder;
pub mod render;

pub use error::{RenderError, RenderResult};
pub use guide::{decode_data_uri, GuideImage};
pub use recorder::{
    AnimationEncoder, FrameRecorder, GifAnimationEncoder, RecorderConfig, RecordingFrame,
};
pub use render::{
    encode_png, to_data_url, ExportOptions, GridConfig, RenderTarget, Renderer, RendererConfig,
    Scene, DEFAULT_CANVAS_SIZE, HIGH_RES_SCALE, MAX_SURFACE_SIDE, MIN_GRID_SPACING,
};
pub use tiny_skia::Pixmap;

/// Renderer version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
