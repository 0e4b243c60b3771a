//! # DrawGuide App
//!
//! Application layer tying the core model and the renderer together.
//!
//! ```text
//! ┌──────────────┐  pointer / commands  ┌──────────────────────────┐
//! │ CLI / UI     │─────────────────────▶│ DrawingCanvas            │
//! └──────────────┘                      │  StrokeStore + History   │
//!        │                              │  Renderer (tiny-skia)    │
//!        │ prompt                       │  FrameRecorder → GIF     │
//!        ▼                              └──────────────────────────┘
//! ┌──────────────┐  GenerationPolicy          ▲ guide image bytes
//! │GuideGenerator│────────────────────────────┘
//! │ reqwest      │──▶ generation service
//! └──────────────┘
//! ```
//!
//! This library is used by both the `drawguide` binary and integration tests.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod canvas;
pub mod config;
pub mod generation;
pub mod limits;

pub use canvas::{
    CanvasCommands, CanvasConfig, CaptureTimer, Clock, DrawingCanvas, ManualClock, SystemClock,
};
pub use config::{Cli, Command, Settings};
pub use generation::{
    compose_prompt, GenerationClient, GenerationError, GuideGenerator, HttpGenerationClient,
    SketchStyle, DEFAULT_TIMEOUT, LIMIT_REACHED_MESSAGE,
};
pub use limits::{DailyGenerationLimit, GenerationPolicy, Unlimited, DAILY_GENERATION_LIMIT};

/// App version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
