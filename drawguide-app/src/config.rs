//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use drawguide_renderer::{GridConfig, RendererConfig, MIN_GRID_SPACING};

use crate::canvas::CanvasConfig;
use crate::generation::SketchStyle;

/// Command-line arguments for drawguide.
#[derive(Debug, Clone, Parser)]
#[command(name = "drawguide")]
#[command(about = "Guided sketching canvas: trace, render, replay and generate drawings")]
#[command(version)]
pub struct Cli {
    /// Shared settings.
    #[command(flatten)]
    pub settings: Settings,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Settings shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Directory holding the drawing library and limit state
    #[arg(long, env = "DRAWGUIDE_DATA_DIR", default_value = "drawguide-data")]
    pub data_dir: PathBuf,

    /// Canvas side length in pixels
    #[arg(long, env = "DRAWGUIDE_CANVAS_SIZE", default_value = "460")]
    pub canvas_size: u32,

    /// Grid spacing in pixels
    #[arg(long, env = "DRAWGUIDE_GRID_SIZE", default_value = "10")]
    pub grid_size: f32,

    /// Scale factor for high-resolution exports
    #[arg(long, env = "DRAWGUIDE_EXPORT_SCALE", default_value = "4")]
    pub export_scale: f32,

    /// Image generation service endpoint (e.g., <http://localhost:3000/api/generate>)
    #[arg(
        long,
        env = "DRAWGUIDE_ENDPOINT",
        default_value = "http://localhost:3000/api/generate"
    )]
    pub endpoint: String,

    /// Generation request timeout in seconds
    #[arg(long, env = "DRAWGUIDE_TIMEOUT_SECS", default_value = "60")]
    pub timeout_secs: u64,
}

impl Settings {
    /// Generation request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Grid spacing to render with. Non-positive or non-finite values fall
    /// back to the default spacing; tiny ones are raised to
    /// [`MIN_GRID_SPACING`].
    #[must_use]
    pub fn grid_spacing(&self) -> f32 {
        if self.grid_size.is_finite() && self.grid_size > 0.0 {
            self.grid_size.max(MIN_GRID_SPACING)
        } else {
            tracing::warn!("Ignoring grid size {}", self.grid_size);
            GridConfig::default().spacing
        }
    }
}

impl From<&Settings> for CanvasConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            renderer: RendererConfig {
                canvas_size: settings.canvas_size,
                grid: GridConfig {
                    spacing: settings.grid_spacing(),
                    ..GridConfig::default()
                },
                ..RendererConfig::default()
            },
            export_scale: settings.export_scale,
            ..Self::default()
        }
    }
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Turn vectorizer path data into strokes and render them.
    Trace(TraceArgs),
    /// Render a saved drawing as a PNG.
    Render(RenderArgs),
    /// Replay a saved drawing stroke by stroke into an animated GIF.
    Replay(ReplayArgs),
    /// Generate a guide image from a prompt.
    Generate(GenerateArgs),
    /// List saved drawings.
    List,
    /// Delete a saved drawing.
    Delete {
        /// Drawing name.
        name: String,
    },
}

/// Arguments for `trace`.
#[derive(Debug, Clone, Args)]
pub struct TraceArgs {
    /// File containing SVG path data
    #[arg(long = "in")]
    pub in_path: PathBuf,

    /// Output PNG path
    #[arg(long)]
    pub out: PathBuf,

    /// Save the traced drawing to the library under this name
    #[arg(long)]
    pub save: Option<String>,
}

/// Arguments for `render`.
#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    /// Drawing name
    pub name: String,

    /// Output PNG path
    #[arg(long)]
    pub out: PathBuf,

    /// Export scale (defaults to the configured export scale)
    #[arg(long)]
    pub scale: Option<f32>,

    /// Render the on-screen view with the grid instead of an export
    #[arg(long, default_value_t = false)]
    pub preview: bool,
}

/// Arguments for `replay`.
#[derive(Debug, Clone, Args)]
pub struct ReplayArgs {
    /// Drawing name
    pub name: String,

    /// Output GIF path
    #[arg(long)]
    pub out: PathBuf,

    /// Delay between strokes in milliseconds
    #[arg(long, default_value = "100")]
    pub step_ms: u64,
}

/// Arguments for `generate`.
#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// What to draw
    #[arg(default_value = "")]
    pub prompt: String,

    /// Drawing style
    #[arg(long, value_enum, default_value_t = SketchStyle::Shounen)]
    pub style: SketchStyle,

    /// Output PNG path for the guide preview
    #[arg(long)]
    pub out: PathBuf,
}
