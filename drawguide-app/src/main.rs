//! # drawguide
//!
//! Command-line driver for the DrawGuide canvas.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context as _};
use clap::Parser;
use drawguide_core::DrawingLibrary;
use drawguide_renderer::{
    encode_png, ExportOptions, FrameRecorder, GifAnimationEncoder, RenderTarget, Renderer, Scene,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use drawguide_app::config::{GenerateArgs, RenderArgs, ReplayArgs, TraceArgs};
use drawguide_app::{
    CanvasCommands, CanvasConfig, Cli, Command, DailyGenerationLimit, DrawingCanvas,
    GuideGenerator, HttpGenerationClient, Settings, DAILY_GENERATION_LIMIT,
};

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,drawguide_app=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,drawguide_app=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    tracing::debug!("Starting drawguide {}", drawguide_app::VERSION);

    let settings = cli.settings;
    match cli.command {
        Command::Trace(args) => cmd_trace(&settings, args),
        Command::Render(args) => cmd_render(&settings, args),
        Command::Replay(args) => cmd_replay(&settings, args).await,
        Command::Generate(args) => cmd_generate(&settings, args).await,
        Command::List => cmd_list(&settings),
        Command::Delete { name } => {
            library(&settings)?.delete(&name)?;
            tracing::info!("Deleted drawing \"{name}\"");
            Ok(())
        }
    }
}

fn library(settings: &Settings) -> anyhow::Result<DrawingLibrary> {
    DrawingLibrary::with_data_dir(&settings.data_dir).with_context(|| {
        format!(
            "open drawing library in '{}'",
            settings.data_dir.display()
        )
    })
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))?;
    tracing::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

fn cmd_trace(settings: &Settings, args: TraceArgs) -> anyhow::Result<()> {
    let path_data = std::fs::read_to_string(&args.in_path)
        .with_context(|| format!("read path data '{}'", args.in_path.display()))?;

    let mut canvas = DrawingCanvas::new(CanvasConfig::from(settings));
    let added = canvas.import_vector_path(&path_data)?;
    tracing::info!("Traced {added} stroke(s)");

    let png = canvas
        .save_image()
        .ok_or_else(|| anyhow!("failed to render traced drawing"))?;
    write_output(&args.out, &png)?;

    if let Some(name) = args.save {
        library(settings)?.save(&name, canvas.to_record())?;
        tracing::info!("Saved drawing \"{name}\"");
    }
    Ok(())
}

fn cmd_render(settings: &Settings, args: RenderArgs) -> anyhow::Result<()> {
    let record = library(settings)?.load(&args.name)?;
    let mut canvas = DrawingCanvas::new(CanvasConfig::from(settings));
    canvas.load_record(record);

    let png = if args.preview {
        let surface = canvas
            .surface()
            .ok_or_else(|| anyhow!("failed to render drawing \"{}\"", args.name))?;
        encode_png(surface)?
    } else {
        let scale = args.scale.unwrap_or(settings.export_scale);
        canvas
            .canvas_png(scale)
            .ok_or_else(|| anyhow!("failed to export drawing \"{}\"", args.name))?
    };
    write_output(&args.out, &png)
}

async fn cmd_replay(settings: &Settings, args: ReplayArgs) -> anyhow::Result<()> {
    let record = library(settings)?.load(&args.name)?;
    if record.lines.is_empty() {
        return Err(anyhow!("drawing \"{}\" has no strokes", args.name));
    }

    let config = CanvasConfig::from(settings);
    let step = Duration::from_millis(args.step_ms).max(config.recorder.min_frame_delay);
    let renderer = Renderer::new(config.renderer);
    let mut recorder = FrameRecorder::new(config.recorder);

    let start = Instant::now();
    recorder.start_at(start);
    let mut at = start;
    for count in 1..=record.lines.len() {
        at += step;
        let scene = Scene::new(&record.lines[..count]);
        let frame = renderer.draw(&scene, RenderTarget::Export(ExportOptions::default()))?;
        recorder.add_frame_at(frame, at);
    }
    recorder.stop();
    tracing::info!("Recorded {} frame(s)", recorder.frame_count());

    let gif = tokio::task::spawn_blocking(move || {
        recorder.generate_animation(&GifAnimationEncoder::default())
    })
    .await
    .context("animation encoder task failed")??;
    write_output(&args.out, &gif)
}

async fn cmd_generate(settings: &Settings, args: GenerateArgs) -> anyhow::Result<()> {
    let library = library(settings)?;
    let policy = DailyGenerationLimit::open(library.data_dir(), DAILY_GENERATION_LIMIT);
    let client = HttpGenerationClient::new(&settings.endpoint, settings.timeout())?;
    let generator = GuideGenerator::new(client, policy);

    let bytes = generator.generate(&args.prompt, args.style).await?;

    let mut canvas = DrawingCanvas::new(CanvasConfig::from(settings));
    if !canvas.load_reference_image(&bytes) {
        return Err(anyhow!("generated image could not be decoded"));
    }
    let surface = canvas
        .surface()
        .ok_or_else(|| anyhow!("failed to render guide preview"))?;
    write_output(&args.out, &encode_png(surface)?)?;

    let remaining = generator.with_policy(|p| p.remaining());
    tracing::info!("{remaining} generation(s) left today");
    Ok(())
}

fn cmd_list(settings: &Settings) -> anyhow::Result<()> {
    let drawings = library(settings)?.load_all()?;
    if drawings.is_empty() {
        println!("No saved drawings");
        return Ok(());
    }
    for (name, record) in drawings {
        let ai = record.ai_strokes.as_ref().map_or(0, Vec::len);
        let saved = record
            .timestamp
            .map_or_else(|| "unknown".to_string(), |t| t.to_string());
        println!(
            "{name}\t{} stroke(s)\t{ai} AI stroke(s)\tsaved {saved}",
            record.lines.len()
        );
    }
    Ok(())
}
