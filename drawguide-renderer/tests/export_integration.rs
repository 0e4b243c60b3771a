//! Integration tests for rendering and animation export (drawguide-renderer).
//!
//! Covers guide layering, export scaling, shapes at scale, and GIF output
//! decoded back with the image crate.

use std::io::Cursor;
use std::time::{Duration, Instant};

use drawguide_core::{Point, StrokeStore, Tool};
use drawguide_renderer::{
    ExportOptions, FrameRecorder, GifAnimationEncoder, GuideImage, Pixmap, RenderTarget,
    Renderer, RendererConfig, Scene,
};
use image::AnimationDecoder;

/// Encode a solid-color PNG.
fn solid_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode png");
    buf.into_inner()
}

fn pixel(pixmap: &Pixmap, x: u32, y: u32) -> [u8; 4] {
    let c = pixmap.pixel(x, y).expect("in bounds").demultiply();
    [c.red(), c.green(), c.blue(), c.alpha()]
}

fn renderer(size: u32) -> Renderer {
    let mut renderer = Renderer::new(RendererConfig {
        canvas_size: size,
        ..RendererConfig::default()
    });
    renderer.set_grid_visible(false);
    renderer
}

// ==========================================================================
// Guide image layering
// ==========================================================================

#[test]
fn test_guide_is_faint_on_screen_and_absent_in_export() {
    let guide = GuideImage::from_bytes(&solid_png(8, 8, [255, 0, 0, 255])).expect("guide");
    let scene = Scene::default().with_guide(Some(&guide));
    let renderer = renderer(32);

    let screen = renderer
        .draw(&scene, RenderTarget::Interactive)
        .expect("draw");
    let [r, g, b, a] = pixel(&screen, 16, 16);
    assert_eq!((r, a), (255, 255));
    // 30% red over white
    assert!((170..=185).contains(&g), "green was {g}");
    assert_eq!(g, b);

    let export = renderer
        .draw(&scene, RenderTarget::Export(ExportOptions::default()))
        .expect("draw");
    assert_eq!(pixel(&export, 16, 16), [255, 255, 255, 255]);

    let with_guide = renderer
        .draw(
            &scene,
            RenderTarget::Export(ExportOptions {
                scale: 2.0,
                include_guide: true,
            }),
        )
        .expect("draw");
    assert_eq!(with_guide.width(), 64);
    assert_ne!(pixel(&with_guide, 60, 60), [255, 255, 255, 255]);
}

#[test]
fn test_eraser_cuts_through_guide() {
    let guide = GuideImage::from_bytes(&solid_png(4, 4, [0, 0, 255, 255])).expect("guide");
    let mut store = StrokeStore::new();
    store.begin_stroke(Tool::Eraser, Point::new(0.0, 16.0));
    store.extend_stroke(Point::new(32.0, 16.0));
    store.commit_stroke(Point::new(32.0, 16.0));

    let scene = Scene::new(store.elements()).with_guide(Some(&guide));
    let screen = renderer(32)
        .draw(&scene, RenderTarget::Interactive)
        .expect("draw");
    assert_eq!(pixel(&screen, 16, 16), [255, 255, 255, 255]);
    assert_ne!(pixel(&screen, 16, 2), [255, 255, 255, 255]);
}

// ==========================================================================
// Export scaling
// ==========================================================================

#[test]
fn test_high_res_export_scales_shapes() {
    let mut store = StrokeStore::new();
    store.begin_stroke(Tool::Square, Point::new(10.0, 10.0));
    store.commit_stroke(Point::new(30.0, 30.0));

    let scene = Scene::new(store.elements());
    let pixmap = renderer(40)
        .draw(&scene, RenderTarget::Export(ExportOptions::scaled(4.0)))
        .expect("draw");

    assert_eq!(pixmap.width(), 160);
    // left edge of the square at x = 10 * 4
    assert_eq!(pixel(&pixmap, 40, 80), [0, 0, 0, 255]);
    // interior stays white
    assert_eq!(pixel(&pixmap, 80, 80), [255, 255, 255, 255]);
}

#[test]
fn test_png_export_decodes_to_expected_size() {
    let png = renderer(50)
        .export_png(&Scene::default(), ExportOptions::scaled(2.0))
        .expect("png");
    let decoded = image::load_from_memory(&png).expect("decode");
    assert_eq!((decoded.width(), decoded.height()), (100, 100));
}

// ==========================================================================
// Animation export
// ==========================================================================

#[test]
fn test_recorded_strokes_become_gif_frames() {
    let renderer = renderer(24);
    let mut store = StrokeStore::new();
    let mut recorder = FrameRecorder::default();
    let t0 = Instant::now();
    recorder.start_at(t0);

    for i in 0..3u8 {
        let y = f32::from(i) * 8.0 + 4.0;
        store.begin_stroke(Tool::Brush, Point::new(0.0, y));
        store.extend_stroke(Point::new(24.0, y));
        store.commit_stroke(Point::new(24.0, y));

        let frame = renderer
            .draw(
                &Scene::new(store.elements()),
                RenderTarget::Export(ExportOptions::default()),
            )
            .expect("draw");
        let at = t0 + Duration::from_millis(100 * u64::from(i + 1));
        assert!(recorder.add_frame_at(frame, at));
    }
    recorder.stop();

    let gif = recorder
        .generate_animation(&GifAnimationEncoder::default())
        .expect("gif");
    let decoder = image::codecs::gif::GifDecoder::new(Cursor::new(gif)).expect("decoder");
    let frames = decoder.into_frames().collect_frames().expect("frames");

    assert_eq!(frames.len(), 3);
    let (num, den) = frames[0].delay().numer_denom_ms();
    assert_eq!(num / den, 100);
    assert_eq!(frames[0].buffer().dimensions(), (24, 24));
}
