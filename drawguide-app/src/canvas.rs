//! The canvas command port.
//!
//! [`DrawingCanvas`] owns the stroke store, renderer, recorder and guide
//! image, and is driven through [`CanvasCommands`]. Every mutation
//! re-renders the interactive surface straight away; while recording, it
//! also offers an export frame to the recorder. Frame timestamps for both
//! mutations and timer ticks come from the canvas [`Clock`].

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use drawguide_core::{
    process_vector_output, CanvasResult, DrawingElement, DrawingRecord, Point, Stroke,
    StrokeStore, StrokeStyle, Tool,
};
use drawguide_renderer::{
    ExportOptions, FrameRecorder, GifAnimationEncoder, GuideImage, Pixmap, RecorderConfig,
    RenderResult, RenderTarget, Renderer, RendererConfig, Scene, HIGH_RES_SCALE,
};

/// Canvas settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasConfig {
    /// Renderer settings (size, grid, guide opacity).
    pub renderer: RendererConfig,
    /// Recorder settings.
    pub recorder: RecorderConfig,
    /// Scale used by [`CanvasCommands::save_image`].
    pub export_scale: f32,
    /// Interval of the recording capture timer.
    pub capture_interval: Duration,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            renderer: RendererConfig::default(),
            recorder: RecorderConfig::default(),
            export_scale: HIGH_RES_SCALE,
            capture_interval: Duration::from_millis(33),
        }
    }
}

/// Time source for frame capture.
pub trait Clock: std::fmt::Debug + Send {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// The system monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    /// Clock reading `start`.
    #[must_use]
    pub fn new(start: Instant) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fixed-interval timer driving frame capture while recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureTimer {
    interval: Duration,
    next_due: Instant,
}

impl CaptureTimer {
    /// Timer first firing one `interval` after `now`.
    #[must_use]
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_due: now + interval,
        }
    }

    /// Whether the timer fires at `now`. Firing schedules the next tick one
    /// interval later.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due = now + self.interval;
        true
    }
}

/// Operations the UI (or CLI) performs on a canvas.
pub trait CanvasCommands {
    /// Pointer pressed: start a stroke with the current tool.
    fn pointer_down(&mut self, point: Point);

    /// Pointer moved: extend the stroke in progress, if any.
    fn pointer_move(&mut self, point: Point);

    /// Pointer released: commit the stroke in progress.
    fn pointer_up(&mut self, point: Point);

    /// Pointer left or was cancelled: drop the stroke in progress.
    fn pointer_cancel(&mut self);

    /// Remove every stroke and the guide image.
    fn clear(&mut self);

    /// Undo the last change. Returns whether anything changed.
    fn undo(&mut self) -> bool;

    /// Redo the last undone change. Returns whether anything changed.
    fn redo(&mut self) -> bool;

    /// High-resolution PNG of the drawing, or `None` if rendering failed.
    fn save_image(&self) -> Option<Vec<u8>>;

    /// PNG of the drawing at `scale`, or `None` if rendering failed.
    fn canvas_png(&self, scale: f32) -> Option<Vec<u8>>;

    /// Show encoded image bytes as the guide. An undecodable image leaves
    /// no guide set. Returns whether a guide is now shown.
    fn load_reference_image(&mut self, bytes: &[u8]) -> bool;

    /// Start a recording session.
    fn start_recording(&mut self);

    /// Stop the recording session and its capture timer.
    fn stop_recording(&mut self);

    /// Advance the capture timer to the canvas clock's current time.
    /// Returns whether a frame was captured.
    fn tick(&mut self) -> bool;

    /// Encode the recorded frames as a GIF.
    ///
    /// # Errors
    ///
    /// Returns the recorder's error if there is nothing to encode or the
    /// encoder fails.
    fn export_animation(&mut self) -> RenderResult<Vec<u8>>;

    /// Merge vectorizer output into the drawing. Returns the number of
    /// strokes added.
    ///
    /// # Errors
    ///
    /// Returns [`drawguide_core::CanvasError::PathSyntax`] for malformed
    /// path data.
    fn import_vector_path(&mut self, path_data: &str) -> CanvasResult<usize>;
}

/// Imported strokes and the history step that added them.
#[derive(Debug, Clone)]
struct AiBatch {
    step: usize,
    strokes: Vec<Stroke>,
}

/// A drawing canvas backed by tiny-skia.
#[derive(Debug)]
pub struct DrawingCanvas {
    store: StrokeStore,
    renderer: Renderer,
    recorder: FrameRecorder,
    clock: Box<dyn Clock>,
    guide: Option<GuideImage>,
    ai_batches: Vec<AiBatch>,
    tool: Tool,
    export_scale: f32,
    capture_interval: Duration,
    capture_timer: Option<CaptureTimer>,
    surface: Option<Pixmap>,
}

impl DrawingCanvas {
    /// Create an empty canvas on the system clock.
    #[must_use]
    pub fn new(config: CanvasConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    /// Create an empty canvas reading time from `clock`.
    #[must_use]
    pub fn with_clock(config: CanvasConfig, clock: impl Clock + 'static) -> Self {
        let mut canvas = Self {
            store: StrokeStore::new(),
            renderer: Renderer::new(config.renderer),
            recorder: FrameRecorder::new(config.recorder),
            clock: Box::new(clock),
            guide: None,
            ai_batches: Vec::new(),
            tool: Tool::default(),
            export_scale: config.export_scale,
            capture_interval: config.capture_interval,
            capture_timer: None,
            surface: None,
        };
        canvas.refresh();
        canvas
    }

    /// Select the drawing tool.
    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    /// The selected tool.
    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Set the color for new strokes.
    pub fn set_color(&mut self, color: impl Into<String>) {
        let style = StrokeStyle {
            color: color.into(),
            ..self.store.style().clone()
        };
        self.store.set_style(style);
    }

    /// Set the width for new strokes.
    pub fn set_stroke_width(&mut self, width: f32) {
        let style = StrokeStyle {
            width,
            ..self.store.style().clone()
        };
        self.store.set_style(style);
    }

    /// Show or hide the grid.
    pub fn set_grid_visible(&mut self, visible: bool) {
        self.renderer.set_grid_visible(visible);
        self.refresh();
    }

    /// Change the grid spacing.
    pub fn set_grid_size(&mut self, spacing: f32) {
        self.renderer.set_grid_spacing(spacing);
        self.refresh();
    }

    /// Committed elements.
    #[must_use]
    pub fn elements(&self) -> &[DrawingElement] {
        self.store.elements()
    }

    /// The stroke store.
    #[must_use]
    pub fn store(&self) -> &StrokeStore {
        &self.store
    }

    /// Last rendered interactive surface.
    #[must_use]
    pub fn surface(&self) -> Option<&Pixmap> {
        self.surface.as_ref()
    }

    /// Whether a guide image is shown.
    #[must_use]
    pub fn has_guide(&self) -> bool {
        self.guide.is_some()
    }

    /// Whether a recording session is active.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Frames captured so far.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.recorder.frame_count()
    }

    /// Imported strokes present at the current history step.
    #[must_use]
    pub fn ai_strokes(&self) -> Vec<Stroke> {
        let step = self.store.history().step();
        self.ai_batches
            .iter()
            .filter(|batch| batch.step <= step)
            .flat_map(|batch| batch.strokes.iter().cloned())
            .collect()
    }

    /// Snapshot of the drawing for the library.
    #[must_use]
    pub fn to_record(&self) -> DrawingRecord {
        let record = DrawingRecord::new(self.store.elements().to_vec());
        let ai_strokes = self.ai_strokes();
        if ai_strokes.is_empty() {
            record
        } else {
            record.with_ai_strokes(&ai_strokes)
        }
    }

    /// Replace the drawing with a saved record. History restarts there.
    pub fn load_record(&mut self, record: DrawingRecord) {
        let strokes: Vec<Stroke> = record
            .ai_strokes
            .unwrap_or_default()
            .into_iter()
            .map(|s| Stroke {
                kind: s.kind,
                points: s.points,
            })
            .collect();
        self.store.load_elements(record.lines);
        self.ai_batches.clear();
        if !strokes.is_empty() {
            self.ai_batches.push(AiBatch {
                step: self.store.history().step(),
                strokes,
            });
        }
        self.refresh();
    }

    /// Forget batches on a redo branch that a new history step replaced.
    fn drop_stale_batches(&mut self) {
        let step = self.store.history().step();
        self.ai_batches.retain(|batch| batch.step < step);
    }

    /// Re-render the interactive surface and, while recording, offer an
    /// export frame.
    fn refresh(&mut self) {
        let preview = self.store.preview();
        let scene = Scene::new(self.store.elements())
            .with_preview(preview.as_ref())
            .with_guide(self.guide.as_ref());

        self.surface = match self.renderer.draw(&scene, RenderTarget::Interactive) {
            Ok(pixmap) => Some(pixmap),
            Err(e) => {
                tracing::warn!("Interactive render failed: {e}");
                None
            }
        };

        if self.recorder.is_recording() {
            self.capture_frame(self.clock.now());
        }
    }

    fn capture_frame(&mut self, now: Instant) -> bool {
        let preview = self.store.preview();
        let scene = Scene::new(self.store.elements()).with_preview(preview.as_ref());
        match self
            .renderer
            .draw(&scene, RenderTarget::Export(ExportOptions::default()))
        {
            Ok(frame) => self.recorder.add_frame_at(frame, now),
            Err(e) => {
                tracing::warn!("Frame capture failed: {e}");
                false
            }
        }
    }
}

impl Default for DrawingCanvas {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl CanvasCommands for DrawingCanvas {
    fn pointer_down(&mut self, point: Point) {
        self.store.begin_stroke(self.tool, point);
        self.refresh();
    }

    fn pointer_move(&mut self, point: Point) {
        if self.store.is_drawing() {
            self.store.extend_stroke(point);
            self.refresh();
        }
    }

    fn pointer_up(&mut self, point: Point) {
        if self.store.is_drawing() {
            if self.store.commit_stroke(point) {
                self.drop_stale_batches();
            }
            self.refresh();
        }
    }

    fn pointer_cancel(&mut self) {
        if self.store.is_drawing() {
            self.store.cancel_stroke();
            self.refresh();
        }
    }

    fn clear(&mut self) {
        self.store.clear();
        self.guide = None;
        self.ai_batches.clear();
        self.refresh();
    }

    fn undo(&mut self) -> bool {
        let moved = self.store.undo();
        if moved {
            self.refresh();
        }
        moved
    }

    fn redo(&mut self) -> bool {
        let moved = self.store.redo();
        if moved {
            self.refresh();
        }
        moved
    }

    fn save_image(&self) -> Option<Vec<u8>> {
        self.canvas_png(self.export_scale)
    }

    fn canvas_png(&self, scale: f32) -> Option<Vec<u8>> {
        let preview = self.store.preview();
        let scene = Scene::new(self.store.elements()).with_preview(preview.as_ref());
        match self.renderer.export_png(&scene, ExportOptions::scaled(scale)) {
            Ok(png) => Some(png),
            Err(e) => {
                tracing::warn!("PNG export failed: {e}");
                None
            }
        }
    }

    fn load_reference_image(&mut self, bytes: &[u8]) -> bool {
        self.guide = None;
        match GuideImage::from_bytes(bytes) {
            Ok(guide) => self.guide = Some(guide),
            Err(e) => tracing::warn!("Reference image rejected: {e}"),
        }
        self.refresh();
        self.guide.is_some()
    }

    fn start_recording(&mut self) {
        let now = self.clock.now();
        self.recorder.start_at(now);
        self.capture_timer = Some(CaptureTimer::new(self.capture_interval, now));
    }

    fn stop_recording(&mut self) {
        self.capture_timer = None;
        self.recorder.stop();
    }

    fn tick(&mut self) -> bool {
        let now = self.clock.now();
        let due = self
            .capture_timer
            .as_mut()
            .is_some_and(|timer| timer.poll(now));
        due && self.capture_frame(now)
    }

    fn export_animation(&mut self) -> RenderResult<Vec<u8>> {
        self.recorder
            .generate_animation(&GifAnimationEncoder::default())
    }

    fn import_vector_path(&mut self, path_data: &str) -> CanvasResult<usize> {
        let strokes = process_vector_output(path_data)?;
        let added = self.store.merge_external_strokes(&strokes);
        if added > 0 {
            self.drop_stale_batches();
            self.ai_batches.push(AiBatch {
                step: self.store.history().step(),
                strokes,
            });
            self.refresh();
        }
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn small_config() -> CanvasConfig {
        CanvasConfig {
            renderer: RendererConfig {
                canvas_size: 40,
                ..RendererConfig::default()
            },
            export_scale: 2.0,
            ..CanvasConfig::default()
        }
    }

    fn small_canvas() -> DrawingCanvas {
        DrawingCanvas::new(small_config())
    }

    fn clocked_canvas() -> (DrawingCanvas, ManualClock) {
        let clock = ManualClock::new(Instant::now());
        (
            DrawingCanvas::with_clock(small_config(), clock.clone()),
            clock,
        )
    }

    fn drag(canvas: &mut DrawingCanvas, from: Point, to: Point) {
        canvas.pointer_down(from);
        canvas.pointer_move(Point::new((from.x + to.x) / 2.0, (from.y + to.y) / 2.0));
        canvas.pointer_up(to);
    }

    fn red_png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([255, 0, 0, 255]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png)
            .expect("encode png");
        buf.into_inner()
    }

    #[test]
    fn test_capture_timer_fires_on_interval() {
        let t0 = Instant::now();
        let mut timer = CaptureTimer::new(Duration::from_millis(33), t0);
        assert!(!timer.poll(t0 + Duration::from_millis(10)));
        assert!(timer.poll(t0 + Duration::from_millis(33)));
        assert!(!timer.poll(t0 + Duration::from_millis(50)));
        assert!(timer.poll(t0 + Duration::from_millis(70)));
    }

    #[test]
    fn test_surface_rendered_on_creation() {
        let canvas = small_canvas();
        let surface = canvas.surface().expect("surface");
        assert_eq!((surface.width(), surface.height()), (40, 40));
    }

    #[test]
    fn test_pointer_sequence_commits_stroke() {
        let mut canvas = small_canvas();
        drag(&mut canvas, Point::new(2.0, 2.0), Point::new(30.0, 30.0));
        assert_eq!(canvas.elements().len(), 1);
        assert_eq!(canvas.elements()[0].tool, Tool::Brush);
    }

    #[test]
    fn test_move_without_down_is_ignored() {
        let mut canvas = small_canvas();
        canvas.pointer_move(Point::new(5.0, 5.0));
        canvas.pointer_up(Point::new(6.0, 6.0));
        assert!(canvas.elements().is_empty());
    }

    #[test]
    fn test_cancel_drops_stroke() {
        let mut canvas = small_canvas();
        canvas.set_tool(Tool::Circle);
        canvas.pointer_down(Point::new(10.0, 10.0));
        canvas.pointer_move(Point::new(20.0, 20.0));
        canvas.pointer_cancel();
        assert!(canvas.elements().is_empty());
        assert!(!canvas.store().is_drawing());
    }

    #[test]
    fn test_style_applies_to_new_strokes() {
        let mut canvas = small_canvas();
        canvas.set_color("#ff0000");
        canvas.set_stroke_width(6.0);
        drag(&mut canvas, Point::new(0.0, 0.0), Point::new(20.0, 0.0));
        let element = &canvas.elements()[0];
        assert_eq!(element.color, "#ff0000");
        assert!((element.stroke_width - 6.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_undo_redo_report_changes() {
        let mut canvas = small_canvas();
        assert!(!canvas.undo());
        drag(&mut canvas, Point::new(0.0, 0.0), Point::new(20.0, 20.0));
        assert!(canvas.undo());
        assert!(canvas.elements().is_empty());
        assert!(canvas.redo());
        assert_eq!(canvas.elements().len(), 1);
        assert!(!canvas.redo());
    }

    #[test]
    fn test_clear_removes_guide() {
        let mut canvas = small_canvas();
        assert!(canvas.load_reference_image(&red_png()));
        drag(&mut canvas, Point::new(0.0, 0.0), Point::new(20.0, 20.0));
        canvas.clear();
        assert!(canvas.elements().is_empty());
        assert!(!canvas.has_guide());
    }

    #[test]
    fn test_bad_reference_image_clears_guide() {
        let mut canvas = small_canvas();
        assert!(canvas.load_reference_image(&red_png()));
        assert!(!canvas.load_reference_image(b"not an image"));
        assert!(!canvas.has_guide());
    }

    #[test]
    fn test_save_image_uses_export_scale() {
        let mut canvas = small_canvas();
        canvas.load_reference_image(&red_png());
        let png = canvas.save_image().expect("png");
        let decoded = image::load_from_memory(&png).expect("decode").to_rgba8();
        assert_eq!(decoded.dimensions(), (80, 80));
        // guide is left out of exports
        assert_eq!(decoded.get_pixel(40, 40).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_ticks_capture_frames_at_interval() {
        let (mut canvas, clock) = clocked_canvas();
        drag(&mut canvas, Point::new(0.0, 0.0), Point::new(30.0, 30.0));

        canvas.start_recording();
        assert!(canvas.is_recording());
        clock.advance(Duration::from_millis(10));
        assert!(!canvas.tick());
        clock.advance(Duration::from_millis(30));
        assert!(canvas.tick());
        clock.advance(Duration::from_millis(40));
        assert!(canvas.tick());
        canvas.stop_recording();
        clock.advance(Duration::from_millis(120));
        assert!(!canvas.tick());
        assert_eq!(canvas.frame_count(), 2);

        let gif = canvas.export_animation().expect("gif");
        assert_eq!(&gif[..3], b"GIF");
        assert_eq!(canvas.frame_count(), 0);
    }

    #[test]
    fn test_mutations_and_ticks_share_the_clock() {
        let (mut canvas, clock) = clocked_canvas();
        canvas.start_recording();
        let step = Duration::from_millis(50);
        for i in 0..4u16 {
            let x = f32::from(i) * 5.0;
            clock.advance(step);
            drag(&mut canvas, Point::new(x, 0.0), Point::new(x, 30.0));
            clock.advance(step);
            assert!(canvas.tick(), "tick {i} dropped");
        }
        // one frame per stroke commit and one per tick
        assert_eq!(canvas.frame_count(), 8);
    }

    #[test]
    fn test_burst_within_min_delay_keeps_one_frame() {
        let (mut canvas, clock) = clocked_canvas();
        canvas.start_recording();
        let mut captured = 0;
        for _ in 0..10 {
            clock.advance(Duration::from_millis(5));
            if canvas.capture_frame(clock.now()) {
                captured += 1;
            }
        }
        assert!(captured <= 2);
        assert_eq!(canvas.frame_count(), captured);
    }

    #[test]
    fn test_export_without_frames_fails() {
        let mut canvas = small_canvas();
        assert!(canvas.export_animation().is_err());
    }

    #[test]
    fn test_import_vector_path_adds_strokes() {
        let mut canvas = small_canvas();
        let added = canvas
            .import_vector_path("M0 0 L40 0 M0 100 L40 100")
            .expect("import");
        assert_eq!(added, 2);
        assert_eq!(canvas.elements().len(), 2);
        assert!(canvas.undo());
        assert!(canvas.elements().is_empty());
        assert!(canvas.to_record().ai_strokes.is_none());

        assert!(canvas.redo());
        let record = canvas.to_record();
        assert_eq!(record.ai_strokes.map(|s| s.len()), Some(2));
    }

    #[test]
    fn test_new_stroke_after_undo_drops_imported_strokes() {
        let mut canvas = small_canvas();
        drag(&mut canvas, Point::new(0.0, 0.0), Point::new(20.0, 20.0));
        canvas.import_vector_path("M0 0 L40 0").expect("import");
        assert_eq!(canvas.ai_strokes().len(), 1);

        assert!(canvas.undo());
        drag(&mut canvas, Point::new(0.0, 30.0), Point::new(20.0, 30.0));
        assert!(!canvas.redo());
        assert!(canvas.ai_strokes().is_empty());
        assert_eq!(canvas.elements().len(), 2);

        canvas.import_vector_path("M0 10 L40 10").expect("import");
        assert!(canvas.undo());
        assert!(canvas.redo());
        assert_eq!(canvas.ai_strokes().len(), 1);
        let strokes = canvas.ai_strokes();
        assert!(strokes[0].points.iter().all(|p| (p.y - 10.0).abs() < 1e-4));
    }

    #[test]
    fn test_import_rejects_bad_path() {
        let mut canvas = small_canvas();
        assert!(canvas.import_vector_path("M 1 Q").is_err());
        assert!(canvas.elements().is_empty());
    }

    #[test]
    fn test_record_round_trip() {
        let mut canvas = small_canvas();
        drag(&mut canvas, Point::new(0.0, 0.0), Point::new(20.0, 20.0));
        let record = canvas.to_record();
        assert!(record.ai_strokes.is_none());

        let mut other = small_canvas();
        other.load_record(record);
        assert_eq!(other.elements(), canvas.elements());
        assert!(!other.undo());
    }
}

#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn capture_timer_fires_at_most_once_per_interval(mut offsets in prop::collection::vec(0u64..1_000, 1..60)) {
            offsets.sort_unstable();
            let interval = Duration::from_millis(33);
            let t0 = Instant::now();
            let mut timer = CaptureTimer::new(interval, t0);

            let fired: Vec<u64> = offsets
                .iter()
                .copied()
                .filter(|ms| timer.poll(t0 + Duration::from_millis(*ms)))
                .collect();
            for pair in fired.windows(2) {
                prop_assert!(pair[1] - pair[0] >= 33);
            }
            if let Some(first) = fired.first() {
                prop_assert!(*first >= 33);
            }
        }
    }
}
