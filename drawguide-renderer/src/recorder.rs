//! Frame recording and animated GIF export.
//!
//! [`FrameRecorder`] is a rate limiter, not a fixed-cadence sampler: a frame
//! offered sooner than [`RecorderConfig::min_frame_delay`] after the last
//! accepted one is dropped. Each accepted frame remembers how long it
//! followed its predecessor, which becomes its delay in the animation.

use std::time::{Duration, Instant};

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};
use tiny_skia::{Color, Pixmap, PixmapPaint, Transform};

use crate::error::{RenderError, RenderResult};

/// Recorder settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderConfig {
    /// Minimum time between accepted frames (about 30 fps).
    pub min_frame_delay: Duration,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            min_frame_delay: Duration::from_millis(33),
        }
    }
}

/// One captured frame.
#[derive(Debug, Clone)]
pub struct RecordingFrame {
    /// Captured surface.
    pub bitmap: Pixmap,
    /// Time since the previous accepted frame (or the session start).
    pub delay: Duration,
}

/// Turns ordered frames into an animation file.
pub trait AnimationEncoder {
    /// Encode `frames` in order.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Animation`] if encoding fails.
    fn encode(&self, frames: &[RecordingFrame]) -> RenderResult<Vec<u8>>;
}

/// GIF encoder that loops forever.
#[derive(Debug, Clone, Copy)]
pub struct GifAnimationEncoder {
    /// Quantization speed, 1 (best) to 30 (fastest).
    pub speed: i32,
}

impl Default for GifAnimationEncoder {
    fn default() -> Self {
        Self { speed: 10 }
    }
}

impl AnimationEncoder for GifAnimationEncoder {
    fn encode(&self, frames: &[RecordingFrame]) -> RenderResult<Vec<u8>> {
        let mut buf = Vec::new();
        {
            let mut encoder = GifEncoder::new_with_speed(&mut buf, self.speed.clamp(1, 30));
            encoder
                .set_repeat(Repeat::Infinite)
                .map_err(|e| RenderError::Animation(format!("GIF setup failed: {e}")))?;

            for frame in frames {
                let rgba = to_rgba_image(&frame.bitmap)?;
                let delay = Delay::from_saturating_duration(frame.delay);
                encoder
                    .encode_frame(Frame::from_parts(rgba, 0, 0, delay))
                    .map_err(|e| RenderError::Animation(format!("GIF encoding failed: {e}")))?;
            }
        }
        Ok(buf)
    }
}

/// Convert a premultiplied surface to straight-alpha RGBA.
fn to_rgba_image(pixmap: &Pixmap) -> RenderResult<RgbaImage> {
    let data: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .ok_or_else(|| RenderError::Animation("frame buffer size mismatch".to_string()))
}

/// Composite a frame over opaque white.
fn flatten_onto_white(bitmap: &Pixmap) -> RenderResult<Pixmap> {
    let mut out = Pixmap::new(bitmap.width(), bitmap.height()).ok_or_else(|| {
        RenderError::Surface(format!(
            "cannot allocate {}x{} frame",
            bitmap.width(),
            bitmap.height()
        ))
    })?;
    out.fill(Color::WHITE);
    out.draw_pixmap(
        0,
        0,
        bitmap.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
    Ok(out)
}

/// Collects rate-limited frames during a recording session.
#[derive(Debug, Default)]
pub struct FrameRecorder {
    config: RecorderConfig,
    frames: Vec<RecordingFrame>,
    last_accepted: Option<Instant>,
    recording: bool,
}

impl FrameRecorder {
    /// Create an idle recorder.
    #[must_use]
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Start a new session now, discarding frames from earlier sessions.
    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    /// Start a new session at `now`.
    pub fn start_at(&mut self, now: Instant) {
        self.frames.clear();
        self.last_accepted = Some(now);
        self.recording = true;
        tracing::debug!("Recording started");
    }

    /// Offer a frame captured now. Returns whether it was kept.
    pub fn add_frame(&mut self, bitmap: Pixmap) -> bool {
        self.add_frame_at(bitmap, Instant::now())
    }

    /// Offer a frame captured at `now`. Returns whether it was kept.
    ///
    /// Frames are ignored while idle and dropped when they arrive sooner
    /// than the minimum delay after the last accepted frame.
    pub fn add_frame_at(&mut self, bitmap: Pixmap, now: Instant) -> bool {
        if !self.recording {
            return false;
        }
        let Some(last) = self.last_accepted else {
            return false;
        };

        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.config.min_frame_delay {
            return false;
        }

        self.frames.push(RecordingFrame {
            bitmap,
            delay: elapsed,
        });
        self.last_accepted = Some(now);
        tracing::trace!("Captured frame {} after {elapsed:?}", self.frames.len());
        true
    }

    /// End the session. Captured frames stay available for export.
    pub fn stop(&mut self) {
        if self.recording {
            self.recording = false;
            tracing::debug!("Recording stopped with {} frame(s)", self.frames.len());
        }
    }

    /// Whether a session is active.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Captured frames in order.
    #[must_use]
    pub fn frames(&self) -> &[RecordingFrame] {
        &self.frames
    }

    /// Number of captured frames.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Encode the captured frames, each flattened onto white.
    ///
    /// The frame buffer is cleared only when encoding succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Animation`] if there are no frames or the
    /// encoder fails.
    pub fn generate_animation(&mut self, encoder: &dyn AnimationEncoder) -> RenderResult<Vec<u8>> {
        if self.frames.is_empty() {
            return Err(RenderError::Animation("no frames recorded".to_string()));
        }

        let flattened = self
            .frames
            .iter()
            .map(|frame| {
                Ok(RecordingFrame {
                    bitmap: flatten_onto_white(&frame.bitmap)?,
                    delay: frame.delay,
                })
            })
            .collect::<RenderResult<Vec<_>>>()?;

        let bytes = encoder.encode(&flattened)?;
        tracing::debug!(
            "Encoded {} frame(s) into {} byte animation",
            flattened.len(),
            bytes.len()
        );
        self.frames.clear();
        Ok(bytes)
    }
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn accepted_frames_respect_min_delay(mut offsets in prop::collection::vec(0u64..2_000, 0..40)) {
            offsets.sort_unstable();
            let mut recorder = FrameRecorder::default();
            let t0 = Instant::now();
            recorder.start_at(t0);
            for ms in &offsets {
                recorder.add_frame_at(Pixmap::new(1, 1).expect("pixmap"), t0 + Duration::from_millis(*ms));
            }

            let min = RecorderConfig::default().min_frame_delay;
            prop_assert!(recorder.frame_count() <= offsets.len());
            for frame in recorder.frames() {
                prop_assert!(frame.delay >= min);
            }
        }
    }
}
