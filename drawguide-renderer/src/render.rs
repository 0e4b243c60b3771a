//! Raster rendering of a drawing to interactive and export surfaces.
//!
//! Both targets share one drawing-layer routine, so a stroke looks the same
//! on screen and in a saved file. The drawing layer starts transparent and
//! is composited over white at the end; eraser strokes therefore cut
//! through strokes and the guide but never the background.

use base64::Engine;
use drawguide_core::geometry::{element_outline, Outline, PathSegment};
use drawguide_core::{parse_hex_color, DrawingElement};
use tiny_skia::{
    BlendMode, Color, FilterQuality, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap,
    PixmapPaint, Transform,
};

use crate::error::{RenderError, RenderResult};
use crate::guide::GuideImage;

/// Default canvas side length in pixels.
pub const DEFAULT_CANVAS_SIZE: u32 = 460;

/// Scale used for high-resolution saves.
pub const HIGH_RES_SCALE: f32 = 4.0;

/// Largest surface side the renderer will allocate.
pub const MAX_SURFACE_SIDE: u32 = 8192;

/// Smallest grid spacing in pixels; finer spacings are raised to this.
pub const MIN_GRID_SPACING: f32 = 1.0;

/// Grid overlay settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    /// Whether the grid is drawn on the interactive surface.
    pub visible: bool,
    /// Distance between grid lines in pixels.
    pub spacing: f32,
    /// Grid line color as RGBA.
    pub color: [u8; 4],
    /// Grid line width in pixels.
    pub line_width: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            visible: true,
            spacing: 10.0,
            color: [0xe5, 0xe7, 0xeb, 0xff],
            line_width: 0.5,
        }
    }
}

/// Configuration for the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Canvas side length in pixels (the canvas is square).
    pub canvas_size: u32,
    /// Grid overlay.
    pub grid: GridConfig,
    /// Opacity of the guide image, 0.0 to 1.0.
    pub guide_opacity: f32,
    /// Enable anti-aliasing.
    pub anti_aliasing: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            canvas_size: DEFAULT_CANVAS_SIZE,
            grid: GridConfig::default(),
            guide_opacity: 0.3,
            anti_aliasing: true,
        }
    }
}

/// Everything that gets drawn, borrowed from its owners.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scene<'a> {
    /// Committed elements in drawing order.
    pub elements: &'a [DrawingElement],
    /// Stroke being captured, drawn on top.
    pub preview: Option<&'a DrawingElement>,
    /// Reference image under the strokes.
    pub guide: Option<&'a GuideImage>,
}

impl<'a> Scene<'a> {
    /// Scene with only committed elements.
    #[must_use]
    pub fn new(elements: &'a [DrawingElement]) -> Self {
        Self {
            elements,
            preview: None,
            guide: None,
        }
    }

    /// Add the in-progress element.
    #[must_use]
    pub fn with_preview(mut self, preview: Option<&'a DrawingElement>) -> Self {
        self.preview = preview;
        self
    }

    /// Add a guide image.
    #[must_use]
    pub fn with_guide(mut self, guide: Option<&'a GuideImage>) -> Self {
        self.guide = guide;
        self
    }
}

/// Options for the export target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    /// Uniform scale applied to the canvas.
    pub scale: f32,
    /// Draw the guide image into the export.
    pub include_guide: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            include_guide: false,
        }
    }
}

impl ExportOptions {
    /// Export at `scale` without the guide.
    #[must_use]
    pub fn scaled(scale: f32) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }
}

/// Where a scene is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderTarget {
    /// On-screen surface: grid, guide, strokes, preview.
    Interactive,
    /// Off-screen surface for files: no grid, optional scale.
    Export(ExportOptions),
}

/// Owned renderer drawing scenes with tiny-skia.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    /// Create a new renderer with the given configuration.
    #[must_use]
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Show or hide the grid on the interactive surface.
    pub fn set_grid_visible(&mut self, visible: bool) {
        self.config.grid.visible = visible;
    }

    /// Change the grid spacing. Non-positive or non-finite spacings are
    /// ignored; spacings below [`MIN_GRID_SPACING`] are raised to it.
    pub fn set_grid_spacing(&mut self, spacing: f32) {
        if spacing.is_finite() && spacing > 0.0 {
            self.config.grid.spacing = spacing.max(MIN_GRID_SPACING);
        }
    }

    /// Draw `scene` to a new surface for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Surface`] if the surface size is zero, not
    /// finite, or larger than [`MAX_SURFACE_SIDE`].
    pub fn draw(&self, scene: &Scene<'_>, target: RenderTarget) -> RenderResult<Pixmap> {
        match target {
            RenderTarget::Interactive => self.draw_interactive(scene),
            RenderTarget::Export(options) => self.draw_export(scene, options),
        }
    }

    fn draw_interactive(&self, scene: &Scene<'_>) -> RenderResult<Pixmap> {
        let side = self.config.canvas_size;
        check_side(side)?;

        let mut surface = new_surface(side)?;
        surface.fill(Color::WHITE);
        if self.config.grid.visible {
            self.draw_grid(&mut surface);
        }

        let layer = self.drawing_layer(scene, side, Transform::identity(), true)?;
        surface.draw_pixmap(
            0,
            0,
            layer.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Ok(surface)
    }

    fn draw_export(&self, scene: &Scene<'_>, options: ExportOptions) -> RenderResult<Pixmap> {
        let side = scaled_side(self.config.canvas_size, options.scale)?;
        let transform = Transform::from_scale(options.scale, options.scale);

        let layer = self.drawing_layer(scene, side, transform, options.include_guide)?;
        let mut surface = new_surface(side)?;
        surface.fill(Color::WHITE);
        surface.draw_pixmap(
            0,
            0,
            layer.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );

        tracing::trace!(
            "Exported {} element(s) at {side}x{side}",
            scene.elements.len()
        );
        Ok(surface)
    }

    /// Render `scene` for export and encode it as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be allocated or encoding fails.
    pub fn export_png(&self, scene: &Scene<'_>, options: ExportOptions) -> RenderResult<Vec<u8>> {
        let pixmap = self.draw_export(scene, options)?;
        encode_png(&pixmap)
    }

    fn drawing_layer(
        &self,
        scene: &Scene<'_>,
        side: u32,
        transform: Transform,
        with_guide: bool,
    ) -> RenderResult<Pixmap> {
        let mut layer = new_surface(side)?;

        if let (true, Some(guide)) = (with_guide, scene.guide) {
            self.draw_guide(&mut layer, guide, transform);
        }
        for element in scene.elements.iter().chain(scene.preview) {
            draw_element(&mut layer, element, transform, self.config.anti_aliasing);
        }
        Ok(layer)
    }

    /// Stretch the guide over the whole canvas at reduced opacity.
    #[allow(clippy::cast_precision_loss)]
    fn draw_guide(&self, layer: &mut Pixmap, guide: &GuideImage, transform: Transform) {
        let size = self.config.canvas_size as f32;
        let sx = size / guide.width() as f32;
        let sy = size / guide.height() as f32;
        let paint = PixmapPaint {
            opacity: self.config.guide_opacity.clamp(0.0, 1.0),
            blend_mode: BlendMode::SourceOver,
            quality: FilterQuality::Bilinear,
        };
        layer.draw_pixmap(
            0,
            0,
            guide.pixmap().as_ref(),
            &paint,
            transform.pre_scale(sx, sy),
            None,
        );
    }

    #[allow(clippy::cast_precision_loss)]
    fn draw_grid(&self, surface: &mut Pixmap) {
        let grid = &self.config.grid;
        if !(grid.spacing.is_finite() && grid.spacing > 0.0) {
            return;
        }
        // a directly built config may bypass set_grid_spacing
        let spacing = grid.spacing.max(MIN_GRID_SPACING);
        let size = self.config.canvas_size as f32;

        let mut pb = PathBuilder::new();
        let mut offset = 0.0;
        while offset <= size {
            pb.move_to(offset, 0.0);
            pb.line_to(offset, size);
            pb.move_to(0.0, offset);
            pb.line_to(size, offset);
            offset += spacing;
        }
        let Some(path) = pb.finish() else {
            return;
        };

        let mut paint = Paint::default();
        let [r, g, b, a] = grid.color;
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = self.config.anti_aliasing;
        let stroke = tiny_skia::Stroke {
            width: grid.line_width,
            ..tiny_skia::Stroke::default()
        };
        surface.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }
}

fn check_side(side: u32) -> RenderResult<()> {
    if side == 0 || side > MAX_SURFACE_SIDE {
        return Err(RenderError::Surface(format!(
            "surface side {side} outside 1..={MAX_SURFACE_SIDE}"
        )));
    }
    Ok(())
}

/// Side length of a canvas of `size` pixels drawn at `scale`.
fn scaled_side(size: u32, scale: f32) -> RenderResult<u32> {
    let side = (f64::from(size) * f64::from(scale)).round();
    if !side.is_finite() || side < 1.0 || side > f64::from(MAX_SURFACE_SIDE) {
        return Err(RenderError::Surface(format!(
            "cannot export {size}px canvas at scale {scale}"
        )));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let side = side as u32;
    Ok(side)
}

fn new_surface(side: u32) -> RenderResult<Pixmap> {
    Pixmap::new(side, side)
        .ok_or_else(|| RenderError::Surface(format!("cannot allocate {side}x{side} surface")))
}

fn outline_path(outline: &Outline) -> Option<Path> {
    let mut pb = PathBuilder::new();
    match outline {
        Outline::Circle { center, radius } => {
            return PathBuilder::from_circle(center.x, center.y, *radius);
        }
        Outline::Polygon(points) => {
            let (first, rest) = points.split_first()?;
            pb.move_to(first.x, first.y);
            for p in rest {
                pb.line_to(p.x, p.y);
            }
            pb.close();
        }
        Outline::Path(segments) => {
            for segment in segments {
                match *segment {
                    PathSegment::MoveTo(p) => pb.move_to(p.x, p.y),
                    PathSegment::LineTo(p) => pb.line_to(p.x, p.y),
                    PathSegment::QuadTo(c, p) => pb.quad_to(c.x, c.y, p.x, p.y),
                    PathSegment::CubicTo(c1, c2, p) => {
                        pb.cubic_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y);
                    }
                }
            }
        }
    }
    pb.finish()
}

/// Stroke one element onto the drawing layer.
fn draw_element(
    layer: &mut Pixmap,
    element: &DrawingElement,
    transform: Transform,
    anti_alias: bool,
) {
    let Some(outline) = element_outline(element) else {
        return;
    };
    let Some(path) = outline_path(&outline) else {
        tracing::trace!("Skipping degenerate {} element", element.tool);
        return;
    };

    let mut paint = Paint::default();
    paint.anti_alias = anti_alias;
    if element.is_eraser() {
        paint.set_color_rgba8(255, 255, 255, 255);
        paint.blend_mode = BlendMode::DestinationOut;
    } else {
        let [r, g, b, a] = parse_hex_color(&element.color).unwrap_or([0, 0, 0, 255]);
        paint.set_color_rgba8(r, g, b, a);
    }

    let mut stroke = tiny_skia::Stroke {
        width: element.stroke_width.max(0.0),
        ..tiny_skia::Stroke::default()
    };
    if matches!(outline, Outline::Path(_)) {
        stroke.line_cap = LineCap::Round;
        stroke.line_join = LineJoin::Round;
    }

    layer.stroke_path(&path, &paint, &stroke, transform, None);
}

/// Encode a surface as PNG.
///
/// # Errors
///
/// Returns [`RenderError::Export`] if encoding fails.
pub fn encode_png(pixmap: &Pixmap) -> RenderResult<Vec<u8>> {
    pixmap
        .encode_png()
        .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))
}

/// Wrap PNG bytes in a `data:image/png;base64,` URL.
#[must_use]
pub fn to_data_url(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}
