//! Drawing surface adapter
//!
//! The surface keeps two rasters: an optional background (decoded from a
//! data URL and scaled to the canvas) and a transparent stroke layer that the
//! user paints on. Only the stroke layer is captured when saving a mask.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::rendering::{compose_preview, PaintCommand};
use crate::{BrushRadius, CanvasSize, DataUrl, EditorConfig, Result};

/// Operations the page controller needs from a freehand drawing widget.
pub trait DrawingSurface: Send {
    /// Fixed canvas dimensions
    fn size(&self) -> CanvasSize;

    /// Radius used by subsequent strokes
    fn set_brush_radius(&mut self, radius: BrushRadius);

    fn brush_radius(&self) -> BrushRadius;

    /// Replace (or remove) the background raster shown beneath strokes.
    fn set_background(&mut self, background: Option<&DataUrl>) -> Result<()>;

    /// Paint a freehand stroke through `points` (canvas pixel coordinates).
    fn stroke(&mut self, points: &[(f32, f32)]);

    /// Remove all strokes. The background is kept.
    fn clear(&mut self);

    /// The current stroke layer, transparent where nothing was drawn.
    fn drawing_layer(&self) -> &RgbaImage;

    /// Background (or placeholder) with strokes composited on top.
    fn preview(&self) -> RgbaImage;
}

/// Raster-backed drawing surface.
pub struct Canvas {
    size: CanvasSize,
    brush_radius: BrushRadius,
    brush_color: [u8; 4],
    placeholder_color: [u8; 4],
    background: Option<RgbaImage>,
    layer: RgbaImage,
}

impl Canvas {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            size: config.canvas,
            brush_radius: BrushRadius::new(config.brush_radius),
            brush_color: config.brush_color,
            placeholder_color: config.placeholder_color,
            background: None,
            layer: RgbaImage::new(config.canvas.width, config.canvas.height),
        }
    }

    // Dabs along a segment, spaced so consecutive discs overlap.
    fn segment_dabs(&self, from: (f32, f32), to: (f32, f32), out: &mut Vec<PaintCommand>) {
        let radius = self.brush_radius.get();
        let spacing = (radius as f32 / 2.0).max(1.0);
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let steps = ((dx * dx + dy * dy).sqrt() / spacing).ceil().max(1.0) as u32;
        let [r, g, b, a] = self.brush_color;
        for i in 1..=steps {
            let t = i as f32 / steps as f32;
            out.push(PaintCommand::Dab {
                cx: (from.0 + dx * t).round() as i32,
                cy: (from.1 + dy * t).round() as i32,
                radius,
                rgba: (r, g, b, a),
            });
        }
    }
}

impl DrawingSurface for Canvas {
    fn size(&self) -> CanvasSize {
        self.size
    }

    fn set_brush_radius(&mut self, radius: BrushRadius) {
        self.brush_radius = radius;
    }

    fn brush_radius(&self) -> BrushRadius {
        self.brush_radius
    }

    fn set_background(&mut self, background: Option<&DataUrl>) -> Result<()> {
        // Drop the old backdrop first so a failed decode never leaves it showing.
        self.background = None;
        let Some(url) = background else {
            return Ok(());
        };
        let bytes = url.decode()?;
        let decoded = image::load_from_memory(&bytes)?.to_rgba8();
        let fitted = if decoded.dimensions() == (self.size.width, self.size.height) {
            decoded
        } else {
            imageops::resize(&decoded, self.size.width, self.size.height, FilterType::Triangle)
        };
        self.background = Some(fitted);
        Ok(())
    }

    fn stroke(&mut self, points: &[(f32, f32)]) {
        let Some(&first) = points.first() else {
            return;
        };
        let [r, g, b, a] = self.brush_color;
        let mut commands = vec![PaintCommand::Dab {
            cx: first.0.round() as i32,
            cy: first.1.round() as i32,
            radius: self.brush_radius.get(),
            rgba: (r, g, b, a),
        }];
        for pair in points.windows(2) {
            self.segment_dabs(pair[0], pair[1], &mut commands);
        }
        log::debug!("stroke: {} points, {} dabs", points.len(), commands.len());
        for cmd in &commands {
            cmd.apply(&mut self.layer);
        }
    }

    fn clear(&mut self) {
        self.layer = RgbaImage::new(self.size.width, self.size.height);
    }

    fn drawing_layer(&self) -> &RgbaImage {
        &self.layer
    }

    fn preview(&self) -> RgbaImage {
        compose_preview(self.background.as_ref(), self.placeholder_color, &self.layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::Snapshot;

    const PLACEHOLDER: [u8; 4] = [0xD3, 0xD3, 0xD3, 255];

    fn small_config() -> EditorConfig {
        EditorConfig {
            canvas: CanvasSize { width: 64, height: 64 },
            ..Default::default()
        }
    }

    fn solid_png(rgba: [u8; 4]) -> DataUrl {
        Snapshot::encode(&RgbaImage::from_pixel(8, 8, image::Rgba(rgba)))
            .unwrap()
            .to_data_url()
    }

    #[test]
    fn stroke_paints_along_path() {
        let mut c = Canvas::new(&small_config());
        c.set_brush_radius(BrushRadius::new(2));
        c.stroke(&[(5.0, 32.0), (58.0, 32.0)]);
        let layer = c.drawing_layer();
        for x in [5, 20, 40, 58] {
            assert_eq!(layer.get_pixel(x, 32).0, [255, 255, 255, 255], "x={}", x);
        }
        assert_eq!(layer.get_pixel(32, 5).0[3], 0);
    }

    #[test]
    fn clear_removes_strokes_only() {
        let mut c = Canvas::new(&small_config());
        c.set_background(Some(&solid_png([9, 9, 9, 255]))).unwrap();
        c.stroke(&[(10.0, 10.0)]);
        c.clear();
        assert!(c.drawing_layer().pixels().all(|p| p.0[3] == 0));
        assert_ne!(c.preview().get_pixel(10, 10).0, PLACEHOLDER);
    }

    #[test]
    fn background_is_scaled_to_canvas() {
        let mut c = Canvas::new(&small_config());
        let bg = Snapshot::encode(&RgbaImage::from_pixel(8, 8, image::Rgba([200, 10, 10, 255])))
            .unwrap()
            .to_data_url();
        c.set_background(Some(&bg)).unwrap();
        let preview = c.preview();
        assert_eq!(preview.dimensions(), (64, 64));
        let px = preview.get_pixel(32, 32).0;
        for (got, want) in px.iter().zip([200u8, 10, 10, 255]) {
            assert!(got.abs_diff(want) <= 1, "{:?}", px);
        }
    }

    #[test]
    fn undecodable_background_is_an_error() {
        let mut c = Canvas::new(&small_config());
        let bogus = DataUrl::from_bytes("image/png", b"definitely not a png");
        assert!(c.set_background(Some(&bogus)).is_err());
        assert_eq!(c.preview().get_pixel(32, 32).0, PLACEHOLDER);
    }

    #[test]
    fn undecodable_background_replaces_previous_one() {
        let mut c = Canvas::new(&small_config());
        c.set_background(Some(&solid_png([200, 10, 10, 255]))).unwrap();
        assert_ne!(c.preview().get_pixel(32, 32).0, PLACEHOLDER);

        let bogus = DataUrl::from_bytes("image/png", b"garbage");
        assert!(c.set_background(Some(&bogus)).is_err());
        assert_eq!(c.preview().get_pixel(32, 32).0, PLACEHOLDER);
    }

    #[test]
    fn removing_background_shows_placeholder() {
        let mut c = Canvas::new(&small_config());
        c.set_background(Some(&solid_png([9, 9, 9, 255]))).unwrap();
        c.set_background(None).unwrap();
        assert_eq!(c.preview().get_pixel(0, 0).0, PLACEHOLDER);
    }

    #[test]
    fn empty_stroke_is_a_noop() {
        let mut c = Canvas::new(&small_config());
        c.stroke(&[]);
        assert!(c.drawing_layer().pixels().all(|p| p.0[3] == 0));
    }
}
