/// Rasterization and flatten-onto-backdrop

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::rendering::{PaintCommand, Snapshot};
use crate::{CanvasSize, Result};

/// Opaque backdrop the mask is flattened onto.
pub const MASK_BACKDROP: (u8, u8, u8, u8) = (0, 0, 0, 255);

/// Run `commands` in order over a fully transparent raster.
pub fn rasterize(width: u32, height: u32, commands: &[PaintCommand]) -> RgbaImage {
    let mut img = RgbaImage::new(width, height);
    for cmd in commands {
        cmd.apply(&mut img);
    }
    img
}

/// Allocate a raster of `size`, fill it with `backdrop`, then composite
/// `layer` over it (scaled to fit when the sizes differ). Transparent layer
/// pixels leave the backdrop showing.
pub fn flatten_onto_backdrop(layer: &RgbaImage, size: CanvasSize, backdrop: (u8, u8, u8, u8)) -> RgbaImage {
    let mut out = rasterize(
        size.width,
        size.height,
        &[PaintCommand::SolidRect {
            x: 0,
            y: 0,
            width: size.width,
            height: size.height,
            rgba: backdrop,
        }],
    );
    overlay_fitted(&mut out, layer);
    out
}

/// Flatten the stroke layer onto black and encode it as PNG.
pub fn capture_mask(layer: &RgbaImage, size: CanvasSize) -> Result<Snapshot> {
    let flat = flatten_onto_backdrop(layer, size, MASK_BACKDROP);
    Snapshot::encode(&flat)
}

/// What the user sees on the canvas: the background (or a placeholder
/// colour when none is loaded) with the strokes on top.
pub fn compose_preview(
    background: Option<&RgbaImage>,
    placeholder: [u8; 4],
    layer: &RgbaImage,
) -> RgbaImage {
    let (w, h) = layer.dimensions();
    let mut out = match background {
        Some(bg) if bg.dimensions() == (w, h) => bg.clone(),
        Some(bg) => imageops::resize(bg, w, h, FilterType::Triangle),
        None => RgbaImage::from_pixel(w, h, Rgba(placeholder)),
    };
    imageops::overlay(&mut out, layer, 0, 0);
    out
}

fn overlay_fitted(bottom: &mut RgbaImage, top: &RgbaImage) {
    if top.dimensions() == bottom.dimensions() {
        imageops::overlay(bottom, top, 0, 0);
    } else {
        let scaled = imageops::resize(top, bottom.width(), bottom.height(), FilterType::Triangle);
        imageops::overlay(bottom, &scaled, 0, 0);
    }
}
