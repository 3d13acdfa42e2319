//! Rendering module: paint commands, rasterization and PNG output

pub mod paint;
pub mod raster;

pub use paint::PaintCommand;
pub use raster::{capture_mask, compose_preview, flatten_onto_backdrop, rasterize};

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};

use crate::{DataUrl, Result};

/// Media type of every raster this module serializes.
pub const PNG_MEDIA_TYPE: &str = "image/png";

/// An encoded raster: dimensions plus PNG bytes.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

impl Snapshot {
    /// Encode an RGBA raster as PNG.
    pub fn encode(img: &RgbaImage) -> Result<Self> {
        let mut png_data = Vec::new();
        img.write_to(&mut Cursor::new(&mut png_data), ImageFormat::Png)?;
        Ok(Self {
            width: img.width(),
            height: img.height(),
            png_data,
        })
    }

    /// Serialize as a `data:image/png;base64,...` URL.
    pub fn to_data_url(&self) -> DataUrl {
        DataUrl::from_bytes(PNG_MEDIA_TYPE, &self.png_data)
    }
}
