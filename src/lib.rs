//! RFox Mask Editor
//!
//! A page controller for drawing a freehand mask over a background image and
//! submitting both the original image and the rendered mask to a remote
//! processing endpoint.
//!
//! # Features
//!
//! - **Upload backend** (default, `upload` feature): multipart POST via `reqwest`
//! - **Raster surface**: strokes, flattening and PNG encoding via `image`
//! - **Single controller**: upload is an injected capability; without one,
//!   saving only captures the mask locally
//!
//! # Example
//!
//! ```no_run
//! use rfmask::{EditorConfig, SaveOutcome, SelectedFile};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EditorConfig::default();
//! let mut editor = rfmask::new_editor(config)?;
//!
//! editor.select_file(&SelectedFile::from_path("photo.jpg")?)?;
//! editor.stroke(&[(100.0, 100.0), (200.0, 150.0)]);
//!
//! if let SaveOutcome::Submitted(ticket) = editor.save()? {
//!     editor.complete_upload(ticket)?;
//! }
//! if let Some(view) = editor.result_view() {
//!     println!("mask stored at {}", view.mask_src);
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

pub mod error;
pub use error::{Error, Result};

pub mod encoding;
pub use encoding::{base64_to_blob, base64_to_blob_chunked, Blob, DataUrl, DEFAULT_CHUNK_SIZE};

// Raster primitives: paint commands, flatten-onto-backdrop, PNG output
pub mod rendering;

// Drawing surface adapter (stroke layer + optional background)
pub mod surface;
pub use surface::{Canvas, DrawingSurface};

pub mod upload;
pub use upload::{UploadRequest, UploadResponse, UploadedUrls, Uploader};

#[cfg(feature = "upload")]
pub use upload::HttpUploader;

// Async-friendly upload API (worker-thread-backed)
#[cfg(feature = "upload")]
pub mod async_api;

#[cfg(feature = "upload")]
pub use async_api::UploadWorker;

pub mod editor;
pub use editor::{
    MaskEditor, ResultView, SaveOutcome, SelectedFile, SkipReason, UploadOutcome, UploadTicket,
};

/// Smallest brush radius the slider allows
pub const MIN_BRUSH_RADIUS: u32 = 1;
/// Largest brush radius the slider allows
pub const MAX_BRUSH_RADIUS: u32 = 20;

/// Configuration for the mask editor
///
/// Defaults reproduce the stock page: a 500x500 canvas, a white brush of
/// radius 4, a light-grey placeholder and uploads to a local development
/// server with no request timeout.
///
/// # Examples
///
/// ```
/// let cfg = rfmask::EditorConfig::default();
/// assert_eq!(cfg.canvas.width, 500);
/// assert!(cfg.endpoint.ends_with("/upload/"));
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Endpoint receiving the multipart upload
    pub endpoint: String,
    /// Canvas dimensions
    pub canvas: CanvasSize,
    /// Initial brush radius (clamped to 1..=20)
    pub brush_radius: u32,
    /// Brush color as RGBA
    pub brush_color: [u8; 4],
    /// Color shown behind strokes when no background is loaded
    pub placeholder_color: [u8; 4],
    /// Request timeout in milliseconds; `None` waits indefinitely
    pub timeout_ms: Option<u64>,
    /// User agent string to send with uploads
    pub user_agent: String,
    /// Custom HTTP headers
    pub headers: HashMap<String, String>,
    /// Base64 source characters decoded per step
    pub chunk_size: usize,
    /// Whether `save` submits to the endpoint or only captures the mask
    pub upload_enabled: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/upload/".to_string(),
            canvas: CanvasSize::default(),
            brush_radius: 4,
            brush_color: [255, 255, 255, 255],
            placeholder_color: [0xD3, 0xD3, 0xD3, 255],
            timeout_ms: None,
            user_agent: format!("rfmask/{}", env!("CARGO_PKG_VERSION")),
            headers: HashMap::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            upload_enabled: true,
        }
    }
}

impl EditorConfig {
    /// Load a JSON config file; missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("Failed to read {}: {}", path.display(), e)))?;
        let cfg: EditorConfig = serde_json::from_str(&text)
            .map_err(|e| Error::ConfigError(format!("Failed to parse {}: {}", path.display(), e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the endpoint and sizes before building an editor.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.endpoint)
            .map_err(|e| Error::ConfigError(format!("Bad endpoint {:?}: {}", self.endpoint, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::ConfigError(format!(
                "Endpoint must be http or https, got {}",
                url.scheme()
            )));
        }
        if self.chunk_size == 0 {
            return Err(Error::ConfigError("chunk_size must be positive".into()));
        }
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(Error::ConfigError("canvas must be non-empty".into()));
        }
        Ok(())
    }
}

/// Canvas dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 500,
            height: 500,
        }
    }
}

/// Brush radius in pixels, always within `MIN_BRUSH_RADIUS..=MAX_BRUSH_RADIUS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BrushRadius(u32);

impl BrushRadius {
    /// Clamp `value` into the slider range.
    pub fn new(value: u32) -> Self {
        BrushRadius(value.clamp(MIN_BRUSH_RADIUS, MAX_BRUSH_RADIUS))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for BrushRadius {
    fn default() -> Self {
        BrushRadius(4)
    }
}

/// Create a mask editor from the configuration.
///
/// When the `upload` feature is enabled and `config.upload_enabled` is set,
/// the editor gets an [`HttpUploader`]; otherwise saving only captures the
/// mask locally.
pub fn new_editor(config: EditorConfig) -> Result<MaskEditor> {
    config.validate()?;

    #[cfg(feature = "upload")]
    {
        if config.upload_enabled {
            let uploader = HttpUploader::new(&config)?;
            return Ok(MaskEditor::with_uploader(config, Box::new(uploader)));
        }
    }

    Ok(MaskEditor::new(config))
}
