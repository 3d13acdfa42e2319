//! Mask-editing page controller.
//!
//! `MaskEditor` owns every piece of transient page state: the background
//! image, the captured mask, the loading flag and the last upload result.
//! Transitions happen only through its methods.
//!
//! Upload lifecycle: `idle -> loading -> idle`. [`MaskEditor::save`] raises
//! the loading flag and hands back an [`UploadTicket`]; whoever performs the
//! request (the injected uploader via [`MaskEditor::complete_upload`], or an
//! async worker) reports back through [`MaskEditor::finish_upload`], which
//! lowers the flag again.

use std::path::Path;

use crate::error::INVALID_FILE_NOTICE;
use crate::rendering::capture_mask;
use crate::upload::{UploadRequest, UploadResponse, UploadedUrls, Uploader};
use crate::{BrushRadius, Canvas, DataUrl, DrawingSurface, EditorConfig, Error, Result};

/// A file picked by the user, with the media type it declares.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, declaring a media type from its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| Error::ReadError(format!("{}: {}", path.display(), e)))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let media_type = match ext.as_deref() {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            Some("bmp") => "image/bmp",
            Some("tif") | Some("tiff") => "image/tiff",
            Some("txt") => "text/plain",
            Some("json") => "application/json",
            _ => "application/octet-stream",
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, media_type, bytes))
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }

    /// The file contents as a data URL, as a file reader would produce.
    pub fn to_data_url(&self) -> DataUrl {
        DataUrl::from_bytes(&self.media_type, &self.bytes)
    }
}

/// Why `save` did not submit anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// An upload is already in flight
    UploadInFlight,
    /// The background or mask has no data after its comma delimiter
    MissingPayload,
}

/// Result of a `save` action
#[derive(Debug)]
pub enum SaveOutcome {
    /// Mask captured; uploads are disabled for this editor
    Captured,
    /// Nothing was submitted
    Skipped(SkipReason),
    /// Mask captured and an upload is now in flight
    Submitted(UploadTicket),
}

/// An in-flight upload. Hand it back to [`MaskEditor::finish_upload`], or to
/// [`MaskEditor::abandon_upload`] if it will never be delivered.
#[derive(Debug)]
#[must_use = "the editor stays loading until the ticket is finished or abandoned"]
pub struct UploadTicket {
    seq: u64,
    generation: u64,
    request: UploadRequest,
}

impl UploadTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn request(&self) -> &UploadRequest {
        &self.request
    }
}

/// How a finished upload affected the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The response was merged into the upload result
    Stored,
    /// The background changed while the request was in flight; the response
    /// was dropped
    DiscardedStale,
}

/// The two side-by-side previews shown after saving
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub original_src: String,
    pub mask_src: String,
}

/// The mask-editing page controller.
pub struct MaskEditor {
    config: EditorConfig,
    surface: Box<dyn DrawingSurface>,
    uploader: Option<Box<dyn Uploader>>,
    uploads_enabled: bool,

    background_image: Option<DataUrl>,
    masked_image: Option<DataUrl>,
    upload_result: Option<UploadedUrls>,
    loading: bool,

    // Bumped on every accepted background; tickets remember the value they
    // were issued under.
    generation: u64,
    next_seq: u64,
}

impl MaskEditor {
    /// Editor with a raster canvas. Uploads follow `config.upload_enabled`;
    /// without an injected uploader, submitted tickets must be delivered by
    /// the caller (e.g. an async worker).
    pub fn new(config: EditorConfig) -> Self {
        let surface = Box::new(Canvas::new(&config));
        Self {
            uploads_enabled: config.upload_enabled,
            config,
            surface,
            uploader: None,
            background_image: None,
            masked_image: None,
            upload_result: None,
            loading: false,
            generation: 0,
            next_seq: 1,
        }
    }

    /// Editor that uploads through `uploader` on every save.
    pub fn with_uploader(config: EditorConfig, uploader: Box<dyn Uploader>) -> Self {
        let mut editor = Self::new(config);
        editor.uploader = Some(uploader);
        editor.uploads_enabled = true;
        editor
    }

    /// Swap in another drawing surface.
    pub fn with_surface(mut self, surface: Box<dyn DrawingSurface>) -> Self {
        self.surface = surface;
        self
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn uploads_enabled(&self) -> bool {
        self.uploads_enabled
    }

    pub fn background_image(&self) -> Option<&DataUrl> {
        self.background_image.as_ref()
    }

    pub fn masked_image(&self) -> Option<&DataUrl> {
        self.masked_image.as_ref()
    }

    pub fn upload_result(&self) -> Option<&UploadedUrls> {
        self.upload_result.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn surface(&self) -> &dyn DrawingSurface {
        self.surface.as_ref()
    }

    /// Accept a new background image.
    ///
    /// Non-image files are rejected with `Error::InvalidFileType` and leave
    /// all state untouched. Accepted files clear the mask and the strokes.
    /// Allowed while an upload is in flight.
    pub fn select_file(&mut self, file: &SelectedFile) -> Result<()> {
        if !file.is_image() {
            log::warn!("{} ({:?} is {})", INVALID_FILE_NOTICE, file.name, file.media_type);
            return Err(Error::InvalidFileType(file.media_type.clone()));
        }

        self.masked_image = None;
        self.surface.clear();

        let url = file.to_data_url();
        if let Err(e) = self.surface.set_background(Some(&url)) {
            log::warn!("Background {:?} could not be displayed: {}", file.name, e);
        }
        self.background_image = Some(url);
        self.generation += 1;
        log::debug!(
            "background set from {:?} ({} bytes, generation {})",
            file.name,
            file.bytes.len(),
            self.generation
        );
        Ok(())
    }

    pub fn set_brush_radius(&mut self, radius: u32) {
        self.surface.set_brush_radius(BrushRadius::new(radius));
    }

    pub fn brush_radius(&self) -> BrushRadius {
        self.surface.brush_radius()
    }

    pub fn stroke(&mut self, points: &[(f32, f32)]) {
        self.surface.stroke(points);
    }

    /// Remove strokes. Background and upload result are kept.
    pub fn clear_drawing(&mut self) {
        self.surface.clear();
    }

    /// Capture the mask and, if uploads are enabled, start an upload.
    ///
    /// A save while an upload is in flight does nothing.
    pub fn save(&mut self) -> Result<SaveOutcome> {
        if self.loading {
            log::debug!("save ignored: upload in flight");
            return Ok(SaveOutcome::Skipped(SkipReason::UploadInFlight));
        }

        let snapshot = capture_mask(self.surface.drawing_layer(), self.surface.size())?;
        let mask = snapshot.to_data_url();
        self.masked_image = Some(mask.clone());

        if !self.uploads_enabled {
            return Ok(SaveOutcome::Captured);
        }

        let Some(background) = self.background_image.as_ref() else {
            log::debug!("save: no background selected, nothing to upload");
            return Ok(SaveOutcome::Skipped(SkipReason::MissingPayload));
        };

        let request = match UploadRequest::from_data_urls(background, &mask, self.config.chunk_size) {
            Ok(r) => r,
            Err(Error::MissingPayload(which)) => {
                log::debug!("save: {} has no payload, nothing to upload", which);
                return Ok(SaveOutcome::Skipped(SkipReason::MissingPayload));
            }
            Err(e) => return Err(e),
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        self.loading = true;
        Ok(SaveOutcome::Submitted(UploadTicket {
            seq,
            generation: self.generation,
            request,
        }))
    }

    /// Record the outcome of an upload started by `save`.
    ///
    /// The loading flag is lowered either way. On failure the previous
    /// upload result is kept and the error is returned.
    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<UploadResponse>,
    ) -> Result<UploadOutcome> {
        self.loading = false;

        let response = match result {
            Ok(r) => r,
            Err(e) => {
                log::error!("Error uploading images (upload #{}): {}", ticket.seq, e);
                return Err(e);
            }
        };

        if ticket.generation != self.generation {
            log::warn!(
                "discarding upload #{}: background changed while it was in flight",
                ticket.seq
            );
            return Ok(UploadOutcome::DiscardedStale);
        }

        let urls = UploadedUrls::from(response);
        log::info!(
            "upload #{} stored: background={:?} mask={:?}",
            ticket.seq,
            urls.background_image,
            urls.masked_image
        );
        self.upload_result = Some(self.upload_result.take().unwrap_or_default().merged_with(urls));
        Ok(UploadOutcome::Stored)
    }

    /// Give up on an upload that was never delivered.
    ///
    /// Lowers the loading flag and leaves the previous upload result in place.
    pub fn abandon_upload(&mut self, ticket: UploadTicket) {
        self.loading = false;
        log::debug!("upload #{} abandoned before delivery", ticket.seq);
    }

    /// Deliver `ticket` through the injected uploader and record the result.
    pub fn complete_upload(&mut self, ticket: UploadTicket) -> Result<UploadOutcome> {
        let result = match &self.uploader {
            Some(uploader) => uploader.upload(&ticket.request),
            None => Err(Error::Other("no uploader configured".into())),
        };
        self.finish_upload(ticket, result)
    }

    /// Previews to show side by side, if any.
    ///
    /// With uploads: the stored remote URLs, once an upload succeeded and
    /// none is in flight. Without: the local background and mask as soon as
    /// a mask was captured.
    pub fn result_view(&self) -> Option<ResultView> {
        let mask = self.masked_image.as_ref()?;
        if self.uploads_enabled {
            if self.loading {
                return None;
            }
            let urls = self.upload_result.as_ref()?;
            Some(ResultView {
                original_src: urls.background_image.clone()?,
                mask_src: urls.masked_image.clone()?,
            })
        } else {
            Some(ResultView {
                original_src: self
                    .background_image
                    .as_ref()
                    .map(|b| b.to_string())
                    .unwrap_or_default(),
                mask_src: mask.to_string(),
            })
        }
    }
}
