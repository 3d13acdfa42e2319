//! Upload client: packages the background and mask as a two-part multipart
//! request and posts it to the processing endpoint.

use serde::Deserialize;

use crate::encoding::{base64_to_blob_chunked, payload_of};
use crate::{Blob, DataUrl, Error, Result};

#[cfg(feature = "upload")]
use crate::EditorConfig;
#[cfg(feature = "upload")]
use reqwest::blocking::{multipart, Client};
#[cfg(feature = "upload")]
use std::collections::HashMap;
#[cfg(feature = "upload")]
use std::time::Duration;

/// Multipart field carrying the background image
pub const IMAGE_PART: &str = "image";
pub const BACKGROUND_FILE_NAME: &str = "background.jpg";
pub const BACKGROUND_MEDIA_TYPE: &str = "image/jpeg";

/// Multipart field carrying the rendered mask
pub const MASK_PART: &str = "mask";
pub const MASK_FILE_NAME: &str = "masked.png";
pub const MASK_MEDIA_TYPE: &str = "image/png";

/// One file part of the upload form.
#[derive(Debug, Clone)]
pub struct UploadPart {
    pub name: &'static str,
    pub file_name: &'static str,
    pub blob: Blob,
}

/// Both parts of an upload, decoded and ready to send.
///
/// The request owns copies of the image data, so later edits to the editor
/// state cannot affect a request that is already in flight.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub image: UploadPart,
    pub mask: UploadPart,
}

impl UploadRequest {
    /// Build a request from two data URLs.
    ///
    /// Fails with `Error::MissingPayload` when either URL has nothing after
    /// its comma, before any decoding happens.
    pub fn from_data_urls(background: &DataUrl, mask: &DataUrl, chunk_size: usize) -> Result<Self> {
        let (bg_payload, mask_payload) = match (payload_of(background.as_str()), payload_of(mask.as_str())) {
            (Some(b), Some(m)) => (b, m),
            (None, _) => return Err(Error::MissingPayload("background".into())),
            (_, None) => return Err(Error::MissingPayload("mask".into())),
        };

        Ok(Self {
            image: UploadPart {
                name: IMAGE_PART,
                file_name: BACKGROUND_FILE_NAME,
                blob: base64_to_blob_chunked(bg_payload, BACKGROUND_MEDIA_TYPE, chunk_size)?,
            },
            mask: UploadPart {
                name: MASK_PART,
                file_name: MASK_FILE_NAME,
                blob: base64_to_blob_chunked(mask_payload, MASK_MEDIA_TYPE, chunk_size)?,
            },
        })
    }

    pub fn parts(&self) -> [&UploadPart; 2] {
        [&self.image, &self.mask]
    }
}

/// Where the endpoint stored one of the uploaded files
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StoredObject {
    pub s3_url: String,
}

/// Success body returned by the endpoint. Extra fields are ignored.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UploadResponse {
    pub image_data: StoredObject,
    pub mask_data: StoredObject,
}

impl UploadResponse {
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| Error::MalformedResponse(e.to_string()))
    }
}

/// Remote URLs of the last successful upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadedUrls {
    pub background_image: Option<String>,
    pub masked_image: Option<String>,
}

impl UploadedUrls {
    /// Shallow merge: fields set in `newer` win, the rest are kept.
    pub fn merged_with(self, newer: UploadedUrls) -> UploadedUrls {
        UploadedUrls {
            background_image: newer.background_image.or(self.background_image),
            masked_image: newer.masked_image.or(self.masked_image),
        }
    }
}

impl From<UploadResponse> for UploadedUrls {
    fn from(resp: UploadResponse) -> Self {
        UploadedUrls {
            background_image: Some(resp.image_data.s3_url),
            masked_image: Some(resp.mask_data.s3_url),
        }
    }
}

/// Something that can deliver an [`UploadRequest`] to the processing endpoint.
pub trait Uploader: Send {
    fn upload(&self, request: &UploadRequest) -> Result<UploadResponse>;
}

/// Blocking multipart uploader backed by `reqwest`.
#[cfg(feature = "upload")]
pub struct HttpUploader {
    client: Client,
    endpoint: String,
    user_agent: String,
    headers: HashMap<String, String>,
}

#[cfg(feature = "upload")]
impl HttpUploader {
    pub fn new(config: &EditorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout_ms.map(Duration::from_millis))
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            user_agent: config.user_agent.clone(),
            headers: config.headers.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn form(request: &UploadRequest) -> Result<multipart::Form> {
        let mut form = multipart::Form::new();
        for part in request.parts() {
            if part.blob.is_empty() {
                log::warn!("{} decoded to zero bytes", part.file_name);
            }
            let p = multipart::Part::bytes(part.blob.bytes().to_vec())
                .file_name(part.file_name)
                .mime_str(part.blob.media_type())
                .map_err(|e| Error::Other(format!("Bad media type {}: {}", part.blob.media_type(), e)))?;
            form = form.part(part.name, p);
        }
        Ok(form)
    }
}

#[cfg(feature = "upload")]
impl Uploader for HttpUploader {
    fn upload(&self, request: &UploadRequest) -> Result<UploadResponse> {
        log::info!(
            "uploading {} ({} bytes, {}) and {} ({} bytes, {}) to {}",
            request.image.file_name,
            request.image.blob.len(),
            request.image.blob.fingerprint(),
            request.mask.file_name,
            request.mask.blob.len(),
            request.mask.blob.fingerprint(),
            self.endpoint
        );

        let mut req = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::USER_AGENT, self.user_agent.clone())
            .multipart(Self::form(request)?);
        for (k, v) in &self.headers {
            req = req.header(k.as_str(), v.as_str());
        }

        let resp = req
            .send()
            .map_err(|e| Error::NetworkError(format!("POST {} failed: {}", self.endpoint, e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::UploadRejected {
                status: status.as_u16(),
            });
        }

        let body = resp
            .text()
            .map_err(|e| Error::NetworkError(format!("Failed to read response body: {}", e)))?;
        UploadResponse::from_json(&body)
    }
}
