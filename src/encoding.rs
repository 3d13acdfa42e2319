//! Data URLs and the chunked base64-to-binary conversion used for uploads.
//!
//! A data URL looks like `data:<media-type>;base64,<payload>`. Uploads only
//! care about the payload segment after the comma; the declared media type of
//! the outgoing part is chosen by the caller, not taken from the URL.

use std::fmt;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Number of base64 source characters consumed per decode step.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

// Accepts both padded and unpadded input, the way browsers' `atob` does.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A raster (or any binary) encoded as a `data:` URL string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl(String);

impl DataUrl {
    /// Wrap an existing data URL string without validating it.
    pub fn new(s: impl Into<String>) -> Self {
        DataUrl(s.into())
    }

    /// Encode `bytes` as `data:<media_type>;base64,<payload>`.
    pub fn from_bytes(media_type: &str, bytes: &[u8]) -> Self {
        DataUrl(format!("data:{};base64,{}", media_type, STANDARD.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The payload segment after the first comma, if it is non-empty.
    pub fn payload(&self) -> Option<&str> {
        payload_of(&self.0)
    }

    /// The media type declared in the header, e.g. `image/png`.
    pub fn media_type(&self) -> Option<&str> {
        let header = self.0.split(',').next()?.strip_prefix("data:")?;
        let mt = header.split(';').next().unwrap_or_default();
        if mt.is_empty() {
            None
        } else {
            Some(mt)
        }
    }

    /// Decode the payload to raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        let payload = self
            .payload()
            .ok_or_else(|| Error::MissingPayload(truncate(&self.0)))?;
        let mt = self.media_type().unwrap_or("application/octet-stream");
        Ok(base64_to_blob(payload, mt)?.into_bytes())
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the payload of a data URL string (`split(',')[1]`, non-empty).
pub fn payload_of(data_url: &str) -> Option<&str> {
    data_url.split(',').nth(1).filter(|p| !p.is_empty())
}

/// Binary object tagged with a media type, ready to go into a multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    media_type: String,
    bytes: Vec<u8>,
}

impl Blob {
    pub fn new(media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Short SHA-256 fingerprint used in upload diagnostics.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(&self.bytes);
        hex::encode(&digest[..6])
    }
}

/// Convert a base64 payload (no `data:` prefix) into a [`Blob`] using the
/// default chunk size.
pub fn base64_to_blob(payload: &str, media_type: &str) -> Result<Blob> {
    base64_to_blob_chunked(payload, media_type, DEFAULT_CHUNK_SIZE)
}

/// Convert a base64 payload into a [`Blob`], consuming at most `chunk_size`
/// source characters per step.
///
/// Only whole 4-character quanta are decoded at each step; a partial quantum
/// is carried into the next chunk, so the output does not depend on the chunk
/// size. A `chunk_size` of zero is treated as one.
///
/// Stricter than a browser's `atob`: ASCII whitespace inside the payload is
/// not skipped, and a final quantum with non-zero trailing bits is refused.
/// Both fail with `Error::DecodeError`. Payloads produced by
/// [`DataUrl::from_bytes`] contain neither.
pub fn base64_to_blob_chunked(payload: &str, media_type: &str, chunk_size: usize) -> Result<Blob> {
    let chunk_size = chunk_size.max(1);
    let src = payload.as_bytes();
    let mut bytes = Vec::with_capacity(src.len() / 4 * 3 + 3);
    let mut carry: Vec<u8> = Vec::with_capacity(chunk_size.min(src.len()) + 4);

    for chunk in src.chunks(chunk_size) {
        carry.extend_from_slice(chunk);
        let whole = carry.len() - carry.len() % 4;
        if whole == 0 {
            continue;
        }
        LENIENT.decode_vec(&carry[..whole], &mut bytes)?;
        carry.drain(..whole);
    }

    // Unpadded tail
    if !carry.is_empty() {
        LENIENT.decode_vec(&carry, &mut bytes)?;
    }

    Ok(Blob::new(media_type, bytes))
}

fn truncate(s: &str) -> String {
    const MAX: usize = 48;
    match s.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
