use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::llm::media::{detect_mime_type, download_media, is_image_mime};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Please choose an image file (got {0})")]
    NotAnImage(String),
    #[error("Image payload is empty")]
    Empty,
    #[error("Image payload is not valid base64: {0}")]
    InvalidBase64(String),
    #[error("Could not fetch image from {0}")]
    Fetch(String),
    #[error("Could not decode image: {0}")]
    Decode(String),
}

/// Immutable decoded RGBA image. Clones share pixel storage.
#[derive(Debug, Clone)]
pub struct Bitmap {
    image: Arc<RgbaImage>,
}

impl Bitmap {
    pub fn from_rgba(image: RgbaImage) -> Result<Self, LoadError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(LoadError::Decode("image has zero width or height".to_string()));
        }
        Ok(Self {
            image: Arc::new(image),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.image.get_pixel(x, y)
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.image
    }
}

/// Caller-side check that an upload is an image before it reaches the loader.
/// A declared `image/*` type is trusted; otherwise the bytes are sniffed.
pub fn ensure_image_mime(declared: Option<&str>, bytes: &[u8]) -> Result<String, LoadError> {
    if let Some(declared) = declared.map(str::trim).filter(|value| !value.is_empty()) {
        if is_image_mime(declared) {
            return Ok(declared.to_string());
        }
        return Err(LoadError::NotAnImage(declared.to_string()));
    }

    match detect_mime_type(bytes) {
        Some(mime) if is_image_mime(&mime) => Ok(mime),
        Some(mime) => Err(LoadError::NotAnImage(mime)),
        None => Err(LoadError::NotAnImage("unknown type".to_string())),
    }
}

/// Splits a `data:image/...;base64,` URL or a bare base64 string into its
/// declared MIME type (if any) and raw bytes.
pub fn decode_image_payload(payload: &str) -> Result<(Option<String>, Vec<u8>), LoadError> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return Err(LoadError::Empty);
    }

    let (mime_type, encoded) = if let Some(rest) = trimmed.strip_prefix("data:") {
        let mut parts = rest.splitn(2, ',');
        let header = parts.next().unwrap_or_default();
        let body = parts.next().unwrap_or_default();
        let mime = header.split(';').next().unwrap_or("").trim().to_string();
        (if mime.is_empty() { None } else { Some(mime) }, body)
    } else {
        (None, trimmed)
    };

    let bytes = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|err| LoadError::InvalidBase64(err.to_string()))?;
    if bytes.is_empty() {
        return Err(LoadError::Empty);
    }
    Ok((mime_type, bytes))
}

pub fn decode(bytes: &[u8]) -> Result<Bitmap, LoadError> {
    if bytes.is_empty() {
        return Err(LoadError::Empty);
    }
    let decoded = image::load_from_memory(bytes).map_err(|err| LoadError::Decode(err.to_string()))?;
    Bitmap::from_rgba(decoded.to_rgba8())
}

/// Decodes on the blocking pool so large uploads don't stall the runtime.
pub async fn load(bytes: Vec<u8>) -> Result<Bitmap, LoadError> {
    tokio::task::spawn_blocking(move || decode(&bytes))
        .await
        .map_err(|err| LoadError::Decode(format!("decode task failed: {err}")))?
}

/// Loads from an `http(s)` URL, a data URL or a bare base64 string. Remote
/// bodies are capped at `max_bytes` and must sniff as an image.
pub async fn load_source(source: &str, max_bytes: usize) -> Result<Bitmap, LoadError> {
    let trimmed = source.trim();
    if is_remote(trimmed) {
        debug!("Fetching image source {}", trimmed);
        let bytes = download_media(trimmed, max_bytes)
            .await
            .map_err(|err| LoadError::Fetch(format!("{trimmed}: {err}")))?;
        ensure_image_mime(None, &bytes)?;
        return load(bytes).await;
    }

    let (declared, bytes) = decode_image_payload(trimmed)?;
    ensure_image_mime(declared.as_deref(), &bytes)?;
    load(bytes).await
}

pub fn is_remote(source: &str) -> bool {
    let source = source.trim_start();
    source.starts_with("http://") || source.starts_with("https://")
}
