use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::utils::http::get_http_client;

pub fn detect_mime_type(data: &[u8]) -> Option<String> {
    if data.len() > 12 {
        let ftyp = &data[4..12];
        if ftyp.starts_with(b"ftyp") {
            let brand = &ftyp[4..8];
            if brand == b"heic" || brand == b"heif" || brand == b"hevc" {
                return Some("image/heic".to_string());
            }
        }
    }

    infer::get(data).map(|kind| kind.mime_type().to_string())
}

pub fn is_image_mime(mime_type: &str) -> bool {
    mime_type
        .trim()
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}

pub fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(StatusCode),
    #[error("body exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

fn within_limit(received: usize, limit: usize) -> Result<(), DownloadError> {
    if received > limit {
        return Err(DownloadError::TooLarge { limit });
    }
    Ok(())
}

/// Fetches a remote image, giving up as soon as the body passes `limit`.
pub async fn download_media(url: &str, limit: usize) -> Result<Vec<u8>, DownloadError> {
    let mut response = get_http_client().get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        warn!("Image download from {url} failed with status {status}");
        return Err(DownloadError::Status(status));
    }
    if let Some(declared) = response.content_length() {
        within_limit(usize::try_from(declared).unwrap_or(usize::MAX), limit)?;
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        within_limit(body.len() + chunk.len(), limit)?;
        body.extend_from_slice(&chunk);
    }
    debug!("Downloaded {} bytes from {url}", body.len());
    Ok(body)
}
