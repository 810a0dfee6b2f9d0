use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

use base64::{engine::general_purpose, Engine as _};
use image::ImageFormat;
use tracing::info;

use super::compositor::Surface;

pub const EXPORT_FILE_NAME: &str = "ai-fashion-gift.png";
pub const EXPORT_MIME_TYPE: &str = "image/png";
pub const SHARE_FALLBACK_INSTRUCTIONS: &str =
    "Sharing is not available here. Download the image and post it from the Instagram app.";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Failed to hand image to share target: {0}")]
    Share(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct ExportFile {
    pub name: &'static str,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared { location: String },
    Unsupported { instructions: String },
}

/// A platform share mechanism. Targets that lack the capability report it
/// through `is_available` instead of failing.
pub trait ShareTarget {
    fn is_available(&self) -> bool;
    fn share(&self, file: &ExportFile) -> Result<String, ExportError>;
}

pub struct NoShareTarget;

impl ShareTarget for NoShareTarget {
    fn is_available(&self) -> bool {
        false
    }

    fn share(&self, _file: &ExportFile) -> Result<String, ExportError> {
        Err(ExportError::Share(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "no share target",
        )))
    }
}

/// Drops the exported file into a directory, e.g. one synced to a phone.
pub struct DirectoryShareTarget {
    dir: PathBuf,
}

impl DirectoryShareTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ShareTarget for DirectoryShareTarget {
    fn is_available(&self) -> bool {
        !self.dir.as_os_str().is_empty()
    }

    fn share(&self, file: &ExportFile) -> Result<String, ExportError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file.name);
        fs::write(&path, &file.bytes)?;
        Ok(path.display().to_string())
    }
}

pub fn to_png(surface: &Surface) -> Result<Vec<u8>, ExportError> {
    let mut out = Vec::new();
    surface
        .pixels()
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
    Ok(out)
}

pub fn png_data_url(png: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        EXPORT_MIME_TYPE,
        general_purpose::STANDARD.encode(png)
    )
}

pub fn to_data_url(surface: &Surface) -> Result<String, ExportError> {
    Ok(png_data_url(&to_png(surface)?))
}

pub fn export_file(surface: &Surface) -> Result<ExportFile, ExportError> {
    Ok(ExportFile {
        name: EXPORT_FILE_NAME,
        mime_type: EXPORT_MIME_TYPE,
        bytes: to_png(surface)?,
    })
}

pub fn share(surface: &Surface, target: &dyn ShareTarget) -> Result<ShareOutcome, ExportError> {
    if !target.is_available() {
        return Ok(ShareOutcome::Unsupported {
            instructions: SHARE_FALLBACK_INSTRUCTIONS.to_string(),
        });
    }
    let file = export_file(surface)?;
    let location = target.share(&file)?;
    info!("Shared {} ({} bytes) to {}", file.name, file.bytes.len(), location);
    Ok(ShareOutcome::Shared { location })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::media::detect_mime_type;

    #[test]
    fn png_export_round_trips_dimensions() {
        let surface = Surface::new(12, 7);
        let png = to_png(&surface).expect("png");
        assert_eq!(detect_mime_type(&png).as_deref(), Some("image/png"));
        let decoded = image::load_from_memory(&png).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (12, 7));
    }

    #[test]
    fn data_url_has_png_prefix() {
        let url = to_data_url(&Surface::new(2, 2)).expect("data url");
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn share_falls_back_to_instructions_without_capability() {
        let outcome = share(&Surface::new(2, 2), &NoShareTarget).expect("share");
        assert_eq!(
            outcome,
            ShareOutcome::Unsupported {
                instructions: SHARE_FALLBACK_INSTRUCTIONS.to_string()
            }
        );
    }

    #[test]
    fn directory_target_writes_fixed_filename() {
        let dir = std::env::temp_dir().join(format!("outfit-share-{}", std::process::id()));
        let target = DirectoryShareTarget::new(&dir);
        let outcome = share(&Surface::new(3, 3), &target).expect("share");
        let written = dir.join(EXPORT_FILE_NAME);
        assert_eq!(
            outcome,
            ShareOutcome::Shared {
                location: written.display().to_string()
            }
        );
        assert!(written.exists());
        let _ = fs::remove_dir_all(&dir);
    }
}
