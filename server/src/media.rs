//! Recipe images: base64 data-URI decoding and file storage under the media root.

use base64::Engine;
use image::ImageReader;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Directory under the media root where recipe images are written.
pub const RECIPE_IMAGE_DIR: &str = "recipes/images";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Not a base64 data URI.")]
    NotDataUri,

    #[error("Failed to decode image.")]
    BadBase64,

    #[error("Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
    NotAnImage,

    #[error("Failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

/// A decoded `data:<mime>;base64,<payload>` string.
#[derive(Debug, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl DataUri {
    pub fn parse(value: &str) -> Result<Self, MediaError> {
        let (header, payload) = value.split_once(";base64,").ok_or(MediaError::NotDataUri)?;
        let mime_type = header.strip_prefix("data:").unwrap_or(header).to_string();

        let data = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|_| MediaError::BadBase64)?;

        Ok(Self { mime_type, data })
    }

    /// File extension taken from the mime subtype (`image/png` -> `png`).
    pub fn extension(&self) -> &str {
        self.mime_type
            .rsplit('/')
            .next()
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("bin")
    }
}

/// Check the bytes look like a known image format.
pub fn ensure_image(data: &[u8]) -> Result<(), MediaError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|_| MediaError::NotAnImage)?;

    match reader.format() {
        Some(_) => Ok(()),
        None => Err(MediaError::NotAnImage),
    }
}

/// Files live under `root`; clients see them under `url_prefix`.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    url_prefix: String,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Decode and store a recipe image, returning its path relative to the root.
    pub fn save_recipe_image(&self, data_uri: &str) -> Result<String, MediaError> {
        let image = DataUri::parse(data_uri)?;
        ensure_image(&image.data)?;

        let relative = format!("{}/{}.{}", RECIPE_IMAGE_DIR, Uuid::new_v4(), image.extension());
        let path = self.root.join(&relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &image.data)?;

        tracing::debug!(path = %relative, bytes = image.data.len(), "stored recipe image");
        Ok(relative)
    }

    /// Best-effort removal of a previously stored file.
    pub fn remove(&self, relative: &str) {
        if relative.is_empty() {
            return;
        }
        if let Err(e) = std::fs::remove_file(self.root.join(relative)) {
            tracing::warn!(path = %relative, error = %e, "failed to remove media file");
        }
    }

    pub fn url(&self, relative: &str) -> String {
        format!("{}/{}", self.url_prefix, relative)
    }
}
