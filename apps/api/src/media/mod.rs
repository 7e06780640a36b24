//! Image providers: generation (text-to-image) and hosting/transformation.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub mod clipdrop;
pub mod cloudinary;

pub use clipdrop::ClipdropClient;
pub use cloudinary::{CloudinaryClient, SignatureAlgorithm};

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid transformation: {0}")]
    InvalidTransformation(String),
}

/// An image stored by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedImage {
    pub public_id: String,
    pub secure_url: String,
}

/// Image transformations the actions ask the host for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageEdit {
    RemoveBackground,
    RemoveObject(String),
}

impl ImageEdit {
    /// Object-removal edit with a checked object name, so a bad name is caught
    /// before anything is uploaded.
    pub fn remove_object(object: &str) -> Result<Self, MediaError> {
        Ok(ImageEdit::RemoveObject(object_name(object)?.to_string()))
    }
}

/// Trimmed object name. `/` and `,` are component separators in
/// transformation syntax, so they are rejected.
pub(crate) fn object_name(object: &str) -> Result<&str, MediaError> {
    let object = object.trim();
    if object.is_empty() {
        return Err(MediaError::InvalidTransformation(
            "object to remove must not be empty".to_string(),
        ));
    }
    if object.contains(['/', ',']) {
        return Err(MediaError::InvalidTransformation(format!(
            "object name '{object}' contains reserved characters"
        )));
    }
    Ok(object)
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Renders `prompt` to encoded image bytes (PNG).
    async fn generate(&self, prompt: &str) -> Result<Bytes, MediaError>;
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Stores the image. With `edit`, the host applies it on ingest and the
    /// returned URL points at the edited asset.
    async fn upload(
        &self,
        image: Bytes,
        file_name: &str,
        edit: Option<&ImageEdit>,
    ) -> Result<HostedImage, MediaError>;

    /// Delivery URL that applies `edit` on the fly to an already-hosted image.
    fn edited_url(&self, public_id: &str, edit: &ImageEdit) -> Result<String, MediaError>;
}
