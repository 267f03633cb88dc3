//! File-backed image storage for product pictures
//!
//! One image per product, validated by an extension and content-type
//! allow-list and capped at 5 MiB. Files are named
//! `<unix-millis>-<random-suffix>.<ext>` and served from a public path.

use rand::Rng;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Maximum accepted image size in bytes
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const ALLOWED_EXTENSIONS: [&str; 5] = ["jpeg", "jpg", "png", "gif", "webp"];
const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Image storage failure
#[derive(Error, Debug)]
pub enum ImageStoreError {
    #[error("Only jpeg, jpg, png, gif and webp images are allowed")]
    UnsupportedFormat,

    #[error("Image exceeds the 5 MiB size limit")]
    TooLarge,

    #[error("Failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

/// Reference to a stored image, resolvable to a public URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Filesystem-backed image store
#[derive(Clone)]
pub struct ImageStore {
    root: PathBuf,
    public_path: String,
}

impl ImageStore {
    /// Create an image store rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            public_path: "/uploads".to_string(),
        }
    }

    /// Create the uploads directory when it does not exist yet
    pub async fn ensure_root(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Directory the stored files live in
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate and persist one image, returning its reference
    pub async fn store(
        &self,
        bytes: &[u8],
        original_name: &str,
        content_type: Option<&str>,
    ) -> Result<ImageRef, ImageStoreError> {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or(ImageStoreError::UnsupportedFormat)?;

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ImageStoreError::UnsupportedFormat);
        }

        if let Some(content_type) = content_type {
            if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
                return Err(ImageStoreError::UnsupportedFormat);
            }
        }

        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ImageStoreError::TooLarge);
        }

        // Timestamp plus random suffix, not collision-proof but unique
        // enough for one uploads directory.
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
        let filename = format!("{millis}-{suffix}.{extension}");

        tokio::fs::write(self.root.join(&filename), bytes).await?;

        Ok(ImageRef(filename))
    }

    /// Public URL a stored image is served from
    pub fn url_for(&self, image: &ImageRef) -> String {
        format!("{}/{}", self.public_path, image.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> ImageStore {
        ImageStore::new(dir.path())
    }

    #[tokio::test]
    async fn stores_and_resolves_an_allowed_image() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let image = store
            .store(b"not really a png", "photo.PNG", Some("image/png"))
            .await
            .expect("store failed");

        assert!(image.as_str().ends_with(".png"));
        assert!(dir.path().join(image.as_str()).exists());
        assert_eq!(store.url_for(&image), format!("/uploads/{}", image.as_str()));
    }

    #[tokio::test]
    async fn rejects_disallowed_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let err = store
            .store(b"#!/bin/sh", "payload.sh", None)
            .await
            .unwrap_err();

        assert!(matches!(err, ImageStoreError::UnsupportedFormat));
    }

    #[tokio::test]
    async fn rejects_missing_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let err = store.store(b"data", "noext", None).await.unwrap_err();
        assert!(matches!(err, ImageStoreError::UnsupportedFormat));
    }

    #[tokio::test]
    async fn rejects_mismatched_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let err = store
            .store(b"data", "photo.png", Some("application/octet-stream"))
            .await
            .unwrap_err();

        assert!(matches!(err, ImageStoreError::UnsupportedFormat));
    }

    #[tokio::test]
    async fn rejects_oversized_image() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let oversized = vec![0u8; MAX_IMAGE_BYTES + 1];
        let err = store
            .store(&oversized, "big.jpg", Some("image/jpeg"))
            .await
            .unwrap_err();

        assert!(matches!(err, ImageStoreError::TooLarge));
    }

    #[tokio::test]
    async fn accepts_image_at_the_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let at_limit = vec![0u8; MAX_IMAGE_BYTES];
        assert!(store.store(&at_limit, "ok.webp", None).await.is_ok());
    }
}
