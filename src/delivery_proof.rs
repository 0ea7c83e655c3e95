//! Proof-of-delivery image uploads.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::app_system::ShopConfig;
use crate::order_actor::OrderError;

const MAX_NAME_ATTEMPTS: u32 = 100;

/// An uploaded file as received from the shipper app.
#[derive(Debug, Clone)]
pub struct ProofImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ProofImage {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { file_name: file_name.into(), bytes }
    }
}

#[derive(Debug, Error)]
pub enum ProofError {
    #[error("Proof of delivery image is required")]
    Missing,
    #[error("Image is {size} bytes, the limit is {max}")]
    TooLarge { size: u64, max: u64 },
    #[error("Unsupported image type '{0}'")]
    UnsupportedExtension(String),
    #[error("Cannot store image: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ProofError> for OrderError {
    fn from(err: ProofError) -> Self {
        match err {
            ProofError::Missing => OrderError::MissingProofImage,
            ProofError::Io(e) => OrderError::ProofStorage(e.to_string()),
            other => OrderError::InvalidProofImage(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProofStore {
    folder: PathBuf,
    max_bytes: u64,
    extensions: Vec<String>,
}

impl ProofStore {
    pub fn new(folder: impl Into<PathBuf>, max_bytes: u64, extensions: &[String]) -> Self {
        Self {
            folder: folder.into(),
            max_bytes,
            extensions: extensions.iter().map(|e| e.trim_start_matches('.').to_lowercase()).collect(),
        }
    }

    pub fn from_config(config: &ShopConfig) -> Self {
        Self::new(&config.proof_folder, config.proof_max_bytes, &config.proof_extensions)
    }

    /// Checks size and extension. Returns the lower-cased extension.
    pub fn validate(&self, image: &ProofImage) -> Result<String, ProofError> {
        if image.bytes.is_empty() {
            return Err(ProofError::Missing);
        }
        let size = image.bytes.len() as u64;
        if size > self.max_bytes {
            return Err(ProofError::TooLarge { size, max: self.max_bytes });
        }
        let ext = Path::new(&image.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if !self.extensions.contains(&ext) {
            return Err(ProofError::UnsupportedExtension(ext));
        }
        Ok(ext)
    }

    /// `{order_id}_{yyyyMMddHHmmss}.{ext}`
    pub fn file_name_for(order_id: &str, at: DateTime<Utc>, ext: &str) -> String {
        format!("{}_{}.{}", order_id, at.format("%Y%m%d%H%M%S"), ext)
    }

    /// Writes the image to a file no other upload owns. A second upload for the
    /// same order within the same second gets a `_{n}` suffix instead of
    /// replacing the first file.
    pub async fn save(&self, order_id: &str, image: &ProofImage, at: DateTime<Utc>) -> Result<PathBuf, ProofError> {
        let ext = self.validate(image)?;
        tokio::fs::create_dir_all(&self.folder).await?;
        let base = Self::file_name_for(order_id, at, &ext);
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                base.clone()
            } else {
                format!("{}_{}_{}.{}", order_id, at.format("%Y%m%d%H%M%S"), attempt, ext)
            };
            let path = self.folder.join(name);
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };
            if let Err(e) = file.write_all(&image.bytes).await {
                drop(file);
                self.discard(&path).await;
                return Err(e.into());
            }
            file.flush().await?;
            info!(order_id, path = %path.display(), bytes = image.bytes.len(), "Proof image stored");
            return Ok(path);
        }
        Err(ProofError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free file name for {}", base),
        )))
    }

    /// Removes a stored image whose order update did not go through. Only pass
    /// a path returned by [`ProofStore::save`] for the same request.
    pub async fn discard(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "Could not remove orphaned proof image");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn store(dir: &Path) -> ProofStore {
        ProofStore::from_config(&ShopConfig { proof_folder: dir.to_path_buf(), ..ShopConfig::default() })
    }

    #[test]
    fn extension_and_size_rules() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        assert_eq!(store.validate(&ProofImage::new("giao.JPEG", vec![1])).unwrap(), "jpeg");
        assert!(matches!(
            store.validate(&ProofImage::new("giao.gif", vec![1])),
            Err(ProofError::UnsupportedExtension(ext)) if ext == "gif"
        ));
        assert!(matches!(store.validate(&ProofImage::new("giao.png", Vec::new())), Err(ProofError::Missing)));
        let big = vec![0u8; 5 * 1024 * 1024 + 1];
        assert!(matches!(
            store.validate(&ProofImage::new("giao.png", big)),
            Err(ProofError::TooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn saved_file_is_named_after_order_and_time() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir.path().join("proofs"));
        let at = Utc.with_ymd_and_hms(2024, 2, 14, 17, 5, 9).unwrap();
        let path = store
            .save("order_12", &ProofImage::new("IMG_1.webp", vec![7, 7, 7]), at)
            .await
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "order_12_20240214170509.webp");
        assert_eq!(tokio::fs::read(&path).await.unwrap(), vec![7, 7, 7]);

        store.discard(&path).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn uploads_in_the_same_second_keep_their_own_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let at = Utc.with_ymd_and_hms(2024, 2, 14, 17, 5, 9).unwrap();
        let first = store.save("order_12", &ProofImage::new("a.jpg", vec![1]), at).await.unwrap();
        let second = store.save("order_12", &ProofImage::new("b.jpg", vec![2]), at).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(second.file_name().unwrap(), "order_12_20240214170509_1.jpg");

        // Throwing away the refused upload must not touch the accepted one.
        store.discard(&second).await;
        assert!(!second.exists());
        assert_eq!(tokio::fs::read(&first).await.unwrap(), vec![1]);
    }
}
