use std::path::{Path, PathBuf};

use crate::config::ALLOWED_IMAGE_EXTENSIONS;
use crate::error::AppError;

/// Stores uploaded item images on local disk under a single root directory.
///
/// Files are served back under the '/uploads' static route, so the value
/// persisted in the database is the public URL path, not the disk path.
#[derive(Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Checks the filename against the image extension whitelist.
    pub fn allowed_file(filename: &str) -> bool {
        filename
            .rsplit_once('.')
            .map(|(_, ext)| ALLOWED_IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Normalizes a client-supplied filename to something safe to store.
    /// Path separators and anything else exotic collapse to '_'.
    pub fn sanitize_filename(filename: &str) -> String {
        filename
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }

    /// Writes one uploaded image to disk and returns its public URL path.
    /// A timestamp prefix keeps concurrent uploads of the same filename apart.
    pub async fn save(&self, filename: &str, data: &[u8]) -> Result<String, AppError> {
        let stored_name = format!(
            "{}_{}",
            chrono::Utc::now().timestamp_millis(),
            Self::sanitize_filename(filename)
        );
        let path = self.root.join(&stored_name);

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        Ok(format!("/uploads/{}", stored_name))
    }

    /// Best-effort removal of a stored image by its public URL path.
    /// Failures are logged, never surfaced: the database row is already gone
    /// and a stray file on disk is harmless.
    pub async fn delete(&self, image_url: &str) {
        let Some(stored_name) = image_url.strip_prefix("/uploads/") else {
            tracing::warn!("Refusing to delete image outside the upload root: {}", image_url);
            return;
        };

        let path = self.root.join(stored_name);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!("Failed to delete image file {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitelists_common_image_extensions() {
        assert!(ImageStore::allowed_file("jacket.jpg"));
        assert!(ImageStore::allowed_file("jacket.final.PNG"));
        assert!(!ImageStore::allowed_file("jacket.pdf"));
        assert!(!ImageStore::allowed_file("no_extension"));
    }

    #[test]
    fn sanitizes_hostile_filenames() {
        assert_eq!(
            ImageStore::sanitize_filename("../../etc/passwd"),
            ".._.._etc_passwd"
        );
        assert_eq!(
            ImageStore::sanitize_filename("my photo (1).jpg"),
            "my_photo__1_.jpg"
        );
    }

    #[tokio::test]
    async fn save_then_delete_round_trips_on_disk() {
        let dir = std::env::temp_dir().join(format!("rewear-images-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let store = ImageStore::new(&dir);

        let url = store.save("test.png", b"not really a png").await.unwrap();
        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with("test.png"));

        let stored = dir.join(url.strip_prefix("/uploads/").unwrap());
        assert!(tokio::fs::metadata(&stored).await.is_ok());

        store.delete(&url).await;
        assert!(tokio::fs::metadata(&stored).await.is_err());

        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
