use anyhow::Result;
use std::io;
use std::path::PathBuf;
use tokio::fs;
use tracing::info;
use uuid::Uuid;

/// On-disk image store.
///
/// Every uploaded image lands as a flat file `{dir}/{uuid}.{ext}` and is
/// referred to by that stored name everywhere else (entry image lists,
/// delete requests, static serving).
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Image storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn file_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Write image bytes under a fresh name and return it. The extension is
    /// carried over from the client's file name; everything else about the
    /// original name is discarded.
    pub async fn save(&self, original_name: &str, data: &[u8]) -> Result<String> {
        let name = match extension_of(original_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };

        fs::write(self.file_path(&name), data).await?;
        info!("Stored image {} ({} bytes)", name, data.len());
        Ok(name)
    }

    /// Delete a stored image by name. The raw `io::Error` is returned so
    /// callers can tell a missing file from any other failure.
    pub async fn delete(&self, name: &str) -> io::Result<()> {
        if !is_safe_name(name) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid image name",
            ));
        }

        fs::remove_file(self.file_path(name)).await?;
        info!("Deleted image {}", name);
        Ok(())
    }
}

/// Stored names are single path segments; anything else smells like traversal.
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}

fn extension_of(original_name: &str) -> Option<String> {
    let ext = std::path::Path::new(original_name).extension()?.to_str()?;
    if ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(ext.to_ascii_lowercase())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn scratch_storage() -> Storage {
        let dir = std::env::temp_dir().join(format!("roomlog-storage-test-{}", Uuid::new_v4()));
        Storage::new(dir).await.unwrap()
    }

    #[tokio::test]
    async fn test_save_and_delete() {
        let storage = scratch_storage().await;

        let name = storage.save("photo.PNG", b"not really a png").await.unwrap();
        assert!(name.ends_with(".png"));
        assert!(storage.file_path(&name).exists());

        storage.delete(&name).await.unwrap();
        assert!(!storage.file_path(&name).exists());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let storage = scratch_storage().await;
        let err = storage.delete("nope.png").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_rejects_traversal() {
        let storage = scratch_storage().await;
        for name in ["../etc/passwd", "a/b.png", "", ".."] {
            let err = storage.delete(name).await.unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput, "name: {name:?}");
        }
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a.JPG").as_deref(), Some("jpg"));
        assert_eq!(extension_of("noext"), None);
        assert_eq!(extension_of("weird.p/g"), None);
    }
}
