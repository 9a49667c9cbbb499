use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use civicfix_types::models::AttachmentKind;

/// On-disk store for complaint attachments.
///
/// Files live flat in one directory under generated names; the same
/// directory is served back under `/uploads`.
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        debug!("Upload directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Writes an attachment under a freshly generated name and returns it.
    pub async fn save(&self, kind: AttachmentKind, data: &[u8]) -> Result<String> {
        let file_name = kind.generate_file_name();
        let path = self.file_path(&file_name);

        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        debug!("Stored {} ({} bytes)", file_name, data.len());
        Ok(file_name)
    }

    /// Removes a stored attachment. A file that is already gone is not an error.
    pub async fn delete_file(&self, file_name: &str) -> Result<()> {
        match fs::remove_file(self.file_path(file_name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Attachment {} already gone", file_name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_writes_bytes_under_generated_name() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("uploads")).await.unwrap();

        let name = storage.save(AttachmentKind::Voice, b"ogg?").await.unwrap();
        assert!(name.starts_with("voice_") && name.ends_with(".webm"));

        let stored = fs::read(storage.file_path(&name)).await.unwrap();
        assert_eq!(stored, b"ogg?");
    }

    #[tokio::test]
    async fn delete_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf()).await.unwrap();

        let name = storage.save(AttachmentKind::Image, b"jpeg").await.unwrap();
        storage.delete_file(&name).await.unwrap();
        assert!(!storage.file_path(&name).exists());
        storage.delete_file(&name).await.unwrap();
    }
}
