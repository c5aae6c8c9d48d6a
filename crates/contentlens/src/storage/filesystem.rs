use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::StorageError;

/// Moves a file. Tries `rename` first and falls back to copy + remove when the
/// directories live on different filesystems.
pub async fn move_file(src: &Path, dst: &Path) -> Result<(), StorageError> {
    if tokio::fs::rename(src, dst).await.is_ok() {
        return Ok(());
    }

    let move_error = |e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    };

    tokio::fs::copy(src, dst).await.map_err(move_error)?;
    tokio::fs::remove_file(src).await.map_err(move_error)?;
    Ok(())
}

/// Deletes a file, treating "already gone" as success.
///
/// Returns whether this call removed the file.
pub async fn remove_if_exists(path: &Path) -> Result<bool, StorageError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StorageError::RemoveFile {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Naming and I/O for the two working directories.
///
/// Uploads live at `<uploads>/<id>_<originalName>`, results at
/// `<results>/<id>_result.md`, and a result being served is renamed to
/// `<results>/temp_<id>.md` so a second download can never find it.
#[derive(Debug, Clone)]
pub struct ArtifactStorage {
    upload_directory: PathBuf,
    result_directory: PathBuf,
}

impl ArtifactStorage {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(upload_directory: P, result_directory: Q) -> Self {
        Self {
            upload_directory: upload_directory.as_ref().to_path_buf(),
            result_directory: result_directory.as_ref().to_path_buf(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.upload_directory, &config.result_directory)
    }

    pub fn upload_directory(&self) -> &Path {
        &self.upload_directory
    }

    pub fn result_directory(&self) -> &Path {
        &self.result_directory
    }

    /// Creates both directories if missing. Safe to call repeatedly.
    pub fn ensure_directories(&self) -> Result<(), StorageError> {
        for dir in [&self.upload_directory, &self.result_directory] {
            std::fs::create_dir_all(dir).map_err(|e| StorageError::CreateDirectory {
                path: dir.clone(),
                source: e,
            })?;
        }
        Ok(())
    }

    pub fn upload_path(&self, id: &Uuid, original_name: &str) -> PathBuf {
        self.upload_directory
            .join(format!("{}_{}", id, original_name))
    }

    pub fn result_path(&self, id: &str) -> PathBuf {
        self.result_directory.join(format!("{}_result.md", id))
    }

    pub fn serving_path(&self, id: &str) -> PathBuf {
        self.result_directory.join(format!("temp_{}.md", id))
    }

    /// Persists upload bytes. The file must not exist yet; a failed write
    /// removes whatever was partially written.
    pub async fn write_upload(
        &self,
        id: &Uuid,
        original_name: &str,
        data: &[u8],
    ) -> Result<PathBuf, StorageError> {
        let path = self.upload_path(id, original_name);
        write_new(&path, data).await?;
        Ok(path)
    }

    pub async fn write_result(&self, id: &Uuid, text: &str) -> Result<PathBuf, StorageError> {
        let path = self.result_path(&id.to_string());
        write_new(&path, text.as_bytes()).await?;
        Ok(path)
    }
}

async fn write_new(path: &Path, data: &[u8]) -> Result<(), StorageError> {
    let write_error = |e| StorageError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    };

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(write_error)?;

    let written = async {
        file.write_all(data).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(file);
        if let Err(cleanup) = remove_if_exists(path).await {
            log::warn!("Failed to remove partial file: {}", cleanup);
        }
        return Err(write_error(e));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage(temp_dir: &TempDir) -> ArtifactStorage {
        let storage = ArtifactStorage::new(
            temp_dir.path().join("uploads"),
            temp_dir.path().join("downloads"),
        );
        storage.ensure_directories().unwrap();
        storage
    }

    #[test]
    fn test_naming_scheme() {
        let storage = ArtifactStorage::new("/u", "/d");
        let id = Uuid::nil();

        assert_eq!(
            storage.upload_path(&id, "notes.txt"),
            PathBuf::from("/u/00000000-0000-0000-0000-000000000000_notes.txt")
        );
        assert_eq!(
            storage.result_path("abc"),
            PathBuf::from("/d/abc_result.md")
        );
        assert_eq!(storage.serving_path("abc"), PathBuf::from("/d/temp_abc.md"));
    }

    #[test]
    fn test_ensure_directories_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage(&temp_dir);
        storage.ensure_directories().unwrap();

        assert!(storage.upload_directory().is_dir());
        assert!(storage.result_directory().is_dir());
    }

    #[tokio::test]
    async fn test_write_upload_and_read_back() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage(&temp_dir);
        let id = Uuid::new_v4();

        let path = storage.write_upload(&id, "notes.txt", b"hello world").await.unwrap();

        assert_eq!(path, storage.upload_path(&id, "notes.txt"));
        assert_eq!(std::fs::read(&path).unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn test_write_refuses_to_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage(&temp_dir);
        let id = Uuid::new_v4();

        storage.write_result(&id, "first").await.unwrap();
        let second = storage.write_result(&id, "second").await;

        assert!(matches!(second, Err(StorageError::WriteFile { .. })));
        let kept = std::fs::read_to_string(storage.result_path(&id.to_string())).unwrap();
        assert_eq!(kept, "first");
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ArtifactStorage::new(temp_dir.path().join("nope"), temp_dir.path());

        let result = storage.write_upload(&Uuid::new_v4(), "a.txt", b"x").await;
        assert!(matches!(result, Err(StorageError::WriteFile { .. })));
    }

    #[tokio::test]
    async fn test_move_file() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("a.md");
        let dst = temp_dir.path().join("b.md");
        std::fs::write(&src, "content").unwrap();

        move_file(&src, &dst).await.unwrap();

        assert!(!src.exists());
        assert_eq!(std::fs::read_to_string(&dst).unwrap(), "content");
    }

    #[tokio::test]
    async fn test_move_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = move_file(
            &temp_dir.path().join("missing.md"),
            &temp_dir.path().join("b.md"),
        )
        .await;

        assert!(matches!(result, Err(StorageError::MoveFile { .. })));
    }

    #[tokio::test]
    async fn test_remove_if_exists_tolerates_missing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gone.md");
        std::fs::write(&path, "x").unwrap();

        assert!(remove_if_exists(&path).await.unwrap());
        assert!(!remove_if_exists(&path).await.unwrap());
    }
}
