//! File-backed checkpoint store.
//!
//! The watermark is stored as a single line of RFC 3339 text. Writes go to a
//! sibling temporary file which is synced and then renamed over the target,
//! so a crash leaves either the old or the new value, never a torn one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use crate::errors::CheckpointError;
use crate::interfaces::CheckpointStore;
use news_indexer_shared::Watermark;

/// Default checkpoint location.
pub const DEFAULT_CHECKPOINT_PATH: &str = "/tmp/indexer_checkpoint.txt";

/// Checkpoint store persisting the watermark to a local file.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "checkpoint".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn write_temp(&self, temp: &Path, contents: &str) -> std::io::Result<()> {
        let mut file = fs::File::create(temp).await?;
        file.write_all(contents.as_bytes()).await?;
        file.sync_all().await?;
        Ok(())
    }

    #[cfg(unix)]
    async fn sync_parent(&self) -> std::io::Result<()> {
        match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => fs::File::open(parent).await?.sync_all().await,
            None => Ok(()),
        }
    }

    #[cfg(not(unix))]
    async fn sync_parent(&self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Default for FileCheckpointStore {
    fn default() -> Self {
        Self::new(DEFAULT_CHECKPOINT_PATH)
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn try_load(&self) -> Result<Option<Watermark>, CheckpointError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No checkpoint file");
                return Ok(None);
            }
            Err(e) => return Err(CheckpointError::io(e.to_string())),
        };

        let text = contents.trim();
        if text.is_empty() {
            return Ok(None);
        }

        text.parse::<Watermark>()
            .map(Some)
            .map_err(|e| CheckpointError::corrupt(format!("{:?}: {}", text, e)))
    }

    #[instrument(skip(self), fields(path = %self.path.display(), watermark = %watermark))]
    async fn save(&self, watermark: Watermark) -> Result<(), CheckpointError> {
        let temp = self.temp_path();
        let contents = format!("{}\n", watermark);

        if let Err(e) = self.write_temp(&temp, &contents).await {
            let _ = fs::remove_file(&temp).await;
            return Err(CheckpointError::io(e.to_string()));
        }

        fs::rename(&temp, &self.path)
            .await
            .map_err(|e| CheckpointError::io(e.to_string()))?;

        self.sync_parent()
            .await
            .map_err(|e| CheckpointError::io(e.to_string()))?;

        debug!("Checkpoint saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn watermark(secs: i64) -> Watermark {
        Watermark::new(Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap())
    }

    #[tokio::test]
    async fn test_missing_file_loads_none() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(dir.path().join("checkpoint.txt"));

        assert_eq!(store.try_load().await.unwrap(), None);
        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(dir.path().join("checkpoint.txt"));

        store.save(watermark(0)).await.unwrap();
        assert_eq!(store.load().await, Some(watermark(0)));

        store.save(watermark(60)).await.unwrap();
        assert_eq!(store.load().await, Some(watermark(60)));
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_file_holds_canonical_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoint.txt");
        let store = FileCheckpointStore::new(&path);

        store.save(watermark(0)).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "2023-11-14T22:13:20.000000Z\n");
    }

    #[tokio::test]
    async fn test_naive_timestamp_is_read_as_utc() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoint.txt");
        std::fs::write(&path, "2023-11-14T22:13:20\n").unwrap();

        let store = FileCheckpointStore::new(&path);
        assert_eq!(store.load().await, Some(watermark(0)));
    }

    #[tokio::test]
    async fn test_corrupt_file_falls_back_to_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoint.txt");
        std::fs::write(&path, "yesterday-ish").unwrap();

        let store = FileCheckpointStore::new(&path);
        assert!(matches!(store.try_load().await, Err(CheckpointError::Corrupt(_))));
        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn test_empty_file_loads_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoint.txt");
        std::fs::write(&path, "  \n").unwrap();

        let store = FileCheckpointStore::new(&path);
        assert_eq!(store.try_load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(dir.path().join("missing").join("checkpoint.txt"));

        assert!(matches!(
            store.save(watermark(0)).await,
            Err(CheckpointError::IoError(_))
        ));
    }
}
