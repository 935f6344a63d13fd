use crate::common::{SnapshotBatch, SnapshotStore};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Appends one JSON line per batch. A failed write truncates the file back
/// to where the batch began, so a line is either complete or absent.
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_parent_dir(&self) -> Result<(), String> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("Failed to create snapshot directory: {}", e)),
            _ => Ok(()),
        }
    }

    /// Every stored batch, oldest first. Unparseable lines are skipped.
    pub async fn load_all(&self) -> Result<Vec<SnapshotBatch>, String> {
        let file = match tokio::fs::File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(format!("Failed to open snapshot file {}: {}", self.path.display(), e)),
        };

        let mut lines = BufReader::new(file).lines();
        let mut batches = Vec::new();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| format!("Failed to read snapshot file: {}", e))?
        {
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(batch) = serde_json::from_str::<SnapshotBatch>(&line) {
                batches.push(batch);
            }
        }
        Ok(batches)
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn save_batch(&self, batch: SnapshotBatch) -> Result<(), String> {
        self.ensure_parent_dir().await?;
        let mut line = serde_json::to_string(&batch).map_err(|e| format!("Failed to serialize batch: {}", e))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| format!("Failed to open snapshot file {}: {}", self.path.display(), e))?;
        let start = file
            .metadata()
            .await
            .map_err(|e| format!("Failed to stat snapshot file: {}", e))?
            .len();

        let written = async {
            file.write_all(line.as_bytes()).await?;
            file.flush().await?;
            file.sync_data().await
        }
        .await;

        if let Err(e) = written {
            let _ = file.set_len(start).await;
            return Err(format!("Failed to write snapshot batch {}: {}", batch.batch_id, e));
        }
        Ok(())
    }

    async fn latest_batch(&self) -> Result<Option<SnapshotBatch>, String> {
        Ok(self.load_all().await?.pop())
    }
}
