use std::path::{Path, PathBuf};
use std::time::Instant;

use thiserror::Error;

use crate::metrics::{SNAPSHOT_WRITES_TOTAL, SNAPSHOT_WRITE_DURATION_SECONDS};
use crate::models::StateDocument;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode snapshot {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Whole-store JSON snapshot on local disk.
///
/// Every write replaces the previous file. There is no log and no replay:
/// the file is the state.
#[derive(Debug, Clone)]
pub struct SnapshotManager {
    path: PathBuf,
}

impl SnapshotManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the last snapshot. `Ok(None)` when no snapshot has been written yet.
    pub async fn restore(&self) -> Result<Option<StateDocument>, SnapshotError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SnapshotError::Io {
                    path: self.display(),
                    source,
                })
            }
        };

        let document: StateDocument =
            serde_json::from_slice(&raw).map_err(|source| SnapshotError::Decode {
                path: self.display(),
                source,
            })?;

        tracing::info!(
            "Snapshot restored from {}: {} users",
            self.display(),
            document.users.len()
        );
        Ok(Some(document))
    }

    /// Restore that never fails: any error is logged and an empty store is used.
    pub async fn restore_or_empty(&self) -> StateDocument {
        match self.restore().await {
            Ok(Some(document)) => document,
            Ok(None) => {
                tracing::info!("No snapshot at {}, starting empty", self.display());
                StateDocument::default()
            }
            Err(e) => {
                tracing::warn!("Snapshot restore failed, starting empty: {}", e);
                StateDocument::default()
            }
        }
    }

    /// Serializes `document` and atomically replaces the snapshot file.
    pub async fn persist(&self, document: &StateDocument) -> Result<(), SnapshotError> {
        let start = Instant::now();
        let result = self.write_document(document).await;

        let status = if result.is_ok() { "success" } else { "error" };
        SNAPSHOT_WRITES_TOTAL.with_label_values(&[status]).inc();
        SNAPSHOT_WRITE_DURATION_SECONDS.observe(start.elapsed().as_secs_f64());

        result
    }

    async fn write_document(&self, document: &StateDocument) -> Result<(), SnapshotError> {
        let mut bytes = serde_json::to_vec_pretty(document).map_err(SnapshotError::Encode)?;
        bytes.push(b'\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| self.io_error(source))?;
        }

        let tmp_path = self.tmp_path();
        tokio::fs::write(&tmp_path, &bytes)
            .await
            .map_err(|source| self.io_error(source))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|source| self.io_error(source))?;

        tracing::debug!("Snapshot written to {} ({} bytes)", self.display(), bytes.len());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: self.display(),
            source,
        }
    }

    fn display(&self) -> String {
        self.path.display().to_string()
    }
}
