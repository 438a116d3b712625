//! Debounced upload pipeline: burst detection, fetch, validate, import, notify
//!
//! The pipeline has no messenger dependency. Files are retrieved through a
//! [`FileFetcher`] and results leave as plain [`UploadOutcome`] values through
//! an [`OutcomeNotifier`].

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::task::TaskTracker;

use super::tracker::UploadTracker;
use crate::core::config;
use crate::import::{self, ImportError, ImportSummary, Importer, RecordKind, StructuralError};
use crate::storage::DbPool;

/// Reference to an attachment as delivered by the messenger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("download failed: {0}")]
    Transport(String),

    #[error("download timed out")]
    Timeout,

    #[error("staging failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A fetched file on local disk, removed when dropped
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if let Err(e) = fs_err::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to remove staged file: {}", e);
            }
        }
    }
}

/// Retrieves an attachment into local storage
#[async_trait]
pub trait FileFetcher: Send + Sync {
    async fn fetch(&self, file: &FileRef) -> Result<StagedFile, FetchError>;
}

/// Receives the terminal outcome of every upload attempt
#[async_trait]
pub trait OutcomeNotifier: Send + Sync {
    async fn notify(&self, user_id: i64, outcome: UploadOutcome);
}

/// Terminal result of an upload attempt
#[derive(Debug)]
pub enum UploadOutcome {
    Imported(ImportSummary),
    InvalidFile { kind: RecordKind, error: StructuralError },
    ImportFailed { kind: RecordKind, error: ImportError },
    FetchFailed { kind: RecordKind, error: FetchError },
    MultipleFiles { count: u32 },
    /// The message carried attachments but none of them were files
    NoFileAttached,
    /// A file arrived without a pending upload
    NotExpected,
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Imported(_))
    }
}

/// Drives uploads from arrival to notification
#[derive(Clone)]
pub struct UploadCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    tracker: UploadTracker,
    fetcher: Arc<dyn FileFetcher>,
    notifier: Arc<dyn OutcomeNotifier>,
    importer: Importer,
    debounce: Duration,
    tasks: TaskTracker,
}

impl UploadCoordinator {
    pub fn new(pool: DbPool, fetcher: Arc<dyn FileFetcher>, notifier: Arc<dyn OutcomeNotifier>) -> Self {
        Self::with_debounce(pool, fetcher, notifier, config::upload::debounce())
    }

    pub fn with_debounce(
        pool: DbPool,
        fetcher: Arc<dyn FileFetcher>,
        notifier: Arc<dyn OutcomeNotifier>,
        debounce: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                tracker: UploadTracker::new(),
                fetcher,
                notifier,
                importer: Importer::new(pool),
                debounce,
                tasks: TaskTracker::new(),
            }),
        }
    }

    pub fn tracker(&self) -> &UploadTracker {
        &self.inner.tracker
    }

    pub fn begin_expecting(&self, user_id: i64, kind: RecordKind) {
        self.inner.tracker.begin_expecting(user_id, kind);
        log::info!("User {} is expected to upload {}", user_id, kind);
    }

    pub fn clear(&self, user_id: i64) {
        self.inner.tracker.clear(user_id);
    }

    /// Handles the attachments of one inbound message
    ///
    /// Returns the burst size after this message, or `None` when the message
    /// was answered right away. Must be called within a Tokio runtime.
    pub fn on_files(&self, user_id: i64, files: Vec<FileRef>) -> Option<u32> {
        let tracker = &self.inner.tracker;

        let Some(first) = files.first().cloned() else {
            if tracker.resolve_expected(user_id).is_none() {
                log::warn!("User {} sent attachments without a pending upload", user_id);
                self.notify_later(user_id, UploadOutcome::NotExpected);
            } else {
                tracker.clear(user_id);
                self.notify_later(user_id, UploadOutcome::NoFileAttached);
            }
            return None;
        };

        let mut arrivals = files.iter().map_while(|_| tracker.record_file_arrival(user_id));
        let Some((kind, opened_at)) = arrivals.next() else {
            log::warn!("User {} sent a file without a pending upload", user_id);
            self.notify_later(user_id, UploadOutcome::NotExpected);
            return None;
        };
        let burst = arrivals.last().map_or(opened_at, |(_, count)| count);

        if opened_at == 1 {
            let inner = Arc::clone(&self.inner);
            self.inner.tasks.spawn(async move {
                inner.finish_burst(user_id, kind, first).await;
            });
        } else {
            log::debug!("User {} burst now has {} files", user_id, burst);
        }
        Some(burst)
    }

    /// Waits for in-flight uploads to commit or roll back
    pub async fn shutdown(&self) {
        self.inner.tasks.close();
        self.inner.tasks.wait().await;
    }

    fn notify_later(&self, user_id: i64, outcome: UploadOutcome) {
        let notifier = Arc::clone(&self.inner.notifier);
        self.inner.tasks.spawn(async move {
            notifier.notify(user_id, outcome).await;
        });
    }
}

impl Inner {
    async fn finish_burst(&self, user_id: i64, kind: RecordKind, first: FileRef) {
        tokio::time::sleep(self.debounce).await;

        let Some(files) = self.tracker.settle(user_id) else {
            log::info!("Upload of {} by user {} was cancelled", kind, user_id);
            return;
        };

        let outcome = if files > 1 {
            UploadOutcome::MultipleFiles { count: files }
        } else {
            self.process(kind, &first).await
        };

        match &outcome {
            UploadOutcome::Imported(summary) => {
                log::info!("User {} imported {} {} rows", user_id, summary.rows, summary.kind)
            }
            other => log::warn!("Upload by user {} failed: {:?}", user_id, other),
        }
        self.notifier.notify(user_id, outcome).await;
    }

    async fn process(&self, kind: RecordKind, file: &FileRef) -> UploadOutcome {
        let staged = match self.fetcher.fetch(file).await {
            Ok(staged) => staged,
            Err(error) => return UploadOutcome::FetchFailed { kind, error },
        };

        let importer = self.importer.clone();
        let result = tokio::task::spawn_blocking(move || {
            let rows = match import::validate(staged.path(), kind) {
                Ok(rows) => rows,
                Err(error) => return UploadOutcome::InvalidFile { kind, error },
            };
            match importer.import(kind, &rows) {
                Ok(summary) => UploadOutcome::Imported(summary),
                Err(error) => UploadOutcome::ImportFailed { kind, error },
            }
        })
        .await;

        result.unwrap_or_else(|e| UploadOutcome::ImportFailed {
            kind,
            error: ImportError::StorageError {
                cause: format!("import task failed: {}", e),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.csv");
        std::fs::write(&path, "x").unwrap();

        let staged = StagedFile::new(&path);
        assert!(staged.path().exists());
        drop(staged);
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_staged_file_drop_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        drop(StagedFile::new(dir.path().join("never-created.csv")));
    }
}
