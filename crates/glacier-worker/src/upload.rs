//! Upload batch orchestration
//!
//! Files of a batch are transferred one at a time, in input order. A failed
//! file is reported and skipped; a provenance log that can no longer be
//! written stops the batch with [`UploadError::LogWrite`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use glacier_core::models::archive_description;
use glacier_core::{UploadLogEntry, UploadSettings};
use glacier_storage::{ArchiveStore, UploadProgress};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::sleep;

use crate::error::UploadError;
use crate::events::{emit, UploadEvent};
use crate::upload_log::UploadLog;

/// An ordered, non-empty list of files bound for one vault.
#[derive(Debug, Clone)]
pub struct UploadBatch {
    files: Vec<PathBuf>,
    vault: String,
}

impl UploadBatch {
    pub fn new(files: Vec<PathBuf>, vault: impl Into<String>) -> Result<Self, UploadError> {
        if files.is_empty() {
            return Err(UploadError::EmptyBatch);
        }
        Ok(Self {
            files,
            vault: vault.into(),
        })
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn vault(&self) -> &str {
        &self.vault
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub path: PathBuf,
    pub archive_id: String,
    pub bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFile {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of a whole batch, reported once at the end.
#[derive(Debug, Clone, Default)]
pub struct UploadReport {
    pub vault: String,
    pub region: String,
    pub uploaded: Vec<UploadedFile>,
    pub failed: Vec<FailedFile>,
    pub total_bytes: u64,
    pub uploaded_bytes: u64,
    pub logged: bool,
}

impl UploadReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn percent(&self) -> u8 {
        percent(self.uploaded_bytes, self.total_bytes)
    }

    /// One human-readable line per file, in batch order of outcome kind.
    pub fn summary(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .uploaded
            .iter()
            .map(|file| {
                let logged = if self.logged { " ArchiveID logged." } else { "" };
                format!(
                    "Successfully uploaded {} to vault {} at {}. Bytes: {}. ArchiveID: {}.{}",
                    file.path.display(),
                    self.vault,
                    self.region,
                    file.bytes,
                    file.archive_id,
                    logged
                )
            })
            .collect();

        lines.extend(
            self.failed
                .iter()
                .map(|file| format!("Failed to upload {}: {}", file.path.display(), file.error)),
        );
        lines
    }
}

fn percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((u128::from(done) * 100 / u128::from(total)).min(100)) as u8
}

/// Runs upload batches against one client.
pub struct UploadOrchestrator {
    store: Arc<dyn ArchiveStore>,
    log: Option<UploadLog>,
    settings: UploadSettings,
    events: Option<UnboundedSender<UploadEvent>>,
}

impl UploadOrchestrator {
    /// `log` is `None` when provenance logging is switched off.
    pub fn new(
        store: Arc<dyn ArchiveStore>,
        log: Option<UploadLog>,
        settings: UploadSettings,
    ) -> Self {
        Self {
            store,
            log,
            settings,
            events: None,
        }
    }

    pub fn with_events(mut self, events: UnboundedSender<UploadEvent>) -> Self {
        self.events = Some(events);
        self
    }

    #[tracing::instrument(skip(self, batch), fields(vault = %batch.vault, files = batch.files.len()))]
    pub async fn run(&self, batch: UploadBatch) -> Result<UploadReport, UploadError> {
        let sizes = file_sizes(&batch.files).await;
        let total_files = batch.files.len();

        let mut report = UploadReport {
            vault: batch.vault.clone(),
            region: self.store.region().name.to_string(),
            total_bytes: sizes.iter().sum(),
            logged: self.log.is_some(),
            ..Default::default()
        };

        for (index, path) in batch.files.iter().enumerate() {
            sleep(self.settings.pacing).await;
            emit(
                &self.events,
                UploadEvent::FileStarted {
                    index,
                    total_files,
                    path: path.clone(),
                },
            );

            match self.upload_file(&batch.vault, index, path).await {
                Ok((archive_id, checksum)) => {
                    let bytes = sizes[index];
                    if let Some(log) = &self.log {
                        let entry = UploadLogEntry {
                            vault: batch.vault.clone(),
                            region: report.region.clone(),
                            file_path: path.display().to_string(),
                            byte_length: bytes,
                            checksum,
                            archive_id: archive_id.clone(),
                            uploaded_at: Local::now(),
                        };
                        log.append(&entry).await.inspect_err(|e| {
                            tracing::error!(error = %e, "Upload log write failed, stopping batch");
                        })?;
                    }

                    report.uploaded_bytes += bytes;
                    emit(
                        &self.events,
                        UploadEvent::FileCompleted {
                            index,
                            path: path.clone(),
                            archive_id: archive_id.clone(),
                            bytes,
                        },
                    );
                    report.uploaded.push(UploadedFile {
                        path: path.clone(),
                        archive_id,
                        bytes,
                    });
                }
                Err(error) => {
                    if let Some(log) = &self.log {
                        log.append_error(&path.display().to_string(), &error, Local::now())
                            .await
                            .inspect_err(|e| {
                                tracing::error!(error = %e, "Error log write failed, stopping batch");
                            })?;
                    }

                    emit(
                        &self.events,
                        UploadEvent::FileFailed {
                            index,
                            path: path.clone(),
                            error: error.clone(),
                        },
                    );
                    report.failed.push(FailedFile {
                        path: path.clone(),
                        error,
                    });
                }
            }

            emit(
                &self.events,
                UploadEvent::BatchProgress {
                    percent: report.percent(),
                },
            );
        }

        tracing::info!(
            uploaded = report.uploaded.len(),
            failed = report.failed.len(),
            bytes = report.uploaded_bytes,
            "Upload batch finished"
        );
        Ok(report)
    }

    /// Transfer one file, returning `(archive_id, checksum)` or the error text.
    #[tracing::instrument(skip(self, path), fields(file = %path.display()))]
    async fn upload_file(
        &self,
        vault: &str,
        index: usize,
        path: &Path,
    ) -> Result<(String, String), String> {
        let description = archive_description(path);
        let events = self.events.clone();
        let progress = move |progress: &UploadProgress| {
            emit(
                &events,
                UploadEvent::Transfer {
                    index,
                    progress: *progress,
                },
            )
        };

        match self
            .store
            .upload_archive(vault, &description, path, &progress)
            .await
        {
            Ok(receipt) => Ok((receipt.archive_id, receipt.checksum)),
            Err(e) => {
                tracing::warn!(error = %e, "Upload failed, continuing with next file");
                Err(e.to_string())
            }
        }
    }
}

/// Sizes of the batch files; unreadable files count as zero bytes and fail
/// later during transfer.
async fn file_sizes(files: &[PathBuf]) -> Vec<u64> {
    let mut sizes = Vec::with_capacity(files.len());
    for path in files {
        let size = tokio::fs::metadata(path)
            .await
            .map(|meta| meta.len())
            .unwrap_or(0);
        sizes.push(size);
    }
    sizes
}
