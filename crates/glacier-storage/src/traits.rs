//! Storage abstraction trait
//!
//! This module defines the [`ArchiveStore`] trait the workers talk to, along
//! with the result types of its operations.

use async_trait::async_trait;
use glacier_core::{JobKind, Region};
use std::path::Path;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncBufRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// The remote service answered with an error (job not ready, unknown
    /// vault, ...).
    #[error("Service error during {operation}: {message}")]
    Service {
        operation: &'static str,
        message: String,
    },

    /// The request never got a service answer: bad credentials, malformed
    /// input, network or timeout failures.
    #[error("Client error during {operation}: {message}")]
    Client {
        operation: &'static str,
        message: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    pub fn is_service_error(&self) -> bool {
        matches!(self, StorageError::Service { .. })
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// What the service returns for a stored archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReceipt {
    pub archive_id: String,
    /// Tree-hash checksum computed for the upload
    pub checksum: String,
    pub location: Option<String>,
}

/// Remote view of a job, as reported by "describe job".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteJobStatus {
    InProgress,
    Succeeded,
    Failed(String),
}

impl RemoteJobStatus {
    pub fn is_completed(&self) -> bool {
        !matches!(self, RemoteJobStatus::InProgress)
    }
}

/// Byte-level progress of a single file transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub bytes_transferred: u64,
    pub bytes_total: u64,
}

/// Receives transfer progress for one file.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, progress: &UploadProgress);
}

impl<F> ProgressCallback for F
where
    F: Fn(&UploadProgress) + Send + Sync,
{
    fn on_progress(&self, progress: &UploadProgress) {
        self(progress)
    }
}

/// Body of a finished job's output.
pub type JobOutputReader = Pin<Box<dyn AsyncBufRead + Send>>;

/// Client interface to the remote archive service.
///
/// An implementation is bound to one set of credentials and one region when
/// it is built; no call is made until an operation is invoked.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Names of all vaults, following the paging marker to the end.
    async fn list_vaults(&self) -> StorageResult<Vec<String>>;

    /// Create a vault and return its location.
    async fn create_vault(&self, vault: &str) -> StorageResult<Option<String>>;

    async fn delete_archive(&self, vault: &str, archive_id: &str) -> StorageResult<()>;

    /// Start a retrieval job and return the job id assigned by the service.
    async fn initiate_job(&self, vault: &str, kind: &JobKind) -> StorageResult<String>;

    async fn describe_job(&self, vault: &str, job_id: &str) -> StorageResult<RemoteJobStatus>;

    /// Open the output of a completed job.
    async fn get_job_output(&self, vault: &str, job_id: &str) -> StorageResult<JobOutputReader>;

    /// Transfer one local file as a new archive.
    async fn upload_archive(
        &self,
        vault: &str,
        description: &str,
        path: &Path,
        progress: &dyn ProgressCallback,
    ) -> StorageResult<ArchiveReceipt>;

    /// Region this client is bound to.
    fn region(&self) -> &'static Region;
}
