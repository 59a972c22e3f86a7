//! Shared test helpers for worker integration tests
//!
//! [`MockArchiveStore`] replays scripted answers instead of talking to the
//! remote service and records what it was asked to do.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use glacier_core::{regions, JobKind, Region};
use glacier_storage::{
    ArchiveReceipt, ArchiveStore, JobOutputReader, ProgressCallback, RemoteJobStatus,
    StorageError, StorageResult, UploadProgress,
};
use tokio::time::Instant;

pub const JOB_ID: &str = "job-0001";

/// One scripted answer to "describe job".
#[derive(Debug, Clone)]
pub enum Describe {
    Incomplete,
    Complete,
    Failed(&'static str),
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpload {
    pub vault: String,
    pub description: String,
    pub path: PathBuf,
}

#[derive(Default)]
struct MockState {
    describes: VecDeque<Describe>,
    describe_times: Vec<Instant>,
    initiated: Vec<(String, JobKind)>,
    uploads: Vec<RecordedUpload>,
    progress: Vec<UploadProgress>,
}

#[derive(Clone)]
pub struct MockArchiveStore {
    state: Arc<Mutex<MockState>>,
    output: Vec<u8>,
    fail_output: bool,
    fail_submit: bool,
    failing_files: Vec<String>,
}

impl MockArchiveStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            output: Vec::new(),
            fail_output: false,
            fail_submit: false,
            failing_files: Vec::new(),
        }
    }

    /// Answers returned by successive "describe job" calls. Once exhausted,
    /// every further call reports the job as complete.
    pub fn with_describes(self, describes: Vec<Describe>) -> Self {
        self.state.lock().unwrap().describes = describes.into();
        self
    }

    pub fn with_output(mut self, output: impl Into<Vec<u8>>) -> Self {
        self.output = output.into();
        self
    }

    pub fn failing_output(mut self) -> Self {
        self.fail_output = true;
        self
    }

    pub fn failing_submit(mut self) -> Self {
        self.fail_submit = true;
        self
    }

    /// Uploads of files with this file name fail.
    pub fn failing_upload(mut self, file_name: &str) -> Self {
        self.failing_files.push(file_name.to_string());
        self
    }

    pub fn describe_times(&self) -> Vec<Instant> {
        self.state.lock().unwrap().describe_times.clone()
    }

    pub fn initiated(&self) -> Vec<(String, JobKind)> {
        self.state.lock().unwrap().initiated.clone()
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn progress(&self) -> Vec<UploadProgress> {
        self.state.lock().unwrap().progress.clone()
    }
}

#[async_trait]
impl ArchiveStore for MockArchiveStore {
    async fn list_vaults(&self) -> StorageResult<Vec<String>> {
        Ok(vec!["photos".to_string()])
    }

    async fn create_vault(&self, vault: &str) -> StorageResult<Option<String>> {
        Ok(Some(format!("/-/vaults/{vault}")))
    }

    async fn delete_archive(&self, _vault: &str, _archive_id: &str) -> StorageResult<()> {
        Ok(())
    }

    async fn initiate_job(&self, vault: &str, kind: &JobKind) -> StorageResult<String> {
        if self.fail_submit {
            return Err(StorageError::Service {
                operation: "initiate job",
                message: "vault not found".to_string(),
            });
        }
        self.state
            .lock()
            .unwrap()
            .initiated
            .push((vault.to_string(), kind.clone()));
        Ok(JOB_ID.to_string())
    }

    async fn describe_job(&self, _vault: &str, _job_id: &str) -> StorageResult<RemoteJobStatus> {
        let mut state = self.state.lock().unwrap();
        state.describe_times.push(Instant::now());
        match state.describes.pop_front().unwrap_or(Describe::Complete) {
            Describe::Incomplete => Ok(RemoteJobStatus::InProgress),
            Describe::Complete => Ok(RemoteJobStatus::Succeeded),
            Describe::Failed(message) => Ok(RemoteJobStatus::Failed(message.to_string())),
            Describe::Error => Err(StorageError::Client {
                operation: "describe job",
                message: "connection reset".to_string(),
            }),
        }
    }

    async fn get_job_output(&self, _vault: &str, _job_id: &str) -> StorageResult<JobOutputReader> {
        if self.fail_output {
            return Err(StorageError::Service {
                operation: "get job output",
                message: "job output expired".to_string(),
            });
        }
        Ok(Box::pin(std::io::Cursor::new(self.output.clone())))
    }

    async fn upload_archive(
        &self,
        vault: &str,
        description: &str,
        path: &Path,
        progress: &dyn ProgressCallback,
    ) -> StorageResult<ArchiveReceipt> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if self.failing_files.contains(&name) {
            return Err(StorageError::Client {
                operation: "upload archive",
                message: format!("request timed out for {name}"),
            });
        }

        let bytes_total = std::fs::metadata(path)?.len();
        for update in [
            UploadProgress {
                bytes_transferred: 0,
                bytes_total,
            },
            UploadProgress {
                bytes_transferred: bytes_total,
                bytes_total,
            },
        ] {
            progress.on_progress(&update);
            self.state.lock().unwrap().progress.push(update);
        }

        self.state.lock().unwrap().uploads.push(RecordedUpload {
            vault: vault.to_string(),
            description: description.to_string(),
            path: path.to_path_buf(),
        });

        Ok(ArchiveReceipt {
            archive_id: format!("archive-{name}"),
            checksum: format!("hash-{name}"),
            location: None,
        })
    }

    fn region(&self) -> &'static Region {
        regions::by_index(3).unwrap()
    }
}
