//! Worker error types.

use std::io;
use std::path::PathBuf;

use glacier_core::CoreError;
use glacier_storage::StorageError;

/// Failures of the provenance log. Callers treat these as fatal.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("There was an error creating the log '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("There was an error writing to the log '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("There was an error writing to the log '{}': {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv_async::Error,
    },

    #[error("Unable to serialize log record: {0}")]
    Serialize(String),

    #[error("Log file '{}' does not exist", .0.display())]
    NotFound(PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Failed to submit job: {0}")]
    Submit(#[source] StorageError),

    #[error("Job {job_id} status could not be read {failures} times in a row")]
    PollFailuresExceeded { job_id: String, failures: u32 },

    #[error("Job {job_id} failed on the remote side: {message}")]
    RemoteFailed { job_id: String, message: String },

    #[error("Failed to fetch job output: {0}")]
    Output(#[source] StorageError),

    #[error("Failed to write job output to '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    State(#[from] CoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Upload batch is empty")]
    EmptyBatch,

    /// Provenance can no longer be recorded; the whole process must stop.
    #[error(transparent)]
    LogWrite(#[from] LogError),
}
