//! Progress events sent from workers to the foreground.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use glacier_storage::UploadProgress;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    FileStarted {
        index: usize,
        total_files: usize,
        path: PathBuf,
    },
    /// Byte-level progress reported by the transfer for the current file.
    Transfer {
        index: usize,
        progress: UploadProgress,
    },
    FileCompleted {
        index: usize,
        path: PathBuf,
        archive_id: String,
        bytes: u64,
    },
    FileFailed {
        index: usize,
        path: PathBuf,
        error: String,
    },
    /// Whole-batch progress, recomputed after every file.
    BatchProgress { percent: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    Submitted {
        job_id: String,
        estimated_ready_at: DateTime<Local>,
    },
    StatusChecked {
        attempt: u32,
        completed: bool,
    },
    StatusCheckFailed {
        attempt: u32,
        error: String,
    },
    Fetching,
    Written {
        path: PathBuf,
        bytes: u64,
    },
}

/// Send an event if anyone listens. A dropped receiver is not an error.
pub(crate) fn emit<E>(events: &Option<UnboundedSender<E>>, event: E) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}
