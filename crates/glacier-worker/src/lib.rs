//! Background work for the archive client.
//!
//! Each user action that talks to the remote service for longer than a
//! request runs as one worker: an upload batch ([`UploadOrchestrator`]) or a
//! retrieval job ([`RetrievalWorkflow`]). Workers own an immutable snapshot of
//! what they need and report progress over an event channel.

pub mod error;
pub mod events;
pub mod retrieval;
pub mod upload;
pub mod upload_log;

pub use error::{JobError, LogError, UploadError};
pub use events::{JobEvent, UploadEvent};
pub use retrieval::{RetrievalOutcome, RetrievalWorkflow};
pub use upload::{FailedFile, UploadBatch, UploadOrchestrator, UploadReport, UploadedFile};
pub use upload_log::{export_text_log, UploadLog};
