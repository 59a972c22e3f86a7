pub mod job;
pub mod upload;

pub use job::{JobKind, JobState, RetrievalJob};
pub use upload::{archive_description, LogType, UploadLogEntry, ERROR_LOG_FILE_NAME, ERROR_LOG_INDEX};
