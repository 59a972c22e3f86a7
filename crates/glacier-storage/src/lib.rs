//! Glacier Uploader Storage Library
//!
//! This crate provides the narrow client interface ([`ArchiveStore`]) every
//! vault, job and upload operation goes through, and its implementation on
//! top of the AWS SDK.
//!
//! Multipart chunking, tree-hash computation and request retries are the
//! SDK's business; this crate only sequences calls and maps their results.

pub mod factory;
#[cfg(feature = "storage-glacier")]
pub mod glacier;
pub mod traits;

// Re-export commonly used types
pub use factory::build_client;
#[cfg(feature = "storage-glacier")]
pub use glacier::GlacierStore;
pub use traits::{
    ArchiveReceipt, ArchiveStore, JobOutputReader, ProgressCallback, RemoteJobStatus,
    StorageError, StorageResult, UploadProgress,
};
