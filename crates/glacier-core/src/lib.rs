//! Glacier Uploader Core Library
//!
//! This crate provides the domain models, error types, persisted user
//! properties, the region registry and environment settings shared by the
//! storage, worker and cli crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod properties;
pub mod regions;
pub mod validation;

// Re-export commonly used types
pub use config::{ClientSettings, PollSettings, Settings, UploadSettings};
pub use error::{CoreError, CoreResult};
pub use models::{JobKind, JobState, LogType, RetrievalJob, UploadLogEntry};
pub use properties::PropertyStore;
pub use regions::Region;
