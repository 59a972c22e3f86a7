use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::{CoreError, CoreResult};

/// What a retrieval job asks the remote service to prepare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum JobKind {
    InventoryRetrieval,
    ArchiveRetrieval { archive_id: String },
}

impl JobKind {
    /// Job type string understood by the remote "initiate job" operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::InventoryRetrieval => "inventory-retrieval",
            JobKind::ArchiveRetrieval { .. } => "archive-retrieval",
        }
    }

    pub fn archive_id(&self) -> Option<&str> {
        match self {
            JobKind::InventoryRetrieval => None,
            JobKind::ArchiveRetrieval { archive_id } => Some(archive_id),
        }
    }

    /// Inventory output is text and is copied line by line.
    pub fn is_text(&self) -> bool {
        matches!(self, JobKind::InventoryRetrieval)
    }
}

impl Display for JobKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Submitted,
    Pending,
    Ready,
    Fetched,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Fetched | JobState::Failed)
    }

    fn can_move_to(self, next: JobState) -> bool {
        use JobState::*;
        match (self, next) {
            (Submitted, Pending) | (Pending, Pending) | (Pending, Ready) | (Ready, Fetched) => {
                true
            }
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl Display for JobState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            JobState::Submitted => write!(f, "submitted"),
            JobState::Pending => write!(f, "pending"),
            JobState::Ready => write!(f, "ready"),
            JobState::Fetched => write!(f, "fetched"),
            JobState::Failed => write!(f, "failed"),
        }
    }
}

/// A long-running remote job, tracked from submission until its output has
/// been written locally (or it failed).
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalJob {
    pub job_id: String,
    pub vault: String,
    pub kind: JobKind,
    pub submitted_at: DateTime<Local>,
    state: JobState,
    status_checks: u32,
}

impl RetrievalJob {
    pub fn submitted(
        job_id: impl Into<String>,
        vault: impl Into<String>,
        kind: JobKind,
        submitted_at: DateTime<Local>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            vault: vault.into(),
            kind,
            submitted_at,
            state: JobState::Submitted,
            status_checks: 0,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, JobState::Ready | JobState::Fetched)
    }

    /// Number of "describe job" calls issued so far.
    pub fn status_checks(&self) -> u32 {
        self.status_checks
    }

    pub fn record_status_check(&mut self) {
        self.status_checks += 1;
    }

    pub fn transition(&mut self, next: JobState) -> CoreResult<()> {
        if !self.state.can_move_to(next) {
            return Err(CoreError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// Default local file name: `<vault><yyyyMMMdd_HHmmss>.txt` for inventories,
    /// `.bin` for archive contents.
    pub fn output_file_name(&self) -> String {
        let extension = if self.kind.is_text() { "txt" } else { "bin" };
        format!(
            "{}{}.{}",
            self.vault,
            self.submitted_at.format("%Y%b%d_%H%M%S"),
            extension
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn job(kind: JobKind) -> RetrievalJob {
        let at = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();
        RetrievalJob::submitted("job-1", "photos", kind, at)
    }

    #[test]
    fn follows_happy_path() {
        let mut job = job(JobKind::InventoryRetrieval);
        assert_eq!(job.state(), JobState::Submitted);
        job.transition(JobState::Pending).unwrap();
        job.transition(JobState::Pending).unwrap();
        job.transition(JobState::Ready).unwrap();
        assert!(job.is_complete());
        job.transition(JobState::Fetched).unwrap();
        assert!(job.state().is_terminal());
    }

    #[test]
    fn rejects_skipping_states() {
        let mut job = job(JobKind::InventoryRetrieval);
        assert!(job.transition(JobState::Ready).is_err());
        assert!(job.transition(JobState::Fetched).is_err());
        job.transition(JobState::Failed).unwrap();
        assert!(job.transition(JobState::Pending).is_err());
        assert!(job.transition(JobState::Failed).is_err());
    }

    #[test]
    fn output_file_name_embeds_vault_and_timestamp() {
        assert_eq!(
            job(JobKind::InventoryRetrieval).output_file_name(),
            "photos2024Mar07_090501.txt"
        );
        let archive = job(JobKind::ArchiveRetrieval {
            archive_id: "abc".to_string(),
        });
        assert_eq!(archive.output_file_name(), "photos2024Mar07_090501.bin");
        assert_eq!(archive.kind.archive_id(), Some("abc"));
        assert_eq!(archive.kind.as_str(), "archive-retrieval");
    }

    #[test]
    fn kind_serializes_with_tag() {
        let kind = JobKind::ArchiveRetrieval {
            archive_id: "abc".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&kind).unwrap(),
            serde_json::json!({ "kind": "archive_retrieval", "archive_id": "abc" })
        );
        assert_eq!(
            serde_json::to_value(JobKind::InventoryRetrieval).unwrap(),
            serde_json::json!({ "kind": "inventory_retrieval" })
        );
    }
}
