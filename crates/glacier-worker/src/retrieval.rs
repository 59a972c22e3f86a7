//! Retrieval job workflow
//!
//! Submits an inventory or archive retrieval job, waits for the remote side to
//! finish it and copies the output to a local file:
//!
//! ```text
//! Submitted -> Pending -(describe: incomplete)-> Pending
//!                      -(describe: complete)---> Ready -> Fetched
//! ```
//!
//! The first status check happens only after a long initial delay, later
//! checks follow at a fixed interval. A failed status check counts as "not
//! yet complete" unless [`PollSettings::max_consecutive_failures`] is set.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use glacier_core::{JobKind, JobState, PollSettings, RetrievalJob};
use glacier_storage::{ArchiveStore, JobOutputReader, RemoteJobStatus};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufWriter};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::sleep;

use crate::error::JobError;
use crate::events::{emit, JobEvent};

/// A finished retrieval: the job and where its output was written.
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub job: RetrievalJob,
    pub path: PathBuf,
    pub bytes: u64,
}

pub struct RetrievalWorkflow {
    store: Arc<dyn ArchiveStore>,
    poll: PollSettings,
    output_dir: PathBuf,
    events: Option<UnboundedSender<JobEvent>>,
}

impl RetrievalWorkflow {
    pub fn new(store: Arc<dyn ArchiveStore>, poll: PollSettings, output_dir: PathBuf) -> Self {
        Self {
            store,
            poll,
            output_dir,
            events: None,
        }
    }

    pub fn with_events(mut self, events: UnboundedSender<JobEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Run a job from submission to written output.
    ///
    /// `destination` overrides the default `<vault><timestamp>.txt|.bin` file
    /// in the output directory.
    pub async fn run(
        &self,
        vault: &str,
        kind: JobKind,
        destination: Option<PathBuf>,
    ) -> Result<RetrievalOutcome, JobError> {
        let mut job = self.submit(vault, kind).await?;

        let result = match self.wait_until_ready(&mut job).await {
            Ok(()) => {
                let path = destination
                    .unwrap_or_else(|| self.output_dir.join(job.output_file_name()));
                self.fetch(&mut job, &path).await.map(|bytes| (path, bytes))
            }
            Err(e) => Err(e),
        };

        match result {
            Ok((path, bytes)) => Ok(RetrievalOutcome { job, path, bytes }),
            Err(e) => {
                // Terminal either way; the job is abandoned.
                let _ = job.transition(JobState::Failed);
                tracing::error!(
                    job_id = %job.job_id,
                    vault = %job.vault,
                    error = %e,
                    "Retrieval job abandoned"
                );
                Err(e)
            }
        }
    }

    #[tracing::instrument(skip(self, kind), fields(kind = %kind))]
    async fn submit(&self, vault: &str, kind: JobKind) -> Result<RetrievalJob, JobError> {
        let job_id = self
            .store
            .initiate_job(vault, &kind)
            .await
            .map_err(JobError::Submit)?;

        let submitted_at = Local::now();
        let mut job = RetrievalJob::submitted(job_id, vault, kind, submitted_at);
        job.transition(JobState::Pending)?;

        let estimated_ready_at = submitted_at
            + chrono::Duration::from_std(self.poll.initial_delay)
                .unwrap_or_else(|_| chrono::Duration::zero());

        tracing::info!(
            job_id = %job.job_id,
            estimated_ready_at = %estimated_ready_at,
            "Retrieval job submitted"
        );
        emit(
            &self.events,
            JobEvent::Submitted {
                job_id: job.job_id.clone(),
                estimated_ready_at,
            },
        );
        Ok(job)
    }

    #[tracing::instrument(skip(self, job), fields(job_id = %job.job_id))]
    async fn wait_until_ready(&self, job: &mut RetrievalJob) -> Result<(), JobError> {
        let mut consecutive_failures: u32 = 0;
        sleep(self.poll.initial_delay).await;

        loop {
            job.record_status_check();
            let attempt = job.status_checks();

            match self.store.describe_job(&job.vault, &job.job_id).await {
                Ok(RemoteJobStatus::Succeeded) => {
                    emit(
                        &self.events,
                        JobEvent::StatusChecked {
                            attempt,
                            completed: true,
                        },
                    );
                    job.transition(JobState::Ready)?;
                    tracing::info!(attempt, "Retrieval job ready");
                    return Ok(());
                }
                Ok(RemoteJobStatus::Failed(message)) => {
                    return Err(JobError::RemoteFailed {
                        job_id: job.job_id.clone(),
                        message,
                    });
                }
                Ok(RemoteJobStatus::InProgress) => {
                    consecutive_failures = 0;
                    tracing::debug!(attempt, "Retrieval job still in progress");
                    emit(
                        &self.events,
                        JobEvent::StatusChecked {
                            attempt,
                            completed: false,
                        },
                    );
                }
                Err(e) => {
                    consecutive_failures += 1;
                    tracing::warn!(
                        attempt,
                        consecutive_failures,
                        error = %e,
                        "Job status check failed, will retry"
                    );
                    emit(
                        &self.events,
                        JobEvent::StatusCheckFailed {
                            attempt,
                            error: e.to_string(),
                        },
                    );
                    if let Some(max) = self.poll.max_consecutive_failures {
                        if consecutive_failures >= max {
                            return Err(JobError::PollFailuresExceeded {
                                job_id: job.job_id.clone(),
                                failures: consecutive_failures,
                            });
                        }
                    }
                }
            }

            job.transition(JobState::Pending)?;
            sleep(self.poll.interval).await;
        }
    }

    #[tracing::instrument(skip(self, job), fields(job_id = %job.job_id, path = %path.display()))]
    async fn fetch(&self, job: &mut RetrievalJob, path: &Path) -> Result<u64, JobError> {
        emit(&self.events, JobEvent::Fetching);

        let reader = self
            .store
            .get_job_output(&job.vault, &job.job_id)
            .await
            .map_err(JobError::Output)?;

        let bytes = match write_output(reader, path, job.kind.is_text()).await {
            Ok(bytes) => bytes,
            Err(source) => {
                // A partial file must not pass for a finished download.
                if let Err(e) = tokio::fs::remove_file(path).await {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(error = %e, "Failed to remove partial job output");
                    }
                }
                return Err(JobError::Write {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        job.transition(JobState::Fetched)?;
        tracing::info!(bytes, "Job output written");
        emit(
            &self.events,
            JobEvent::Written {
                path: path.to_path_buf(),
                bytes,
            },
        );
        Ok(bytes)
    }
}

/// Copy job output to `path`. Text output is rewritten line by line with `\n`
/// endings, anything else is copied byte for byte.
async fn write_output(
    mut reader: JobOutputReader,
    path: &Path,
    text: bool,
) -> std::io::Result<u64> {
    let mut writer = BufWriter::new(File::create(path).await?);

    let bytes = if text {
        let mut written = 0u64;
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            written += line.len() as u64 + 1;
        }
        written
    } else {
        tokio::io::copy_buf(&mut reader, &mut writer).await?
    };

    writer.flush().await?;
    Ok(bytes)
}
