use crate::traits::{
    ArchiveReceipt, ArchiveStore, JobOutputReader, ProgressCallback, RemoteJobStatus,
    StorageError, StorageResult, UploadProgress,
};
use async_trait::async_trait;
use aws_sdk_glacier::config::retry::RetryConfig;
use aws_sdk_glacier::config::timeout::TimeoutConfig;
use aws_sdk_glacier::config::{BehaviorVersion, Credentials, Region as AwsRegion};
use aws_sdk_glacier::error::{DisplayErrorContext, SdkError};
use aws_sdk_glacier::primitives::ByteStream;
use aws_sdk_glacier::types::{JobParameters, StatusCode};
use aws_sdk_glacier::Client;
use glacier_core::{ClientSettings, JobKind, Region};
use std::error::Error as StdError;
use std::fmt::Debug;
use std::path::Path;
use std::time::Instant;

/// Account id placeholder meaning "the account owning the credentials".
const CURRENT_ACCOUNT: &str = "-";

/// Provider name attached to credentials read from the property file.
const CREDENTIALS_PROVIDER: &str = "glacier-properties";

/// Archive service client bound to one region's endpoint
#[derive(Clone, Debug)]
pub struct GlacierStore {
    client: Client,
    region: &'static Region,
}

impl GlacierStore {
    /// Build a client from static credentials. No network call is made.
    pub fn new(
        access_key: &str,
        secret_key: &str,
        region: &'static Region,
        settings: &ClientSettings,
    ) -> Self {
        let credentials = Credentials::new(
            access_key.trim(),
            secret_key.trim(),
            None,
            None,
            CREDENTIALS_PROVIDER,
        );

        let config = aws_sdk_glacier::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(AwsRegion::new(region.name))
            .endpoint_url(region.archive_endpoint)
            .credentials_provider(credentials)
            .retry_config(RetryConfig::standard().with_max_attempts(settings.max_retries + 1))
            .timeout_config(
                TimeoutConfig::builder()
                    .read_timeout(settings.socket_timeout)
                    .build(),
            )
            .build();

        tracing::debug!(
            region = region.name,
            endpoint = region.archive_endpoint,
            max_retries = settings.max_retries,
            "Built archive client"
        );

        Self {
            client: Client::from_conf(config),
            region,
        }
    }
}

fn map_sdk_error<E, R>(operation: &'static str, err: SdkError<E, R>) -> StorageError
where
    E: StdError + Send + Sync + 'static,
    R: Debug + Send + Sync + 'static,
{
    let message = DisplayErrorContext(&err).to_string();
    match err {
        SdkError::ServiceError(_) => StorageError::Service { operation, message },
        _ => StorageError::Client { operation, message },
    }
}

#[async_trait]
impl ArchiveStore for GlacierStore {
    async fn list_vaults(&self) -> StorageResult<Vec<String>> {
        let mut names = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let output = self
                .client
                .list_vaults()
                .account_id(CURRENT_ACCOUNT)
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| map_sdk_error("list vaults", e))?;

            names.extend(
                output
                    .vault_list()
                    .iter()
                    .filter_map(|vault| vault.vault_name().map(str::to_string)),
            );

            match output.marker() {
                Some(next) => marker = Some(next.to_string()),
                None => break,
            }
        }

        tracing::info!(region = self.region.name, count = names.len(), "Listed vaults");
        Ok(names)
    }

    async fn create_vault(&self, vault: &str) -> StorageResult<Option<String>> {
        let output = self
            .client
            .create_vault()
            .account_id(CURRENT_ACCOUNT)
            .vault_name(vault)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %DisplayErrorContext(&e), vault = %vault, "Create vault failed");
                map_sdk_error("create vault", e)
            })?;

        tracing::info!(vault = %vault, region = self.region.name, "Vault created");
        Ok(output.location().map(str::to_string))
    }

    async fn delete_archive(&self, vault: &str, archive_id: &str) -> StorageResult<()> {
        self.client
            .delete_archive()
            .account_id(CURRENT_ACCOUNT)
            .vault_name(vault)
            .archive_id(archive_id)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %DisplayErrorContext(&e),
                    vault = %vault,
                    archive_id = %archive_id,
                    "Delete archive failed"
                );
                map_sdk_error("delete archive", e)
            })?;

        tracing::info!(vault = %vault, archive_id = %archive_id, "Archive deleted");
        Ok(())
    }

    async fn initiate_job(&self, vault: &str, kind: &JobKind) -> StorageResult<String> {
        let parameters = JobParameters::builder()
            .r#type(kind.as_str())
            .set_archive_id(kind.archive_id().map(str::to_string))
            .build();

        let output = self
            .client
            .initiate_job()
            .account_id(CURRENT_ACCOUNT)
            .vault_name(vault)
            .job_parameters(parameters)
            .send()
            .await
            .map_err(|e| map_sdk_error("initiate job", e))?;

        output
            .job_id()
            .map(str::to_string)
            .ok_or_else(|| StorageError::Service {
                operation: "initiate job",
                message: "response carried no job id".to_string(),
            })
    }

    async fn describe_job(&self, vault: &str, job_id: &str) -> StorageResult<RemoteJobStatus> {
        let output = self
            .client
            .describe_job()
            .account_id(CURRENT_ACCOUNT)
            .vault_name(vault)
            .job_id(job_id)
            .send()
            .await
            .map_err(|e| map_sdk_error("describe job", e))?;

        let status = match output.status_code() {
            Some(StatusCode::Succeeded) => RemoteJobStatus::Succeeded,
            Some(StatusCode::Failed) => RemoteJobStatus::Failed(
                output
                    .status_message()
                    .unwrap_or("job failed without a status message")
                    .to_string(),
            ),
            _ => RemoteJobStatus::InProgress,
        };
        Ok(status)
    }

    async fn get_job_output(&self, vault: &str, job_id: &str) -> StorageResult<JobOutputReader> {
        let output = self
            .client
            .get_job_output()
            .account_id(CURRENT_ACCOUNT)
            .vault_name(vault)
            .job_id(job_id)
            .send()
            .await
            .map_err(|e| map_sdk_error("get job output", e))?;

        Ok(Box::pin(output.body.into_async_read()))
    }

    async fn upload_archive(
        &self,
        vault: &str,
        description: &str,
        path: &Path,
        progress: &dyn ProgressCallback,
    ) -> StorageResult<ArchiveReceipt> {
        let start = Instant::now();
        // The SDK computes the tree hash over a loaded body, so the file is
        // read into memory instead of streamed.
        let data = tokio::fs::read(path).await?;
        let bytes_total = data.len() as u64;

        progress.on_progress(&UploadProgress {
            bytes_transferred: 0,
            bytes_total,
        });

        let output = self
            .client
            .upload_archive()
            .account_id(CURRENT_ACCOUNT)
            .vault_name(vault)
            .archive_description(description)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %DisplayErrorContext(&e),
                    vault = %vault,
                    file = %path.display(),
                    size_bytes = bytes_total,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Archive upload failed"
                );
                map_sdk_error("upload archive", e)
            })?;

        progress.on_progress(&UploadProgress {
            bytes_transferred: bytes_total,
            bytes_total,
        });

        let archive_id = output
            .archive_id()
            .map(str::to_string)
            .ok_or_else(|| StorageError::Service {
                operation: "upload archive",
                message: "response carried no archive id".to_string(),
            })?;

        tracing::info!(
            vault = %vault,
            file = %path.display(),
            archive_id = %archive_id,
            size_bytes = bytes_total,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Archive upload successful"
        );

        Ok(ArchiveReceipt {
            archive_id,
            checksum: output.checksum().unwrap_or_default().to_string(),
            location: output.location().map(str::to_string),
        })
    }

    fn region(&self) -> &'static Region {
        self.region
    }
}
