//! Upload provenance log
//!
//! One append-only file per log type, living next to the property file. The
//! text log holds three-line records:
//!
//! ```text
//!  | ArchiveID: <archive id>
//!  | File: <path> | Bytes: <n> | Vault: <vault> | Location: <region> | Date: <date> | Hash: <checksum>
//! <empty line>
//! ```
//!
//! Failed uploads go to a separate error log as timestamped free text.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use csv_async::AsyncWriterBuilder;
use glacier_core::models::ERROR_LOG_FILE_NAME;
use glacier_core::{LogType, UploadLogEntry};
use serde::Serialize;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::error::LogError;

const DATE_FORMAT: &str = "%a %b %d %H:%M:%S %Z %Y";
const TEXT_RECORD_LINES: usize = 3;

/// Column layout of the CSV log.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Vault")]
    vault: &'a str,
    #[serde(rename = "Location")]
    region: &'a str,
    #[serde(rename = "File")]
    file_path: &'a str,
    #[serde(rename = "Bytes")]
    byte_length: u64,
    #[serde(rename = "Hash")]
    checksum: &'a str,
    #[serde(rename = "ArchiveID")]
    archive_id: &'a str,
    #[serde(rename = "Date")]
    uploaded_at: String,
}

impl<'a> From<&'a UploadLogEntry> for CsvRow<'a> {
    fn from(entry: &'a UploadLogEntry) -> Self {
        Self {
            vault: &entry.vault,
            region: &entry.region,
            file_path: &entry.file_path,
            byte_length: entry.byte_length,
            checksum: &entry.checksum,
            archive_id: &entry.archive_id,
            uploaded_at: entry.uploaded_at.format(DATE_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadLog {
    dir: PathBuf,
    log_type: LogType,
}

impl UploadLog {
    pub fn new(dir: impl Into<PathBuf>, log_type: LogType) -> Self {
        Self {
            dir: dir.into(),
            log_type,
        }
    }

    pub fn log_type(&self) -> LogType {
        self.log_type
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(self.log_type.file_name())
    }

    pub fn error_path(&self) -> PathBuf {
        self.dir.join(ERROR_LOG_FILE_NAME)
    }

    /// Append one record in the configured format, creating the file if needed.
    pub async fn append(&self, entry: &UploadLogEntry) -> Result<(), LogError> {
        let path = self.path();

        match self.log_type {
            LogType::Text => append_to(&path, &render_text(entry)).await?,
            LogType::Csv => append_csv(&path, entry).await?,
            LogType::Yaml => {
                let body = serde_yaml::to_string(entry)
                    .map_err(|e| LogError::Serialize(e.to_string()))?;
                append_to(&path, &format!("---\n{body}")).await?;
            }
            LogType::Json => {
                let line = serde_json::to_string(entry)
                    .map_err(|e| LogError::Serialize(e.to_string()))?;
                append_to(&path, &format!("{line}\n")).await?;
            }
        }

        tracing::debug!(
            path = %path.display(),
            archive_id = %entry.archive_id,
            "Upload recorded"
        );
        Ok(())
    }

    /// Append a failed upload to the error log.
    pub async fn append_error(
        &self,
        file: &str,
        error: &str,
        at: DateTime<Local>,
    ) -> Result<(), LogError> {
        let record = format!("\n{}: \"{}\" *ERROR* {}\n", at.format(DATE_FORMAT), file, error);
        append_to(&self.error_path(), &record).await
    }
}

async fn open_append(path: &Path) -> Result<tokio::fs::File, LogError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|source| LogError::Open {
            path: path.to_path_buf(),
            source,
        })
}

async fn append_to(path: &Path, record: &str) -> Result<(), LogError> {
    let mut file = open_append(path).await?;
    let write_err = |source| LogError::Write {
        path: path.to_path_buf(),
        source,
    };

    file.write_all(record.as_bytes()).await.map_err(write_err)?;
    file.flush().await.map_err(write_err)
}

/// Append one CSV row; the header row is written only into a new file.
async fn append_csv(path: &Path, entry: &UploadLogEntry) -> Result<(), LogError> {
    let is_new = tokio::fs::metadata(path)
        .await
        .map(|meta| meta.len() == 0)
        .unwrap_or(true);
    let file = open_append(path).await?;

    let mut serializer = AsyncWriterBuilder::new()
        .has_headers(is_new)
        .create_serializer(file);
    serializer
        .serialize(CsvRow::from(entry))
        .await
        .map_err(|source| LogError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    serializer.flush().await.map_err(|source| LogError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn render_text(entry: &UploadLogEntry) -> String {
    format!(
        " | ArchiveID: {} \n | File: {} | Bytes: {} | Vault: {} | Location: {} | Date: {} | Hash: {}\n\n",
        entry.archive_id,
        entry.file_path,
        entry.byte_length,
        entry.vault,
        entry.region,
        entry.uploaded_at.format(DATE_FORMAT),
        entry.checksum,
    )
}

/// Copy the text log from `log_dir` to `dest` as CRLF-terminated three-line
/// records. Returns the number of records exported.
pub fn export_text_log(log_dir: &Path, dest: &Path) -> Result<usize, LogError> {
    let source = log_dir.join(LogType::Text.file_name());
    let input = match File::open(&source) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(LogError::NotFound(source));
        }
        Err(source_err) => {
            return Err(LogError::Open {
                path: source,
                source: source_err,
            })
        }
    };

    let lines = BufReader::new(input)
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| LogError::Open {
            path: source.clone(),
            source: e,
        })?;

    let output = File::create(dest).map_err(|e| LogError::Open {
        path: dest.to_path_buf(),
        source: e,
    })?;
    let mut writer = BufWriter::new(output);
    let write_err = |e| LogError::Write {
        path: dest.to_path_buf(),
        source: e,
    };

    let mut count = 0;
    for record in lines.chunks(TEXT_RECORD_LINES) {
        if record.iter().all(|line| line.trim().is_empty()) {
            continue;
        }
        for i in 0..TEXT_RECORD_LINES {
            let line = record.get(i).map(String::as_str).unwrap_or_default();
            writer.write_all(line.as_bytes()).map_err(write_err)?;
            writer.write_all(b"\r\n").map_err(write_err)?;
        }
        count += 1;
    }
    writer.flush().map_err(write_err)?;

    tracing::info!(records = count, dest = %dest.display(), "Exported upload log");
    Ok(count)
}
