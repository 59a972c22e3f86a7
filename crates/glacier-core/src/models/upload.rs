use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;

use crate::constants::MAX_DESCRIPTION_LEN;
use crate::error::{CoreError, CoreResult};

/// Provenance record for one uploaded archive. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadLogEntry {
    pub vault: String,
    pub region: String,
    pub file_path: String,
    pub byte_length: u64,
    pub checksum: String,
    pub archive_id: String,
    pub uploaded_at: DateTime<Local>,
}

/// Index of the error-log category, next to the upload log types.
pub const ERROR_LOG_INDEX: usize = 4;
pub const ERROR_LOG_FILE_NAME: &str = "GlacierErrors.log";

/// Upload log categories, selected by the persisted `logType` index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    Text,
    Csv,
    Yaml,
    Json,
}

impl LogType {
    pub const ALL: [LogType; 4] = [LogType::Text, LogType::Csv, LogType::Yaml, LogType::Json];

    pub fn from_index(index: usize) -> CoreResult<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(CoreError::IndexOutOfRange {
                what: "Log type",
                index,
                len: Self::ALL.len(),
            })
    }

    pub fn index(self) -> usize {
        match self {
            LogType::Text => 0,
            LogType::Csv => 1,
            LogType::Yaml => 2,
            LogType::Json => 3,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            LogType::Text => "Glacier.log",
            LogType::Csv => "Glacier.csv",
            LogType::Yaml => "Glacier.yaml",
            LogType::Json => "Glacier.json",
        }
    }
}

impl Display for LogType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            LogType::Text => write!(f, "text"),
            LogType::Csv => write!(f, "csv"),
            LogType::Yaml => write!(f, "yaml"),
            LogType::Json => write!(f, "json"),
        }
    }
}

/// Archive description derived from the source path.
///
/// The service only accepts printable ASCII up to 1024 characters; anything
/// else is dropped.
pub fn archive_description(path: &Path) -> String {
    path.to_string_lossy()
        .chars()
        .filter(|c| (' '..='~').contains(c))
        .take(MAX_DESCRIPTION_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn log_type_indices_round_trip() {
        for log_type in LogType::ALL {
            assert_eq!(LogType::from_index(log_type.index()).unwrap(), log_type);
        }
        assert!(LogType::from_index(ERROR_LOG_INDEX).is_err());
    }

    #[test]
    fn description_drops_non_ascii() {
        let path = PathBuf::from("/home/zoë/Фото/trip\t2024.zip");
        assert_eq!(archive_description(&path), "/home/zo//trip2024.zip");
    }

    #[test]
    fn description_is_truncated() {
        let long = PathBuf::from("a".repeat(MAX_DESCRIPTION_LEN + 10));
        assert_eq!(archive_description(&long).len(), MAX_DESCRIPTION_LEN);
    }
}
