//! Configuration module
//!
//! Tunables for the remote client, the retrieval job poller and the upload
//! batch, read from environment variables (a `.env` file is honoured) with
//! defaults for everything. User-facing settings such as credentials live in
//! the property file instead, see [`crate::properties`].

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    INITIAL_POLL_DELAY_SECS, MAX_RETRIES, POLL_INTERVAL_SECS, SOCKET_TIMEOUT_MS, UPLOAD_PACING_MS,
};

/// Settings used when building a storage client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientSettings {
    pub socket_timeout: Duration,
    pub max_retries: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            socket_timeout: Duration::from_millis(SOCKET_TIMEOUT_MS),
            max_retries: MAX_RETRIES,
        }
    }
}

/// Polling schedule for retrieval jobs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollSettings {
    /// Wait before the first status check; jobs take hours on the remote side.
    pub initial_delay: Duration,
    /// Wait between subsequent status checks.
    pub interval: Duration,
    /// Give up after this many consecutive failed status checks.
    /// `None` keeps polling forever.
    pub max_consecutive_failures: Option<u32>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(INITIAL_POLL_DELAY_SECS),
            interval: Duration::from_secs(POLL_INTERVAL_SECS),
            max_consecutive_failures: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadSettings {
    /// Pause before each file of a batch.
    pub pacing: Duration,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            pacing: Duration::from_millis(UPLOAD_PACING_MS),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Settings {
    pub client: ClientSettings,
    pub poll: PollSettings,
    pub upload: UploadSettings,
}

impl Settings {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let settings = Settings {
            client: ClientSettings {
                socket_timeout: Duration::from_millis(parse_or(
                    env::var("GLACIER_SOCKET_TIMEOUT_MS").ok(),
                    SOCKET_TIMEOUT_MS,
                )),
                max_retries: parse_or(env::var("GLACIER_MAX_RETRIES").ok(), MAX_RETRIES),
            },
            poll: PollSettings {
                initial_delay: Duration::from_secs(parse_or(
                    env::var("GLACIER_INITIAL_POLL_DELAY_SECS").ok(),
                    INITIAL_POLL_DELAY_SECS,
                )),
                interval: Duration::from_secs(parse_or(
                    env::var("GLACIER_POLL_INTERVAL_SECS").ok(),
                    POLL_INTERVAL_SECS,
                )),
                max_consecutive_failures: env::var("GLACIER_MAX_POLL_FAILURES")
                    .ok()
                    .and_then(|s| s.trim().parse().ok()),
            },
            upload: UploadSettings {
                pacing: Duration::from_millis(parse_or(
                    env::var("GLACIER_UPLOAD_PACING_MS").ok(),
                    UPLOAD_PACING_MS,
                )),
            },
        };

        tracing::debug!(?settings, "Loaded settings");
        settings
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}
