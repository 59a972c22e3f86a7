//! Fixed names and defaults.

/// Name of the property file, looked up in the working directory first.
pub const PROPERTIES_FILE_NAME: &str = "glacier.properties";

/// Per-user fallback directory (under the home directory) for properties and logs.
pub const HOME_DIR_NAME: &str = ".glacier-uploader";

// Property keys. These names are part of the on-disk format.
pub const ACCESS_KEY: &str = "accessKey";
pub const SECRET_KEY: &str = "secretKey";
pub const VAULT_KEY: &str = "vaultKey";
pub const LOCATION_INDEX: &str = "locationSet";
pub const LOG_TYPE_INDEX: &str = "logType";

/// Socket timeout applied to every remote call, in milliseconds.
pub const SOCKET_TIMEOUT_MS: u64 = 1_000_000;

/// Retries the SDK performs on top of the first attempt.
pub const MAX_RETRIES: u32 = 6;

/// Delay before the first status check of a retrieval job (3.5 hours).
pub const INITIAL_POLL_DELAY_SECS: u64 = 12_600;

/// Delay between subsequent status checks (10 minutes).
pub const POLL_INTERVAL_SECS: u64 = 600;

/// Pause between two files of an upload batch.
pub const UPLOAD_PACING_MS: u64 = 100;

/// Maximum archive description length accepted by the service.
pub const MAX_DESCRIPTION_LEN: usize = 1024;

/// Expected lengths of the access and secret identifiers.
pub const ACCESS_KEY_LEN: usize = 20;
pub const SECRET_KEY_LEN: usize = 40;
