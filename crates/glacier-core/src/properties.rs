//! Persisted user properties
//!
//! Credentials, the vault name and the region/log-type selections are kept in
//! a flat `key=value` file (`glacier.properties`). The file is looked up in the
//! working directory first and falls back to a per-user directory under the
//! home directory, which is created on demand.
//!
//! Loading never fails: a missing or unreadable file simply yields no
//! properties. Unknown keys are carried through load/save untouched.

use std::collections::BTreeMap;
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::constants::{
    ACCESS_KEY, HOME_DIR_NAME, LOCATION_INDEX, LOG_TYPE_INDEX, PROPERTIES_FILE_NAME, SECRET_KEY,
    VAULT_KEY,
};
use crate::error::{CoreError, CoreResult};

/// In-memory view of the property file plus the directory it belongs to.
#[derive(Debug, Clone)]
pub struct PropertyStore {
    dir: PathBuf,
    entries: BTreeMap<String, String>,
}

impl PropertyStore {
    /// Open the store using the default resolution: the current working
    /// directory if it holds a property file, `~/.glacier-uploader` otherwise.
    pub fn open_default() -> CoreResult<Self> {
        let working_dir = env::current_dir()?;
        let dir = Self::resolve_directory(&working_dir, &default_home_dir()?)?;
        Ok(Self::load(dir))
    }

    /// Pick the directory holding the property file.
    ///
    /// The home fallback is created if missing; failing to create it is fatal
    /// because no durable location for properties and logs would exist.
    pub fn resolve_directory(working_dir: &Path, home_fallback_dir: &Path) -> CoreResult<PathBuf> {
        if working_dir.join(PROPERTIES_FILE_NAME).exists() {
            return Ok(working_dir.to_path_buf());
        }

        if !home_fallback_dir.exists() {
            fs::create_dir_all(home_fallback_dir).map_err(|source| CoreError::PropertiesDir {
                path: home_fallback_dir.to_path_buf(),
                source,
            })?;
            tracing::info!(dir = %home_fallback_dir.display(), "Created properties directory");
        }

        Ok(home_fallback_dir.to_path_buf())
    }

    /// Load properties from `dir`. A missing or unreadable file leaves the
    /// store empty.
    pub fn load(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let path = dir.join(PROPERTIES_FILE_NAME);

        let entries = match fs::read_to_string(&path) {
            Ok(content) => parse(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "Failed to read properties");
                BTreeMap::new()
            }
        };

        Self { dir, entries }
    }

    /// Write the current values back to the file they were loaded from.
    pub fn try_save(&self) -> io::Result<()> {
        fs::write(self.file_path(), render(&self.entries))
    }

    /// Best-effort save: I/O failures are logged and otherwise ignored.
    /// Use [`PropertyStore::try_save`] to surface them.
    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            tracing::warn!(error = %e, path = %self.file_path().display(), "Failed to save properties");
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_path(&self) -> PathBuf {
        self.dir.join(PROPERTIES_FILE_NAME)
    }

    pub fn access_key(&self) -> Option<&str> {
        self.get(ACCESS_KEY)
    }

    pub fn secret_key(&self) -> Option<&str> {
        self.get(SECRET_KEY)
    }

    pub fn vault_key(&self) -> Option<&str> {
        self.get(VAULT_KEY)
    }

    /// Region selector; `0` when unset or unparsable.
    pub fn location_index(&self) -> usize {
        self.get_index(LOCATION_INDEX)
    }

    /// Log-type selector; `0` when unset or unparsable.
    pub fn log_type_index(&self) -> usize {
        self.get_index(LOG_TYPE_INDEX)
    }

    /// Returns `true` if the stored value changed.
    pub fn set_access_key(&mut self, value: Option<&str>) -> bool {
        self.set(ACCESS_KEY, value)
    }

    /// Returns `true` if the stored value changed.
    pub fn set_secret_key(&mut self, value: Option<&str>) -> bool {
        self.set(SECRET_KEY, value)
    }

    /// Returns `true` if the stored value changed.
    pub fn set_vault_key(&mut self, value: Option<&str>) -> bool {
        self.set(VAULT_KEY, value)
    }

    /// Returns `true` if the stored value changed.
    pub fn set_location_index(&mut self, index: usize) -> bool {
        self.set(LOCATION_INDEX, Some(&index.to_string()))
    }

    /// Returns `true` if the stored value changed.
    pub fn set_log_type_index(&mut self, index: usize) -> bool {
        self.set(LOG_TYPE_INDEX, Some(&index.to_string()))
    }

    /// Raw lookup, including keys this application does not know about.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    fn get_index(&self, key: &str) -> usize {
        match self.get(key) {
            None => 0,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(key, value = raw, "Ignoring non-numeric property value");
                0
            }),
        }
    }

    // Null and empty are the same thing here: absent, "" and whitespace-only
    // all compare equal, so clearing an absent value is not a change.
    fn set(&mut self, key: &str, value: Option<&str>) -> bool {
        let new_value = value.unwrap_or_default().trim();
        let old_value = self.get(key).unwrap_or_default().trim();
        if old_value == new_value {
            return false;
        }
        self.entries.insert(key.to_string(), new_value.to_string());
        true
    }
}

/// `$HOME/.glacier-uploader` (`%USERPROFILE%` on Windows).
pub fn default_home_dir() -> CoreResult<PathBuf> {
    let home = if cfg!(target_os = "windows") {
        env::var("USERPROFILE").or_else(|_| env::var("HOME"))
    } else {
        env::var("HOME")
    }
    .map_err(|_| CoreError::HomeDirUnavailable)?;

    Ok(PathBuf::from(home).join(HOME_DIR_NAME))
}

/// Parse the `.properties` text format: `#`/`!` comments, `=`, `:` or
/// whitespace separators, backslash escapes and line continuations. Values
/// are stored trimmed, the same way the setters store them.
fn parse(content: &str) -> BTreeMap<String, String> {
    let mut entries = BTreeMap::new();
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        let mut logical = line.trim_start().to_string();
        if logical.is_empty() || logical.starts_with('#') || logical.starts_with('!') {
            continue;
        }
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (key, value) = split_key_value(&logical);
        entries.insert(unescape(key), unescape(value).trim().to_string());
    }

    entries
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (&line[..i], line[i + 1..].trim_start()),
            c if c.is_whitespace() => {
                let rest = line[i..].trim_start();
                let rest = rest
                    .strip_prefix(['=', ':'])
                    .map(str::trim_start)
                    .unwrap_or(rest);
                return (&line[..i], rest);
            }
            _ => {}
        }
    }
    (line, "")
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => out.push_str(&hex),
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn escape(raw: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for (i, c) in raw.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{c}' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            c if (' '..='~').contains(&c) => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{:04X}", unit);
                }
            }
        }
    }
    out
}

fn render(entries: &BTreeMap<String, String>) -> String {
    let mut out = String::from("#Properties\n");
    let _ = writeln!(out, "#{}", Local::now().format("%a %b %d %H:%M:%S %Z %Y"));
    for (key, value) in entries {
        let _ = writeln!(out, "{}={}", escape(key, true), escape(value, false));
    }
    out
}
