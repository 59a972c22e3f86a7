//! Property store integration tests against a fixture directory and temp dirs.

use std::fs;
use std::path::PathBuf;

use glacier_core::constants::PROPERTIES_FILE_NAME;
use glacier_core::PropertyStore;
use tempfile::tempdir;

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

#[test]
fn load_reads_every_recognized_key() {
    let store = PropertyStore::load(fixture_dir());
    assert_eq!(store.access_key(), Some("TEST_ACCESS"));
    assert_eq!(store.secret_key(), Some("TEST_SECRET"));
    assert_eq!(store.vault_key(), Some("TEST_VAULT"));
    assert_eq!(store.location_index(), 3);
    assert_eq!(store.log_type_index(), 1);
}

#[test]
fn file_path_joins_dir_and_file_name() {
    let store = PropertyStore::load(fixture_dir());
    assert_eq!(store.file_path(), fixture_dir().join(PROPERTIES_FILE_NAME));
}

#[test]
fn getters_have_sensible_defaults() {
    let dir = tempdir().unwrap();
    let store = PropertyStore::load(dir.path());
    assert_eq!(store.access_key(), None);
    assert_eq!(store.secret_key(), None);
    assert_eq!(store.vault_key(), None);
    assert_eq!(store.location_index(), 0);
    assert_eq!(store.log_type_index(), 0);
}

#[test]
fn partial_file_reads_back_present_keys_and_defaults() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join(PROPERTIES_FILE_NAME),
        "vaultKey=  spaced  \nlogType=2\n",
    )
    .unwrap();

    let store = PropertyStore::load(dir.path());
    assert_eq!(store.vault_key(), Some("spaced"));
    assert_eq!(store.log_type_index(), 2);
    assert_eq!(store.access_key(), None);
    assert_eq!(store.location_index(), 0);
}

#[test]
fn resolve_uses_working_dir_when_file_present() {
    let home = tempdir().unwrap();
    let fallback = home.path().join(".glacier-uploader");

    let resolved = PropertyStore::resolve_directory(&fixture_dir(), &fallback).unwrap();
    assert_eq!(resolved, fixture_dir());
    assert!(!fallback.exists());
}

#[test]
fn resolve_falls_back_to_home_and_creates_it() {
    let working = tempdir().unwrap();
    let home = tempdir().unwrap();
    let fallback = home.path().join(".glacier-uploader");

    let resolved = PropertyStore::resolve_directory(working.path(), &fallback).unwrap();
    assert_eq!(resolved, fallback);
    assert!(fallback.is_dir());
}

#[test]
fn resolve_loads_existing_home_properties() {
    let working = tempdir().unwrap();
    let home = tempdir().unwrap();
    let fallback = home.path().join(".glacier-uploader");
    fs::create_dir(&fallback).unwrap();
    fs::write(fallback.join(PROPERTIES_FILE_NAME), "accessKey=TEST\n").unwrap();

    let dir = PropertyStore::resolve_directory(working.path(), &fallback).unwrap();
    let store = PropertyStore::load(dir);
    assert_eq!(store.access_key(), Some("TEST"));
}

#[test]
fn resolve_fails_when_fallback_cannot_be_created() {
    let working = tempdir().unwrap();
    let blocker = working.path().join("not-a-dir");
    fs::write(&blocker, "file").unwrap();

    let result = PropertyStore::resolve_directory(working.path(), &blocker.join("child"));
    assert!(result.is_err());
}

#[test]
fn setters_change_values_and_report_changes() {
    let mut store = PropertyStore::load(fixture_dir());

    assert!(store.set_access_key(Some("AC")));
    assert!(store.set_secret_key(Some("SE")));
    assert!(store.set_vault_key(Some("VA")));
    assert!(store.set_location_index(1));
    assert!(store.set_log_type_index(2));

    assert_eq!(store.access_key(), Some("AC"));
    assert_eq!(store.secret_key(), Some("SE"));
    assert_eq!(store.vault_key(), Some("VA"));
    assert_eq!(store.location_index(), 1);
    assert_eq!(store.log_type_index(), 2);

    assert!(!store.set_access_key(Some("AC")));
    assert!(!store.set_secret_key(Some("SE")));
    assert!(!store.set_vault_key(Some("VA")));
    assert!(!store.set_location_index(1));
    assert!(!store.set_log_type_index(2));
}

#[test]
fn setters_sanitize_none() {
    let mut store = PropertyStore::load(fixture_dir());

    assert!(store.set_access_key(None));
    assert!(store.set_secret_key(None));
    assert!(store.set_vault_key(None));

    assert_eq!(store.access_key(), Some(""));
    assert_eq!(store.secret_key(), Some(""));
    assert_eq!(store.vault_key(), Some(""));

    assert!(!store.set_access_key(None));
    assert!(!store.set_secret_key(None));
    assert!(!store.set_vault_key(None));
}

#[test]
fn clearing_an_absent_value_is_not_a_change() {
    let dir = tempdir().unwrap();
    let mut store = PropertyStore::load(dir.path());
    assert!(!store.set_vault_key(None));
    assert!(!store.set_vault_key(Some("   ")));
    assert_eq!(store.vault_key(), None);
}

#[test]
fn setters_trim_strings() {
    let mut store = PropertyStore::load(fixture_dir());

    assert!(store.set_access_key(Some(" AC ")));
    assert!(store.set_secret_key(Some(" SE ")));
    assert!(store.set_vault_key(Some(" VA ")));

    assert_eq!(store.access_key(), Some("AC"));
    assert_eq!(store.secret_key(), Some("SE"));
    assert_eq!(store.vault_key(), Some("VA"));

    assert!(!store.set_access_key(Some("AC")));
    assert!(!store.set_secret_key(Some(" SE")));
    assert!(!store.set_vault_key(Some("VA ")));
}

#[test]
fn save_then_reload_round_trips() {
    let dir = tempdir().unwrap();
    let mut store = PropertyStore::load(dir.path());
    store.set_access_key(Some("AC"));
    store.set_secret_key(Some("SE"));
    store.set_vault_key(Some("VA"));
    store.set_location_index(3);
    store.set_log_type_index(4);
    store.save();

    let raw = fs::read_to_string(dir.path().join(PROPERTIES_FILE_NAME)).unwrap();
    assert!(raw.lines().any(|l| l == "accessKey=AC"));
    assert!(raw.lines().any(|l| l == "locationSet=3"));

    let reloaded = PropertyStore::load(dir.path());
    assert_eq!(reloaded.access_key(), Some("AC"));
    assert_eq!(reloaded.secret_key(), Some("SE"));
    assert_eq!(reloaded.vault_key(), Some("VA"));
    assert_eq!(reloaded.location_index(), 3);
    assert_eq!(reloaded.log_type_index(), 4);
}
