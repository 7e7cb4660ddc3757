//! Integration tests for Settings loading with layered merge semantics.
//!
//! These tests run without a global config (temp directories only), so the
//! local `.teamtree.toml` merges onto compiled defaults.
//!
//! Environment variables are process-wide: every test holds `ENV_LOCK` so
//! `TEAMTREE_*` overrides set by one test never leak into another.

use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use tempfile::TempDir;

use teamtree::config::{local_config_path, Settings};
use teamtree::domain::LayoutConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Sets an environment variable for the lifetime of the guard.
struct EnvVar(&'static str);

impl EnvVar {
    fn set(key: &'static str, value: impl AsRef<std::ffi::OsStr>) -> Self {
        std::env::set_var(key, value);
        Self(key)
    }
}

impl Drop for EnvVar {
    fn drop(&mut self) {
        std::env::remove_var(self.0);
    }
}

#[test]
fn given_local_config_when_load_then_overrides_defaults() {
    let _lock = env_lock();
    // Arrange
    let data_dir = TempDir::new().unwrap();
    let local = r#"
exclude_id = "admin-uid"

[layout]
row_height = 60.0
sibling_gap = 0.0
"#;
    fs::write(local_config_path(data_dir.path()), local).unwrap();

    // Act
    let settings = Settings::load(Some(data_dir.path())).expect("load settings");

    // Assert
    assert_eq!(settings.exclude_id.as_deref(), Some("admin-uid"));
    assert_eq!(settings.layout.row_height, 60.0);
    assert_eq!(settings.layout.sibling_gap, 0.0);
    assert_eq!(
        settings.layout.horizontal_unit,
        LayoutConfig::default().horizontal_unit
    );
}

#[test]
fn given_data_dir_in_local_config_when_load_then_cli_dir_wins() {
    let _lock = env_lock();
    let data_dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(data_dir.path()),
        "data_dir = \"/somewhere/else\"\n",
    )
    .unwrap();

    let settings = Settings::load(Some(data_dir.path())).unwrap();

    assert_eq!(settings.data_dir, data_dir.path().to_path_buf());
}

#[test]
fn given_no_local_config_when_load_then_uses_defaults() {
    let _lock = env_lock();
    let data_dir = TempDir::new().unwrap();

    let settings = Settings::load(Some(data_dir.path())).unwrap();

    assert_eq!(settings.layout_config(), LayoutConfig::default());
    assert!(settings.exclude_id.is_none());
}

#[test]
fn given_malformed_local_config_when_load_then_config_error() {
    let _lock = env_lock();
    let data_dir = TempDir::new().unwrap();
    fs::write(local_config_path(data_dir.path()), "[layout\nrow_height = ").unwrap();

    let err = Settings::load(Some(data_dir.path())).unwrap_err();

    assert!(err.to_string().starts_with("config error"));
}

#[test]
fn given_loaded_settings_when_printing_then_toml_contains_sections() {
    let _lock = env_lock();
    let data_dir = TempDir::new().unwrap();

    let toml = Settings::load(Some(data_dir.path()))
        .unwrap()
        .to_toml()
        .unwrap();

    assert!(toml.contains("[layout]"));
    assert!(toml.contains("row_height"));
    let expected: PathBuf = data_dir.path().to_path_buf();
    assert!(toml.contains(expected.to_string_lossy().as_ref()));
}

#[test]
fn given_env_row_height_when_load_then_overrides_local_config() {
    let _lock = env_lock();
    // Arrange
    let data_dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(data_dir.path()),
        "[layout]\nrow_height = 60.0\nfollower_gap = 30.0\n",
    )
    .unwrap();
    let _row = EnvVar::set("TEAMTREE_LAYOUT__ROW_HEIGHT", "100");

    // Act
    let settings = Settings::load(Some(data_dir.path())).unwrap();

    // Assert
    assert_eq!(settings.layout.row_height, 100.0);
    assert_eq!(settings.layout.follower_gap, 30.0);
}

#[test]
fn given_env_exclude_id_when_load_then_overrides_local_config() {
    let _lock = env_lock();
    let data_dir = TempDir::new().unwrap();
    fs::write(local_config_path(data_dir.path()), "exclude_id = \"admin\"\n").unwrap();
    let _exclude = EnvVar::set("TEAMTREE_EXCLUDE_ID", "viewer");

    let settings = Settings::load(Some(data_dir.path())).unwrap();

    assert_eq!(settings.exclude_id.as_deref(), Some("viewer"));
}

#[test]
fn given_env_data_dir_when_load_then_reads_local_config_there() {
    let _lock = env_lock();
    let data_dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(data_dir.path()),
        "[layout]\nsibling_gap = 5.0\n",
    )
    .unwrap();
    let _dir = EnvVar::set("TEAMTREE_DATA_DIR", data_dir.path());

    let settings = Settings::load(None).unwrap();

    assert_eq!(settings.data_dir, data_dir.path().to_path_buf());
    assert_eq!(settings.layout.sibling_gap, 5.0);
}

#[test]
fn given_non_numeric_env_layout_value_when_load_then_config_error() {
    let _lock = env_lock();
    let data_dir = TempDir::new().unwrap();
    let _row = EnvVar::set("TEAMTREE_LAYOUT__ROW_HEIGHT", "abc");

    let err = Settings::load(Some(data_dir.path())).unwrap_err();

    let message = err.to_string();
    assert!(message.starts_with("config error"), "{message}");
    assert!(message.contains("layout.row_height"), "{message}");
}
