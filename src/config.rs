//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/teamtree/teamtree.toml`
//! 3. Local config: `<data_dir>/.teamtree.toml`
//! 4. Environment variables: `TEAMTREE_*` prefix (`__` separates sections)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::LayoutConfig;

/// Layout spacing, mirrors [`LayoutConfig`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutSettings {
    pub horizontal_unit: f64,
    pub row_height: f64,
    pub follower_gap: f64,
    pub sibling_gap: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        let d = LayoutConfig::default();
        Self {
            horizontal_unit: d.horizontal_unit,
            row_height: d.row_height,
            follower_gap: d.follower_gap,
            sibling_gap: d.sibling_gap,
        }
    }
}

impl From<LayoutSettings> for LayoutConfig {
    fn from(s: LayoutSettings) -> Self {
        Self {
            horizontal_unit: s.horizontal_unit,
            row_height: s.row_height,
            follower_gap: s.follower_gap,
            sibling_gap: s.sibling_gap,
        }
    }
}

/// Raw layout settings for intermediate parsing (None = not specified).
#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(default)]
pub struct RawLayoutSettings {
    pub horizontal_unit: Option<f64>,
    pub row_height: Option<f64>,
    pub follower_gap: Option<f64>,
    pub sibling_gap: Option<f64>,
}

impl LayoutSettings {
    /// Overlay wins field by field when specified.
    pub fn merge(&self, overlay: &RawLayoutSettings) -> Self {
        Self {
            horizontal_unit: overlay.horizontal_unit.unwrap_or(self.horizontal_unit),
            row_height: overlay.row_height.unwrap_or(self.row_height),
            follower_gap: overlay.follower_gap.unwrap_or(self.follower_gap),
            sibling_gap: overlay.sibling_gap.unwrap_or(self.sibling_gap),
        }
    }
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_dir: Option<PathBuf>,
    pub exclude_id: Option<String>,
    pub layout: RawLayoutSettings,
}

/// Unified configuration for teamtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding campaign export files (default: ~/.teamtree/campaigns)
    pub data_dir: PathBuf,
    /// Participant hidden from every hierarchy, e.g. the viewing administrator
    pub exclude_id: Option<String>,
    pub layout: LayoutSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            exclude_id: None,
            layout: LayoutSettings::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".teamtree").join("campaigns"))
        .unwrap_or_else(|| PathBuf::from("~/.teamtree/campaigns"))
}

/// Get the XDG config directory for teamtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "teamtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("teamtree.toml"))
}

/// Get the path to the local config file in a data directory.
pub fn local_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(".teamtree.toml")
}

/// Expand `~`, `$VAR` and `${VAR}` in a path string.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    pub fn layout_config(&self) -> LayoutConfig {
        self.layout.into()
    }

    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.data_dir.to_string_lossy().as_ref());
        self.data_dir = PathBuf::from(expanded);
    }

    /// Overlay wins for every value it specifies.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_dir: overlay
                .data_dir
                .clone()
                .unwrap_or_else(|| self.data_dir.clone()),
            exclude_id: overlay
                .exclude_id
                .clone()
                .or_else(|| self.exclude_id.clone()),
            layout: self.layout.merge(&overlay.layout),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `data_dir` - Data directory given on the command line. It selects the
    ///   local config file and wins over every configured `data_dir`.
    pub fn load(data_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        let env = env_source()?;

        // 3. Local config next to the campaign files, an env data_dir selects it too
        let local_dir = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => env
                .get_string("data_dir")
                .map(PathBuf::from)
                .unwrap_or_else(|_| current.data_dir.clone()),
        };
        let local_dir = PathBuf::from(expand_env_vars(local_dir.to_string_lossy().as_ref()));
        let local_path = local_config_path(&local_dir);
        if local_path.exists() {
            let raw = load_raw_settings(&local_path)?;
            current = current.merge_with(&raw);
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current, &env)?;

        if let Some(dir) = data_dir {
            current.data_dir = dir.to_path_buf();
        }
        current.expand_paths();

        Ok(current)
    }

    /// Apply TEAMTREE_* environment variables as explicit overrides.
    ///
    /// A layout value that is set but not a number is an error.
    fn apply_env_overrides(mut settings: Self, env: &Config) -> Result<Self, ApplicationError> {
        if let Ok(val) = env.get_string("data_dir") {
            settings.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = env.get_string("exclude_id") {
            settings.exclude_id = Some(val).filter(|v| !v.is_empty());
        }
        let layout = RawLayoutSettings {
            horizontal_unit: env_float(env, "layout.horizontal_unit")?,
            row_height: env_float(env, "layout.row_height")?,
            follower_gap: env_float(env, "layout.follower_gap")?,
            sibling_gap: env_float(env, "layout.sibling_gap")?,
        };
        settings.layout = settings.layout.merge(&layout);

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# teamtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/teamtree/teamtree.toml
#   Local:  <data_dir>/.teamtree.toml
#   Env:    TEAMTREE_* environment variables (TEAMTREE_LAYOUT__ROW_HEIGHT=60)

# Directory holding campaign export files (*.json)
# data_dir = "~/.teamtree/campaigns"

# Participant hidden from every hierarchy (e.g. the viewing administrator)
# exclude_id = "admin-uid"

[layout]
# Horizontal distance between hierarchy levels
# horizontal_unit = 250.0

# Vertical space of one multiplier row
# row_height = 80.0

# Vertical space of one follower row
# follower_gap = 40.0

# Gap between sibling subtrees
# sibling_gap = 20.0
"#
        .to_string()
    }
}

/// `TEAMTREE_X` maps to `x`, `TEAMTREE_LAYOUT__ROW_HEIGHT` to `layout.row_height`.
fn env_source() -> Result<Config, ApplicationError> {
    Config::builder()
        .add_source(
            Environment::with_prefix("TEAMTREE")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .map_err(config_err)
}

fn env_float(env: &Config, key: &str) -> Result<Option<f64>, ApplicationError> {
    match env.get_float(key) {
        Ok(value) => Ok(Some(value)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(ApplicationError::Config {
            message: format!("environment override {}: {}", key, e),
        }),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
