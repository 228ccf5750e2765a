//! Configuration management for rill.
//!
//! Configuration is read from `~/.config/rill/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

pub mod colors;
pub mod column;
pub mod keybindings;

pub use colors::ColorConfig;
pub use column::{ListConfig, MarkReadConfig, ScrollSeekConfig};
pub use keybindings::KeybindingConfig;

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::constants::APP_NAME;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub colors: ColorConfig,
    pub keybindings: KeybindingConfig,
    pub list: ListConfig,
    pub scroll_seek: ScrollSeekConfig,
    pub mark_read: MarkReadConfig,
    pub general: GeneralConfig,
    pub user: UserConfig,
    pub translation: TranslationConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Start with only unread entries listed.
    pub unread_only: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Matched against a feed's owner to offer a full resync.
    pub id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Translation is disabled without an endpoint.
    pub endpoint: Option<String>,
    pub language: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            language: "en".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject combinations the column cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let seek = &self.scroll_seek;
        if !(seek.enter_velocity > seek.exit_velocity) {
            return Err(ConfigError::Invalid(format!(
                "scroll_seek.enter_velocity ({}) must be greater than exit_velocity ({})",
                seek.enter_velocity, seek.exit_velocity
            )));
        }
        if seek.exit_velocity < 0.0 {
            return Err(ConfigError::Invalid(
                "scroll_seek.exit_velocity must not be negative".to_string(),
            ));
        }
        if self.list.page_size == 0 {
            return Err(ConfigError::Invalid(
                "list.page_size must be at least 1".to_string(),
            ));
        }
        if let Some(endpoint) = &self.translation.endpoint {
            url::Url::parse(endpoint).map_err(|e| {
                ConfigError::Invalid(format!("translation.endpoint {}: {}", endpoint, e))
            })?;
        }
        Ok(())
    }

    /// Get the default config file path: `~/.config/rill/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(APP_NAME).join("config.toml"))
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# rill configuration
#
# Colors can be specified as:
# - Named colors: Black, Red, Green, Yellow, Blue, Magenta, Cyan, Gray,
#   DarkGray, LightRed, LightGreen, LightYellow, LightBlue, LightMagenta,
#   LightCyan, White, Reset
# - Hex colors: "#RRGGBB" or "#RGB"
#
# Keybindings can be specified as:
# - Single characters: "a", "A", "1"
# - Special keys: Enter, Tab, BackTab, Backspace, Delete, Home, End,
#   PageUp, PageDown, Up, Down, Left, Right, Esc, Space, F1-F12
# - With modifiers: "Ctrl+c", "Shift+Tab", "Alt+Enter"
#
# PageUp, PageDown, Home, End and the mouse wheel always scroll the entry
# list directly.

[colors]
active_border = "Cyan"
inactive_border = "DarkGray"
selection_bg_active = "Cyan"
selection_fg_active = "Black"
selection_bg_inactive = "DarkGray"
selection_fg_inactive = "White"
read_item = "DarkGray"
unread_item = "White"
metadata_author = "Yellow"
metadata_date = "Yellow"
metadata_link = "Blue"
status_fg = "White"
status_bg = "DarkGray"
# Entry column
accent = "LightCyan"
starred = "Yellow"
separator = "Magenta"
placeholder = "DarkGray"

[keybindings]
quit = ["q", "Ctrl+c"]
move_up = ["k", "Up"]
move_down = ["j", "Down"]
next_pane = ["Tab"]
prev_pane = ["BackTab", "Shift+Tab"]
select = ["Enter"]
clear_selection = ["Esc"]
toggle_read = ["r"]
toggle_star = ["s"]
open_in_browser = ["o"]
refresh = ["R"]
update_all = ["U"]
toggle_unread_only = ["u"]
mark_all_read = ["A"]
next_view = ["]"]
prev_view = ["["]
translate = ["t"]
toggle_maximize = ["m"]
delete_feed = ["d", "Delete"]

[list]
# Lines rendered beyond each edge of the viewport
overscan = 2
# Load more once the rendered rows end within this many rows of the last one
end_reached_threshold = 5
page_size = 30
# Delay before the loading row below the list appears
skeleton_delay_ms = 150

[scroll_seek]
# Rows per second. Placeholders are drawn above enter_velocity and real rows
# return below exit_velocity. enter_velocity must be greater.
enter_velocity = 60.0
exit_velocity = 20.0
settle_ms = 150

[mark_read]
# render: rows that stayed visible for dwell_ms
# scroll: rows scrolled past the top of the list
# off:    only entries you open
policy = "render"
dwell_ms = 1000

[general]
unread_only = false

[user]
# id = "me"

[translation]
# endpoint = "http://localhost:5000/translate"
language = "en"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
