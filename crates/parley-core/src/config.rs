use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const APP_DIR: &str = "parley";
const PREFERENCES_FILE: &str = "preferences.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid preferences in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    pub config_dir: PathBuf,
}

impl CoreConfig {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(data_dir: P, config_dir: Q) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            config_dir: config_dir.as_ref().to_path_buf(),
        }
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.config_dir.join(PREFERENCES_FILE)
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("parley_data"));
        let config_dir = dirs::config_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| data_dir.clone());
        Self::new(data_dir, config_dir)
    }
}

fn default_true() -> bool {
    true
}

fn default_compact_width() -> u16 {
    80
}

/// User preferences persisted as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Tag-grouped list when true, recency-grouped list otherwise.
    #[serde(default = "default_true")]
    pub tag_group_rooms: bool,
    /// Terminal widths at or below this use a single-pane layout.
    #[serde(default = "default_compact_width")]
    pub compact_width: u16,
    #[serde(default)]
    pub disable_notifications: bool,
    #[serde(default = "default_true")]
    pub notify_sound: bool,
    #[serde(default)]
    pub hide_room_list: bool,
    #[serde(default)]
    pub disable_typing_notifs: bool,
    #[serde(default)]
    pub led_alerts: bool,
    /// Own user id; messages from it never raise unread state.
    #[serde(default)]
    pub user_id: String,
    /// Last open conversation, restored at startup.
    #[serde(default)]
    pub last_room: Option<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            tag_group_rooms: true,
            compact_width: default_compact_width(),
            disable_notifications: false,
            notify_sound: true,
            hide_room_list: false,
            disable_typing_notifs: false,
            led_alerts: false,
            user_id: String::new(),
            last_room: None,
        }
    }
}

impl Preferences {
    /// Loads preferences, returning defaults when the file does not exist yet.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
