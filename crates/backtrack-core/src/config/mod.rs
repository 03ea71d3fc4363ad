use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::BacktrackError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub backup: BackupSettings,
    #[serde(default)]
    pub log: LogSettings,
}

/// On-disk layout of conversation backups, plus the retention default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupSettings {
    /// Name of the backup directory under the project root.
    pub directory_name: String,
    pub directory_prefix: String,
    pub directory_suffix: String,
    /// Suffix marking a snapshot of a file that did not exist before the conversation.
    pub new_file_marker: String,
    pub keep_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            directory_name: ".backup".to_string(),
            directory_prefix: "conversation-".to_string(),
            directory_suffix: "-backup".to_string(),
            new_file_marker: ".init".to_string(),
            keep_count: 10,
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl BackupSettings {
    /// Extract the conversation id from a snapshot directory name.
    ///
    /// Returns `None` unless the name carries both the prefix and the suffix
    /// with a non-empty id between them.
    pub fn parse_directory_name(&self, name: &str) -> Option<String> {
        let id = name
            .strip_prefix(&self.directory_prefix)?
            .strip_suffix(&self.directory_suffix)?;
        if id.is_empty() {
            None
        } else {
            Some(id.to_string())
        }
    }

    pub fn directory_name_for(&self, conversation_id: &str) -> String {
        format!(
            "{}{}{}",
            self.directory_prefix, conversation_id, self.directory_suffix
        )
    }

    /// Strip the new-file marker from a snapshot file name.
    ///
    /// A file named exactly like the marker is not treated as marked.
    pub fn strip_new_file_marker<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        file_name
            .strip_suffix(&self.new_file_marker)
            .filter(|stem| !stem.is_empty())
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("backtrack")
            .join("config.toml")
    }

    /// Load settings from the default location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(settings) => return settings,
                Err(e) => tracing::warn!("Ignoring {}: {}", config_path.display(), e),
            }
        }
        Self::default()
    }

    pub fn load_from(path: &Path) -> Result<Self, BacktrackError> {
        let content = std::fs::read_to_string(path)?;
        let settings = toml::from_str(&content)?;
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), BacktrackError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| BacktrackError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
