use crate::error::{Result, RosterError};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClubConfig {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Relative paths are resolved against the club root.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from(paths::DEFAULT_DB_FILE)
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3141
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Buffered change notifications per subscriber before it lags.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    64
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: u32,
    pub club: ClubConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

impl Config {
    pub fn new(club_name: impl Into<String>) -> Self {
        Self {
            version: CONFIG_VERSION,
            club: ClubConfig {
                name: club_name.into(),
            },
            store: StoreConfig::default(),
            server: ServerConfig::default(),
            events: EventsConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(RosterError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Absolute location of the roster database for this club.
    pub fn db_path(&self, root: &Path) -> PathBuf {
        paths::resolve_db_path(root, &self.store.path)
    }

    /// Channel capacity with a floor of one; broadcast channels reject zero.
    pub fn channel_capacity(&self) -> usize {
        self.events.channel_capacity.max(1)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.version != CONFIG_VERSION {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "unsupported config version {} (expected {CONFIG_VERSION})",
                    self.version
                ),
            });
        }

        if self.club.name.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "club.name is empty".to_string(),
            });
        }

        if self.store.path.as_os_str().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "store.path is empty".to_string(),
            });
        }

        if self.events.channel_capacity == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "events.channel_capacity is 0; using 1".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::new("Leões FC");
        cfg.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.club.name, "Leões FC");
        assert_eq!(loaded.server.port, 3141);
        assert_eq!(loaded.events.channel_capacity, 64);
        assert_eq!(
            loaded.db_path(dir.path()),
            dir.path().join(".quadra/roster.db")
        );
    }

    #[test]
    fn load_without_config_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(RosterError::NotInitialized)
        ));
    }

    #[test]
    fn missing_sections_use_defaults() {
        let dir = TempDir::new().unwrap();
        crate::io::atomic_write(
            &paths::config_path(dir.path()),
            b"version: 1\nclub:\n  name: Tigres\n",
        )
        .unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.store.path, PathBuf::from(".quadra/roster.db"));
        assert_eq!(cfg.server.port, 3141);
    }

    #[test]
    fn validate_flags_bad_values() {
        let mut cfg = Config::new("");
        cfg.version = 7;
        cfg.events.channel_capacity = 0;
        cfg.store.path = PathBuf::new();

        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 4);
        assert_eq!(
            warnings.iter().filter(|w| w.level == WarnLevel::Error).count(),
            2
        );
        assert_eq!(cfg.channel_capacity(), 1);
    }

    #[test]
    fn default_config_is_clean() {
        assert!(Config::new("Tigres").validate().is_empty());
    }
}
