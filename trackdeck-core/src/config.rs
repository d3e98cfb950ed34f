use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::model::DEFAULT_RECORDING_NAME;
use crate::tracker::TrackerSettings;

/// Largest accepted capacity for the change and event channels
pub const MAX_CHANNEL_CAPACITY: usize = 1 << 16;

/// Root configuration file structure
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DashboardConfig {
    /// Config file version
    #[serde(default = "default_version")]
    pub version: String,

    /// Capacity of each tracker's change broadcast channel
    #[serde(default = "default_change_buffer")]
    pub change_buffer: usize,

    /// Capacity of the bridge event queue feeding the session
    #[serde(default = "default_event_queue")]
    pub event_queue: usize,

    /// Custom strftime format for log timestamps (human format when absent)
    #[serde(default)]
    pub timestamp_format: Option<String>,

    /// Label given to new recordings
    #[serde(default = "default_recording_name")]
    pub recording_name: String,
}

fn default_version() -> String {
    "1".into()
}
fn default_change_buffer() -> usize {
    256
}
fn default_event_queue() -> usize {
    1024
}
fn default_recording_name() -> String {
    DEFAULT_RECORDING_NAME.into()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            change_buffer: default_change_buffer(),
            event_queue: default_event_queue(),
            timestamp_format: None,
            recording_name: default_recording_name(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Invalid { field: &'static str, reason: String },
    NotFound { searched: Vec<PathBuf> },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Yaml(e) => write!(f, "YAML parse error: {}", e),
            Self::Invalid { field, reason } => write!(f, "invalid '{}': {}", field, reason),
            Self::NotFound { searched } => {
                write!(f, "no config file found, searched: {:?}", searched)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Yaml(e)
    }
}

fn check_capacity(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 || value > MAX_CHANNEL_CAPACITY {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("must be between 1 and {}", MAX_CHANNEL_CAPACITY),
        });
    }
    Ok(())
}

impl DashboardConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a string (useful for testing)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: DashboardConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Search for a config file in standard locations
    pub fn discover(start_dir: &Path) -> Result<(PathBuf, Self), ConfigError> {
        let env_path = std::env::var("TRACKDECK_CONFIG").ok().map(PathBuf::from);
        Self::discover_with(start_dir, env_path)
    }

    /// Discovery with an explicit override path standing in for `TRACKDECK_CONFIG`
    pub fn discover_with(
        start_dir: &Path,
        env_path: Option<PathBuf>,
    ) -> Result<(PathBuf, Self), ConfigError> {
        let names = [
            "trackdeck.yaml",
            "trackdeck.yml",
            ".trackdeck.yaml",
            ".trackdeck.yml",
        ];
        let mut searched = Vec::new();

        // Override wins
        if let Some(path) = env_path {
            if path.exists() {
                return Ok((path.clone(), Self::load(&path)?));
            }
            searched.push(path);
        }

        let mut dir = Some(start_dir);
        while let Some(current) = dir {
            for name in &names {
                let path = current.join(name);
                if path.exists() {
                    return Ok((path.clone(), Self::load(&path)?));
                }
                searched.push(path);
            }
            dir = current.parent();
        }

        Err(ConfigError::NotFound { searched })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_capacity("change_buffer", self.change_buffer)?;
        check_capacity("event_queue", self.event_queue)?;
        if self.recording_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "recording_name",
                reason: "must not be empty".into(),
            });
        }
        if let Some(fmt) = &self.timestamp_format {
            if fmt.is_empty() {
                return Err(ConfigError::Invalid {
                    field: "timestamp_format",
                    reason: "must not be empty when set".into(),
                });
            }
            if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
                return Err(ConfigError::Invalid {
                    field: "timestamp_format",
                    reason: format!("'{}' is not a valid strftime format", fmt),
                });
            }
        }
        Ok(())
    }

    /// Settings handed to every tracker registered under this config
    pub fn tracker_settings(&self) -> TrackerSettings {
        TrackerSettings {
            change_buffer: self.change_buffer,
            timestamp_format: self.timestamp_format.clone(),
            recording_name: self.recording_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
version: "1"
change_buffer: 64
event_queue: 32
timestamp_format: "%H:%M:%S"
recording_name: untitled
"#;
        let config = DashboardConfig::from_str(yaml).unwrap();
        assert_eq!(config.change_buffer, 64);
        assert_eq!(config.event_queue, 32);
        assert_eq!(config.timestamp_format.as_deref(), Some("%H:%M:%S"));
        assert_eq!(config.recording_name, "untitled");

        let settings = config.tracker_settings();
        assert_eq!(settings.change_buffer, 64);
        assert_eq!(settings.recording_name, "untitled");
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = DashboardConfig::from_str("version: \"1\"\n").unwrap();
        assert_eq!(config.change_buffer, 256);
        assert_eq!(config.event_queue, 1024);
        assert!(config.timestamp_format.is_none());
        assert_eq!(config.recording_name, "Un-named");
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let result = DashboardConfig::from_str("change_buffer: 0\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "change_buffer",
                ..
            })
        ));
    }

    #[test]
    fn test_blank_recording_name_rejected() {
        let result = DashboardConfig::from_str("recording_name: \"  \"\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "recording_name",
                ..
            })
        ));
    }

    #[test]
    fn test_bad_yaml() {
        let result = DashboardConfig::from_str("change_buffer: [1, 2");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_zero_event_queue_rejected() {
        let result = DashboardConfig::from_str("event_queue: 0\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "event_queue",
                ..
            })
        ));
    }

    #[test]
    fn test_oversized_capacities_rejected() {
        let result = DashboardConfig::from_str("change_buffer: 18446744073709551615\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "change_buffer",
                ..
            })
        ));

        let result = DashboardConfig::from_str("event_queue: 65537\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "event_queue",
                ..
            })
        ));

        let config = DashboardConfig::from_str("change_buffer: 65536\nevent_queue: 65536\n").unwrap();
        assert_eq!(config.change_buffer, MAX_CHANNEL_CAPACITY);
    }

    #[test]
    fn test_invalid_timestamp_format_rejected() {
        let result = DashboardConfig::from_str("timestamp_format: \"%Q\"\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "timestamp_format",
                ..
            })
        ));
        assert!(DashboardConfig::from_str("timestamp_format: \"%Y-%m-%d %H:%M\"\n").is_ok());
    }

    /// Fresh scratch directory tree under the system temp dir
    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("trackdeck-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("app/src")).unwrap();
        dir
    }

    #[test]
    fn test_discover_walks_up_to_parent() {
        let root = scratch_dir("walk");
        std::fs::write(root.join(".trackdeck.yml"), "change_buffer: 8\n").unwrap();

        let (path, config) = DashboardConfig::discover_with(&root.join("app/src"), None).unwrap();
        assert_eq!(path, root.join(".trackdeck.yml"));
        assert_eq!(config.change_buffer, 8);

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_discover_override_wins() {
        let root = scratch_dir("override");
        std::fs::write(root.join("app/trackdeck.yaml"), "change_buffer: 8\n").unwrap();
        let override_path = root.join("custom.yaml");
        std::fs::write(&override_path, "change_buffer: 16\n").unwrap();

        let (path, config) =
            DashboardConfig::discover_with(&root.join("app/src"), Some(override_path.clone()))
                .unwrap();
        assert_eq!(path, override_path);
        assert_eq!(config.change_buffer, 16);

        // a missing override falls back to the directory search
        let (path, _) =
            DashboardConfig::discover_with(&root.join("app/src"), Some(root.join("missing.yaml")))
                .unwrap();
        assert_eq!(path, root.join("app/trackdeck.yaml"));

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_discover_not_found_lists_searched() {
        let root = scratch_dir("missing");
        let missing = root.join("missing.yaml");
        // stop the walk before it reaches directories outside the scratch tree
        let result = DashboardConfig::discover_with(&root.join("app/src"), Some(missing.clone()));
        match result {
            Err(ConfigError::NotFound { searched }) => {
                assert_eq!(searched[0], missing);
                assert!(searched.contains(&root.join("app/src/trackdeck.yaml")));
                assert!(searched.contains(&root.join("app/.trackdeck.yml")));
                assert!(searched.contains(&root.join("trackdeck.yml")));
            }
            Ok((path, _)) => {
                // a config somewhere above the temp dir; only legal outside the scratch tree
                assert!(!path.starts_with(&root));
            }
            Err(e) => panic!("unexpected error: {}", e),
        }

        std::fs::remove_dir_all(&root).unwrap();
    }
}
