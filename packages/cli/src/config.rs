use folio_editor::EditorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "folio.config.json";

/// Folio configuration file format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Milliseconds between revealed characters when streaming
    #[serde(default = "default_stream_tick_ms")]
    pub stream_tick_ms: u64,

    /// Seconds of inactivity before an autosave
    #[serde(default = "default_autosave_delay_secs")]
    pub autosave_delay_secs: u64,

    #[serde(default = "default_true")]
    pub version_control: bool,

    /// Root of the report API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Visualization script used by the server for charts
    #[serde(default = "default_chart_script")]
    pub chart_script: String,

    #[serde(default = "default_python_program")]
    pub python_program: String,

    #[serde(default = "default_model")]
    pub default_model: String,
}

fn default_stream_tick_ms() -> u64 {
    15
}

fn default_autosave_delay_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_api_url() -> String {
    "http://localhost:3003/api".to_string()
}

fn default_chart_script() -> String {
    "scripts/visualization.py".to_string()
}

fn default_python_program() -> String {
    "python".to_string()
}

fn default_model() -> String {
    "gpt-4".to_string()
}

impl Config {
    pub fn path(cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME)
    }

    /// Load config from a directory; a missing file means defaults
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        Self::load_from(&Self::path(cwd))
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn editor_config(&self) -> EditorConfig {
        let config = EditorConfig::default()
            .with_stream_tick(Duration::from_millis(self.stream_tick_ms))
            .with_autosave_delay(Duration::from_secs(self.autosave_delay_secs));
        if self.version_control {
            config
        } else {
            config.without_version_control()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stream_tick_ms: default_stream_tick_ms(),
            autosave_delay_secs: default_autosave_delay_secs(),
            version_control: true,
            api_url: default_api_url(),
            chart_script: default_chart_script(),
            python_program: default_python_program(),
            default_model: default_model(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "streamTickMs": 5,
            "versionControl": false,
            "apiUrl": "https://reports.example.com/api"
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.stream_tick_ms, 5);
        assert!(!config.version_control);
        assert_eq!(config.api_url, "https://reports.example.com/api");
        assert_eq!(config.autosave_delay_secs, 30);
        assert_eq!(config.default_model, "gpt-4");
    }

    #[test]
    fn test_default_config() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.editor_config(), EditorConfig::default());
    }

    #[test]
    fn test_editor_config_conversion() {
        let config = Config {
            stream_tick_ms: 40,
            version_control: false,
            ..Config::default()
        };
        let editor = config.editor_config();
        assert_eq!(editor.stream_tick, Duration::from_millis(40));
        assert!(!editor.version_control);
    }

    #[test]
    fn test_missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().display().to_string()).unwrap();
        assert_eq!(config, Config::default());
    }
}
