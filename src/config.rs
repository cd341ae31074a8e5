use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub strings: Strings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DataConfig {
    /// `http(s)://` URL or a local path to the card document.
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_source() -> String {
    "data.json".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub directory: Option<String>,
    pub retention_days: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HostConfig {
    #[serde(default = "default_header_color")]
    pub header_color: String,
}

fn default_header_color() -> String {
    "#0f0f0f".to_string()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            header_color: default_header_color(),
        }
    }
}

/// User-visible strings. Every field can be overridden from `[strings]`,
/// which is how the page gets localized.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Strings {
    pub instruction_title: String,
    pub instructions_unavailable: String,
    pub copy_label: String,
    pub copied: String,
    pub load_error: String,
    pub format_error: String,
}

impl Default for Strings {
    fn default() -> Self {
        Self {
            instruction_title: "Instructions".to_string(),
            instructions_unavailable: "Instructions unavailable".to_string(),
            copy_label: "Copy".to_string(),
            copied: "Copied".to_string(),
            load_error: "Error loading data".to_string(),
            format_error: "Error: invalid data format".to_string(),
        }
    }
}

impl Config {
    pub fn load_with_path() -> Result<(Self, Option<PathBuf>)> {
        let mut candidates = Vec::new();

        if let Ok(explicit) = std::env::var("CARDVIEW_CONFIG") {
            candidates.push(PathBuf::from(explicit));
        }

        candidates.push(PathBuf::from("cardview.toml"));

        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("cardview").join("cardview.toml"));
        }

        if let Some(dir) = dirs::data_dir() {
            candidates.push(dir.join("cardview").join("cardview.toml"));
        }

        for path in candidates {
            if path.exists() {
                let content = fs::read_to_string(&path)?;
                let config = Self::from_toml(&content)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((Config::default(), None))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.data.source.trim().is_empty() {
            anyhow::bail!("data.source cannot be empty");
        }
        if self.data.timeout_secs == 0 {
            anyhow::bail!("data.timeout_secs must be greater than 0");
        }
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }
        Ok(())
    }
}
