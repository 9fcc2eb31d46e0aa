use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: Server,
    pub upstream: UpstreamConfig,
    pub cache: CacheSection,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

/// The single site origin the gateway fronts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Origin base, e.g. `http://127.0.0.1:8080`
    pub origin: String,
    /// Per-request timeout for origin fetches
    pub request_timeout_secs: u64,
}

/// Cache generation settings: where entries live, which version tag is
/// current, and which assets get pre-populated at install time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub directory: PathBuf,
    /// Version tag of the current generation; all others are pruned on activate
    pub version: String,
    /// Paths fetched and stored before the gateway starts serving
    pub core_assets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 15580,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            origin: "http://127.0.0.1:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./data/cache"),
            version: "quiz-app-v1".to_string(),
            core_assets: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/questions.json".to_string(),
            ],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from YAML file; missing fields fall back to
    /// their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ServerConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Get server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
