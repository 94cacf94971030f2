use agios_graph::PipelineConfig;
use agios_llm::GeminiConfig;
use agios_tools::ToolsConfig;
use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub gemini_api_key: String,
    #[serde(default)]
    pub mongodb_uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for any request, streams included
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    300
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    #[serde(default)]
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl LlmConfig {
    pub fn gemini(&self, api_key: &str) -> GeminiConfig {
        let config = GeminiConfig::new(api_key)
            .with_model(&self.model)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        match &self.base_url {
            Some(url) => config.with_base_url(url),
            None => config,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Mongodb,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub upload_dir: PathBuf,
    pub mongodb_database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables, `AGIOS_<SECTION>__<KEY>` (e.g. `AGIOS_SERVER__PORT`)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("AGIOS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;
        cfg.apply_secrets(|name| std::env::var(name).ok())?;

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        builder.build()?.try_deserialize()
    }

    /// Fill secrets that never live in files
    pub fn apply_secrets(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        self.gemini_api_key = lookup("GEMINI_API_KEY")
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::Message("GEMINI_API_KEY environment variable is required".to_string()))?;

        match lookup("GOOGLE_MAP_KEY") {
            Some(key) => self.tools.places.api_key = key,
            None => tracing::warn!("GOOGLE_MAP_KEY not set, nearby places will fall back to search"),
        }
        match lookup("TAVILY_API_KEY") {
            Some(key) => self.tools.search.api_key = key,
            None => tracing::warn!("TAVILY_API_KEY not set, web search will fail"),
        }

        self.mongodb_uri = lookup("MONGODB_URI");
        if self.storage.backend == StorageBackend::Mongodb && self.mongodb_uri.is_none() {
            return Err(ConfigError::Message(
                "MONGODB_URI environment variable is required for the mongodb backend".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 3000

        [cors]
        enabled = true
        origins = ["http://localhost:3000"]

        [llm]
        model = "gemini-1.5-flash"
        timeout_secs = 30

        [tools.places]
        radius_m = 800

        [tools.default_location]
        city = "Lisbon"
        latitude = 38.72
        longitude = -9.14

        [storage]
        backend = "mongodb"
        upload_dir = "uploads"
        mongodb_database = "agios"

        [logging]
        level = "debug"
        format = "json"
    "#;

    #[test]
    fn test_config_structure() {
        let config: Config = toml::from_str(TOML).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.request_timeout(), Duration::from_secs(300));
        assert_eq!(config.storage.backend, StorageBackend::Mongodb);
        assert_eq!(config.tools.places.radius_m, 800);
        assert_eq!(config.tools.places.max_results, 10);
        assert_eq!(config.tools.default_location.city, "Lisbon");
        assert_eq!(config.pipeline.channel_capacity, PipelineConfig::default().channel_capacity);
    }

    #[test]
    fn test_secrets_come_from_lookup() {
        let mut config: Config = toml::from_str(TOML).unwrap();
        let env = |name: &str| match name {
            "GEMINI_API_KEY" => Some("g".to_string()),
            "TAVILY_API_KEY" => Some("t".to_string()),
            "MONGODB_URI" => Some("mongodb://localhost".to_string()),
            _ => None,
        };

        config.apply_secrets(env).unwrap();
        assert_eq!(config.gemini_api_key, "g");
        assert_eq!(config.tools.search.api_key, "t");
        assert!(config.tools.places.api_key.is_empty());
        assert_eq!(config.llm.gemini(&config.gemini_api_key).model, "gemini-1.5-flash");
    }

    #[test]
    fn test_mongodb_backend_requires_uri() {
        let mut config: Config = toml::from_str(TOML).unwrap();
        let err = config
            .apply_secrets(|name| (name == "GEMINI_API_KEY").then(|| "g".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("MONGODB_URI"));
    }

    #[test]
    fn test_default_file_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml");
        let config = Config::from_file(path).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
    }
}
