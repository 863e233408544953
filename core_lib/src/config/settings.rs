use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

pub const DEFAULT_ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
    "text/plain",
    "application/json",
    "text/csv",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Externally visible origin used to build `filePath` in upload responses.
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub max_file_size_bytes: u64,
    pub max_files: usize,
    pub allowed_mime_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            max_files: 1,
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|mime| mime.to_string())
                .collect(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { token: None }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl AuthConfig {
    /// The shared bearer secret. An empty value counts as unset.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|token| !token.is_empty())
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(std::env::vars().collect())
    }

    /// Layers defaults, an optional `config.toml`, `APP__SECTION__KEY`
    /// variables and finally the flat well-known variables from `vars`.
    pub fn load_from(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?);

        if std::path::Path::new("config.toml").exists() {
            builder = builder.add_source(File::with_name("config"));
        }

        builder = builder.add_source(
            Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("storage.allowed_mime_types")
                .source(Some(vars.clone())),
        );

        let port = match vars.get("PORT") {
            Some(raw) => Some(raw.trim().parse::<u16>().map_err(|_| {
                ConfigError::Message(format!("PORT must be a valid port number, got '{}'", raw))
            })?),
            None => None,
        };

        builder = builder
            .set_override_option("server.port", port.map(i64::from))?
            .set_override_option("server.base_url", vars.get("BASE_URL").cloned())?
            .set_override_option("storage.upload_dir", vars.get("UPLOAD_DIR").cloned())?
            .set_override_option("auth.token", vars.get("AUTH_TOKEN").cloned())?
            .set_override_option("logging.level", vars.get("LOG_LEVEL").cloned())?
            .set_override_option(
                "logging.format",
                vars.get("LOG_FORMAT").map(|format| format.to_lowercase()),
            )?;

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.server.base_url.trim().is_empty() {
            return Err(ConfigError::Message("Base URL cannot be empty".to_string()));
        }

        if self.storage.max_file_size_bytes == 0 {
            return Err(ConfigError::Message(
                "Max file size must be greater than 0".to_string(),
            ));
        }

        if self.storage.max_files == 0 {
            return Err(ConfigError::Message(
                "Max files per request must be greater than 0".to_string(),
            ));
        }

        if self.storage.allowed_mime_types.is_empty() {
            return Err(ConfigError::Message(
                "Allowed mime types cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn create_directories(&self) -> Result<(), std::io::Error> {
        std::fs::create_dir_all(&self.storage.upload_dir)?;
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn public_file_url(&self, filename: &str) -> String {
        format!("{}/files/{}", self.server.base_url.trim_end_matches('/'), filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.base_url, "http://localhost:3000");
        assert_eq!(config.storage.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.storage.max_file_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.storage.max_files, 1);
        assert_eq!(config.storage.allowed_mime_types.len(), 10);
        assert_eq!(config.logging.level, "info");
        assert!(config.auth.token().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.storage.max_file_size_bytes = 0;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.storage.allowed_mime_types.clear();
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.server.base_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_token_counts_as_unset() {
        let auth = AuthConfig {
            token: Some(String::new()),
        };
        assert!(auth.token().is_none());

        let auth = AuthConfig {
            token: Some("s3cret".to_string()),
        };
        assert_eq!(auth.token(), Some("s3cret"));
    }

    #[test]
    fn test_bind_address_and_public_url() {
        let mut config = AppConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:3000");

        config.server.base_url = "https://files.example.com/".to_string();
        assert_eq!(
            config.public_file_url("abc.png"),
            "https://files.example.com/files/abc.png"
        );
    }

    #[test]
    fn test_load_from_defaults() {
        let config = AppConfig::load_from(HashMap::new()).expect("defaults should load");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.auth.token.is_none());
    }

    #[test]
    fn test_load_from_flat_variables() {
        let config = AppConfig::load_from(vars(&[
            ("PORT", "8080"),
            ("BASE_URL", "https://cdn.example.com"),
            ("UPLOAD_DIR", "/var/lib/files"),
            ("AUTH_TOKEN", "top-secret"),
            ("LOG_LEVEL", "debug"),
            ("LOG_FORMAT", "JSON"),
        ]))
        .expect("flat variables should load");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.base_url, "https://cdn.example.com");
        assert_eq!(config.storage.upload_dir, PathBuf::from("/var/lib/files"));
        assert_eq!(config.auth.token(), Some("top-secret"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_load_from_nested_variables() {
        let config = AppConfig::load_from(vars(&[
            ("APP__STORAGE__MAX_FILE_SIZE_BYTES", "2048"),
            ("APP__SERVER__HOST", "127.0.0.1"),
        ]))
        .expect("nested variables should load");

        assert_eq!(config.storage.max_file_size_bytes, 2048);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_flat_variables_win_over_nested() {
        let config = AppConfig::load_from(vars(&[
            ("APP__SERVER__PORT", "4000"),
            ("PORT", "5000"),
        ]))
        .expect("should load");

        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(AppConfig::load_from(vars(&[("PORT", "not-a-port")])).is_err());
        assert!(AppConfig::load_from(vars(&[("PORT", "0")])).is_err());
    }

    #[test]
    fn test_directory_creation() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.storage.upload_dir = temp_dir.path().join("nested").join("uploads");

        assert!(config.create_directories().is_ok());
        assert!(config.storage.upload_dir.is_dir());
    }
}
