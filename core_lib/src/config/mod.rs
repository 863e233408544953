//! Application configuration

pub mod settings;

pub use settings::{
    AppConfig, AuthConfig, LogFormat, LoggingConfig, ServerConfig, StorageConfig,
    DEFAULT_ALLOWED_MIME_TYPES, DEFAULT_MAX_FILE_SIZE_BYTES,
};
