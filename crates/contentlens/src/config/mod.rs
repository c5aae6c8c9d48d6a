pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_from_str, load_from_env, validate_config, CONFIG_ENV_VAR};
pub use schema::{
    Config, DownloadConfig, GenerationConfig, LimitsConfig, LoggingConfig, RetentionConfig,
    ServerConfig, StorageConfig, DEFAULT_MAX_UPLOAD_BYTES,
};
