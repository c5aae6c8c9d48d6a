use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

/// Names the JSON config file to load. Unset means built-in defaults.
pub const CONFIG_ENV_VAR: &str = "CONTENTLENS_CONFIG";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

/// Loads the file named by `CONTENTLENS_CONFIG`, or validated defaults when unset.
pub fn load_from_env() -> Result<Config, ConfigError> {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(path) if !path.is_empty() => load_config(path),
        _ => {
            let config = Config::default();
            validate_config(&config)?;
            Ok(config)
        }
    }
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.limits.max_upload_bytes == 0 {
        return Err(invalid("limits.maxUploadBytes must be greater than zero"));
    }

    if config.generation.timeout_secs == 0 {
        return Err(invalid("generation.timeoutSecs must be greater than zero"));
    }

    if config.generation.model.trim().is_empty() {
        return Err(invalid("generation.model must not be empty"));
    }

    if config.generation.api_base.trim().is_empty() {
        return Err(invalid("generation.apiBase must not be empty"));
    }

    // Upload names are `<id>_<name>` and result names `<id>_result.md`; sharing
    // a directory would let an upload called `result.md` collide with a result.
    if config.storage.upload_directory == config.storage.result_directory {
        return Err(invalid(
            "storage.uploadDirectory and storage.resultDirectory must differ",
        ));
    }

    if config.server.host.trim().is_empty() {
        return Err(invalid("server.host must not be empty"));
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Validation {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_load_valid_config() {
        let config_json = r#"
        {
            "server": { "host": "0.0.0.0", "port": 8080 },
            "storage": {
                "uploadDirectory": "/var/lib/contentlens/uploads",
                "resultDirectory": "/var/lib/contentlens/results"
            },
            "limits": { "maxUploadBytes": 2048 },
            "generation": { "model": "gemini-1.5-pro" },
            "logging": { "level": "debug", "json": true }
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.limits.max_upload_bytes, 2048);
        assert_eq!(config.generation.model, "gemini-1.5-pro");
        assert!(config.logging.json);
    }

    #[test]
    fn test_rejects_zero_upload_limit() {
        let result = load_config_from_str(r#"{ "limits": { "maxUploadBytes": 0 } }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let result = load_config_from_str(r#"{ "generation": { "timeoutSecs": 0 } }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_rejects_empty_model() {
        let result = load_config_from_str(r#"{ "generation": { "model": "  " } }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_rejects_shared_directories() {
        let result = load_config_from_str(
            r#"{ "storage": { "uploadDirectory": "work", "resultDirectory": "work" } }"#,
        );
        let err = result.unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn test_invalid_json() {
        let result = load_config_from_str("{ not json");
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = load_config("/nonexistent/contentlens.json");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    #[serial]
    fn test_load_from_env_defaults_when_unset() {
        std::env::remove_var(CONFIG_ENV_VAR);
        let config = load_from_env().unwrap();
        assert_eq!(config.server.port, 5001);
    }

    #[test]
    #[serial]
    fn test_load_from_env_reads_named_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "server": {{ "port": 6001 }} }}"#).unwrap();

        std::env::set_var(CONFIG_ENV_VAR, file.path());
        let config = load_from_env().unwrap();
        std::env::remove_var(CONFIG_ENV_VAR);

        assert_eq!(config.server.port, 6001);
    }
}
