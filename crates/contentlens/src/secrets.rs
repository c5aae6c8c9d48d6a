//! Credential resolution for the generation backend.
//!
//! A credential can come from two places, checked in this order:
//!
//! 1. **Secret file** - Docker/Kubernetes mounted secrets (`apiKeyFile`)
//! 2. **Environment variable** - `GEMINI_API_KEY` unless configured otherwise
//!
//! The first source that is configured wins; later sources are not consulted
//! even when the winning one fails.

use std::path::PathBuf;

use secrecy::SecretString;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No credential source configured (need a secret file or an env var name)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },

    #[error("Credential from {origin} is empty")]
    Empty { origin: String },
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// Where a credential may be found. Empty strings count as "not configured".
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretSource<'a> {
    pub file: Option<&'a str>,
    pub env_var: Option<&'a str>,
}

impl<'a> SecretSource<'a> {
    pub fn env(name: &'a str) -> Self {
        Self {
            env_var: Some(name),
            ..Self::default()
        }
    }

    pub fn with_file(mut self, file: Option<&'a str>) -> Self {
        self.file = file;
        self
    }

    /// Resolves the credential. Surrounding whitespace is trimmed from every
    /// source so a trailing newline in a secret file is harmless.
    pub fn resolve(&self) -> Result<SecretString> {
        if let Some(file) = non_empty(self.file) {
            let path = expand_home(file);
            let content =
                std::fs::read_to_string(&path).map_err(|e| SecretError::FileReadError {
                    path: path.clone(),
                    source: e,
                })?;
            return checked(content.trim(), || format!("file '{}'", path.display()));
        }

        if let Some(name) = non_empty(self.env_var) {
            return match std::env::var(name) {
                Ok(value) => checked(value.trim(), || format!("env var '{}'", name)),
                Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                    name: name.to_string(),
                }),
                Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                    name: name.to_string(),
                }),
            };
        }

        Err(SecretError::NoSourceProvided)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

fn checked(value: &str, origin: impl FnOnce() -> String) -> Result<SecretString> {
    if value.is_empty() {
        return Err(SecretError::Empty { origin: origin() });
    }
    Ok(SecretString::from(value.to_string()))
}

/// Expands a leading `~` to the user's home directory (HOME, then USERPROFILE).
///
/// `~user/path` is not supported.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
            let home = PathBuf::from(home);
            return match path.strip_prefix("~/") {
                Some(rest) => home.join(rest),
                None => home,
            };
        }
    }
    PathBuf::from(path)
}
