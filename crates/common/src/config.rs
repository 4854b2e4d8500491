//! Application configuration.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Upload storage configuration.
    #[serde(default)]
    pub uploads: UploadConfig,
    /// Form behaviour configuration.
    #[serde(default)]
    pub forms: FormsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Upload storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Directory uploaded files are written to.
    #[serde(default = "default_upload_path")]
    pub path: PathBuf,
    /// Maximum request body size for multipart submissions.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// File extensions accepted by file fields (lower-case, without dot).
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: BTreeSet<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: default_upload_path(),
            max_body_bytes: default_max_body_bytes(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

/// Form behaviour configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FormsConfig {
    /// Page size for submission listings.
    #[serde(default = "default_submissions_per_page")]
    pub submissions_per_page: u64,
    /// Page size for form listings.
    #[serde(default = "default_forms_per_page")]
    pub forms_per_page: u64,
    /// Name of the hidden anti-bot field on public forms.
    #[serde(default = "default_honeypot_field")]
    pub honeypot_field: String,
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            submissions_per_page: default_submissions_per_page(),
            forms_per_page: default_forms_per_page(),
            honeypot_field: default_honeypot_field(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("./uploads")
}

const fn default_max_body_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_allowed_extensions() -> BTreeSet<String> {
    ["png", "jpg", "jpeg", "gif", "webp", "pdf", "doc", "docx"]
        .into_iter()
        .map(String::from)
        .collect()
}

const fn default_submissions_per_page() -> u64 {
    20
}

const fn default_forms_per_page() -> u64 {
    10
}

fn default_honeypot_field() -> String {
    "website".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `COLLEXO_ENV`)
    /// 3. Environment variables with `COLLEXO_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("COLLEXO_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("COLLEXO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("COLLEXO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_defaults() {
        let uploads = UploadConfig::default();
        assert_eq!(uploads.max_body_bytes, 16 * 1024 * 1024);
        assert!(uploads.allowed_extensions.contains("pdf"));
        assert!(uploads.allowed_extensions.contains("docx"));
        assert!(!uploads.allowed_extensions.contains("exe"));
    }

    #[test]
    fn test_forms_defaults() {
        let forms = FormsConfig::default();
        assert_eq!(forms.submissions_per_page, 20);
        assert_eq!(forms.forms_per_page, 10);
        assert_eq!(forms.honeypot_field, "website");
    }

    #[test]
    fn test_deserialize_minimal_config() {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [server]
                url = "https://collexo.example"

                [database]
                url = "postgres://localhost/collexo"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .and_then(config::Config::try_deserialize)
            .unwrap_or_else(|e| panic!("config should deserialize: {e}"));

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.max_connections, 100);
        assert_eq!(config.forms.honeypot_field, "website");
        assert!(config.uploads.allowed_extensions.contains("png"));
    }
}
