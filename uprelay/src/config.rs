//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `UPRELAY_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `UPRELAY_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `UPRELAY_STORAGE__BACKEND=local` sets the `storage.backend` field.
//!
//! ## Configuration Structure
//!
//! - **Server**: `host`, `port`, `max_body_bytes` - HTTP server binding and transport body ceiling
//! - **Upload**: `upload.max_file_size`, `upload.content_type`, `upload.prefix` - payload ceiling
//!   and relay policy
//! - **Storage**: `storage.backend` - where uploaded bytes are relayed (`local` or `http`)
//! - **CORS**: `cors.allowed_origins` - browser client origins
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Override server port
//! UPRELAY_PORT=8080
//!
//! # Point at a remote storage service
//! UPRELAY_STORAGE__BACKEND=http
//! UPRELAY_STORAGE__ENDPOINT="https://storage.example.com/storage/v1"
//! UPRELAY_STORAGE__API_KEY="service-role-key"
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

/// Simple CLI args - just for specifying the config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "UPRELAY_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment variables.
/// All fields have sensible defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Transport-level request body ceiling in bytes.
    ///
    /// This is a coarse upper bound on the whole JSON request body and must be larger than the
    /// payload ceiling in `upload.max_file_size` (base64 inflates the payload by 4/3 before the
    /// JSON framing is added).
    pub max_body_bytes: usize,
    /// Upload validation and relay policy
    pub upload: UploadConfig,
    /// Storage backend the decoded bytes are relayed to
    pub storage: StorageConfig,
    /// CORS configuration for browser clients
    pub cors: CorsConfig,
}

/// Upload validation and relay policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// Maximum decoded payload size in bytes (default: 5 MiB).
    ///
    /// Enforced on the *encoded* representation before any decode is attempted.
    pub max_file_size: usize,
    /// Content type sent to the storage backend for every upload.
    ///
    /// Uploads are deliberately stored as generic binary regardless of the file's true type;
    /// no sniffing, no extension-based negotiation.
    pub content_type: String,
    /// Storage prefix (bucket) under which uploaded objects are placed
    pub prefix: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: 5 * 1024 * 1024, // 5 MiB
            content_type: "application/octet-stream".to_string(),
            prefix: "review-uploads".to_string(),
        }
    }
}

/// Storage backend configuration.
///
/// Uploaded bytes are relayed to exactly one backend, selected by the `backend` tag.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Write objects under a local directory. Useful for development and testing.
    Local {
        /// Base directory where objects are written
        path: PathBuf,
    },
    /// Relay objects to a remote object-storage HTTP API.
    Http {
        /// Base URL of the storage API (e.g., "https://storage.example.com/storage/v1")
        endpoint: Url,
        /// Bearer token for authenticating with the storage API
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
        /// Per-request timeout for storage calls
        #[serde(default = "default_storage_timeout")]
        #[serde(with = "humantime_serde")]
        timeout: Duration,
    },
}

fn default_storage_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Local {
            path: PathBuf::from("./uprelay_data"),
        }
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![CorsOrigin::Wildcard],
            allow_credentials: false,
            max_age: Some(3600), // Cache preflight for 1 hour
        }
    }
}

/// CORS origin specification.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://app.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            max_body_bytes: 10 * 1024 * 1024, // 10 MiB
            upload: UploadConfig::default(),
            storage: StorageConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl Config {
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Build the figment for config loading (YAML file + env overrides)
    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("UPRELAY_").split("__"))
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check cross-field constraints that serde cannot express
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.upload.max_file_size == 0 {
            anyhow::bail!("upload.max_file_size must be greater than zero");
        }
        if self.upload.content_type.is_empty() {
            anyhow::bail!("upload.content_type must not be empty");
        }
        if self.upload.prefix.is_empty() || self.upload.prefix.contains('/') {
            anyhow::bail!("upload.prefix must be a single non-empty path segment");
        }
        // The encoded payload is 4/3 the decoded ceiling; the transport bound has to leave room
        // for that plus the JSON framing.
        if self.max_body_bytes <= self.upload.max_file_size * 4 / 3 {
            anyhow::bail!(
                "max_body_bytes ({}) must exceed the encoded form of upload.max_file_size ({})",
                self.max_body_bytes,
                self.upload.max_file_size
            );
        }
        // Browsers refuse this combination, and tower-http panics on it
        if self.cors.allow_credentials
            && self.cors.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard))
        {
            anyhow::bail!("cors.allow_credentials cannot be combined with a wildcard origin");
        }
        Ok(())
    }
}
