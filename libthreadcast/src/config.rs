//! Configuration management for Threadcast
//!
//! Settings live in a TOML file; secrets never do. API keys come from the
//! process environment (optionally seeded from a `.env` file) and are read
//! once at startup by [`crate::credentials`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::credentials::XCredentials;
use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub posting: PostingConfig,
    pub x: XConfig,
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP server listens on
    pub bind: String,
    /// Largest accepted request body (base64 media is inlined in JSON)
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            body_limit_bytes: 32 * 1024 * 1024,
        }
    }
}

/// Which upstream posting service to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    /// In-process mock that returns fabricated ids
    #[default]
    Mock,
    /// The X (Twitter) API
    X,
}

impl FromStr for PlatformKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(PlatformKind::Mock),
            "x" | "twitter" => Ok(PlatformKind::X),
            _ => Err(format!(
                "Invalid platform: '{}'. Valid options: mock, x",
                s
            )),
        }
    }
}

impl std::fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformKind::Mock => write!(f, "mock"),
            PlatformKind::X => write!(f, "x"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostingConfig {
    pub platform: PlatformKind,
    /// How long a caller waits for a whole thread before giving up
    pub timeout_secs: u64,
    /// Simulated latency of the mock platform, in milliseconds
    pub mock_delay_ms: u64,
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            platform: PlatformKind::Mock,
            timeout_secs: 120,
            mock_delay_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct XConfig {
    pub api_base: String,
    pub upload_base: String,
    pub request_timeout_secs: u64,
}

impl Default for XConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.twitter.com".to_string(),
            upload_base: "https://upload.twitter.com".to_string(),
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub gemini_base: String,
    pub text_model: String,
    pub image_model: String,
    /// Directory generated images are also written to, if set
    pub image_dir: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            gemini_base: "https://generativelanguage.googleapis.com".to_string(),
            text_model: "gemini-2.0-flash".to_string(),
            image_model: "gemini-2.0-flash-exp-image-generation".to_string(),
            image_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// An explicit `THREADCAST_CONFIG` must point at a readable file. The
    /// default location is optional; built-in defaults apply when it is absent.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let explicit = std::env::var("THREADCAST_CONFIG").is_ok();
        let config_path = resolve_config_path()?;

        let mut config = if explicit || config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Apply `THREADCAST_BIND` and `THREADCAST_PLATFORM` on top of file settings
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(bind) = std::env::var("THREADCAST_BIND") {
            self.server.bind = bind;
        }
        if let Ok(platform) = std::env::var("THREADCAST_PLATFORM") {
            self.posting.platform = platform
                .parse()
                .map_err(ConfigError::InvalidValue)?;
        }
        Ok(())
    }

    /// Check startup requirements
    ///
    /// Posting to X without all four credentials is a configuration error
    /// reported here, never per request.
    pub fn validate(&self) -> Result<()> {
        if self.posting.timeout_secs == 0 {
            return Err(
                ConfigError::InvalidValue("posting.timeout_secs must be positive".into()).into(),
            );
        }
        if self.posting.platform == PlatformKind::X {
            XCredentials::from_env()?;
        }
        Ok(())
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("THREADCAST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("threadcast").join("config.toml"))
}

/// Expand `~` and environment references in a configured directory
pub fn expand_dir(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path)
        .map_err(|e| ConfigError::InvalidValue(format!("Failed to expand {}: {}", path, e)))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert_eq!(config.posting.platform, PlatformKind::Mock);
        assert_eq!(config.generation.text_model, "gemini-2.0-flash");
        assert!(config.generation.image_dir.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[posting]
platform = "x"

[generation]
image_dir = "~/Pictures/threadcast"
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.posting.platform, PlatformKind::X);
        assert_eq!(config.posting.timeout_secs, 120);
        assert_eq!(config.x.api_base, "https://api.twitter.com");
        assert_eq!(
            config.generation.image_dir.as_deref(),
            Some("~/Pictures/threadcast")
        );
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[posting\nplatform = ").unwrap();

        let err = Config::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_platform_kind_from_str() {
        assert_eq!("mock".parse::<PlatformKind>().unwrap(), PlatformKind::Mock);
        assert_eq!("X".parse::<PlatformKind>().unwrap(), PlatformKind::X);
        assert_eq!("twitter".parse::<PlatformKind>().unwrap(), PlatformKind::X);
        assert!("mastodon".parse::<PlatformKind>().is_err());
    }

    #[test]
    #[serial]
    fn test_explicit_config_path_must_exist() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");
        std::env::set_var("THREADCAST_CONFIG", &missing);

        let result = Config::load();
        std::env::remove_var("THREADCAST_CONFIG");

        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[server]\nbind = \"0.0.0.0:8080\"\n").unwrap();

        std::env::set_var("THREADCAST_CONFIG", &path);
        std::env::set_var("THREADCAST_BIND", "127.0.0.1:9999");
        std::env::set_var("THREADCAST_PLATFORM", "mock");

        let config = Config::load();

        std::env::remove_var("THREADCAST_CONFIG");
        std::env::remove_var("THREADCAST_BIND");
        std::env::remove_var("THREADCAST_PLATFORM");

        let config = config.unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:9999");
        assert_eq!(config.posting.platform, PlatformKind::Mock);
    }

    #[test]
    #[serial]
    fn test_validate_requires_x_credentials() {
        for var in ["X_API_KEY", "X_API_SECRET", "X_ACCESS_TOKEN", "X_ACCESS_SECRET"] {
            std::env::remove_var(var);
        }

        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.posting.platform = PlatformKind::X;
        let err = config.validate().unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("X_API_KEY"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.posting.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
