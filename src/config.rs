//! Configuration management for RAX FTP Client
//!
//! Layers built-in defaults, an optional `config.toml` and `RAX_FTP_CLIENT_*`
//! environment variables into a single [`ClientConfig`].

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

const ENV_PREFIX: &str = "RAX_FTP_CLIENT";

/// Client configuration shared by every transfer started from one client
#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    /// Seconds allowed to open the control or data TCP connection
    pub connect_timeout_secs: u64,

    /// Seconds to wait for each control reply
    pub response_timeout_secs: u64,

    /// Bytes moved per read/write while streaming file data
    pub chunk_size: usize,

    /// Longest reply line accepted from the server, CRLF included
    pub max_line_length: usize,

    /// Most lines accepted in one multi-line reply
    pub max_response_lines: usize,

    /// Optional deadline for a whole put/get, unset means no deadline
    #[serde(default)]
    pub transfer_deadline_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            response_timeout_secs: 30,
            chunk_size: 8192,
            max_line_length: 2048,
            max_response_lines: 256,
            transfer_deadline_secs: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from the default locations with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        // Installed layout first, then the working directory
        Self::load_from(&["rax-ftp-client/config", "config"])
    }

    /// Load configuration, layering each optional file found in `paths`
    pub fn load_from(paths: &[&str]) -> Result<Self, ConfigError> {
        let defaults = ClientConfig::default();

        let mut builder = Config::builder()
            .set_default("connect_timeout_secs", defaults.connect_timeout_secs)?
            .set_default("response_timeout_secs", defaults.response_timeout_secs)?
            .set_default("chunk_size", defaults.chunk_size as u64)?
            .set_default("max_line_length", defaults.max_line_length as u64)?
            .set_default("max_response_lines", defaults.max_response_lines as u64)?;

        for path in paths {
            builder = builder.add_source(File::with_name(path).required(false));
        }

        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: ClientConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "connect_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.response_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "response_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.chunk_size == 0 {
            return Err(ConfigError::Message(
                "chunk_size must be greater than 0".into(),
            ));
        }

        // "ddd\r\n" is the shortest legal reply line
        if self.max_line_length < 5 {
            return Err(ConfigError::Message(
                "max_line_length must be at least 5".into(),
            ));
        }

        if self.max_response_lines == 0 {
            return Err(ConfigError::Message(
                "max_response_lines must be greater than 0".into(),
            ));
        }

        if self.transfer_deadline_secs == Some(0) {
            return Err(ConfigError::Message(
                "transfer_deadline_secs must be greater than 0 when set".into(),
            ));
        }

        Ok(())
    }

    /// Get connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Get control reply timeout as Duration
    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_timeout_secs)
    }

    /// Get the whole-transfer deadline, if one is configured
    pub fn transfer_deadline(&self) -> Option<Duration> {
        self.transfer_deadline_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 8192);
        assert_eq!(config.response_timeout(), Duration::from_secs(30));
        assert!(config.transfer_deadline().is_none());
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let config = ClientConfig {
            chunk_size: 0,
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_deadline_is_rejected() {
        let config = ClientConfig {
            transfer_deadline_secs: Some(0),
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_files_fall_back_to_defaults() {
        let config = ClientConfig::load_from(&["/nonexistent/rax-ftp-client-config"]).unwrap();
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.max_response_lines, 256);
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "chunk_size = 1024").unwrap();
        writeln!(file, "transfer_deadline_secs = 600").unwrap();
        drop(file);

        let base = dir.path().join("client");
        let config = ClientConfig::load_from(&[base.to_str().unwrap()]).unwrap();
        assert_eq!(config.chunk_size, 1024);
        assert_eq!(config.transfer_deadline(), Some(Duration::from_secs(600)));
        assert_eq!(config.response_timeout_secs, 30);
    }
}
