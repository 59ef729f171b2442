//! Gateway configuration

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the shared PIN
pub const ENV_LOCK_PIN: &str = "LOCK_PIN";
/// Environment variable holding the locked folder ID
pub const ENV_LOCKED_FOLDER_ID: &str = "LOCKED_FOLDER_ID";
/// Default location of the service-account key
pub const DEFAULT_CREDENTIALS_PATH: &str = "./service-account-key.json";

/// Startup configuration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable(s): {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

/// Gateway server configuration
#[derive(Clone)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// ID of the Drive folder exposed by the gateway
    pub folder_id: String,
    /// Shared PIN required on data routes
    pub pin: String,
    /// Path of the service-account key file
    pub credentials_path: PathBuf,
    /// Requests per second per client IP (0 disables limiting)
    pub rate_limit_rps: u32,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
    /// Longest wait for the next chunk of a download (seconds)
    pub stream_idle_timeout_secs: u64,
    /// Enable CORS
    pub cors_enabled: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            folder_id: String::new(),
            pin: String::new(),
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
            rate_limit_rps: 10,
            max_body_size: 512 * 1024 * 1024, // 512 MiB
            stream_idle_timeout_secs: 60,
            cors_enabled: true,
        }
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("folder_id", &self.folder_id)
            .field("pin", &"<redacted>")
            .field("credentials_path", &self.credentials_path)
            .field("rate_limit_rps", &self.rate_limit_rps)
            .field("max_body_size", &self.max_body_size)
            .field("stream_idle_timeout_secs", &self.stream_idle_timeout_secs)
            .field("cors_enabled", &self.cors_enabled)
            .finish()
    }
}

impl GatewayConfig {
    /// Get the bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Idle timeout for streamed downloads
    pub fn stream_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_idle_timeout_secs.max(1))
    }

    /// Check that the required values are present
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if self.folder_id.trim().is_empty() {
            missing.push(ENV_LOCKED_FOLDER_ID);
        }
        if self.pin.is_empty() {
            missing.push(ENV_LOCK_PIN);
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing(missing))
        }
    }
}
