//! Client configuration

use std::time::Duration;

/// OAuth scope granting full access to Drive
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Drive client configuration
#[derive(Clone, Debug)]
pub struct DriveConfig {
    /// Base URL of the Drive v3 metadata API
    pub api_base: String,
    /// Base URL of the Drive v3 upload API
    pub upload_base: String,
    /// OAuth scope requested for service-account tokens
    pub scope: String,
    /// Connect timeout for every request
    pub connect_timeout: Duration,
    /// Timeout for metadata and listing calls
    pub timeout: Duration,
    /// Timeout for a whole upload request
    pub upload_timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Page size used when listing a folder
    pub page_size: u32,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com/drive/v3".to_string(),
            upload_base: "https://www.googleapis.com/upload/drive/v3".to_string(),
            scope: DRIVE_SCOPE.to_string(),
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(30),
            upload_timeout: Duration::from_secs(10 * 60),
            user_agent: format!("pinvault-drive/{}", env!("CARGO_PKG_VERSION")),
            page_size: 1000,
        }
    }
}

impl DriveConfig {
    /// Point both API bases at another origin (emulators, tests)
    pub fn with_base_url(mut self, origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        self.api_base = format!("{}/drive/v3", origin);
        self.upload_base = format!("{}/upload/drive/v3", origin);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_base_url() {
        let config = DriveConfig::default().with_base_url("http://127.0.0.1:8080/");
        assert_eq!(config.api_base, "http://127.0.0.1:8080/drive/v3");
        assert_eq!(config.upload_base, "http://127.0.0.1:8080/upload/drive/v3");
        assert_eq!(config.scope, DRIVE_SCOPE);
    }
}
