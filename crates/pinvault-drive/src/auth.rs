//! Service-account credentials and access tokens
//!
//! Google service accounts authenticate with the OAuth 2.0 JWT bearer flow:
//! the client signs a short-lived RS256 assertion with the account's private
//! key and trades it at `token_uri` for an access token.

use crate::{DriveError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use parking_lot::RwLock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};

/// Default token endpoint
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Grant type of the JWT bearer flow
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime of a signed assertion (the maximum Google accepts)
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Tokens are refreshed this long before they expire
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Supplies bearer tokens for Drive requests
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Get a valid access token
    async fn access_token(&self) -> Result<String>;
}

/// A fixed bearer token
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// Parsed service-account key file
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Account type, `service_account` for key files
    #[serde(rename = "type", default)]
    pub key_type: Option<String>,
    /// Google Cloud project
    #[serde(default)]
    pub project_id: Option<String>,
    /// Key ID, sent as the JWT `kid`
    #[serde(default)]
    pub private_key_id: Option<String>,
    /// PEM-encoded RSA private key
    pub private_key: String,
    /// Service account email, the assertion issuer
    pub client_email: String,
    /// OAuth token endpoint
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Parse a key from its JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let key: Self = serde_json::from_str(json)
            .map_err(|e| DriveError::Credentials(format!("malformed key file: {}", e)))?;

        if let Some(kind) = key.key_type.as_deref() {
            if kind != "service_account" {
                return Err(DriveError::Credentials(format!(
                    "expected a service_account key, got {}",
                    kind
                )));
            }
        }
        if key.client_email.is_empty() || key.private_key.is_empty() {
            return Err(DriveError::Credentials(
                "key file has no client_email or private_key".to_string(),
            ));
        }

        Ok(key)
    }

    /// Read and parse a key file
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            DriveError::Credentials(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Sign a JWT assertion requesting `scope`
    pub fn sign_assertion(&self, scope: &str, now: DateTime<Utc>) -> Result<String> {
        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: self.client_email.clone(),
            scope: scope.to_string(),
            aud: self.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())?;
        Ok(encode(&header, &claims, &key)?)
    }
}

/// Claims of a service-account assertion
#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Issuer (service account email)
    pub iss: String,
    /// Space-separated scopes
    pub scope: String,
    /// Audience (token endpoint)
    pub aud: String,
    /// Issued at
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
}

/// A cached access token
#[derive(Clone, Debug)]
pub struct AccessToken {
    /// Bearer token value
    pub token: String,
    /// When Google stops accepting it
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Check the token is usable for at least the refresh margin
    pub fn is_fresh(&self) -> bool {
        Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

/// Tokens minted from a service-account key file
///
/// The key file is read on first use, so a missing or malformed file surfaces
/// as an error on the first Drive call instead of at construction.
pub struct ServiceAccountTokenProvider {
    key_path: PathBuf,
    scope: String,
    http: Client,
    key: OnceCell<ServiceAccountKey>,
    cached: RwLock<Option<AccessToken>>,
    refresh: Mutex<()>,
}

impl ServiceAccountTokenProvider {
    /// Create a provider for the key file at `key_path`
    pub fn new(key_path: impl Into<PathBuf>, scope: impl Into<String>, http: Client) -> Self {
        Self {
            key_path: key_path.into(),
            scope: scope.into(),
            http,
            key: OnceCell::new(),
            cached: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    async fn key(&self) -> Result<&ServiceAccountKey> {
        self.key
            .get_or_try_init(|| async {
                let key = ServiceAccountKey::from_file(&self.key_path).await?;
                info!(client_email = %key.client_email, "Loaded service account key");
                Ok::<_, DriveError>(key)
            })
            .await
    }

    fn cached_token(&self) -> Option<String> {
        self.cached
            .read()
            .as_ref()
            .filter(|t| t.is_fresh())
            .map(|t| t.token.clone())
    }

    async fn exchange(&self, key: &ServiceAccountKey) -> Result<AccessToken> {
        let now = Utc::now();
        let assertion = key.sign_assertion(&self.scope, now)?;

        debug!(token_uri = %key.token_uri, "Exchanging service account assertion");
        let response = self
            .http
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<TokenErrorResponse>(&text) {
                Ok(err) => err.error_description.unwrap_or(err.error),
                Err(_) => text,
            };
            return Err(DriveError::Token {
                status: status.as_u16(),
                message,
            });
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);

        Ok(AccessToken {
            token: token.access_token,
            expires_at: now + Duration::seconds(lifetime),
        })
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountTokenProvider {
    async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        // One refresh at a time; late arrivals pick up the new token
        let _guard = self.refresh.lock().await;
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        let key = self.key().await?;
        let token = self.exchange(key).await?;
        let value = token.token.clone();
        *self.cached.write() = Some(token);

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};

    const KEY_JSON: &str = include_str!("../tests/fixtures/service-account.json");
    const PUBLIC_KEY: &str = include_str!("../tests/fixtures/service-account.pub.pem");

    #[test]
    fn test_parse_key() {
        let key = ServiceAccountKey::from_json(KEY_JSON).unwrap();
        assert_eq!(key.client_email, "gateway@pinvault-test.iam.gserviceaccount.com");
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
        assert!(!format!("{:?}", key).contains("PRIVATE KEY"));
    }

    #[test]
    fn test_reject_wrong_key_type() {
        let json = r#"{"type": "authorized_user", "private_key": "x", "client_email": "a@b"}"#;
        assert!(matches!(
            ServiceAccountKey::from_json(json),
            Err(DriveError::Credentials(_))
        ));
    }

    #[test]
    fn test_reject_malformed_key() {
        assert!(matches!(
            ServiceAccountKey::from_json("not json"),
            Err(DriveError::Credentials(_))
        ));
        let json = r#"{"private_key": "", "client_email": "a@b"}"#;
        assert!(ServiceAccountKey::from_json(json).is_err());
    }

    #[test]
    fn test_sign_assertion() {
        let key = ServiceAccountKey::from_json(KEY_JSON).unwrap();
        let now = Utc::now();
        let jwt = key.sign_assertion(crate::DRIVE_SCOPE, now).unwrap();

        let header = decode_header(&jwt).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some("0123456789abcdef"));

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[DEFAULT_TOKEN_URI]);
        let decoding = DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap();
        let claims = decode::<AssertionClaims>(&jwt, &decoding, &validation)
            .unwrap()
            .claims;

        assert_eq!(claims.iss, key.client_email);
        assert_eq!(claims.scope, crate::DRIVE_SCOPE);
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp - claims.iat, ASSERTION_LIFETIME_SECS);
    }

    #[test]
    fn test_token_freshness() {
        let fresh = AccessToken {
            token: "t".into(),
            expires_at: Utc::now() + Duration::minutes(30),
        };
        let stale = AccessToken {
            token: "t".into(),
            expires_at: Utc::now() + Duration::seconds(10),
        };
        assert!(fresh.is_fresh());
        assert!(!stale.is_fresh());
    }

    #[tokio::test]
    async fn test_missing_key_file_fails_on_first_use() {
        let provider = ServiceAccountTokenProvider::new(
            "/nonexistent/service-account-key.json",
            crate::DRIVE_SCOPE,
            Client::new(),
        );

        let result = provider.access_token().await;
        assert!(matches!(result, Err(DriveError::Credentials(_))));
    }

    #[tokio::test]
    async fn test_static_token() {
        let provider = StaticTokenProvider::new("abc");
        assert_eq!(provider.access_token().await.unwrap(), "abc");
    }
}
