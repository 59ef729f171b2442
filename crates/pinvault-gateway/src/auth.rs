//! PIN verification

use crate::{ApiError, ErrorCode};
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::{Deserialize, Deserializer};

/// Checks caller-supplied PINs against the configured one
///
/// Only a BLAKE3 digest of the PIN is kept. Comparing digests goes through
/// `blake3::Hash`'s constant-time equality, so response timing does not reveal
/// how much of a guess was right.
#[derive(Clone)]
pub struct PinGuard {
    digest: blake3::Hash,
}

impl PinGuard {
    /// Create a guard for the configured PIN
    pub fn new(pin: &str) -> Self {
        Self {
            digest: pin_digest(pin),
        }
    }

    /// Check whether the supplied PIN is the configured one
    pub fn matches<'a>(&self, supplied: impl Into<SuppliedPin<'a>>) -> bool {
        match supplied.into() {
            SuppliedPin::Text(pin) if !pin.is_empty() => pin_digest(pin) == self.digest,
            _ => false,
        }
    }

    /// Reject the request unless the supplied PIN matches
    pub fn check<'a>(&self, supplied: impl Into<SuppliedPin<'a>>) -> Result<(), ApiError> {
        match supplied.into() {
            SuppliedPin::Missing | SuppliedPin::Text("") => {
                Err(ApiError::new(ErrorCode::PinRequired))
            }
            SuppliedPin::Text(pin) if self.matches(pin) => Ok(()),
            SuppliedPin::Text(_) | SuppliedPin::NotText => {
                Err(ApiError::new(ErrorCode::IncorrectPin))
            }
        }
    }
}

/// A PIN as it appears in a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppliedPin<'a> {
    /// No PIN, or JSON `null`
    Missing,
    /// A text PIN, possibly empty
    Text(&'a str),
    /// A JSON value that is not a string; never matches
    NotText,
}

impl<'a> From<Option<&'a str>> for SuppliedPin<'a> {
    fn from(pin: Option<&'a str>) -> Self {
        pin.map_or(Self::Missing, Self::Text)
    }
}

impl<'a> From<&'a str> for SuppliedPin<'a> {
    fn from(pin: &'a str) -> Self {
        Self::Text(pin)
    }
}

impl std::fmt::Debug for PinGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinGuard").finish_non_exhaustive()
    }
}

fn pin_digest(pin: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"pinvault:pin:"); // Domain separation
    hasher.update(pin.as_bytes());
    hasher.finalize()
}

/// The `pin` member of a JSON body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinValue {
    Text(String),
    /// Number, boolean, array or object
    NotText,
}

/// JSON body carrying a PIN
#[derive(Debug, Default, Deserialize)]
pub struct PinRequest {
    /// Absent when the member is missing or `null`
    #[serde(default, deserialize_with = "deserialize_pin")]
    pub pin: Option<PinValue>,
}

impl PinRequest {
    pub fn pin(&self) -> SuppliedPin<'_> {
        match &self.pin {
            None => SuppliedPin::Missing,
            Some(PinValue::Text(pin)) => SuppliedPin::Text(pin),
            Some(PinValue::NotText) => SuppliedPin::NotText,
        }
    }
}

fn deserialize_pin<'de, D>(deserializer: D) -> Result<Option<PinValue>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(pin)) => Some(PinValue::Text(pin)),
        Some(_) => Some(PinValue::NotText),
    })
}

/// Extractor for a [`PinRequest`] body
///
/// Parsing is lenient: an empty or malformed body yields a request without a
/// PIN, which the guard then rejects with "PIN is required".
#[derive(Debug, Default)]
pub struct PinBody(pub PinRequest);

impl PinBody {
    pub fn pin(&self) -> SuppliedPin<'_> {
        self.0.pin()
    }
}

impl<S> FromRequest<S> for PinBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            ApiError::with_message(ErrorCode::InvalidRequest, e.body_text())
        })?;

        let request = serde_json::from_slice::<PinRequest>(&bytes).unwrap_or_else(|e| {
            if !bytes.is_empty() {
                tracing::debug!(error = %e, "Ignoring unparsable request body");
            }
            PinRequest::default()
        });

        Ok(Self(request))
    }
}
