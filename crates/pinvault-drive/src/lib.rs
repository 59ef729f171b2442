//! # Pinvault Drive
//!
//! A small Google Drive v3 client used by the Pinvault gateway.
//!
//! ## Features
//!
//! - **Service accounts**: signs RS256 JWT assertions and caches access tokens
//! - **Folder listing**: children of a folder, trashed items excluded, all pages
//! - **Uploads**: single-request `multipart/related` uploads into a folder
//! - **Streaming downloads**: file media as a byte stream, never buffered
//!
//! ## Example
//!
//! ```rust,ignore
//! use pinvault_drive::{DriveApi, DriveClient, DriveConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let drive = DriveClient::from_service_account(
//!         "./service-account-key.json",
//!         DriveConfig::default(),
//!     )?;
//!
//!     for file in drive.list_folder("1AbCdEf").await? {
//!         println!("{} {}", file.id, file.name);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod api;
pub mod auth;
mod client;
mod config;
mod error;
mod types;

pub use api::DriveApi;
pub use auth::{
    AccessToken, ServiceAccountKey, ServiceAccountTokenProvider, StaticTokenProvider,
    TokenProvider,
};
pub use client::DriveClient;
pub use config::{DriveConfig, DRIVE_SCOPE};
pub use error::{DriveError, Result};
pub use types::*;
