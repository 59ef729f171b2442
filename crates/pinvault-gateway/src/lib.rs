//! # Pinvault Gateway
//!
//! HTTP gateway exposing a single Google Drive folder behind a shared PIN.
//!
//! This crate provides:
//! - **Folder relay**: list, upload and download scoped to one folder
//! - **PIN guard**: constant-time check of a shared secret on every data route
//! - **Rate limiting**: per-client request throttling against PIN guessing
//! - **Streaming downloads**: provider bytes relayed without buffering
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   HTTP Clients                      │
//! │            (browser, mobile app, curl)              │
//! └─────────────────────────┬───────────────────────────┘
//!                           │
//! ┌─────────────────────────▼───────────────────────────┐
//! │                  Pinvault Gateway                   │
//! ├─────────────────────────────────────────────────────┤
//! │  Request ID │ Rate Limiter │ CORS │ Body Limit      │
//! ├─────────────────────────────────────────────────────┤
//! │        PIN Guard  →  Folder Relay Handlers          │
//! │          (list, upload, download, check)            │
//! ├─────────────────────────────────────────────────────┤
//! │                   pinvault-drive                    │
//! │     (service-account auth, Drive v3 files API)      │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod relay;
pub mod routes;
pub mod server;
pub mod state;

pub use auth::{PinGuard, SuppliedPin};
pub use config::{ConfigError, GatewayConfig};
pub use error::{ApiError, ErrorCode, Operation};
pub use server::{run_server, serve};
pub use state::AppState;
