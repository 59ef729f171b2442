//! # Pinvault
//!
//! A PIN-locked gateway in front of a single Google Drive folder.
//!
//! - [`drive`]: Google Drive v3 client (service-account auth, list/upload/download)
//! - [`gateway`]: the HTTP server exposing the locked folder

pub use pinvault_drive as drive;
pub use pinvault_gateway as gateway;
