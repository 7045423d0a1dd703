//! # AWS MFA Agent Library
//!
//! Refreshes short-lived AWS credentials by exchanging a long-term key pair
//! plus a one-time MFA code for an STS session, and persists the result into
//! the shared credentials file.
//!
//! Modules:
//! - `credentials`: section naming and the crash-safe credentials store
//! - `config`: input/environment/store precedence resolution
//! - `refresh`: deciding whether a new session is needed
//! - `sts`: the session exchange (STS `GetSessionToken`)
//! - `app`: one end-to-end invocation

pub mod app;
pub mod config;
pub mod credentials;
pub mod error;
pub mod helpers;
pub mod refresh;
pub mod sts;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::error::{MfaError, Result};
