//! Session exchange: long-term keys + MFA code -> temporary credentials.

pub mod client;
pub mod response;
pub mod sigv4;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

pub use client::StsClient;

/// Everything one `GetSessionToken` call needs.
#[derive(Clone, PartialEq, Eq)]
pub struct ExchangeRequest {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub serial_number: String,
    pub token_code: String,
    pub duration_seconds: u32,
}

impl std::fmt::Debug for ExchangeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeRequest")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("serial_number", &self.serial_number)
            .field("duration_seconds", &self.duration_seconds)
            .finish_non_exhaustive()
    }
}

/// Temporary credential bundle returned by the exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
}

impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait SessionExchanger: Send + Sync {
    async fn exchange(&self, request: &ExchangeRequest) -> Result<SessionCredentials>;
}
