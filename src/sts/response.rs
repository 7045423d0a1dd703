//! STS query API XML documents.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{MfaError, Result};
use crate::sts::SessionCredentials;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetSessionTokenResponse {
    pub get_session_token_result: Option<GetSessionTokenResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetSessionTokenResult {
    pub credentials: Option<CredentialsXml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CredentialsXml {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub expiration: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorDetail {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Decodes a successful `GetSessionToken` body. Missing or empty fields are
/// reported as an incomplete response.
pub fn parse_session_credentials(body: &str) -> Result<SessionCredentials> {
    let response: GetSessionTokenResponse = quick_xml::de::from_str(body)
        .map_err(|e| MfaError::Exchange(format!("decode response: {e}")))?;

    let creds = response
        .get_session_token_result
        .and_then(|r| r.credentials)
        .ok_or_else(|| MfaError::Exchange("no credentials in response".to_owned()))?;

    let required = |field: Option<String>, name: &str| {
        field
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| MfaError::Exchange(format!("response is missing {name}")))
    };

    let access_key_id = required(creds.access_key_id, "AccessKeyId")?;
    let secret_access_key = required(creds.secret_access_key, "SecretAccessKey")?;
    let session_token = required(creds.session_token, "SessionToken")?;
    let raw_expiration = required(creds.expiration, "Expiration")?;
    let expiration = DateTime::parse_from_rfc3339(&raw_expiration)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| MfaError::Exchange(format!("invalid Expiration {raw_expiration:?}: {e}")))?;

    Ok(SessionCredentials {
        access_key_id,
        secret_access_key,
        session_token,
        expiration,
    })
}

/// `Code: Message` from an STS error document, if the body is one.
pub fn parse_error_message(body: &str) -> Option<String> {
    let response: ErrorResponse = quick_xml::de::from_str(body).ok()?;
    let code = response.error.code.unwrap_or_default();
    let message = response.error.message.unwrap_or_default();
    match (code.is_empty(), message.is_empty()) {
        (true, true) => None,
        (false, true) => Some(code),
        (true, false) => Some(message),
        (false, false) => Some(format!("{code}: {message}")),
    }
}
