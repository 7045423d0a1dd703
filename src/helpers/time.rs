use std::sync::OnceLock;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;

use crate::error::{MfaError, Result};
use crate::utils::constants::EXPIRATION_FORMAT;

pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

// chrono alone accepts single-digit fields, padding and signed years
fn expiration_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}$").expect("static regex")
    })
}

/// Parses a stored `expiration` value, exactly `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn parse_expiration(value: &str) -> Result<DateTime<Utc>> {
    let invalid = |reason: String| MfaError::InvalidExpiration {
        value: value.to_owned(),
        reason,
    };
    if !expiration_shape().is_match(value) {
        return Err(invalid("expected YYYY-MM-DD HH:MM:SS".to_owned()));
    }
    NaiveDateTime::parse_from_str(value, EXPIRATION_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| invalid(e.to_string()))
}

pub fn format_expiration(at: &DateTime<Utc>) -> String {
    at.format(EXPIRATION_FORMAT).to_string()
}

pub fn format_rfc3339(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
