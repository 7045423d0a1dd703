use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::credentials::Store;
use crate::helpers::time::parse_expiration;
use crate::utils::constants::{
    KEY_ACCESS_KEY_ID, KEY_EXPIRATION, KEY_SECRET_ACCESS_KEY, KEY_SECURITY_TOKEN,
    KEY_SESSION_TOKEN,
};

/// Keys a usable short-term section must carry, all non-empty.
pub const SHORT_TERM_REQUIRED_KEYS: [&str; 5] = [
    KEY_ACCESS_KEY_ID,
    KEY_SECRET_ACCESS_KEY,
    KEY_SESSION_TOKEN,
    KEY_SECURITY_TOKEN,
    KEY_EXPIRATION,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    Forced,
    SectionMissing,
    KeysMissing,
    InvalidExpiry,
    Expired,
    StillValid,
}

impl RefreshReason {
    pub fn as_str(&self) -> &'static str {
        match *self {
            RefreshReason::Forced => "forced refresh",
            RefreshReason::SectionMissing => "short-term section missing",
            RefreshReason::KeysMissing => "short-term section missing required keys",
            RefreshReason::InvalidExpiry => "invalid expiration",
            RefreshReason::Expired => "expired",
            RefreshReason::StillValid => "still valid",
        }
    }
}

impl fmt::Display for RefreshReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshDecision {
    pub must_refresh: bool,
    /// Set only when the stored expiration parsed.
    pub expires_at: Option<DateTime<Utc>>,
    /// `expires_at - now`; set under the same condition as `expires_at`.
    pub remaining: Option<TimeDelta>,
    pub reason: RefreshReason,
}

impl RefreshDecision {
    fn refresh(reason: RefreshReason) -> Self {
        Self {
            must_refresh: true,
            expires_at: None,
            remaining: None,
            reason,
        }
    }
}

/// Decides whether the short-term section needs a new session.
///
/// Checks run in order and the first match wins: forced, section missing,
/// required keys missing, unparseable expiration, expired, still valid.
/// An unparseable expiration asks for a refresh instead of failing.
pub fn decide_refresh(
    now: DateTime<Utc>,
    store: &Store,
    short_term_section: &str,
    force: bool,
) -> RefreshDecision {
    let decision = evaluate(now, store, short_term_section, force);
    debug!(
        section = %short_term_section,
        must_refresh = decision.must_refresh,
        reason = %decision.reason,
        "refresh decision"
    );
    decision
}

fn evaluate(now: DateTime<Utc>, store: &Store, section: &str, force: bool) -> RefreshDecision {
    if force {
        return RefreshDecision::refresh(RefreshReason::Forced);
    }

    let Some(short_term) = store.section(section) else {
        return RefreshDecision::refresh(RefreshReason::SectionMissing);
    };

    let complete = SHORT_TERM_REQUIRED_KEYS
        .iter()
        .all(|key| short_term.get(key).is_some_and(|v| !v.is_empty()));
    if !complete {
        return RefreshDecision::refresh(RefreshReason::KeysMissing);
    }

    let raw = short_term.get(KEY_EXPIRATION).unwrap_or_default();
    let Ok(expires_at) = parse_expiration(raw) else {
        return RefreshDecision::refresh(RefreshReason::InvalidExpiry);
    };

    let remaining = expires_at - now;
    let (must_refresh, reason) = if remaining <= TimeDelta::zero() {
        (true, RefreshReason::Expired)
    } else {
        (false, RefreshReason::StillValid)
    };

    RefreshDecision {
        must_refresh,
        expires_at: Some(expires_at),
        remaining: Some(remaining),
        reason,
    }
}
