use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info};

use crate::app::token::{validate_token, PromptTokenSource, TokenSource};
use crate::config::{resolve, resolve_region, Env, Inputs, OsEnv};
use crate::credentials::{expand_home, Store};
use crate::error::Result;
use crate::helpers::time::{format_expiration, format_rfc3339, now_utc};
use crate::refresh::{decide_refresh, RefreshReason};
use crate::sts::{ExchangeRequest, SessionCredentials, SessionExchanger, StsClient};
use crate::utils::constants::{
    KEY_ACCESS_KEY_ID, KEY_ASSUMED_ROLE, KEY_ASSUMED_ROLE_ARN, KEY_EXPIRATION,
    KEY_SECRET_ACCESS_KEY, KEY_SECURITY_TOKEN, KEY_SESSION_TOKEN,
};

pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Collaborators of one invocation.
pub struct Deps {
    pub now: Clock,
    pub env: Box<dyn Env>,
    pub exchanger: Arc<dyn SessionExchanger>,
    pub tokens: Box<dyn TokenSource>,
    pub stdout: Box<dyn Write + Send>,
}

impl Deps {
    /// Wall clock, process environment, real STS and an stdin prompt.
    pub fn production() -> Result<Self> {
        Ok(Self {
            now: Box::new(now_utc),
            env: Box::new(OsEnv),
            exchanger: Arc::new(StsClient::new()?),
            tokens: Box::new(PromptTokenSource::stdio()),
            stdout: Box::new(std::io::stdout()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Refreshed {
        expires_at: DateTime<Utc>,
    },
    StillValid {
        expires_at: DateTime<Utc>,
        remaining: TimeDelta,
    },
}

/// Loads the store, decides, exchanges if needed and saves.
///
/// At most one exchange and one save happen, in that order. Any error before
/// the save leaves the credentials file as it was.
pub async fn run(input: &Inputs, deps: &mut Deps) -> Result<RunOutcome> {
    let store_path = expand_home(&input.credentials_file);
    let mut store = Store::load(&store_path)?;

    let resolved = resolve(input, deps.env.as_ref(), &store)?;
    let _ = writeln!(deps.stdout, "INFO - Using profile: {}", resolved.short_term_section);

    let long_term_key_id = store
        .must_get(&resolved.long_term_section, KEY_ACCESS_KEY_ID)?
        .to_owned();
    let long_term_secret = store
        .must_get(&resolved.long_term_section, KEY_SECRET_ACCESS_KEY)?
        .to_owned();

    let now = (deps.now)();
    let decision = decide_refresh(now, &store, &resolved.short_term_section, resolved.force);

    if let (false, Some(expires_at), Some(remaining)) =
        (decision.must_refresh, decision.expires_at, decision.remaining)
    {
        let _ = writeln!(
            deps.stdout,
            "INFO - Your credentials are still valid for {} seconds they will expire at {}",
            rounded_seconds(remaining),
            format_expiration(&expires_at)
        );
        return Ok(RunOutcome::StillValid {
            expires_at,
            remaining,
        });
    }

    match decision.reason {
        RefreshReason::Expired => {
            let _ = writeln!(deps.stdout, "INFO - Your credentials have expired, renewing.");
        }
        RefreshReason::SectionMissing => {
            let _ = writeln!(
                deps.stdout,
                "INFO - Short term credentials section [{}] is missing, obtaining new credentials.",
                resolved.short_term_section
            );
        }
        _ => {
            let _ = writeln!(deps.stdout, "INFO - Obtaining new credentials.");
        }
    }
    info!(reason = %decision.reason, section = %resolved.short_term_section, "refreshing session");

    let token = match &resolved.token {
        Some(token) => token.clone(),
        None => deps
            .tokens
            .read_token(&resolved.device, resolved.duration_seconds)?,
    };
    let token = validate_token(&token)?;

    let request = ExchangeRequest {
        region: resolve_region(input, deps.env.as_ref()),
        access_key_id: long_term_key_id,
        secret_access_key: long_term_secret,
        serial_number: resolved.device.clone(),
        token_code: token,
        duration_seconds: resolved.duration_seconds,
    };
    debug!(?request, "exchanging long-term credentials");
    let credentials = deps.exchanger.exchange(&request).await?;

    store_session(&mut store, &resolved.short_term_section, &credentials);
    store.save_atomic()?;

    let _ = writeln!(
        deps.stdout,
        "INFO - Success! Your credentials will expire in {} seconds at: {}",
        resolved.duration_seconds,
        format_rfc3339(&credentials.expiration)
    );
    Ok(RunOutcome::Refreshed {
        expires_at: credentials.expiration,
    })
}

/// Whole seconds, rounded to nearest.
fn rounded_seconds(delta: TimeDelta) -> i64 {
    (delta.num_milliseconds() as f64 / 1000.0).round() as i64
}

/// Rewrites the short-term section from a fresh session.
///
/// Both token keys carry the same value since consumers read either name.
pub fn store_session(store: &mut Store, section: &str, credentials: &SessionCredentials) {
    store.set(section, KEY_ACCESS_KEY_ID, &credentials.access_key_id);
    store.set(section, KEY_SECRET_ACCESS_KEY, &credentials.secret_access_key);
    store.set(section, KEY_SESSION_TOKEN, &credentials.session_token);
    store.set(section, KEY_SECURITY_TOKEN, &credentials.session_token);
    store.set(section, KEY_EXPIRATION, &format_expiration(&credentials.expiration));
    store.set(section, KEY_ASSUMED_ROLE, "False");
    store.delete_key(section, KEY_ASSUMED_ROLE_ARN);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_seconds_round_to_nearest() {
        assert_eq!(rounded_seconds(TimeDelta::milliseconds(3_599_600)), 3600);
        assert_eq!(rounded_seconds(TimeDelta::milliseconds(3_599_400)), 3599);
        assert_eq!(rounded_seconds(TimeDelta::hours(1)), 3600);
    }
}
