use std::path::PathBuf;

use tracing::debug;

use crate::config::env::Env;
use crate::config::inputs::{explicit, Inputs};
use crate::credentials::{compute_section_names, expand_home, Store};
use crate::error::{MfaError, Result};
use crate::utils::constants::{
    DEFAULT_DURATION_SECONDS, DEFAULT_PROFILE, DEFAULT_REGION, ENV_DEFAULT_REGION, ENV_MFA_DEVICE,
    ENV_PROFILE, ENV_REGION, ENV_STS_DURATION, KEY_MFA_DEVICE,
};

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub profile: String,
    pub long_term_section: String,
    pub short_term_section: String,
    pub device: String,
    pub duration_seconds: u32,
    /// Pre-supplied MFA code; `None` means the caller has to ask for one.
    pub token: Option<String>,
    pub force: bool,
    pub credentials_file: PathBuf,
}

/// Combines explicit input, the environment and the store.
///
/// Precedence per field: explicit input, then environment, then the stored
/// device (device only), then the built-in default (profile, duration).
/// Nothing here prompts or touches the filesystem.
pub fn resolve(input: &Inputs, env: &dyn Env, store: &Store) -> Result<Resolved> {
    let profile = explicit(&input.profile)
        .or_else(|| env.lookup(ENV_PROFILE))
        .unwrap_or_else(|| DEFAULT_PROFILE.to_owned());

    let names = compute_section_names(
        &profile,
        &input.long_term_suffix,
        &input.short_term_suffix,
    )?;

    let device = resolve_device(input, env, store, &names.long_term)?;
    let duration_seconds = resolve_duration(input, env)?;
    let token = explicit(&input.token);

    debug!(
        profile = %profile,
        long_term = %names.long_term,
        short_term = %names.short_term,
        duration_seconds,
        token_supplied = token.is_some(),
        "configuration resolved"
    );

    Ok(Resolved {
        profile,
        long_term_section: names.long_term,
        short_term_section: names.short_term,
        device,
        duration_seconds,
        token,
        force: input.force,
        credentials_file: expand_home(&input.credentials_file),
    })
}

fn resolve_device(input: &Inputs, env: &dyn Env, store: &Store, long_term: &str) -> Result<String> {
    if let Some(device) = explicit(&input.device) {
        debug!(source = "flag", "mfa device resolved");
        return Ok(device);
    }
    if let Some(device) = env.lookup(ENV_MFA_DEVICE) {
        debug!(source = "env", "mfa device resolved");
        return Ok(device);
    }
    match store.get(long_term, KEY_MFA_DEVICE).filter(|v| !v.is_empty()) {
        Some(device) => {
            debug!(source = "store", section = %long_term, "mfa device resolved");
            Ok(device.to_owned())
        }
        None => Err(MfaError::MissingDevice),
    }
}

fn resolve_duration(input: &Inputs, env: &dyn Env) -> Result<u32> {
    if let Some(duration) = input.duration_seconds.filter(|d| *d > 0) {
        return Ok(duration);
    }
    match env.lookup(ENV_STS_DURATION) {
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|d| *d > 0)
            .ok_or_else(|| MfaError::config(format!("invalid {ENV_STS_DURATION} {raw:?}"))),
        None => Ok(DEFAULT_DURATION_SECONDS),
    }
}

/// Region for the session exchange: explicit input, `AWS_REGION`,
/// `AWS_DEFAULT_REGION`, then `us-east-1`.
pub fn resolve_region(input: &Inputs, env: &dyn Env) -> String {
    explicit(&input.region)
        .or_else(|| env.lookup(ENV_REGION))
        .or_else(|| env.lookup(ENV_DEFAULT_REGION))
        .unwrap_or_else(|| DEFAULT_REGION.to_owned())
}
