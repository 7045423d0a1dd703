use crate::error::{MfaError, Result};
use crate::utils::constants::{DEFAULT_LONG_TERM_SUFFIX, SUFFIX_NONE};

/// Storage locations for one profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionNames {
    pub long_term: String,
    pub short_term: String,
}

/// Maps a profile and the two suffixes onto section names.
///
/// - long-term: empty suffix -> `<profile>-long-term`, `none` -> `<profile>`
/// - short-term: empty or `none` -> `<profile>`
/// - any other suffix -> `<profile>-<suffix>`
///
/// Colliding names are rejected rather than merged.
pub fn compute_section_names(
    profile: &str,
    long_term_suffix: &str,
    short_term_suffix: &str,
) -> Result<SectionNames> {
    let profile = profile.trim();
    if profile.is_empty() {
        return Err(MfaError::config("profile is empty"));
    }

    let long_term = match long_term_suffix.trim() {
        "" => format!("{profile}-{DEFAULT_LONG_TERM_SUFFIX}"),
        s if s.eq_ignore_ascii_case(SUFFIX_NONE) => profile.to_owned(),
        s => format!("{profile}-{s}"),
    };

    let short_term = match short_term_suffix.trim() {
        "" => profile.to_owned(),
        s if s.eq_ignore_ascii_case(SUFFIX_NONE) => profile.to_owned(),
        s => format!("{profile}-{s}"),
    };

    if long_term == short_term {
        return Err(MfaError::config(format!(
            "long-term section name {long_term:?} equals short-term section name {short_term:?}"
        )));
    }

    Ok(SectionNames {
        long_term,
        short_term,
    })
}
