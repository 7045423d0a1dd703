use crate::utils::constants::{
    DEFAULT_CREDENTIALS_FILE, DEFAULT_LONG_TERM_SUFFIX, DEFAULT_SHORT_TERM_SUFFIX,
};

/// Raw values from the command line.
///
/// `Some` marks a value the user set explicitly. Only explicit, non-empty
/// values take precedence over the environment.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub profile: Option<String>,
    pub device: Option<String>,
    pub duration_seconds: Option<u32>,
    pub token: Option<String>,
    pub region: Option<String>,
    pub force: bool,

    pub long_term_suffix: String,
    pub short_term_suffix: String,
    pub credentials_file: String,
}

impl Default for Inputs {
    fn default() -> Self {
        Self {
            profile: None,
            device: None,
            duration_seconds: None,
            token: None,
            region: None,
            force: false,
            long_term_suffix: DEFAULT_LONG_TERM_SUFFIX.to_owned(),
            short_term_suffix: DEFAULT_SHORT_TERM_SUFFIX.to_owned(),
            credentials_file: DEFAULT_CREDENTIALS_FILE.to_owned(),
        }
    }
}

/// Trimmed explicit value, `None` when unset or blank.
pub(crate) fn explicit(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
