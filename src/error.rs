use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = MfaError> = std::result::Result<T, E>;

/// Every failure the credential lifecycle can surface.
#[derive(Debug, Error)]
pub enum MfaError {
    /// Bad or contradictory user-facing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing MFA device: set --device, MFA_DEVICE, or aws_mfa_device in the long-term credentials section")]
    MissingDevice,

    #[error("missing {key:?} in [{section}]")]
    MissingKey { section: String, key: String },

    #[error("failed to parse credentials file {}: line {line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("invalid expiration {value:?}: {reason}")]
    InvalidExpiration { value: String, reason: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("session exchange failed: {0}")]
    Exchange(String),

    #[error("token must be six digits")]
    TokenFormat,
}

impl MfaError {
    pub fn config(message: impl Into<String>) -> Self {
        MfaError::Config(message.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        MfaError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn missing_key(section: &str, key: &str) -> Self {
        MfaError::MissingKey {
            section: section.to_owned(),
            key: key.to_owned(),
        }
    }
}
