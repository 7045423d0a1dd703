//! Shared constants and invariants

// Environment variables
pub const ENV_PROFILE: &str = "AWS_PROFILE";
pub const ENV_MFA_DEVICE: &str = "MFA_DEVICE";
pub const ENV_STS_DURATION: &str = "MFA_STS_DURATION";
pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

// Defaults
pub const DEFAULT_PROFILE: &str = "default";
pub const DEFAULT_LONG_TERM_SUFFIX: &str = "long-term";
pub const DEFAULT_SHORT_TERM_SUFFIX: &str = "none";
pub const DEFAULT_CREDENTIALS_FILE: &str = "~/.aws/credentials";
pub const DEFAULT_REGION: &str = "us-east-1";
/// 12 hours
pub const DEFAULT_DURATION_SECONDS: u32 = 43_200;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;

/// Sentinel suffix meaning "use the bare profile name".
pub const SUFFIX_NONE: &str = "none";

// Credentials file keys
pub const KEY_ACCESS_KEY_ID: &str = "aws_access_key_id";
pub const KEY_SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
pub const KEY_SESSION_TOKEN: &str = "aws_session_token";
pub const KEY_SECURITY_TOKEN: &str = "aws_security_token";
pub const KEY_EXPIRATION: &str = "expiration";
pub const KEY_MFA_DEVICE: &str = "aws_mfa_device";
pub const KEY_ASSUMED_ROLE: &str = "assumed_role";
pub const KEY_ASSUMED_ROLE_ARN: &str = "assumed_role_arn";

/// `YYYY-MM-DD HH:MM:SS`, always UTC.
pub const EXPIRATION_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
