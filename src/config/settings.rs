use crate::config::env::Env;
use crate::utils::constants::ENV_LOG_FORMAT;

/// ================================
/// Logging
/// ================================
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

impl LogFormat {
    pub fn from_env(env: &dyn Env) -> Self {
        match env
            .lookup(ENV_LOG_FORMAT)
            .unwrap_or_else(|| "compact".to_string())
            .to_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}
