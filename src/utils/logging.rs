use clap::ValueEnum;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::env::Env;
use crate::config::settings::{LogFormat, LoggingConfig};

/// Quiet unless asked: stdout carries the user-facing status lines.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match *self {
            LogLevel::TRACE => "TRACE",
            LogLevel::DEBUG => "DEBUG",
            LogLevel::INFO => "INFO",
            LogLevel::WARN => "WARN",
            LogLevel::ERROR => "ERROR",
        }
    }
}

/// Builds the logging config from the CLI level and `LOG_FORMAT`.
pub fn logging_config(arg_log_level: Option<LogLevel>, env: &dyn Env) -> LoggingConfig {
    LoggingConfig::new(
        arg_log_level
            .map(|level| level.as_str().to_lowercase())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_owned()),
        LogFormat::from_env(env),
    )
}

pub fn run(arg_log_level: Option<LogLevel>, env: &dyn Env) {
    init_logging(&logging_config(arg_log_level, env));
}

/// Initialize tracing with the desired config. Logs go to stderr.
pub fn init_logging(cfg: &LoggingConfig) {
    let env_filter = EnvFilter::try_new(&cfg.level)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    let registry = tracing_subscriber::registry().with(env_filter);

    match cfg.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_timer(UtcTime::rfc_3339())
                .flatten_event(true)
                .with_writer(std::io::stderr)
                .with_ansi(false);

            let _ = registry.with(layer).try_init();
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_timer(UtcTime::rfc_3339())
                .with_writer(std::io::stderr)
                .with_ansi(true);

            let _ = registry.with(layer).try_init();
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::MapEnv;
    use crate::utils::constants::ENV_LOG_FORMAT;

    #[test]
    fn cli_level_wins_over_default() {
        let env = MapEnv::new();
        assert_eq!(logging_config(None, &env).level, "warn");
        assert_eq!(logging_config(Some(LogLevel::DEBUG), &env).level, "debug");
    }

    #[test]
    fn format_follows_env() {
        let env = MapEnv::new().with(ENV_LOG_FORMAT, "json");
        assert_eq!(logging_config(None, &env).format, LogFormat::Json);
    }

    #[test]
    fn init_twice_is_harmless() {
        let cfg = logging_config(Some(LogLevel::ERROR), &MapEnv::new());
        init_logging(&cfg);
        init_logging(&cfg);
    }
}
