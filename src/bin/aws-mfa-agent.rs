use anyhow::{Context, Result};
use aws_mfa_agent::app::{run, Deps};
use aws_mfa_agent::config::{Inputs, OsEnv};
use aws_mfa_agent::utils::constants::{
    DEFAULT_CREDENTIALS_FILE, DEFAULT_LONG_TERM_SUFFIX, DEFAULT_SHORT_TERM_SUFFIX,
};
use aws_mfa_agent::utils::logging;
use aws_mfa_agent::utils::logging::LogLevel;
use clap::Parser;
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// AWS profile name (env: AWS_PROFILE, default: default)
    #[arg(long)]
    profile: Option<String>,
    /// MFA device ARN/serial (env: MFA_DEVICE, or aws_mfa_device in long-term section)
    #[arg(long)]
    device: Option<String>,
    /// STS session duration seconds (env: MFA_STS_DURATION, default: 43200)
    #[arg(long)]
    duration: Option<u32>,
    /// MFA token code (6 digits). If omitted, prompts on stdin
    #[arg(long)]
    token: Option<String>,
    /// Refresh credentials even if still valid
    #[arg(long)]
    force: bool,
    /// Suffix for long-term section (<profile>-<suffix>). Use 'none' for <profile>
    #[arg(long, default_value = DEFAULT_LONG_TERM_SUFFIX)]
    long_term_suffix: String,
    /// Suffix for short-term section (<profile>-<suffix>). Use 'none' for <profile>
    #[arg(long, default_value = DEFAULT_SHORT_TERM_SUFFIX)]
    short_term_suffix: String,
    /// Path to shared credentials file
    #[arg(long, default_value = DEFAULT_CREDENTIALS_FILE)]
    credentials_file: String,
    /// STS region (env: AWS_REGION, AWS_DEFAULT_REGION, default: us-east-1)
    #[arg(long)]
    region: Option<String>,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

impl Args {
    fn into_inputs(self) -> Inputs {
        Inputs {
            profile: self.profile,
            device: self.device,
            duration_seconds: self.duration,
            token: self.token,
            region: self.region,
            force: self.force,
            long_term_suffix: self.long_term_suffix,
            short_term_suffix: self.short_term_suffix,
            credentials_file: self.credentials_file,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::run(args.log_level, &OsEnv);

    let inputs = args.into_inputs();
    let mut deps = Deps::production().context("failed to initialise")?;

    // the prompt blocks a worker thread, so the refresh runs off the main task
    let refresh = tokio::spawn(async move { run(&inputs, &mut deps).await });

    tokio::select! {
        joined = refresh => {
            let outcome = joined.context("refresh task failed")??;
            info!(?outcome, "done");
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted");
            std::process::exit(130);
        }
    }

    Ok(())
}
