use std::io::{self, BufRead, Write};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{MfaError, Result};

fn six_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{6}$").expect("static regex"))
}

/// Trims `token` and checks it is exactly six ASCII digits.
pub fn validate_token(token: &str) -> Result<String> {
    let token = token.trim();
    if six_digits().is_match(token) {
        Ok(token.to_owned())
    } else {
        Err(MfaError::TokenFormat)
    }
}

/// Supplies an MFA code when none was given up front.
pub trait TokenSource: Send {
    fn read_token(&mut self, device: &str, duration_seconds: u32) -> Result<String>;
}

/// Prompts on one stream and reads a single line from another.
pub struct PromptTokenSource<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead + Send, W: Write + Send> PromptTokenSource<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl PromptTokenSource<io::BufReader<io::Stdin>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead + Send, W: Write + Send> TokenSource for PromptTokenSource<R, W> {
    fn read_token(&mut self, device: &str, duration_seconds: u32) -> Result<String> {
        let _ = write!(
            self.output,
            "Enter AWS MFA code for device [{device}] (renewing for {duration_seconds} seconds):"
        );
        let _ = self.output.flush();

        let mut line = String::new();
        self.input
            .read_line(&mut line)
            .map_err(|e| MfaError::io("read token", e))?;
        Ok(line.trim().to_owned())
    }
}
