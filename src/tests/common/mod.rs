// tests/common/mod.rs
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::app::{Deps, TokenSource};
use crate::config::{Inputs, MapEnv};
use crate::credentials::Store;
use crate::error::{MfaError, Result};
use crate::sts::{ExchangeRequest, SessionCredentials, SessionExchanger};

pub const LONG_TERM: &str = "default-long-term";
pub const SHORT_TERM: &str = "default";
pub const DEVICE: &str = "arn:aws:iam::123456789012:mfa/me";

pub fn utc(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 9, hour, 0, 0).unwrap()
}

/// Session exchanger double that records every request.
pub struct FakeExchanger {
    calls: Mutex<Vec<ExchangeRequest>>,
    response: std::result::Result<SessionCredentials, String>,
}

impl FakeExchanger {
    pub fn returning(credentials: SessionCredentials) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            response: Ok(credentials),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            response: Err(message.to_owned()),
        })
    }

    pub fn calls(&self) -> Vec<ExchangeRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionExchanger for FakeExchanger {
    async fn exchange(&self, request: &ExchangeRequest) -> Result<SessionCredentials> {
        self.calls.lock().unwrap().push(request.clone());
        self.response.clone().map_err(MfaError::Exchange)
    }
}

pub fn session(expiration: DateTime<Utc>) -> SessionCredentials {
    SessionCredentials {
        access_key_id: "ASIA_ST".into(),
        secret_access_key: "SECRET_ST".into(),
        session_token: "TOKEN_ST".into(),
        expiration,
    }
}

/// Answers every prompt with the same code and counts the prompts.
#[derive(Clone)]
pub struct FixedToken {
    token: String,
    asked: Arc<AtomicUsize>,
}

impl FixedToken {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_owned(),
            asked: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

impl TokenSource for FixedToken {
    fn read_token(&mut self, _device: &str, _duration_seconds: u32) -> Result<String> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        Ok(self.token.clone())
    }
}

/// Cloneable in-memory stdout.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn deps(
    now: DateTime<Utc>,
    env: MapEnv,
    exchanger: Arc<dyn SessionExchanger>,
    tokens: FixedToken,
    stdout: SharedBuf,
) -> Deps {
    Deps {
        now: Box::new(move || now),
        env: Box::new(env),
        exchanger,
        tokens: Box::new(tokens),
        stdout: Box::new(stdout),
    }
}

pub fn inputs(credentials_file: &Path) -> Inputs {
    Inputs {
        profile: Some("default".into()),
        credentials_file: credentials_file.to_string_lossy().into_owned(),
        ..Inputs::default()
    }
}

/// Writes a credentials file with a long-term section carrying keys and device.
pub fn seed_long_term(path: &Path) -> Store {
    let mut store = Store::load(path).unwrap();
    store.set(LONG_TERM, "aws_access_key_id", "AKIA_LT");
    store.set(LONG_TERM, "aws_secret_access_key", "SECRET_LT");
    store.set(LONG_TERM, "aws_mfa_device", DEVICE);
    store.save_atomic().unwrap();
    store
}

pub fn credentials_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join(".aws").join("credentials")
}
