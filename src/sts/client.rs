use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Url};
use tracing::{debug, info, warn};

use crate::error::{MfaError, Result};
use crate::helpers::time::now_utc;
use crate::sts::response::{parse_error_message, parse_session_credentials};
use crate::sts::sigv4::{sign, CanonicalParts, SigningParams};
use crate::sts::{ExchangeRequest, SessionCredentials, SessionExchanger};
use crate::utils::constants::DEFAULT_HTTP_TIMEOUT_MS;

static SERVICE: &str = "sts";
static API_VERSION: &str = "2011-06-15";
static FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// AWS STS `GetSessionToken` over the query API.
#[derive(Debug, Clone)]
pub struct StsClient {
    http: Client,
    /// Fixed endpoint; when unset the regional endpoint is used.
    endpoint: Option<String>,
}

impl StsClient {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS))
            .build()
            .map_err(|e| MfaError::Exchange(format!("build http client: {e}")))?;
        Ok(Self::with_client(http))
    }

    pub fn with_client(http: Client) -> Self {
        Self {
            http,
            endpoint: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    fn endpoint_for(&self, region: &str) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| format!("https://sts.{region}.amazonaws.com/"))
    }
}

#[async_trait]
impl SessionExchanger for StsClient {
    async fn exchange(&self, request: &ExchangeRequest) -> Result<SessionCredentials> {
        if request.region.trim().is_empty() {
            return Err(MfaError::Exchange("region is empty".to_owned()));
        }
        if request.access_key_id.is_empty() || request.secret_access_key.is_empty() {
            return Err(MfaError::Exchange(
                "access key id/secret access key must be set".to_owned(),
            ));
        }

        let endpoint = self.endpoint_for(&request.region);
        let url = Url::parse(&endpoint)
            .map_err(|e| MfaError::Exchange(format!("invalid endpoint {endpoint:?}: {e}")))?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_owned(),
            (None, _) => return Err(MfaError::Exchange(format!("endpoint {endpoint:?} has no host"))),
        };

        let body = form_body(&[
            ("Action", "GetSessionToken"),
            ("Version", API_VERSION),
            ("DurationSeconds", &request.duration_seconds.to_string()),
            ("SerialNumber", &request.serial_number),
            ("TokenCode", &request.token_code),
        ]);

        let signature = sign(
            &SigningParams {
                access_key_id: &request.access_key_id,
                secret_access_key: &request.secret_access_key,
                region: &request.region,
                service: SERVICE,
                time: now_utc(),
            },
            &CanonicalParts {
                method: "POST",
                host: &host,
                path: url.path(),
                query: url.query().unwrap_or_default(),
                content_type: FORM_CONTENT_TYPE,
                payload: body.as_bytes(),
            },
        );

        info!(endpoint = %url, region = %request.region, "requesting session token");
        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header("x-amz-date", signature.amz_date)
            .header(AUTHORIZATION, signature.authorization)
            .body(body)
            .send()
            .await
            .map_err(|e| MfaError::Exchange(format!("sts get-session-token: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| MfaError::Exchange(format!("read sts response: {e}")))?;

        if !status.is_success() {
            let detail = parse_error_message(&text).unwrap_or_else(|| format!("HTTP {status}"));
            warn!(status = status.as_u16(), "sts get-session-token rejected");
            return Err(MfaError::Exchange(format!("sts get-session-token: {detail}")));
        }

        let credentials = parse_session_credentials(&text)?;
        debug!(expiration = %credentials.expiration, "session token received");
        Ok(credentials)
    }
}

fn form_body(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
