//! AWS Signature Version 4 for form-encoded query API calls.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SIGNED_HEADERS: &str = "content-type;host;x-amz-date";

pub struct SigningParams<'a> {
    pub access_key_id: &'a str,
    pub secret_access_key: &'a str,
    pub region: &'a str,
    pub service: &'a str,
    pub time: DateTime<Utc>,
}

/// What has to be sent along with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub amz_date: String,
    pub authorization: String,
}

/// The request parts covered by the signature.
pub struct CanonicalParts<'a> {
    pub method: &'a str,
    pub host: &'a str,
    pub path: &'a str,
    /// Already encoded and sorted.
    pub query: &'a str,
    pub content_type: &'a str,
    pub payload: &'a [u8],
}

pub fn sign(params: &SigningParams<'_>, parts: &CanonicalParts<'_>) -> Signature {
    let amz_date = params.time.format("%Y%m%dT%H%M%SZ").to_string();
    let date = params.time.format("%Y%m%d").to_string();
    let scope = format!("{date}/{}/{}/aws4_request", params.region, params.service);

    let canonical = canonical_request(parts, &amz_date);
    let to_sign = string_to_sign(&amz_date, &scope, &canonical);
    let key = signing_key(params.secret_access_key, &date, params.region, params.service);
    let signature = hex::encode(hmac(&key, to_sign.as_bytes()));

    Signature {
        authorization: format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
            params.access_key_id
        ),
        amz_date,
    }
}

fn canonical_request(parts: &CanonicalParts<'_>, amz_date: &str) -> String {
    format!(
        "{}\n{}\n{}\ncontent-type:{}\nhost:{}\nx-amz-date:{}\n\n{}\n{}",
        parts.method,
        parts.path,
        parts.query,
        parts.content_type.trim(),
        parts.host.trim(),
        amz_date,
        SIGNED_HEADERS,
        hex::encode(Sha256::digest(parts.payload)),
    )
}

fn string_to_sign(amz_date: &str, scope: &str, canonical: &str) -> String {
    format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        hex::encode(Sha256::digest(canonical.as_bytes()))
    )
}

fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac(format!("AWS4{secret}").as_bytes(), date.as_bytes());
    let k_region = hmac(&k_date, region.as_bytes());
    let k_service = hmac(&k_region, service.as_bytes());
    hmac(&k_service, b"aws4_request")
}

fn hmac(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC takes keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
