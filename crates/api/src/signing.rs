//! HMAC-SHA256 request signing for the OpenAPI gateway.
//!
//! Canonical request layout:
//!
//! ```text
//! METHOD \n PATH \n SORTED_QUERY \n CANONICAL_HEADERS \n SIGNED_HEADERS \n HEX(SHA256(BODY))
//! ```
//!
//! The signing key is derived as
//! `HMAC(HMAC(HMAC(HMAC(secret, date), region), service), "request")`.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HMAC-SHA256";
const SIGNED_HEADER_NAMES: &str = "content-type;host;x-content-sha256;x-date";
pub(crate) const CONTENT_TYPE_JSON: &str = "application/json";

/// RFC 3986 unreserved characters stay as-is.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Everything that goes into one signature.
#[derive(Debug, Clone)]
pub struct SigningInput<'a> {
    pub method: &'a str,
    pub host: &'a str,
    pub path: &'a str,
    pub query: &'a [(&'a str, &'a str)],
    pub body: &'a [u8],
    pub access_key: &'a str,
    pub secret_key: &'a str,
    pub region: &'a str,
    pub service: &'a str,
}

/// Headers to attach to the signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub x_date: String,
    pub content_sha256: String,
    pub authorization: String,
}

/// Sign a request at instant `now`.
pub fn sign_request(input: &SigningInput<'_>, now: DateTime<Utc>) -> SignedHeaders {
    let x_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let short_date = now.format("%Y%m%d").to_string();
    let content_sha256 = sha256_hex(input.body);

    let canonical_headers = format!(
        "content-type:{CONTENT_TYPE_JSON}\nhost:{}\nx-content-sha256:{content_sha256}\nx-date:{x_date}\n",
        input.host
    );
    let query = canonical_query(input.query);
    let canonical_request = [
        input.method,
        if input.path.is_empty() { "/" } else { input.path },
        query.as_str(),
        canonical_headers.as_str(),
        SIGNED_HEADER_NAMES,
        content_sha256.as_str(),
    ]
    .join("\n");

    let credential_scope = format!("{short_date}/{}/{}/request", input.region, input.service);
    let string_to_sign = format!(
        "{ALGORITHM}\n{x_date}\n{credential_scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    );

    let date_key = hmac_sha256(input.secret_key.as_bytes(), short_date.as_bytes());
    let region_key = hmac_sha256(&date_key, input.region.as_bytes());
    let service_key = hmac_sha256(&region_key, input.service.as_bytes());
    let signing_key = hmac_sha256(&service_key, b"request");
    let signature = to_hex(&hmac_sha256(&signing_key, string_to_sign.as_bytes()));

    SignedHeaders {
        authorization: format!(
            "{ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={SIGNED_HEADER_NAMES}, Signature={signature}",
            input.access_key
        ),
        x_date,
        content_sha256,
    }
}

fn canonical_query(query: &[(&str, &str)]) -> String {
    let mut pairs: Vec<(String, String)> = query
        .iter()
        .map(|(key, value)| {
            (
                utf8_percent_encode(key, QUERY_ENCODE_SET).to_string(),
                utf8_percent_encode(value, QUERY_ENCODE_SET).to_string(),
            )
        })
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn sha256_hex(data: &[u8]) -> String {
    to_hex(&Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length, so construction cannot fail.
    let mut mac = match HmacSha256::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => return Vec::new(),
    };
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}
