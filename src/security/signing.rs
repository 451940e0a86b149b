//! Signed-request scheme (`GW-HMAC-SHA256`).
//!
//! ```text
//! Authorization: GW-HMAC-SHA256 Credential=<key id>, SignedHeaders=host;x-gw-date, Signature=<hex>
//! X-Gw-Date:     20240101T120000Z
//!
//! canonical request = METHOD \n path \n canonical query \n canonical headers
//!                     \n signed headers \n hex(sha256(body))
//! string to sign    = GW-HMAC-SHA256 \n timestamp \n hex(sha256(canonical request))
//! signature         = hex(hmac_sha256(secret, string to sign))
//! ```

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::Method;
use chrono::{DateTime, NaiveDateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use url::form_urlencoded;

use crate::security::AuthError;

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "GW-HMAC-SHA256";
pub const DATE_HEADER: &str = "x-gw-date";
pub const DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Parsed `Authorization` header of a signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub credential: String,
    /// Lowercase header names, in the order they were signed.
    pub signed_headers: Vec<String>,
    pub signature: String,
}

impl SignatureHeader {
    pub fn parse(value: &str) -> Result<Self, AuthError> {
        let malformed = || AuthError::MalformedAuthorization(value.to_string());

        let rest = value
            .strip_prefix(ALGORITHM)
            .filter(|rest| rest.starts_with(' '))
            .ok_or_else(malformed)?;

        let mut credential = None;
        let mut signed_headers = None;
        let mut signature = None;
        for part in rest.split(',') {
            let (key, val) = part.trim().split_once('=').ok_or_else(malformed)?;
            match key {
                "Credential" => credential = Some(val.to_string()),
                "SignedHeaders" => {
                    signed_headers = Some(
                        val.split(';')
                            .map(|h| h.trim().to_ascii_lowercase())
                            .filter(|h| !h.is_empty())
                            .collect::<Vec<_>>(),
                    )
                }
                "Signature" => signature = Some(val.to_string()),
                _ => return Err(malformed()),
            }
        }

        match (credential, signed_headers, signature) {
            (Some(credential), Some(signed_headers), Some(signature))
                if !credential.is_empty() && !signed_headers.is_empty() && !signature.is_empty() =>
            {
                Ok(Self {
                    credential,
                    signed_headers,
                    signature,
                })
            }
            _ => Err(malformed()),
        }
    }

    pub fn to_header_value(&self) -> String {
        format!(
            "{} Credential={}, SignedHeaders={}, Signature={}",
            ALGORITHM,
            self.credential,
            self.signed_headers.join(";"),
            self.signature
        )
    }
}

/// Sorted, form-encoded query string.
pub fn canonical_query(query: Option<&str>) -> String {
    let mut pairs: Vec<(String, String)> = query
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();
    pairs.sort();
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// Build the canonical request. Every signed header must be present.
pub fn canonical_request(
    method: &Method,
    path: &str,
    query: Option<&str>,
    headers: &HeaderMap,
    signed_headers: &[String],
    body: &[u8],
) -> Result<String, AuthError> {
    let mut canonical_headers = String::new();
    for name in signed_headers {
        let value = headers
            .get(name.as_str())
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AuthError::MissingSignedHeader(name.clone()))?;
        canonical_headers.push_str(name);
        canonical_headers.push(':');
        canonical_headers.push_str(value.trim());
        canonical_headers.push('\n');
    }

    Ok(format!(
        "{}\n{}\n{}\n{}{}\n{}",
        method.as_str(),
        path,
        canonical_query(query),
        canonical_headers,
        signed_headers.join(";"),
        hex::encode(Sha256::digest(body))
    ))
}

pub fn string_to_sign(timestamp: &str, canonical_request: &str) -> String {
    format!(
        "{}\n{}\n{}",
        ALGORITHM,
        timestamp,
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    )
}

fn mac(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length")
}

/// Hex HMAC-SHA256 of `string_to_sign`.
pub fn sign(secret: &str, string_to_sign: &str) -> String {
    let mut mac = mac(secret);
    mac.update(string_to_sign.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time signature check.
pub fn verify(secret: &str, string_to_sign: &str, signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex) else {
        return false;
    };
    let mut mac = mac(secret);
    mac.update(string_to_sign.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, AuthError> {
    NaiveDateTime::parse_from_str(value, DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| AuthError::MalformedDate(value.to_string()))
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(DATE_FORMAT).to_string()
}

/// Sign an outgoing request in place: sets `X-Gw-Date` and `Authorization`.
///
/// `host` (when present) and the date header are signed.
#[allow(clippy::too_many_arguments)]
pub fn sign_request(
    access_key_id: &str,
    secret: &str,
    method: &Method,
    path: &str,
    query: Option<&str>,
    headers: &mut HeaderMap,
    body: &[u8],
    now: DateTime<Utc>,
) -> Result<(), AuthError> {
    let timestamp = format_timestamp(now);
    let date_value = HeaderValue::from_str(&timestamp)
        .map_err(|_| AuthError::MalformedDate(timestamp.clone()))?;
    headers.insert(HeaderName::from_static(DATE_HEADER), date_value);

    let mut signed_headers = vec![DATE_HEADER.to_string()];
    if headers.contains_key(header::HOST) {
        signed_headers.push("host".to_string());
    }
    signed_headers.sort();

    let canonical = canonical_request(method, path, query, headers, &signed_headers, body)?;
    let signature = sign(secret, &string_to_sign(&timestamp, &canonical));
    let authorization = SignatureHeader {
        credential: access_key_id.to_string(),
        signed_headers,
        signature,
    }
    .to_header_value();

    let value = HeaderValue::from_str(&authorization)
        .map_err(|_| AuthError::MalformedAuthorization(authorization.clone()))?;
    headers.insert(header::AUTHORIZATION, value);
    Ok(())
}
