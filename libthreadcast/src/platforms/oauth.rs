//! OAuth 1.0a request signing (HMAC-SHA1)
//!
//! Only the pieces the X client needs: building the signature base string,
//! signing it with the consumer and token secrets, and rendering the
//! `Authorization` header. JSON and multipart bodies are not part of the
//! signature; query parameters are.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{digest::InvalidLength, Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::distributions::Alphanumeric;
use rand::Rng;
use secrecy::ExposeSecret;
use sha1::Sha1;

use crate::credentials::XCredentials;

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 unreserved characters stay as-is, everything else is encoded
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub fn encode(value: &str) -> String {
    utf8_percent_encode(value, UNRESERVED).to_string()
}

/// Per-request values of the signature
#[derive(Debug, Clone)]
pub struct Nonce {
    pub nonce: String,
    pub timestamp: i64,
}

impl Nonce {
    pub fn generate() -> Self {
        let nonce = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        Self {
            nonce,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Compute the base64 HMAC-SHA1 signature over already collected parameters
pub fn signature(
    consumer_secret: &str,
    token_secret: &str,
    method: &str,
    base_url: &str,
    params: &[(String, String)],
) -> Result<String, InvalidLength> {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let base_string = format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(base_url),
        encode(&param_string)
    );
    let signing_key = format!("{}&{}", encode(consumer_secret), encode(token_secret));

    let mut mac = HmacSha1::new_from_slice(signing_key.as_bytes())?;
    mac.update(base_string.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Render the `Authorization` header for one request
///
/// `query` must hold every query parameter of `base_url`'s request; the URL
/// itself is passed without its query string.
pub fn authorization_header(
    credentials: &XCredentials,
    method: &str,
    base_url: &str,
    query: &[(&str, &str)],
    nonce: &Nonce,
) -> Result<String, InvalidLength> {
    let timestamp = nonce.timestamp.to_string();
    let mut oauth_params = vec![
        (
            "oauth_consumer_key".to_string(),
            credentials.api_key.expose_secret().to_string(),
        ),
        ("oauth_nonce".to_string(), nonce.nonce.clone()),
        (
            "oauth_signature_method".to_string(),
            "HMAC-SHA1".to_string(),
        ),
        ("oauth_timestamp".to_string(), timestamp),
        (
            "oauth_token".to_string(),
            credentials.access_token.expose_secret().to_string(),
        ),
        ("oauth_version".to_string(), "1.0".to_string()),
    ];

    let mut all_params = oauth_params.clone();
    all_params.extend(query.iter().map(|(k, v)| (k.to_string(), v.to_string())));

    let signed = signature(
        credentials.api_secret.expose_secret(),
        credentials.access_secret.expose_secret(),
        method,
        base_url,
        &all_params,
    )?;
    oauth_params.push(("oauth_signature".to_string(), signed));

    let header = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!("OAuth {}", header))
}
