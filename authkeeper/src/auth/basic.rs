//! Basic authorization header decoding.
//!
//! `Authorization: Basic <base64(identifier ":" secret)>` is taken apart in three steps, each of
//! which reports the exact [`MalformedCredential`] it hit:
//!
//! 1. [`extract_scheme_token`] strips the literal `"Basic "` prefix
//! 2. [`decode`] reverses the base64 transport encoding and checks UTF-8
//! 3. [`split_credentials`] splits on the first `:` (secrets may contain `:`)
//!
//! [`decode_header`] chains them.

use std::fmt;

use base64::{Engine as _, engine::general_purpose};

use super::error::MalformedCredential;

pub const BASIC_SCHEME_PREFIX: &str = "Basic ";

/// Identifier and secret recovered from a Basic header.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub identifier: String,
    pub secret: String,
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Returns the token following the exact, case-sensitive `"Basic "` prefix.
pub fn extract_scheme_token(header: Option<&str>) -> Result<&str, MalformedCredential> {
    let header = header.ok_or(MalformedCredential::Missing)?;
    header.strip_prefix(BASIC_SCHEME_PREFIX).ok_or(MalformedCredential::WrongScheme)
}

pub fn decode(token: &str) -> Result<String, MalformedCredential> {
    let bytes = general_purpose::STANDARD
        .decode(token)
        .map_err(|_| MalformedCredential::InvalidBase64)?;
    String::from_utf8(bytes).map_err(|_| MalformedCredential::InvalidUtf8)
}

pub fn split_credentials(plaintext: &str) -> Result<BasicCredentials, MalformedCredential> {
    let (identifier, secret) = plaintext.split_once(':').ok_or(MalformedCredential::MissingSeparator)?;
    Ok(BasicCredentials {
        identifier: identifier.to_string(),
        secret: secret.to_string(),
    })
}

pub fn decode_header(header: Option<&str>) -> Result<BasicCredentials, MalformedCredential> {
    let token = extract_scheme_token(header)?;
    let plaintext = decode(token)?;
    split_credentials(&plaintext)
}

/// Builds a header value; the inverse of [`decode_header`].
pub fn encode_header(identifier: &str, secret: &str) -> String {
    format!("{BASIC_SCHEME_PREFIX}{}", general_purpose::STANDARD.encode(format!("{identifier}:{secret}")))
}
