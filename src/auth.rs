use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret as _, SecretString};
use sha1::{Digest as _, Sha1};

/// Wall-clock format the API expects inside the signature header.
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// API key pair identifying the caller.
///
/// The secret key is wrapped so it never shows up in `Debug` output or
/// logs. Credentials are fixed for the lifetime of a client.
#[derive(Clone, Debug)]
pub struct Credentials {
    user_key: String,
    secret_key: SecretString,
}

impl Credentials {
    pub fn new(user_key: impl Into<String>, secret_key: impl Into<SecretString>) -> Self {
        Self {
            user_key: user_key.into(),
            secret_key: secret_key.into(),
        }
    }

    #[must_use]
    pub fn user_key(&self) -> &str {
        &self.user_key
    }
}

/// Computes the `X-Api-Signature` value for one request attempt.
///
/// The digest covers `user_key + user_agent + timestamp + secret_key`, in
/// exactly that byte order; the server recomputes it and rejects any
/// mismatch, including a stale timestamp. Callers therefore invoke this
/// once per attempt rather than caching the result.
pub(crate) fn signature(
    credentials: &Credentials,
    user_agent: &str,
    now: DateTime<Utc>,
) -> String {
    let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
    let digest = sha1_base64(&format!(
        "{}{}{}{}",
        credentials.user_key,
        user_agent,
        timestamp,
        credentials.secret_key.expose_secret(),
    ));
    format!("{}:{timestamp}:{digest}", credentials.user_key)
}

fn sha1_base64(data: &str) -> String {
    BASE64.encode(Sha1::digest(data.as_bytes()))
}
