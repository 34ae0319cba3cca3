use std::error::Error as StdError;
use std::fmt;

use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Server message that marks a 403 as a throttle signal rather than an
/// authorization failure.
const THROTTLED_MESSAGE: &str = "Exceeded request limits";

/// Error returned by every fallible operation in this crate.
pub struct Error {
    kind: Kind,
    message: Option<String>,
    source: Option<BoxError>,
    api: Option<Box<ApiError>>,
}

/// Broad classification of an [`Error`].
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    /// A required value was missing from a configuration source.
    Config,
    /// An input was rejected before any request was sent.
    Validation,
    /// The request failed below the HTTP layer, with no server response.
    Transport,
    /// The server answered with a non-2xx status.
    Api,
    /// A 2xx response body could not be parsed into the requested shape.
    Decode,
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::new(Kind::Config).with_message(message)
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::new(Kind::Validation).with_message(message)
    }

    pub(crate) fn transport(source: impl Into<BoxError>) -> Self {
        Self::new(Kind::Transport).with_source(source)
    }

    pub(crate) fn decode(source: impl Into<BoxError>) -> Self {
        Self::new(Kind::Decode).with_source(source)
    }

    pub(crate) fn decode_message(message: impl Into<String>) -> Self {
        Self::new(Kind::Decode).with_message(message)
    }

    pub(crate) fn api(api: ApiError) -> Self {
        let mut err = Self::new(Kind::Api);
        err.api = Some(Box::new(api));
        err
    }

    fn new(kind: Kind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
            api: None,
        }
    }

    fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Details of the failed HTTP exchange, for errors of kind [`Kind::Api`].
    #[must_use]
    pub fn api_error(&self) -> Option<&ApiError> {
        self.api.as_deref()
    }

    /// HTTP status of the failed exchange, when one was received.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.api.as_deref().and_then(ApiError::status)
    }

    /// Whether this error is the server's request-quota signal.
    ///
    /// Only such errors are absorbed by the retry loop; every other error
    /// reaches the caller on the first attempt.
    #[must_use]
    pub fn is_throttled(&self) -> bool {
        self.api.as_deref().is_some_and(ApiError::is_throttled)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Kind::Config => f.write_str("configuration error")?,
            Kind::Validation => f.write_str("invalid input")?,
            Kind::Transport => f.write_str("transport error")?,
            Kind::Api => f.write_str("api error")?,
            Kind::Decode => f.write_str("decode error")?,
        }
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(api) = &self.api {
            write!(f, ": {api}")?;
        }
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("Error");
        builder.field("kind", &self.kind);
        if let Some(message) = &self.message {
            builder.field("message", message);
        }
        if let Some(api) = &self.api {
            builder.field("api", api);
        }
        if let Some(source) = &self.source {
            builder.field("source", source);
        }
        builder.finish()
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::transport(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::validation(err.to_string())
    }
}

/// A non-2xx response, kept whole so callers can branch on status and body.
#[derive(Clone, Debug)]
pub struct ApiError {
    status: Option<StatusCode>,
    body: ErrorBody,
    url: Option<Url>,
}

/// Body of a failed exchange: structured when the server sent JSON, raw
/// text otherwise.
#[derive(Clone, Debug)]
pub enum ErrorBody {
    Json(Value),
    Text(String),
}

impl ApiError {
    pub(crate) fn from_response(status: StatusCode, body: String, url: Url) -> Self {
        let body = match serde_json::from_str(&body) {
            Ok(value) => ErrorBody::Json(value),
            Err(_) => ErrorBody::Text(body),
        };
        Self {
            status: Some(status),
            body,
            url: Some(url),
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    #[must_use]
    pub fn body(&self) -> &ErrorBody {
        &self.body
    }

    /// The decoded body, when the server sent JSON.
    #[must_use]
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            ErrorBody::Json(value) => Some(value),
            ErrorBody::Text(_) => None,
        }
    }

    #[must_use]
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// True when this is the server's throttle signal: a 403 whose body
    /// carries `unauthorizedFault.message == "Exceeded request limits"`.
    #[must_use]
    pub fn is_throttled(&self) -> bool {
        if self.status != Some(StatusCode::FORBIDDEN) {
            return false;
        }
        self.json()
            .and_then(|body| body.get("unauthorizedFault"))
            .and_then(|fault| fault.get("message"))
            .and_then(Value::as_str)
            == Some(THROTTLED_MESSAGE)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{status}")?,
            None => f.write_str("no status")?,
        }
        if let Some(url) = &self.url {
            write!(f, " from {url}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn throttled_body() -> String {
        json!({
            "unauthorizedFault": {
                "code": 403,
                "message": "Exceeded request limits",
            }
        })
        .to_string()
    }

    #[test]
    fn throttle_signal_is_recognized() {
        let url = Url::parse("https://api.emailsrvr.com/v1/customers").expect("url");
        let api = ApiError::from_response(StatusCode::FORBIDDEN, throttled_body(), url);
        assert!(api.is_throttled(), "403 + quota message is the throttle signal");
    }

    #[test]
    fn forbidden_with_other_message_is_not_throttled() {
        let url = Url::parse("https://api.emailsrvr.com/v1/customers").expect("url");
        let body = json!({
            "unauthorizedFault": { "code": 403, "message": "Invalid signature" }
        })
        .to_string();
        let api = ApiError::from_response(StatusCode::FORBIDDEN, body, url);
        assert!(!api.is_throttled(), "ordinary 403s must propagate");
    }

    #[test]
    fn other_status_with_quota_message_is_not_throttled() {
        let url = Url::parse("https://api.emailsrvr.com/v1/customers").expect("url");
        let api =
            ApiError::from_response(StatusCode::INTERNAL_SERVER_ERROR, throttled_body(), url);
        assert!(!api.is_throttled(), "only 403 carries the throttle signal");
    }

    #[test]
    fn non_json_body_falls_back_to_raw_text() {
        let url = Url::parse("https://api.emailsrvr.com/v1/customers").expect("url");
        let api = ApiError::from_response(
            StatusCode::BAD_GATEWAY,
            "<html>bad gateway</html>".to_owned(),
            url,
        );
        assert!(api.json().is_none());
        assert!(matches!(api.body(), ErrorBody::Text(text) if text.contains("bad gateway")));
        assert!(!api.is_throttled());
    }

    #[test]
    fn error_exposes_status_and_body() {
        let url = Url::parse("https://api.emailsrvr.com/v1/domains").expect("url");
        let err = Error::api(ApiError::from_response(
            StatusCode::NOT_FOUND,
            json!({ "itemNotFoundFault": { "message": "No such domain" } }).to_string(),
            url,
        ));
        assert_eq!(err.kind(), Kind::Api);
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        let fault = err
            .api_error()
            .and_then(ApiError::json)
            .and_then(|body| body.get("itemNotFoundFault"))
            .expect("decoded fault");
        assert_eq!(fault["message"], "No such domain");
    }
}
