use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header;
use reqwest::{Client as ReqwestClient, Method, StatusCode};
use tracing::debug;
use url::Url;

use crate::auth::{self, Credentials};
use crate::body::{ContentType, EncodedBody};
use crate::error::{ApiError, Error};
use crate::throttle::RequestWindow;
use crate::{Result, SIGNATURE_HEADER, USER_AGENT};

/// One outbound request, independent of any particular attempt.
///
/// The signature header is deliberately not part of this value: it is
/// computed at send time, so a retried request automatically carries a
/// current timestamp instead of replaying a stale one.
#[derive(Clone, Debug)]
pub(crate) struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) body: Option<EncodedBody>,
}

/// A fully-read response: status plus the body text.
///
/// Reading the body eagerly drains the connection on every path, so
/// nothing downstream can leak it.
#[derive(Clone, Debug)]
pub(crate) struct RawResponse {
    pub(crate) status: StatusCode,
    pub(crate) text: String,
}

/// Seam between the retry wrapper and the real HTTP transport. Test
/// doubles implement this to script failure sequences.
#[async_trait]
pub(crate) trait SendRequest: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse>;
}

/// reqwest-backed transport: waits for rate-limit admission, signs, sends,
/// and classifies the response.
#[derive(Clone, Debug)]
pub(crate) struct HttpTransport {
    http: ReqwestClient,
    credentials: Credentials,
    headers: Vec<(String, String)>,
    window: Arc<RequestWindow>,
}

impl HttpTransport {
    pub(crate) fn new(
        http: ReqwestClient,
        credentials: Credentials,
        headers: Vec<(String, String)>,
        window: Arc<RequestWindow>,
    ) -> Self {
        Self {
            http,
            credentials,
            headers,
            window,
        }
    }
}

#[async_trait]
impl SendRequest for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse> {
        self.window.acquire().await;

        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone())
            .header(header::ACCEPT, ContentType::Json.as_str())
            .header(header::USER_AGENT, USER_AGENT);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        // Signature last: it covers the exact user-agent being sent and
        // must embed a timestamp taken at this attempt.
        builder = builder.header(
            SIGNATURE_HEADER,
            auth::signature(&self.credentials, USER_AGENT, Utc::now()),
        );
        if let Some(body) = &request.body {
            builder = builder
                .header(header::CONTENT_TYPE, body.content_type.as_str())
                .body(body.payload.clone());
        }

        debug!(method = %request.method, url = %request.url, "sending request");

        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().clone();
        let text = response.text().await?;

        if status.is_success() {
            Ok(RawResponse { status, text })
        } else {
            Err(Error::api(ApiError::from_response(status, text, url)))
        }
    }
}
