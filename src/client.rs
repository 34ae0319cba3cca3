use std::sync::Arc;

use bon::bon;
use reqwest::{Client as ReqwestClient, Method};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::auth::Credentials;
use crate::body::{ContentType, EncodedBody};
use crate::config::Config;
use crate::decode;
use crate::error::Error;
use crate::paging::{self, DEFAULT_PAGE_SIZE, PagingPropertyNames};
use crate::retry::{RetryPolicy, RetryingDispatcher};
use crate::throttle::{RateLimit, RequestWindow};
use crate::transport::{ApiRequest, HttpTransport, SendRequest as _};
use crate::{DEFAULT_BASE_URL, Result};

/// Asynchronous Cloud Office API client.
///
/// Every request goes through one pipeline: rate-limit admission, a
/// freshly signed attempt, and throttle-aware retry. The client is cheap
/// to clone; clones share the same request window, so the rate limit
/// applies to the client as a whole, not per clone.
#[derive(Clone, Debug)]
pub struct Client {
    base_url: Url,
    credentials: Credentials,
    dispatcher: RetryingDispatcher<HttpTransport>,
}

#[bon]
impl Client {
    /// Builds a client.
    ///
    /// `user_key` and `secret_key` are required; everything else has a
    /// production default.
    #[builder]
    pub fn new(
        #[builder(into)] user_key: String,
        #[builder(into)] secret_key: SecretString,
        #[builder(into)] base_url: Option<String>,
        #[builder(default)] rate_limit: RateLimit,
        #[builder(default)] retry: RetryPolicy,
        headers: Option<Vec<(String, String)>>,
        http_client: Option<ReqwestClient>,
    ) -> Result<Self> {
        if user_key.is_empty() {
            return Err(Error::config("user key is required"));
        }
        if secret_key.expose_secret().is_empty() {
            return Err(Error::config("secret key is required"));
        }
        let base_url = Url::parse(base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::config(format!("base URL cannot carry paths: {base_url}")));
        }

        let credentials = Credentials::new(user_key, secret_key);
        let window = Arc::new(RequestWindow::new(rate_limit));
        let transport = HttpTransport::new(
            http_client.unwrap_or_default(),
            credentials.clone(),
            headers.unwrap_or_default(),
            window,
        );

        Ok(Self {
            base_url,
            credentials,
            dispatcher: RetryingDispatcher::new(transport, retry),
        })
    }
}

impl Client {
    /// Client with default settings against the production API.
    pub fn with_credentials(
        user_key: impl Into<String>,
        secret_key: impl Into<SecretString>,
    ) -> Result<Self> {
        Self::builder()
            .user_key(user_key.into())
            .secret_key(secret_key.into())
            .build()
    }

    /// Client from an external configuration source.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::builder()
            .user_key(config.user_key.clone())
            .secret_key(config.secret_key.clone())
            .base_url(config.base_url.clone())
            .build()
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn user_key(&self) -> &str {
        self.credentials.user_key()
    }

    /// Issues a GET and decodes the response into `T`.
    ///
    /// Use `serde_json::Value` as `T` when the response shape is not
    /// known up front.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.request(Method::GET, path, None)?;
        let response = self.dispatcher.send(&request).await?;
        decode::decode(&response)
    }

    /// Accumulates every item of a paged resource, using the default
    /// field names and page size.
    pub async fn get_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        self.get_all_with(path, &PagingPropertyNames::default(), DEFAULT_PAGE_SIZE)
            .await
    }

    /// Accumulates every item of a paged resource, in request order.
    ///
    /// Offsets advance by `page_size` until they reach the total the most
    /// recently fetched page reports. The total is re-read every page, so
    /// a collection that grows mid-walk keeps being fetched; termination
    /// assumes the server's total eventually settles.
    pub async fn get_all_with<T: DeserializeOwned>(
        &self,
        path: &str,
        names: &PagingPropertyNames,
        page_size: u32,
    ) -> Result<Vec<T>> {
        if page_size == 0 {
            return Err(Error::validation("page size must be at least 1"));
        }

        let base = self.endpoint(path)?;
        let mut collected = Vec::new();
        let mut offset = 0_u64;
        loop {
            let request = ApiRequest {
                method: Method::GET,
                url: paging::page_url(&base, names, offset, page_size),
                body: None,
            };
            let response = self.dispatcher.send(&request).await?;
            let page: Value = decode::decode(&response)?;

            for item in paging::read_items(&page, &names.items)? {
                collected.push(decode::convert_item(item)?);
            }

            let total = paging::read_total(&page, &names.total)?;
            offset += u64::from(page_size);
            if offset >= total {
                break;
            }
        }
        Ok(collected)
    }

    /// Issues a POST with the API's default url-encoded body.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.post_with(path, body, ContentType::default()).await
    }

    /// Issues a POST with an explicit body encoding.
    pub async fn post_with<T, B>(
        &self,
        path: &str,
        body: &B,
        content_type: ContentType,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::POST, path, body, content_type)
            .await
    }

    /// Issues a PUT with the API's default url-encoded body.
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.put_with(path, body, ContentType::default()).await
    }

    /// Issues a PUT with an explicit body encoding.
    pub async fn put_with<T, B>(
        &self,
        path: &str,
        body: &B,
        content_type: ContentType,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::PUT, path, body, content_type)
            .await
    }

    /// Issues a PATCH with the API's default url-encoded body.
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.patch_with(path, body, ContentType::default()).await
    }

    /// Issues a PATCH with an explicit body encoding.
    pub async fn patch_with<T, B>(
        &self,
        path: &str,
        body: &B,
        content_type: ContentType,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::PATCH, path, body, content_type)
            .await
    }

    /// Issues a DELETE; the API sends no body on success.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let request = self.request(Method::DELETE, path, None)?;
        self.dispatcher.send(&request).await?;
        Ok(())
    }

    async fn send_with_body<T, B>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        content_type: ContentType,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let encoded = EncodedBody::encode(body, content_type)?;
        let request = self.request(method, path, Some(encoded))?;
        let response = self.dispatcher.send(&request).await?;
        decode::decode(&response)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<EncodedBody>,
    ) -> Result<ApiRequest> {
        Ok(ApiRequest {
            method,
            url: self.endpoint(path)?,
            body,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }
}
