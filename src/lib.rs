//! Rackspace Cloud Office (Hosted Email) REST API client.
//!
//! Every call goes through one dispatch pipeline:
//! - a shared request window keeps the outgoing rate under the API quota
//! - each attempt carries a freshly computed `X-Api-Signature` header
//! - the server's own throttle response is absorbed with doubling backoff
//! - paged resources are accumulated offset by offset through that same
//!   chain, so pagination inherits throttling and retry transparently
//!
//! Response shapes are caller-chosen: any `serde::Deserialize` type, or
//! `serde_json::Value` when no fixed shape is known.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cloudoffice_client_sdk::Client;
//! use serde_json::Value;
//!
//! # async fn example() -> cloudoffice_client_sdk::Result<()> {
//! let client = Client::builder()
//!     .user_key("user-key")
//!     .secret_key("secret-key".to_owned())
//!     .build()?;
//!
//! let customer: Value = client.get("/v1/customers/123456").await?;
//! println!("customer: {}", customer["name"]);
//!
//! let domains: Vec<Value> = client.get_all("/v1/customers/123456/domains").await?;
//! println!("{} domains", domains.len());
//! # Ok(())
//! # }
//! ```

mod auth;
mod body;
mod client;
mod config;
mod decode;
mod error;
mod paging;
mod retry;
mod throttle;
mod transport;

pub use auth::Credentials;
pub use body::ContentType;
pub use client::Client;
pub use config::{BASE_URL_VAR, Config, SECRET_KEY_VAR, USER_KEY_VAR};
pub use error::{ApiError, Error, ErrorBody, Kind as ErrorKind};
pub use paging::PagingPropertyNames;
pub use retry::RetryPolicy;
pub use throttle::RateLimit;

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Production API endpoint, used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.emailsrvr.com";

/// Identifying user-agent sent on every request.
///
/// The signature digest covers this exact value, so the transport and the
/// signer must agree on it.
pub const USER_AGENT: &str = concat!("cloudoffice-client-sdk/", env!("CARGO_PKG_VERSION"));

/// Header carrying the per-request signature.
pub const SIGNATURE_HEADER: &str = "X-Api-Signature";
