use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Result;
use crate::error::Error;
use crate::transport::RawResponse;

/// Parses a successful response body into the caller-requested shape.
///
/// `serde_json::Value` is the open form: unknown fields survive and stay
/// reachable by name. A body that does not parse into `T` is a decode
/// error; decode errors are never retried, since resending cannot fix a
/// malformed payload.
pub(crate) fn decode<T: DeserializeOwned>(response: &RawResponse) -> Result<T> {
    serde_json::from_str(&response.text).map_err(Error::decode)
}

/// Narrows one element of a generically-decoded collection to `T`.
///
/// Items arrive as open JSON values inside a page; this converts each to
/// the target shape directly, without re-encoding through text.
pub(crate) fn convert_item<T: DeserializeOwned>(item: &Value) -> Result<T> {
    serde_json::from_value(item.clone()).map_err(Error::decode)
}
