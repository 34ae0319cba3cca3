use serde::Serialize;

use crate::Result;
use crate::error::Error;

/// Wire encodings accepted for POST/PUT/PATCH bodies.
///
/// `UrlEncoded` is the API's default; JSON is opt-in per call.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ContentType {
    /// `application/x-www-form-urlencoded`: the body's fields flattened
    /// into URL-encoded `key=value` pairs.
    #[default]
    UrlEncoded,
    /// `application/json`.
    Json,
}

impl ContentType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ContentType::UrlEncoded => "application/x-www-form-urlencoded",
            ContentType::Json => "application/json",
        }
    }
}

/// A request body already rendered for the wire.
///
/// Encoding happens once per logical request; only the signature header
/// differs between retry attempts.
#[derive(Clone, Debug)]
pub(crate) struct EncodedBody {
    pub(crate) content_type: ContentType,
    pub(crate) payload: String,
}

impl EncodedBody {
    pub(crate) fn encode<B>(data: &B, content_type: ContentType) -> Result<Self>
    where
        B: Serialize + ?Sized,
    {
        let payload = match content_type {
            ContentType::UrlEncoded => serde_html_form::to_string(data)
                .map_err(|e| Error::validation(format!("cannot form-encode request body: {e}")))?,
            ContentType::Json => serde_json::to_string(data)
                .map_err(|e| Error::validation(format!("cannot JSON-encode request body: {e}")))?,
        };
        Ok(Self {
            content_type,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct NewMailbox<'a> {
        #[serde(rename = "displayName")]
        display_name: &'a str,
        size: u32,
        enabled: bool,
    }

    fn mailbox() -> NewMailbox<'static> {
        NewMailbox {
            display_name: "Jo Smith",
            size: 1024,
            enabled: true,
        }
    }

    #[test]
    fn url_encoded_flattens_fields_into_pairs() {
        let body = EncodedBody::encode(&mailbox(), ContentType::UrlEncoded).expect("encode");
        assert_eq!(body.content_type, ContentType::UrlEncoded);
        assert_eq!(body.payload, "displayName=Jo+Smith&size=1024&enabled=true");
    }

    #[test]
    fn json_serializes_the_full_value() {
        let body = EncodedBody::encode(&mailbox(), ContentType::Json).expect("encode");
        assert_eq!(body.content_type, ContentType::Json);
        assert_eq!(
            body.payload,
            r#"{"displayName":"Jo Smith","size":1024,"enabled":true}"#
        );
    }

    #[test]
    fn default_content_type_is_url_encoded() {
        assert_eq!(ContentType::default(), ContentType::UrlEncoded);
    }

    #[test]
    fn content_type_strings_match_the_wire_values() {
        assert_eq!(
            ContentType::UrlEncoded.as_str(),
            "application/x-www-form-urlencoded"
        );
        assert_eq!(ContentType::Json.as_str(), "application/json");
    }
}
