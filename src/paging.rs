use serde_json::Value;
use url::Url;

use crate::Result;
use crate::error::Error;

/// Page size requested when the caller does not pick one.
pub(crate) const DEFAULT_PAGE_SIZE: u32 = 50;

/// Field names a paged resource uses for its query parameters and
/// response envelope.
///
/// Most endpoints use the defaults; a handful of older resources rename
/// the items collection, hence the overrides.
#[derive(Clone, Debug)]
pub struct PagingPropertyNames {
    /// Response field holding the page's items array.
    pub items: String,
    /// Query parameter carrying the current offset.
    pub offset: String,
    /// Query parameter carrying the requested page size.
    pub page_size: String,
    /// Response field holding the collection's running total.
    pub total: String,
}

impl Default for PagingPropertyNames {
    fn default() -> Self {
        Self {
            items: "items".to_owned(),
            offset: "offset".to_owned(),
            page_size: "size".to_owned(),
            total: "total".to_owned(),
        }
    }
}

impl PagingPropertyNames {
    /// Default names with only the items collection renamed, the common
    /// deviation among older resources.
    #[must_use]
    pub fn with_items(items: impl Into<String>) -> Self {
        Self {
            items: items.into(),
            ..Self::default()
        }
    }
}

/// Appends the paging query parameters to a page's URL, joining onto any
/// query string the path already carries.
pub(crate) fn page_url(
    base: &Url,
    names: &PagingPropertyNames,
    offset: u64,
    page_size: u32,
) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair(&names.offset, &offset.to_string())
        .append_pair(&names.page_size, &page_size.to_string());
    url
}

/// Case-insensitive field lookup; the API's property casing is not
/// guaranteed stable across resources.
fn find_field<'a>(page: &'a Value, name: &str) -> Option<&'a Value> {
    let map = page.as_object()?;
    map.get(name).or_else(|| {
        map.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

/// Locates the page's items array.
pub(crate) fn read_items<'a>(page: &'a Value, name: &str) -> Result<&'a Vec<Value>> {
    find_field(page, name)
        .ok_or_else(|| Error::decode_message(format!("paged response has no `{name}` field")))?
        .as_array()
        .ok_or_else(|| Error::decode_message(format!("paged response `{name}` is not an array")))
}

/// Reads the running total the page reports, coercing numeric strings.
pub(crate) fn read_total(page: &Value, name: &str) -> Result<u64> {
    let value = find_field(page, name)
        .ok_or_else(|| Error::decode_message(format!("paged response has no `{name}` field")))?;
    let total = match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };
    total.ok_or_else(|| {
        Error::decode_message(format!("paged response `{name}` is not a count: {value}"))
    })
}
