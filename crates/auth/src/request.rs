//! Transport-neutral view of a request, for parameter extraction.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::ParamSource;

/// Header checked last by the default lookup.
pub const TAX_ID_HEADER: &str = "x-tax-id";

/// Default lookup order when the caller names no parameter.
const DEFAULT_LOOKUP: [(ParamSource, &str); 7] = [
    (ParamSource::Path, "taxId"),
    (ParamSource::Path, "tax_id"),
    (ParamSource::Query, "taxId"),
    (ParamSource::Query, "tax_id"),
    (ParamSource::Body, "taxId"),
    (ParamSource::Body, "tax_id"),
    (ParamSource::Header, TAX_ID_HEADER),
];

/// The four parameter buckets a host adapter copies out of its request.
///
/// Header names are matched case-insensitively; deserialized and
/// builder-added names are stored lowercase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestRecord {
    pub path: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub body: serde_json::Map<String, Value>,
    #[serde(deserialize_with = "lowercase_keys")]
    pub headers: BTreeMap<String, String>,
}

fn lowercase_keys<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, String>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value))
        .collect())
}

impl RequestRecord {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_path(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.body.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Non-empty value of `name` in one bucket.
    pub fn get(&self, source: ParamSource, name: &str) -> Option<String> {
        let found = match source {
            ParamSource::Path => self.path.get(name).cloned(),
            ParamSource::Query => self.query.get(name).cloned(),
            ParamSource::Body => self.body.get(name).and_then(body_scalar),
            ParamSource::Header => self
                .headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.clone()),
        };
        found.filter(|v| !v.is_empty())
    }
}

fn body_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Look up a parameter.
///
/// - name and source: only that bucket.
/// - name only: path, query, body, header; first hit wins.
/// - neither: the default `taxId` / `tax_id` / `x-tax-id` lookup.
pub fn extract_value(
    record: &RequestRecord,
    name: Option<&str>,
    source: Option<ParamSource>,
) -> Option<String> {
    match (name, source) {
        (Some(name), Some(source)) => record.get(source, name),
        (Some(name), None) => [
            ParamSource::Path,
            ParamSource::Query,
            ParamSource::Body,
            ParamSource::Header,
        ]
        .into_iter()
        .find_map(|source| record.get(source, name)),
        (None, _) => DEFAULT_LOOKUP
            .iter()
            .find_map(|(source, name)| record.get(*source, name)),
    }
}

/// [`extract_value`] under the name route adapters use for tax ids.
pub fn extract_tax_id(
    record: &RequestRecord,
    name: Option<&str>,
    source: Option<ParamSource>,
) -> Option<String> {
    extract_value(record, name, source)
}
