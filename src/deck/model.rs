//! Wire types for the card document.
//!
//! Everything here is lenient: a field of the wrong JSON type reads as absent
//! instead of failing the whole record, and sequence elements that do not fit
//! are dropped.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Literal token in a card title that marks it as new.
pub const NEW_MARKER: &str = "NEW!";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub country: Option<String>,
    #[serde(default, rename = "buttonText", deserialize_with = "lenient")]
    pub button_text: Option<String>,
    #[serde(default, rename = "buttonAction", deserialize_with = "lenient")]
    pub button_action: Option<String>,
    #[serde(default, rename = "websiteUrl", deserialize_with = "lenient")]
    pub website_url: Option<String>,
    #[serde(default, rename = "websiteText", deserialize_with = "lenient")]
    pub website_text: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub instruction: Option<InstructionDocument>,
}

impl CardRecord {
    pub fn is_new(&self) -> bool {
        self.title
            .as_deref()
            .is_some_and(|t| t.contains(NEW_MARKER))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstructionDocument {
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    /// Forces download disposition on every link of the document.
    #[serde(default, deserialize_with = "lenient")]
    pub download: Option<bool>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub steps: Option<Vec<StepRecord>>,
    #[serde(default, deserialize_with = "lenient")]
    pub footer: Option<Footer>,
}

impl InstructionDocument {
    pub fn forces_download(&self) -> bool {
        self.download == Some(true)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepRecord {
    #[serde(default, rename = "type", deserialize_with = "lenient")]
    pub type_name: Option<String>,
    /// Older documents spell the step type as `kind`; `type` wins when both are set.
    #[serde(default, rename = "kind", deserialize_with = "lenient")]
    pub kind_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub links: Option<Vec<LinkRecord>>,
    /// Copy items are objects, list items are strings; kept raw until dispatch.
    #[serde(default, deserialize_with = "lenient_seq")]
    pub items: Option<Vec<Value>>,
}

/// Dispatch result for a step. Borrowed from the record.
#[derive(Debug, Clone, Copy)]
pub enum StepKind<'a> {
    Links(&'a [LinkRecord]),
    Copy(&'a [Value]),
    List(&'a [Value]),
    Text,
}

impl StepRecord {
    pub fn kind(&self) -> Option<&str> {
        self.type_name.as_deref().or(self.kind_name.as_deref())
    }

    /// `links` needs a links array and `copy` needs items; anything else that
    /// carries items is a list, even without an explicit kind.
    pub fn classify(&self) -> Option<StepKind<'_>> {
        match (self.kind(), &self.links, &self.items) {
            (Some("links"), Some(links), _) => Some(StepKind::Links(links)),
            (Some("copy"), _, Some(items)) => Some(StepKind::Copy(items)),
            (_, _, Some(items)) => Some(StepKind::List(items)),
            (Some("list"), _, None) => Some(StepKind::List(&[])),
            (Some("text"), _, None) => Some(StepKind::Text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default)]
    pub download: Option<Value>,
}

/// Per-link download request: `true`, or a suggested filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadRequest {
    Flag,
    Filename(String),
}

impl LinkRecord {
    pub fn download_request(&self) -> Option<DownloadRequest> {
        match &self.download {
            Some(Value::Bool(true)) => Some(DownloadRequest::Flag),
            Some(Value::String(name)) if !name.is_empty() => {
                Some(DownloadRequest::Filename(name.clone()))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CopyRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Footer {
    Text(String),
    Object {
        #[serde(default, deserialize_with = "lenient")]
        text: Option<String>,
        #[serde(default, rename = "buttonText", deserialize_with = "lenient")]
        button_text: Option<String>,
    },
}

/// Deserialize an optional field, reading a value of the wrong shape as `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Like [`lenient`] for sequences: a non-array reads as `None`, and elements
/// that do not fit `T` (including `null`) are dropped.
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter(|v| !v.is_null())
                .filter_map(|v| serde_json::from_value(v).ok())
                .collect(),
        ),
        _ => None,
    })
}

/// Card ids are usually strings; numbers are accepted and stringified.
fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}
