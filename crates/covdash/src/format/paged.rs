//! Lenient paged collections.
//!
//! Formatter input is shaped like `{pages: [{<entities>: [...]}, ...]}`. Any
//! part of it may be missing, null or malformed; decoding degrades to empty
//! lists instead of failing.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// An ordered sequence of fetched pages.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(bound(deserialize = "P: DeserializeOwned"))]
pub struct PagedCollection<P> {
    #[serde(default, deserialize_with = "lenient_list")]
    pub pages: Vec<Option<P>>,
}

impl<P> Default for PagedCollection<P> {
    fn default() -> Self {
        Self { pages: Vec::new() }
    }
}

impl<P: DeserializeOwned> PagedCollection<P> {
    /// Decode a collection from arbitrary JSON. Never fails: anything that is
    /// not an object with a `pages` array yields an empty collection.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(_) => Self::deserialize(value).unwrap_or_default(),
            _ => Self::default(),
        }
    }
}

impl<P> PagedCollection<P> {
    pub fn from_pages(pages: impl IntoIterator<Item = P>) -> Self {
        Self {
            pages: pages.into_iter().map(Some).collect(),
        }
    }

    /// Present pages, in order.
    pub fn iter(&self) -> impl Iterator<Item = &P> {
        self.pages.iter().flatten()
    }
}

/// Decode a JSON array element by element. Null or malformed elements become
/// `None`; a value that is not an array becomes an empty list.
pub(crate) fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(lenient_elements(&value))
}

pub(crate) fn lenient_elements<T: DeserializeOwned>(value: &Value) -> Vec<Option<T>> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => None,
                other => T::deserialize(other).ok(),
            })
            .collect(),
        _ => Vec::new(),
    }
}
