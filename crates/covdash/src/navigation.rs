//! Filter, sort and pagination state bound to a shareable query string.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use url::form_urlencoded;

/// A query-string parameter value. Repeated keys form a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    List(Vec<String>),
}

impl ParamValue {
    /// The text value, or the first list element.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(s) => s,
            Self::List(items) => items.first().map_or("", String::as_str),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Tri-state API filter; `None` means "do not filter".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ApiFilter {
    #[default]
    None,
    True,
    False,
}

impl ApiFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::True => "true",
            Self::False => "false",
        }
    }
}

impl fmt::Display for ApiFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(Self::None),
            "true" => Ok(Self::True),
            "false" => Ok(Self::False),
            other => Err(format!("Invalid filter value: {other}")),
        }
    }
}

/// Recognized location params with declared defaults.
///
/// Values not present in the location fall back to their default. Updates
/// merge into the current values; keys that were not declared are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationParams {
    defaults: Vec<(String, ParamValue)>,
    values: HashMap<String, ParamValue>,
}

impl LocationParams {
    pub fn new<K, V>(defaults: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<ParamValue>,
    {
        Self {
            defaults: defaults
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            values: HashMap::new(),
        }
    }

    /// Load values from a query string (with or without the leading `?`).
    #[must_use]
    pub fn with_query(mut self, query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut parsed: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if self.is_recognized(&key) {
                parsed
                    .entry(key.into_owned())
                    .or_default()
                    .push(value.into_owned());
            }
        }
        for (key, mut values) in parsed {
            let value = if values.len() == 1 {
                ParamValue::Text(values.remove(0))
            } else {
                ParamValue::List(values)
            };
            self.values.insert(key, value);
        }
        self
    }

    pub fn is_recognized(&self, name: &str) -> bool {
        self.defaults.iter().any(|(k, _)| k == name)
    }

    /// Current value, or the default when unset. `None` for unknown names.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name).or_else(|| {
            self.defaults
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v)
        })
    }

    /// Current value as text; empty for unknown names.
    pub fn get_str(&self, name: &str) -> &str {
        self.get(name).map_or("", ParamValue::as_str)
    }

    /// Every recognized param with its current value, in declaration order.
    pub fn params(&self) -> Vec<(&str, &ParamValue)> {
        self.defaults
            .iter()
            .map(|(k, default)| (k.as_str(), self.values.get(k).unwrap_or(default)))
            .collect()
    }

    /// Merge `changes` into the current values.
    pub fn update_params<K, V>(&mut self, changes: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: Into<ParamValue>,
    {
        for (key, value) in changes {
            let key = key.as_ref();
            if !self.is_recognized(key) {
                tracing::debug!(param = key, "ignoring unrecognized location param");
                continue;
            }
            self.values.insert(key.to_string(), value.into());
        }
    }

    /// Serialize the params that differ from their defaults, in declaration
    /// order. Lists become repeated keys.
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, default) in &self.defaults {
            let Some(value) = self.values.get(key) else {
                continue;
            };
            if value == default || value.is_empty() {
                continue;
            }
            match value {
                ParamValue::Text(text) => {
                    serializer.append_pair(key, text);
                }
                ParamValue::List(items) => {
                    for item in items {
                        serializer.append_pair(key, item);
                    }
                }
            }
        }
        serializer.finish()
    }
}

/// Path parameters supplied by the router.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    pub provider: String,
    pub owner: String,
    pub repo: Option<String>,
    pub branch: Option<String>,
    /// Git ref (`/tree/:ref` style routes).
    pub reference: Option<String>,
    pub pull_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_params() -> LocationParams {
        LocationParams::new([
            ("activated", ""),
            ("isAdmin", ""),
            ("ordering", "name"),
            ("search", ""),
        ])
    }

    #[test]
    fn test_defaults_apply_when_unset() {
        let params = user_params();
        assert_eq!(params.get_str("ordering"), "name");
        assert_eq!(params.get_str("activated"), "");
        assert!(params.get("unknown").is_none());
        assert_eq!(params.to_query_string(), "");
    }

    #[test]
    fn test_query_string_is_read() {
        let params = user_params().with_query("?ordering=-email&search=laudna&bogus=1");
        assert_eq!(params.get_str("ordering"), "-email");
        assert_eq!(params.get_str("search"), "laudna");
        assert!(params.get("bogus").is_none());
    }

    #[test]
    fn test_update_merges_and_ignores_unknown_keys() {
        let mut params = user_params().with_query("search=laudna");
        params.update_params([("activated", "true"), ("notAParam", "x")]);

        assert_eq!(params.get_str("activated"), "true");
        assert_eq!(params.get_str("search"), "laudna");
        assert!(params.get("notAParam").is_none());
        assert_eq!(params.to_query_string(), "activated=true&search=laudna");
    }

    #[test]
    fn test_params_in_declaration_order() {
        let params = user_params().with_query("search=a&activated=false");
        let names: Vec<&str> = params.params().iter().map(|(k, _)| *k).collect();
        assert_eq!(names, vec!["activated", "isAdmin", "ordering", "search"]);
    }

    #[test]
    fn test_repeated_keys_form_lists() {
        let params = LocationParams::new([("flags", ParamValue::List(Vec::new()))])
            .with_query("flags=unit&flags=integration");
        assert_eq!(
            params.get("flags"),
            Some(&ParamValue::List(vec![
                "unit".to_string(),
                "integration".to_string()
            ]))
        );
        assert_eq!(params.to_query_string(), "flags=unit&flags=integration");
    }

    #[test]
    fn test_api_filter() {
        assert_eq!("".parse::<ApiFilter>(), Ok(ApiFilter::None));
        assert_eq!("true".parse::<ApiFilter>(), Ok(ApiFilter::True));
        assert_eq!("false".parse::<ApiFilter>(), Ok(ApiFilter::False));
        assert!("maybe".parse::<ApiFilter>().is_err());
        assert_eq!(ApiFilter::True.to_string(), "true");
    }
}
