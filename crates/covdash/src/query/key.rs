use serde_json::Value;

/// Identity tuple for a query: a resource name followed by the parameters
/// that distinguish one request from another (provider, owner, repo, filters).
///
/// Two keys are equal only if every element matches in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    /// Start a key for the named resource, e.g. `"GetRepo"`.
    pub fn new(resource: &str) -> Self {
        Self(vec![resource.to_string()])
    }

    /// Append one element to the identity tuple.
    #[must_use]
    pub fn with(mut self, part: impl ToString) -> Self {
        self.0.push(part.to_string());
        self
    }

    /// Append an optional element; `None` is kept as an explicit empty slot so
    /// `(a, None, b)` and `(a, b)` never collide.
    #[must_use]
    pub fn with_opt(self, part: Option<impl ToString>) -> Self {
        match part {
            Some(p) => self.with(p),
            None => self.with("\u{2205}"),
        }
    }

    /// Append a JSON filter object. Object key order is significant.
    #[must_use]
    pub fn with_json(self, filters: &Value) -> Self {
        self.with(filters.to_string())
    }

    /// Derive the key of one page of a paginated query.
    #[must_use]
    pub fn page(&self, cursor: Option<&str>) -> Self {
        self.clone().with("page").with_opt(cursor)
    }

    /// Resource name (first element).
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.0[0]
    }

    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// Whether `prefix` is a leading sub-tuple of this key.
    #[must_use]
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_equality_is_element_wise() {
        let a = QueryKey::new("GetRepo").with("gh").with("codecov").with("gazebo");
        let b = QueryKey::new("GetRepo").with("gh").with("codecov").with("gazebo");
        let c = QueryKey::new("GetRepo").with("gh").with("codecov").with("worker");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_optional_slots_do_not_collide() {
        let with_gap = QueryKey::new("X").with("a").with_opt(None::<&str>).with("b");
        let without = QueryKey::new("X").with("a").with("b");
        assert_ne!(with_gap, without);
    }

    #[test]
    fn test_prefix_and_page_keys() {
        let base = QueryKey::new("users").with("gh").with("codecov");
        let full = base.clone().with_json(&json!({ "search": "a" }));
        assert!(full.starts_with(&base));
        assert!(!base.starts_with(&full));

        let first = full.page(None);
        let second = full.page(Some("abc"));
        assert_ne!(first, second);
        assert!(second.starts_with(&full));
        assert_eq!(second.resource(), "users");
    }

    #[test]
    fn test_display() {
        let key = QueryKey::new("GetRepo").with("gh");
        assert_eq!(key.to_string(), "[GetRepo, gh]");
    }
}
