use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Map of field names to CSS selectors
/// Uses IndexMap to preserve insertion order, which is also the order fields are extracted in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectorSet {
    map: IndexMap<String, String>,
}

impl SelectorSet {
    /// Create a new empty SelectorSet
    pub fn new() -> Self {
        Self { map: IndexMap::new() }
    }

    /// Build from (name, selector) pairs; a repeated name keeps the last selector
    pub fn from_pairs<I, N, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        Self {
            map: pairs.into_iter().map(|(name, selector)| (name.into(), selector.into())).collect(),
        }
    }

    /// Insert a field, returning the selector it replaced
    pub fn insert(&mut self, name: impl Into<String>, selector: impl Into<String>) -> Option<String> {
        self.map.insert(name.into(), selector.into())
    }

    /// Get selector by field name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Remove a field, keeping the order of the rest
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.map.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over all (name, selector) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(name, selector)| (name.as_str(), selector.as_str()))
    }

    /// Get all field names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    /// Get all selectors
    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.map.values().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_set_preserves_order() {
        let mut set = SelectorSet::new();
        set.insert("title", "h1");
        set.insert("author", ".byline a");
        set.insert("date", "time");

        let names: Vec<_> = set.names().collect();
        assert_eq!(names, vec!["title", "author", "date"]);

        set.remove("author");
        let selectors: Vec<_> = set.selectors().collect();
        assert_eq!(selectors, vec!["h1", "time"]);
    }

    #[test]
    fn test_selector_set_insert_replaces() {
        let mut set = SelectorSet::from_pairs([("order", "#order-id")]);
        let previous = set.insert("order", "#order-number");

        assert_eq!(previous.as_deref(), Some("#order-id"));
        assert_eq!(set.get("order"), Some("#order-number"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_selector_set_serializes_as_object() {
        let set = SelectorSet::from_pairs([("b", "#b"), ("a", "#a")]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r##"{"b":"#b","a":"#a"}"##);

        let back: SelectorSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back.names().collect::<Vec<_>>(), vec!["b", "a"]);
    }
}
