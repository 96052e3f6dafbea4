//! Title rules and their authoring-time validation
//!
//! This module holds the persisted rule record and everything needed to build one:
//! - Rule: a URL condition, named CSS selectors and a title template
//! - SelectorSet: ordered mapping of field names to CSS selectors
//! - RuleDraft: unvalidated authoring input, checked for placeholder/selector consistency

pub mod draft;
pub mod selectors;

pub use draft::{RuleDraft, RuleValidationError, placeholders};
pub use selectors::SelectorSet;

use crate::matcher;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque rule identifier, assigned once at creation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RuleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// How a rule's `urlValue` is compared against the page URL
///
/// Stored as its camelCase name. Names this crate does not know are kept
/// verbatim so they survive a load/save cycle, and never match anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MatchType {
    Contains,
    Is,
    StartsWith,
    EndsWith,
    Unknown(String),
}

impl MatchType {
    /// The stored name of this match type
    pub fn as_str(&self) -> &str {
        match self {
            MatchType::Contains => "contains",
            MatchType::Is => "is",
            MatchType::StartsWith => "startsWith",
            MatchType::EndsWith => "endsWith",
            MatchType::Unknown(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, MatchType::Unknown(_))
    }

    /// Check `url` against `url_value` under this match type
    pub fn matches(&self, url: &str, url_value: &str) -> bool {
        matcher::matches(url, self, url_value)
    }
}

impl From<String> for MatchType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "contains" => MatchType::Contains,
            "is" => MatchType::Is,
            "startsWith" => MatchType::StartsWith,
            "endsWith" => MatchType::EndsWith,
            _ => MatchType::Unknown(name),
        }
    }
}

impl From<&str> for MatchType {
    fn from(name: &str) -> Self {
        MatchType::from(name.to_string())
    }
}

impl From<MatchType> for String {
    fn from(match_type: MatchType) -> Self {
        match match_type {
            MatchType::Unknown(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A title rewriting rule as persisted in the rule store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Stable identifier, preserved across edits
    pub id: RuleId,

    /// How `url_value` is compared to the page URL
    pub match_type: MatchType,

    /// Value compared against the page URL
    pub url_value: String,

    /// Field name to CSS selector
    pub selectors: SelectorSet,

    /// Title template with `{{name}}` placeholders
    pub title_change: String,

    /// Set once the user confirmed the rendered title looks right
    #[serde(default)]
    pub verified_title: bool,
}

impl Rule {
    /// Whether this rule applies to `url`
    pub fn matches_url(&self, url: &str) -> bool {
        self.match_type.matches(url, &self.url_value)
    }

    /// Builder method: mark as verified
    pub fn verified(mut self) -> Self {
        self.verified_title = true;
        self
    }
}

/// Verification counts over a rule collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RuleSummary {
    pub total: usize,
    pub verified: usize,
    pub unverified: usize,
}

impl RuleSummary {
    pub fn from_rules(rules: &[Rule]) -> Self {
        let verified = rules.iter().filter(|rule| rule.verified_title).count();
        Self { total: rules.len(), verified, unverified: rules.len() - verified }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rule() -> Rule {
        Rule {
            id: RuleId::new("rule-1"),
            match_type: MatchType::Contains,
            url_value: "example.com/orders".to_string(),
            selectors: SelectorSet::from_pairs([("order", "#order-id")]),
            title_change: "Order {{order}}".to_string(),
            verified_title: false,
        }
    }

    #[test]
    fn test_rule_serializes_with_camel_case_fields() {
        let json = serde_json::to_value(sample_rule()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "rule-1",
                "matchType": "contains",
                "urlValue": "example.com/orders",
                "selectors": { "order": "#order-id" },
                "titleChange": "Order {{order}}",
                "verifiedTitle": false
            })
        );
    }

    #[test]
    fn test_unknown_match_type_is_preserved() {
        let json = serde_json::json!({
            "id": "r",
            "matchType": "regex",
            "urlValue": ".*",
            "selectors": { "a": "#a" },
            "titleChange": "{{a}}"
        });
        let rule: Rule = serde_json::from_value(json).unwrap();
        assert_eq!(rule.match_type, MatchType::Unknown("regex".to_string()));
        assert!(!rule.verified_title);
        assert!(!rule.matches_url("anything"));

        let back = serde_json::to_value(&rule).unwrap();
        assert_eq!(back["matchType"], "regex");
    }

    #[test]
    fn test_match_type_names() {
        for name in ["contains", "is", "startsWith", "endsWith"] {
            let match_type = MatchType::from(name);
            assert!(match_type.is_known());
            assert_eq!(match_type.as_str(), name);
        }
        assert!(!MatchType::from("StartsWith").is_known());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(RuleId::generate(), RuleId::generate());
    }

    #[test]
    fn test_summary_counts() {
        let rules = vec![sample_rule(), sample_rule().verified(), sample_rule()];
        let summary = RuleSummary::from_rules(&rules);
        assert_eq!(summary, RuleSummary { total: 3, verified: 1, unverified: 2 });
    }
}
