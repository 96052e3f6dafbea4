use crate::rule::{MatchType, Rule, RuleId, SelectorSet};
use indexmap::IndexSet;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("placeholder pattern is valid"));

/// Placeholder names used in a title template, in order of appearance
pub fn placeholders(template: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(template)
        .map(|captures| captures[1].to_string())
        .collect()
}

/// Reasons a rule draft is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleValidationError {
    #[error("a rule needs at least one selector pair")]
    NoSelectors,

    #[error("selector pair {index} is missing a name or a CSS selector")]
    IncompleteSelectorPair { index: usize },

    #[error("selector name '{0}' is used more than once")]
    DuplicateSelectorName(String),

    #[error("the title template uses names without matching selector pairs: {}", .0.join(", "))]
    UnknownPlaceholders(Vec<String>),

    #[error("selector pairs not used in the title template: {} (use them like {{{{{}}}}} or remove them)", .0.join(", "), .0[0])]
    UnusedSelectors(Vec<String>),
}

/// Rule input from an authoring surface, not yet checked
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDraft {
    pub match_type: MatchType,
    pub url_value: String,
    /// (name, selector) pairs as entered
    pub selectors: Vec<(String, String)>,
    pub title_change: String,
}

impl RuleDraft {
    pub fn new(match_type: impl Into<MatchType>, url_value: impl Into<String>, title_change: impl Into<String>) -> Self {
        Self {
            match_type: match_type.into(),
            url_value: url_value.into(),
            selectors: Vec::new(),
            title_change: title_change.into(),
        }
    }

    /// Builder method: add a selector pair
    pub fn selector(mut self, name: impl Into<String>, css: impl Into<String>) -> Self {
        self.selectors.push((name.into(), css.into()));
        self
    }

    /// Check that the selector names and the template placeholders are the same set
    pub fn validate(&self) -> Result<SelectorSet, RuleValidationError> {
        if self.selectors.is_empty() {
            return Err(RuleValidationError::NoSelectors);
        }

        let mut set = SelectorSet::new();
        for (index, (name, css)) in self.selectors.iter().enumerate() {
            let (name, css) = (name.trim(), css.trim());
            if name.is_empty() || css.is_empty() {
                return Err(RuleValidationError::IncompleteSelectorPair { index });
            }
            if set.insert(name, css).is_some() {
                return Err(RuleValidationError::DuplicateSelectorName(name.to_string()));
            }
        }

        let used: IndexSet<String> = placeholders(&self.title_change).into_iter().collect();

        let unknown: Vec<String> = used.iter().filter(|name| !set.contains(name)).cloned().collect();
        if !unknown.is_empty() {
            return Err(RuleValidationError::UnknownPlaceholders(unknown));
        }

        let unused: Vec<String> = set
            .names()
            .filter(|name| !used.contains(*name))
            .map(str::to_string)
            .collect();
        if !unused.is_empty() {
            return Err(RuleValidationError::UnusedSelectors(unused));
        }

        Ok(set)
    }

    /// Validate and create a new, unverified rule with a fresh id
    pub fn into_rule(self) -> Result<Rule, RuleValidationError> {
        let selectors = self.validate()?;
        Ok(Rule {
            id: RuleId::generate(),
            match_type: self.match_type,
            url_value: self.url_value,
            selectors,
            title_change: self.title_change,
            verified_title: false,
        })
    }

    /// Validate and produce an edited copy of `existing`
    ///
    /// The id is kept. Verification is kept only if nothing that affects
    /// matching or rendering changed.
    pub fn apply_to(self, existing: &Rule) -> Result<Rule, RuleValidationError> {
        let selectors = self.validate()?;
        let unchanged = existing.match_type == self.match_type
            && existing.url_value == self.url_value
            && existing.selectors == selectors
            && existing.title_change == self.title_change;

        Ok(Rule {
            id: existing.id.clone(),
            match_type: self.match_type,
            url_value: self.url_value,
            selectors,
            title_change: self.title_change,
            verified_title: existing.verified_title && unchanged,
        })
    }
}

impl From<&Rule> for RuleDraft {
    fn from(rule: &Rule) -> Self {
        Self {
            match_type: rule.match_type.clone(),
            url_value: rule.url_value.clone(),
            selectors: rule.selectors.iter().map(|(name, css)| (name.to_string(), css.to_string())).collect(),
            title_change: rule.title_change.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_in_order() {
        assert_eq!(placeholders("{{a}} - {{b}} ({{a}})"), vec!["a", "b", "a"]);
        assert!(placeholders("no placeholders").is_empty());
        assert_eq!(placeholders("{{}}"), vec![""]);
        assert_eq!(placeholders("{{outer {{inner}}"), vec!["outer {{inner"]);
    }

    #[test]
    fn test_valid_draft_becomes_unverified_rule() {
        let rule = RuleDraft::new(MatchType::Contains, "example.com/orders", "Order {{order}} for {{customer}}")
            .selector("order", " #order-id ")
            .selector("customer", ".customer-name")
            .into_rule()
            .unwrap();

        assert!(!rule.verified_title);
        assert!(!rule.id.as_str().is_empty());
        assert_eq!(rule.selectors.get("order"), Some("#order-id"));
        assert_eq!(rule.selectors.names().collect::<Vec<_>>(), vec!["order", "customer"]);
    }

    #[test]
    fn test_draft_without_selectors() {
        let err = RuleDraft::new("is", "https://example.com", "Static").validate().unwrap_err();
        assert_eq!(err, RuleValidationError::NoSelectors);
    }

    #[test]
    fn test_incomplete_pair() {
        let err = RuleDraft::new("is", "u", "{{a}}")
            .selector("a", "#a")
            .selector("  ", "#b")
            .validate()
            .unwrap_err();
        assert_eq!(err, RuleValidationError::IncompleteSelectorPair { index: 1 });
    }

    #[test]
    fn test_duplicate_names() {
        let err = RuleDraft::new("is", "u", "{{a}}")
            .selector("a", "#a")
            .selector("a", "#b")
            .validate()
            .unwrap_err();
        assert_eq!(err, RuleValidationError::DuplicateSelectorName("a".to_string()));
    }

    #[test]
    fn test_unknown_placeholder() {
        let err = RuleDraft::new("contains", "x", "{{a}} {{b}} {{b}}")
            .selector("a", "#a")
            .validate()
            .unwrap_err();
        assert_eq!(err, RuleValidationError::UnknownPlaceholders(vec!["b".to_string()]));
    }

    #[test]
    fn test_unused_selector() {
        let err = RuleDraft::new("contains", "x", "{{a}}")
            .selector("a", "#a")
            .selector("b", "#b")
            .validate()
            .unwrap_err();
        assert_eq!(err, RuleValidationError::UnusedSelectors(vec!["b".to_string()]));
        assert!(err.to_string().contains("{{b}}"));
    }

    #[test]
    fn test_edit_keeps_id_and_resets_verification() {
        let original = RuleDraft::new("contains", "example.com", "{{a}}")
            .selector("a", "#a")
            .into_rule()
            .unwrap()
            .verified();

        let edited = RuleDraft::new("contains", "example.com", "Item {{a}}")
            .selector("a", "#a")
            .apply_to(&original)
            .unwrap();
        assert_eq!(edited.id, original.id);
        assert_eq!(edited.title_change, "Item {{a}}");
        assert!(!edited.verified_title);

        let untouched = RuleDraft::from(&original).apply_to(&original).unwrap();
        assert_eq!(untouched, original);
    }
}
