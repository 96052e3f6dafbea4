use crate::error::{RetitleError, Result};
use crate::rule::{MatchType, Rule, RuleId, SelectorSet};
use serde::Deserialize;
use serde_json::Value;

const REQUIRED_FIELDS: [&str; 4] = ["matchType", "urlValue", "selectors", "titleChange"];

/// Rule as it may appear in an import file; `id` and `verifiedTitle` are optional
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportedRule {
    id: Option<RuleId>,
    match_type: MatchType,
    url_value: String,
    selectors: SelectorSet,
    title_change: String,
    #[serde(default)]
    verified_title: bool,
}

impl From<ImportedRule> for Rule {
    fn from(imported: ImportedRule) -> Self {
        Rule {
            id: imported.id.unwrap_or_else(RuleId::generate),
            match_type: imported.match_type,
            url_value: imported.url_value,
            selectors: imported.selectors,
            title_change: imported.title_change,
            verified_title: imported.verified_title,
        }
    }
}

/// Serialize rules to the export format: a pretty-printed JSON array
pub fn export_rules(rules: &[Rule]) -> Result<String> {
    Ok(serde_json::to_string_pretty(rules)?)
}

/// Parse an export file back into rules
///
/// Only the shape is checked here; placeholder/selector consistency is an
/// authoring concern and imported rules are taken as they are.
pub fn import_rules(text: &str) -> Result<Vec<Rule>> {
    let value: Value = serde_json::from_str(text).map_err(|e| RetitleError::Import(e.to_string()))?;

    let entries = match value {
        Value::Array(entries) => entries,
        _ => return Err(RetitleError::Import("Imported data must be an array of rules".to_string())),
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let object = entry
                .as_object()
                .ok_or_else(|| RetitleError::Import(format!("Rule at index {} is not an object", index)))?;

            if let Some(field) = REQUIRED_FIELDS.iter().find(|field| !object.contains_key(**field)) {
                return Err(RetitleError::Import(format!(
                    "Rule at index {} is missing required field: {}",
                    index, field
                )));
            }

            let imported: ImportedRule = serde_json::from_value(entry)
                .map_err(|e| RetitleError::Import(format!("Rule at index {}: {}", index, e)))?;
            Ok(imported.into())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> Rule {
        Rule {
            id: RuleId::new("2b5c7a52-0d0e-4c55-9d6c-1b2f0c1f3a10"),
            match_type: MatchType::EndsWith,
            url_value: "/issues".to_string(),
            selectors: SelectorSet::from_pairs([("repo", "strong[itemprop=name] a"), ("count", ".Counter")]),
            title_change: "{{repo}} ({{count}} open)".to_string(),
            verified_title: true,
        }
    }

    #[test]
    fn test_export_is_pretty_printed() {
        let json = export_rules(&[rule()]).unwrap();
        assert!(json.starts_with("[\n  {\n    \"id\""));
        assert!(json.contains("\"matchType\": \"endsWith\""));
    }

    #[test]
    fn test_export_import_export_is_identical() {
        let exported = export_rules(&[rule(), rule()]).unwrap();
        let imported = import_rules(&exported).unwrap();
        assert_eq!(imported, vec![rule(), rule()]);
        assert_eq!(export_rules(&imported).unwrap(), exported);
    }

    #[test]
    fn test_import_requires_array() {
        let err = import_rules(r#"{"rules": []}"#).unwrap_err();
        assert_eq!(err.to_string(), "Error importing rules: Imported data must be an array of rules");
    }

    #[test]
    fn test_import_reports_missing_field() {
        let text = r##"[
            {"matchType": "is", "urlValue": "u", "selectors": {"a": "#a"}, "titleChange": "{{a}}"},
            {"matchType": "is", "urlValue": "u", "titleChange": "{{a}}"}
        ]"##;
        let err = import_rules(text).unwrap_err();
        assert!(err.to_string().contains("Rule at index 1 is missing required field: selectors"));
    }

    #[test]
    fn test_import_fills_optional_fields() {
        let text = r##"[{"matchType": "contains", "urlValue": "u", "selectors": {"a": "#a"}, "titleChange": "{{a}}"}]"##;
        let rules = import_rules(text).unwrap();
        assert_eq!(rules.len(), 1);
        assert!(!rules[0].verified_title);
        assert!(!rules[0].id.as_str().is_empty());
    }

    #[test]
    fn test_import_keeps_selector_order() {
        let text = r##"[{"matchType": "is", "urlValue": "u", "selectors": {"zeta": "#z", "alpha": "#a", "mid": ".m"}, "titleChange": "{{zeta}}{{alpha}}{{mid}}"}]"##;
        let rules = import_rules(text).unwrap();
        assert_eq!(rules[0].selectors.names().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);

        let exported = export_rules(&rules).unwrap();
        assert!(exported.find("\"zeta\"").unwrap() < exported.find("\"alpha\"").unwrap());
    }

    #[test]
    fn test_import_rejects_bad_json() {
        assert!(matches!(import_rules("not json"), Err(RetitleError::Import(_))));
        assert!(matches!(import_rules("[1]"), Err(RetitleError::Import(_))));
    }
}
