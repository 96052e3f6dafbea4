use crate::rule::placeholders;
use indexmap::IndexMap;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Expand `{{name}}` placeholders in `template` with values extracted from the page
///
/// Fields are substituted one after another in `values` order, each replacing
/// every occurrence of its placeholder. A value that itself contains a
/// placeholder for a field substituted later is expanded by that later pass.
/// Placeholders with no value stay in the output as written.
pub fn render(template: &str, values: &IndexMap<String, String>) -> String {
    values.iter().fold(template.to_string(), |title, (name, value)| {
        title.replace(&format!("{}{}{}", OPEN, name, CLOSE), value)
    })
}

/// Placeholders still present after rendering
pub fn unresolved(rendered: &str) -> Vec<String> {
    placeholders(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_render_single_placeholder() {
        assert_eq!(render("Order {{order}}", &values(&[("order", "42")])), "Order 42");
    }

    #[test]
    fn test_render_replaces_every_occurrence() {
        let rendered = render("{{a}}-{{b}}-{{a}}", &values(&[("a", "x"), ("b", "y")]));
        assert_eq!(rendered, "x-y-x");
    }

    #[test]
    fn test_missing_value_left_intact() {
        let rendered = render("{{a}} / {{missing}}", &values(&[("a", "1")]));
        assert_eq!(rendered, "1 / {{missing}}");
        assert_eq!(unresolved(&rendered), vec!["missing"]);
    }

    #[test]
    fn test_values_inserted_verbatim() {
        let rendered = render("{{b}}", &values(&[("b", "<b>&amp;</b>")]));
        assert_eq!(rendered, "<b>&amp;</b>");
    }

    #[test]
    fn test_later_fields_expand_inside_earlier_values() {
        let vals = values(&[("a", "{{b}}"), ("b", "X")]);
        assert_eq!(render("{{a}}-{{b}}", &vals), "X-X");

        // Earlier fields are not revisited.
        let vals = values(&[("b", "X"), ("a", "{{b}}")]);
        assert_eq!(render("{{a}}-{{b}}", &vals), "{{b}}-X");
    }

    #[test]
    fn test_nested_braces() {
        assert_eq!(render("{{{a}}}", &values(&[("a", "1")])), "{1}");
        assert_eq!(render("{{x {{a}}", &values(&[("a", "1")])), "{{x 1");
        assert_eq!(render("{{a", &values(&[("a", "1")])), "{{a");
    }

    #[test]
    fn test_no_placeholders() {
        assert_eq!(render("Plain title", &values(&[("a", "1")])), "Plain title");
        assert_eq!(render("", &IndexMap::new()), "");
    }

    #[test]
    fn test_render_is_idempotent() {
        let vals = values(&[("title", "Hello"), ("site", "Example")]);
        let first = render("{{title}} | {{site}}", &vals);
        assert_eq!(first, render("{{title}} | {{site}}", &vals));
    }

    #[test]
    fn test_unicode_around_placeholders() {
        assert_eq!(render("📦 {{n}} — ü", &values(&[("n", "ß")])), "📦 ß — ü");
    }
}
