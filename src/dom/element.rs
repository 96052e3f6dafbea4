use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write;

/// Attribute carrying an element's child-index path while it is matched
const PATH_MARKER: &str = "data-retitle-path";

fn escape(raw: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Represents a DOM element node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ElementNode {
    /// HTML tag name, lowercase (e.g., "div", "span", "h1")
    pub tag_name: String,

    /// Element attributes (e.g., id, class, href, etc.)
    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// Text directly inside this element, before its children
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Child elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementNode>,
}

impl ElementNode {
    /// Create a new ElementNode
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    /// Builder method: set an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Builder method: set the id attribute
    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.with_attribute("id", id)
    }

    /// Builder method: set the class attribute
    pub fn with_class(self, class: impl Into<String>) -> Self {
        self.with_attribute("class", class)
    }

    /// Builder method: set own text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder method: append a child
    pub fn with_child(mut self, child: ElementNode) -> Self {
        self.children.push(child);
        self
    }

    /// Get attribute value
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Get element ID
    pub fn id(&self) -> Option<&str> {
        self.get_attribute("id")
    }

    /// Whitespace-separated entries of the class attribute
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.get_attribute("class").unwrap_or("").split_whitespace()
    }

    /// Concatenated text of this element and all descendants, like `textContent`
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// First element in document order (this node included) matching `selector`
    pub fn query_selector(&self, selector: &Selector) -> Option<&ElementNode> {
        let path = self.select_paths(selector).into_iter().next()?;
        self.node_at(&path)
    }

    /// Mutable access to the first element matching `selector`
    pub fn query_selector_mut(&mut self, selector: &Selector) -> Option<&mut ElementNode> {
        let path = self.select_paths(selector).into_iter().next()?;
        self.node_at_mut(&path)
    }

    /// Remove every descendant matching `selector`, returning how many were removed
    ///
    /// A match nested inside another match goes away with its ancestor and
    /// is not counted separately.
    pub fn remove_matching(&mut self, selector: &Selector) -> usize {
        let mut paths: Vec<Vec<usize>> = Vec::new();
        for path in self.select_paths(selector) {
            if path.is_empty() || paths.iter().any(|kept| path.starts_with(kept)) {
                continue;
            }
            paths.push(path);
        }

        // Deepest-last order keeps earlier indices valid while removing.
        paths.sort();
        for path in paths.iter().rev() {
            let Some((index, parent)) = path.split_last() else {
                continue;
            };
            if let Some(parent) = self.node_at_mut(parent) {
                parent.children.remove(*index);
            }
        }
        paths.len()
    }

    /// Child-index paths of every element matching `selector`, in document order
    ///
    /// The subtree is rendered to HTML with a path marker on each element and
    /// handed to `scraper`; matches are mapped back through the marker.
    fn select_paths(&self, selector: &Selector) -> Vec<Vec<usize>> {
        let mut html = String::new();
        self.write_html(&mut html, &mut Vec::new());
        let document = Html::parse_document(&html);

        document
            .select(selector)
            .filter_map(|element| element.value().attr(PATH_MARKER))
            .map(|marker| marker.split('.').filter(|part| !part.is_empty()).filter_map(|part| part.parse().ok()).collect())
            .collect()
    }

    fn write_html(&self, out: &mut String, path: &mut Vec<usize>) {
        let marker = path.iter().map(usize::to_string).collect::<Vec<_>>().join(".");
        let _ = write!(out, "<{} {}=\"{}\"", self.tag_name, PATH_MARKER, marker);
        for (name, value) in &self.attributes {
            let _ = write!(out, " {}=\"{}\"", name, escape(value, true));
        }
        out.push('>');

        if let Some(text) = &self.text {
            out.push_str(&escape(text, false));
        }
        for (index, child) in self.children.iter().enumerate() {
            path.push(index);
            child.write_html(out, path);
            path.pop();
        }
        let _ = write!(out, "</{}>", self.tag_name);
    }

    fn node_at(&self, path: &[usize]) -> Option<&ElementNode> {
        path.iter().try_fold(self, |node, &index| node.children.get(index))
    }

    fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut ElementNode> {
        path.iter().try_fold(self, |node, &index| node.children.get_mut(index))
    }

    /// Count total elements in this subtree
    pub fn count_elements(&self) -> usize {
        1 + self.children.iter().map(ElementNode::count_elements).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_selector;

    fn page() -> ElementNode {
        ElementNode::new("body")
            .with_child(
                ElementNode::new("div").with_class("header main").with_child(
                    ElementNode::new("h1")
                        .with_text("Order ")
                        .with_child(ElementNode::new("span").with_id("order-id").with_text("42")),
                ),
            )
            .with_child(ElementNode::new("span").with_class("status").with_text("  shipped \n"))
    }

    #[test]
    fn test_text_content_includes_descendants() {
        let body = page();
        assert_eq!(body.children[0].text_content(), "Order 42");
    }

    #[test]
    fn test_query_selector_first_in_document_order() {
        let body = page();
        let span = body.query_selector(&parse_selector("span").unwrap()).unwrap();
        assert_eq!(span.id(), Some("order-id"));

        let status = body.query_selector(&parse_selector("body > span").unwrap()).unwrap();
        assert_eq!(status.text_content(), "  shipped \n");

        assert!(body.query_selector(&parse_selector("#missing").unwrap()).is_none());
    }

    #[test]
    fn test_classes() {
        let body = page();
        let classes: Vec<_> = body.children[0].classes().collect();
        assert_eq!(classes, vec!["header", "main"]);
    }

    #[test]
    fn test_query_selector_mut() {
        let mut body = page();
        let selector = parse_selector(".status").unwrap();
        body.query_selector_mut(&selector).unwrap().text = Some("delivered".to_string());
        assert_eq!(body.query_selector(&selector).unwrap().text_content(), "delivered");
    }

    #[test]
    fn test_remove_matching() {
        let mut body = page();
        assert_eq!(body.count_elements(), 5);
        assert_eq!(body.remove_matching(&parse_selector("div span").unwrap()), 1);
        assert_eq!(body.count_elements(), 4);
        assert!(body.query_selector(&parse_selector("#order-id").unwrap()).is_none());
    }

    #[test]
    fn test_structural_pseudo_classes() {
        let list = ElementNode::new("body").with_child(
            ElementNode::new("ul")
                .with_child(ElementNode::new("li").with_text("first"))
                .with_child(ElementNode::new("li").with_text("second"))
                .with_child(ElementNode::new("li").with_class("last").with_text("third")),
        );
        let text = |selector: &str| list.query_selector(&parse_selector(selector).unwrap()).map(ElementNode::text_content);

        assert_eq!(text("li:nth-child(2)").as_deref(), Some("second"));
        assert_eq!(text("li:first-of-type").as_deref(), Some("first"));
        assert_eq!(text("li + li").as_deref(), Some("second"));
        assert_eq!(text("li ~ .last").as_deref(), Some("third"));
        assert_eq!(text("ul > li:last-child").as_deref(), Some("third"));
    }

    #[test]
    fn test_markup_in_text_and_attributes_stays_literal() {
        let body = ElementNode::new("body")
            .with_child(ElementNode::new("b").with_attribute("title", "a \"quoted\" <b>").with_text("<i>not a tag</i> & co"));
        let b = body.query_selector(&parse_selector("b[title='a \"quoted\" <b>']").unwrap()).unwrap();
        assert_eq!(b.text_content(), "<i>not a tag</i> & co");
        assert!(body.query_selector(&parse_selector("i").unwrap()).is_none());
    }

    #[test]
    fn test_remove_nested_matches_once() {
        let mut body = ElementNode::new("body")
            .with_child(ElementNode::new("div").with_class("ad").with_child(ElementNode::new("div").with_class("ad")))
            .with_child(ElementNode::new("div").with_class("ad"))
            .with_child(ElementNode::new("p").with_text("keep"));
        assert_eq!(body.remove_matching(&parse_selector(".ad").unwrap()), 2);
        assert_eq!(body.count_elements(), 2);
        assert_eq!(body.children[0].tag_name, "p");
    }
}
