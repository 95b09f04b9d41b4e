//! Accessibility tree.
//!
//! Built from the same host element walk as snapshots. Each element gets a
//! role (explicit `role` attribute, else implied by its tag) and an
//! accessible name. Elements without a role or name are transparent: their
//! children are lifted into the parent. Hidden subtrees are pruned.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;

use crate::error::Result;
use crate::host::{DocumentHost, ElementInfo};
use crate::identifiers::ElementId;

// ============================================================================
// Types
// ============================================================================

/// One accessible node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessibilityNode {
    /// ARIA role.
    pub role: String,
    /// Accessible name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Source tag.
    pub tag: String,
    /// Heading level for headings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    /// State flags (`disabled`, `checked`, `expanded`, `required`).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub states: Vec<String>,
    /// Accessible children.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AccessibilityNode>,
}

/// The computed tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityTree {
    /// Root node.
    pub root: AccessibilityNode,
    /// Elements visited.
    pub visited: usize,
    /// `true` if the element bound stopped the walk early.
    pub truncated: bool,
}

// ============================================================================
// Build
// ============================================================================

/// Computes the accessibility tree under `root`, visiting at most
/// `max_elements` elements.
///
/// # Errors
///
/// Returns any error the host raises while describing elements.
pub fn accessibility_tree(
    document: &dyn DocumentHost,
    root: &ElementId,
    max_elements: usize,
) -> Result<AccessibilityTree> {
    let mut builder = Builder {
        document,
        budget: max_elements.max(1),
        visited: 0,
        truncated: false,
    };

    let info = document.describe(root)?;
    builder.budget -= 1;
    builder.visited += 1;
    let children = builder.children(root)?;
    let mut node = to_node(&info, children);
    if node.role.is_empty() {
        node.role = "document".to_string();
    }

    Ok(AccessibilityTree {
        root: node,
        visited: builder.visited,
        truncated: builder.truncated,
    })
}

struct Builder<'a> {
    document: &'a dyn DocumentHost,
    budget: usize,
    visited: usize,
    truncated: bool,
}

impl Builder<'_> {
    fn children(&mut self, element: &ElementId) -> Result<Vec<AccessibilityNode>> {
        let mut out = Vec::new();

        for child in self.document.children(element)? {
            if self.budget == 0 {
                self.truncated = true;
                break;
            }
            self.budget -= 1;
            self.visited += 1;

            let info = self.document.describe(&child)?;
            if is_hidden(&info) {
                continue;
            }

            let grandchildren = self.children(&child)?;
            let node = to_node(&info, grandchildren);
            if node.role.is_empty() && node.name.is_none() {
                out.extend(node.children);
            } else {
                out.push(node);
            }
        }

        Ok(out)
    }
}

fn to_node(info: &ElementInfo, children: Vec<AccessibilityNode>) -> AccessibilityNode {
    let role = role_of(info);
    AccessibilityNode {
        name: name_of(info, &role),
        level: heading_level(&info.tag),
        states: states_of(info),
        tag: info.tag.clone(),
        role,
        children,
    }
}

fn is_hidden(info: &ElementInfo) -> bool {
    matches!(
        info.tag.as_str(),
        "script" | "style" | "template" | "noscript" | "head" | "meta" | "link"
    ) || info.attr("aria-hidden") == Some("true")
        || info.attrs.contains_key("hidden")
        || (info.tag == "input" && info.attr("type") == Some("hidden"))
}

/// Explicit role, else the tag's implicit role, else empty.
fn role_of(info: &ElementInfo) -> String {
    if let Some(role) = info.attr("role")
        && let Some(first) = role.split_whitespace().next()
    {
        return first.to_string();
    }

    let role = match info.tag.as_str() {
        "a" | "area" if info.attrs.contains_key("href") => "link",
        "button" => "button",
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "heading",
        "nav" => "navigation",
        "main" => "main",
        "header" => "banner",
        "footer" => "contentinfo",
        "aside" => "complementary",
        "form" => "form",
        "section" if info.attrs.contains_key("aria-label") => "region",
        "article" => "article",
        "ul" | "ol" => "list",
        "li" => "listitem",
        "table" => "table",
        "tr" => "row",
        "td" => "cell",
        "th" => "columnheader",
        "img" => "img",
        "textarea" => "textbox",
        "select" => "combobox",
        "option" => "option",
        "dialog" => "dialog",
        "progress" => "progressbar",
        "p" => "paragraph",
        "input" => match info.attr("type").unwrap_or("text") {
            "checkbox" => "checkbox",
            "radio" => "radio",
            "range" => "slider",
            "button" | "submit" | "reset" | "image" => "button",
            "search" => "searchbox",
            "number" => "spinbutton",
            _ => "textbox",
        },
        _ => "",
    };
    role.to_string()
}

/// Accessible name from labelling attributes, then own text.
fn name_of(info: &ElementInfo, role: &str) -> Option<String> {
    let from_attr = ["aria-label", "alt", "title", "placeholder"]
        .iter()
        .find_map(|attr| info.attr(attr))
        .map(str::trim)
        .filter(|s| !s.is_empty());
    if let Some(name) = from_attr {
        return Some(name.to_string());
    }

    if info.tag == "input"
        && matches!(info.attr("type"), Some("button" | "submit" | "reset"))
        && let Some(value) = &info.value
    {
        return Some(value.clone());
    }

    if role == "textbox" || role == "combobox" || role == "searchbox" {
        return None;
    }

    info.text.clone().filter(|t| !t.is_empty())
}

fn heading_level(tag: &str) -> Option<u8> {
    match tag.as_bytes() {
        [b'h', digit @ b'1'..=b'6'] => Some(digit - b'0'),
        _ => None,
    }
}

fn states_of(info: &ElementInfo) -> Vec<String> {
    let mut states = Vec::new();
    if info.attrs.contains_key("disabled") || info.attr("aria-disabled") == Some("true") {
        states.push("disabled".to_string());
    }
    if info.attrs.contains_key("checked") || info.attr("aria-checked") == Some("true") {
        states.push("checked".to_string());
    }
    if let Some(expanded) = info.attr("aria-expanded") {
        states.push(if expanded == "true" { "expanded" } else { "collapsed" }.to_string());
    }
    if info.attrs.contains_key("required") {
        states.push("required".to_string());
    }
    states
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testing::FakeDocument;

    #[test]
    fn test_roles_names_and_pruning() {
        let doc = FakeDocument::new();
        let body = doc.body();
        let nav = doc.append(&body, "nav", &[]);
        doc.append_text(&nav, "a", "Home");
        doc.set_attr(&doc.query_one("a"), "href", "/");
        let wrapper = doc.append(&body, "div", &[]);
        doc.append_text(&wrapper, "h2", "Title");
        doc.append(&wrapper, "button", &[("aria-label", "Close"), ("disabled", "")]);
        let hidden = doc.append(&body, "div", &[("aria-hidden", "true")]);
        doc.append_text(&hidden, "button", "Secret");
        doc.append(&body, "input", &[("type", "checkbox"), ("title", "Agree")]);

        let tree = accessibility_tree(&doc, &body, 100).expect("tree");
        let roles: Vec<&str> = tree.root.children.iter().map(|n| n.role.as_str()).collect();
        assert_eq!(roles, vec!["navigation", "heading", "button", "checkbox"]);

        let link = &tree.root.children[0].children[0];
        assert_eq!(link.role, "link");
        assert_eq!(link.name.as_deref(), Some("Home"));

        let heading = &tree.root.children[1];
        assert_eq!(heading.level, Some(2));

        let button = &tree.root.children[2];
        assert_eq!(button.name.as_deref(), Some("Close"));
        assert_eq!(button.states, vec!["disabled"]);

        assert_eq!(tree.root.children[3].name.as_deref(), Some("Agree"));
    }

    #[test]
    fn test_explicit_role_wins() {
        let doc = FakeDocument::new();
        let body = doc.body();
        doc.append_text(&body, "div", "Go");
        doc.set_attr(&doc.query_one("div"), "role", "button");

        let tree = accessibility_tree(&doc, &body, 10).expect("tree");
        assert_eq!(tree.root.children[0].role, "button");
        assert_eq!(tree.root.children[0].name.as_deref(), Some("Go"));
    }

    #[test]
    fn test_bounded() {
        let doc = FakeDocument::new();
        let body = doc.body();
        for _ in 0..10 {
            doc.append(&body, "button", &[]);
        }
        let tree = accessibility_tree(&doc, &body, 4).expect("tree");
        assert_eq!(tree.visited, 4);
        assert!(tree.truncated);
        assert_eq!(tree.root.children.len(), 3);
    }
}
