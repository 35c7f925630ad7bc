//! Best-effort page parse into a serializable element tree.

use scraper::{ElementRef, Html, Node};
use serde::Serialize;

/// Elements nested deeper than this keep their tag and attributes but lose
/// their children.
pub const MAX_DEPTH: usize = 256;

/// One node of the parsed page. Text serializes as a bare JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DomNode {
    Text(String),
    Element(ElementNode),
}

/// Element with lowercase tag name, attributes in source order, and children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementNode {
    #[serde(rename = "t")]
    pub tag: String,
    #[serde(rename = "a")]
    pub attrs: Vec<(String, String)>,
    #[serde(rename = "c")]
    pub children: Vec<DomNode>,
}

impl ElementNode {
    /// Depth-first search for the first element carrying `id`.
    pub fn find_by_id(&self, id: &str) -> Option<&ElementNode> {
        if self.attr("id") == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| match child {
            DomNode::Element(el) => el.find_by_id(id),
            DomNode::Text(_) => None,
        })
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Parses `body` as an HTML document. Never fails: the parser recovers from
/// malformed markup and its diagnostics are discarded.
pub fn parse_document(body: &str) -> ElementNode {
    let html = Html::parse_document(body);
    if !html.errors.is_empty() {
        tracing::trace!("ignored {} parse diagnostics", html.errors.len());
    }
    element_node(html.root_element(), 0)
}

fn element_node(el: ElementRef<'_>, depth: usize) -> ElementNode {
    let value = el.value();
    let attrs = value
        .attrs()
        .map(|(name, v)| (name.to_string(), v.to_string()))
        .collect();

    let mut children = Vec::new();
    if depth < MAX_DEPTH {
        for child in el.children() {
            match child.value() {
                Node::Text(text) => children.push(DomNode::Text(String::from(&**text))),
                Node::Element(_) => {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        children.push(DomNode::Element(element_node(child_el, depth + 1)));
                    }
                }
                _ => {}
            }
        }
    }

    ElementNode {
        tag: value.name().to_string(),
        attrs,
        children,
    }
}
