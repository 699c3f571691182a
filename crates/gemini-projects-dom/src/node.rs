//! Node storage for the document arena.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::geometry::BoundingBox;

/// Index of a node inside its [`Document`](crate::Document).
///
/// Ids stay valid after removal; a removed node is simply disconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    /// Open shadow root; `host` points back at the element.
    ShadowRoot,
}

/// One element or shadow root.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) tag: String,
    pub(crate) attributes: BTreeMap<String, String>,
    /// Direct text only, not from children.
    pub(crate) text: String,
    pub(crate) bounding_box: BoundingBox,
    /// Styles the host's stylesheets resolve to.
    pub(crate) computed_styles: HashMap<String, String>,
    /// Inline overrides written through `element.style`.
    pub(crate) inline_styles: BTreeMap<String, String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) shadow_root: Option<NodeId>,
    pub(crate) host: Option<NodeId>,
}

impl Node {
    pub(crate) fn element(tag: &str) -> Self {
        Self {
            kind: NodeKind::Element,
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            text: String::new(),
            bounding_box: BoundingBox::default(),
            computed_styles: HashMap::new(),
            inline_styles: BTreeMap::new(),
            parent: None,
            children: Vec::new(),
            shadow_root: None,
            host: None,
        }
    }

    pub(crate) fn shadow_root(host: NodeId) -> Self {
        Self {
            kind: NodeKind::ShadowRoot,
            tag: "#shadow-root".to_string(),
            host: Some(host),
            ..Self::element("")
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    pub fn is_shadow_root(&self) -> bool {
        self.kind == NodeKind::ShadowRoot
    }

    /// Lowercase tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn role(&self) -> Option<&str> {
        self.attr("role")
    }

    pub fn aria_label(&self) -> Option<&str> {
        self.attr("aria-label")
    }

    pub fn title(&self) -> Option<&str> {
        self.attr("title")
    }

    pub fn href(&self) -> Option<&str> {
        self.attr("href")
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_list().any(|c| c == class)
    }

    pub fn class_list(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    /// `data-*` attributes keyed the way `element.dataset` exposes them
    /// (`data-conversation-id` becomes `conversationId`).
    pub fn dataset(&self) -> impl Iterator<Item = (String, &str)> {
        self.attributes.iter().filter_map(|(name, value)| {
            name.strip_prefix("data-")
                .map(|rest| (dataset_key(rest), value.as_str()))
        })
    }

    /// Single dataset lookup by camelCase key.
    pub fn data(&self, key: &str) -> Option<&str> {
        self.dataset().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Own text, without descendants.
    pub fn own_text(&self) -> &str {
        &self.text
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn shadow_root_id(&self) -> Option<NodeId> {
        self.shadow_root
    }

    pub fn host(&self) -> Option<NodeId> {
        self.host
    }

    pub fn inline_style(&self, prop: &str) -> Option<&str> {
        self.inline_styles.get(prop).map(String::as_str)
    }

    /// Inline `height` in pixels, when set as `<n>px`.
    pub(crate) fn inline_px(&self, prop: &str) -> Option<f64> {
        parse_px(self.inline_style(prop)?)
    }
}

/// Parse `"32px"` (or a bare number) into pixels.
pub fn parse_px(value: &str) -> Option<f64> {
    let v = value.trim();
    v.strip_suffix("px").unwrap_or(v).trim().parse().ok()
}

fn dataset_key(attr_suffix: &str) -> String {
    let mut out = String::with_capacity(attr_suffix.len());
    let mut upper = false;
    for ch in attr_suffix.chars() {
        if ch == '-' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_keys() {
        let mut node = Node::element("DIV");
        node.attributes
            .insert("data-conversation-id".into(), "c_123".into());
        node.attributes.insert("data-id".into(), "x".into());
        node.attributes.insert("aria-label".into(), "More".into());

        assert_eq!(node.tag(), "div");
        assert_eq!(node.data("conversationId"), Some("c_123"));
        assert_eq!(node.data("id"), Some("x"));
        assert_eq!(node.dataset().count(), 2);
    }

    #[test]
    fn test_class_list() {
        let mut node = Node::element("body");
        node.attributes.insert("class".into(), "theme  dark".into());
        assert!(node.has_class("dark"));
        assert!(!node.has_class("light"));
    }

    #[test]
    fn test_parse_px() {
        assert_eq!(parse_px("32px"), Some(32.0));
        assert_eq!(parse_px(" 18 "), Some(18.0));
        assert_eq!(parse_px("auto"), None);
    }
}
