//! Element selectors.
//!
//! The heuristics only ever need a handful of CSS shapes, so they are
//! expressed as an enum instead of parsed selector strings.

use crate::node::Node;

#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Any element.
    Any,
    /// `nav, aside`
    Tags(Vec<&'static str>),
    /// `[role="menu"], [role="listbox"]`
    Roles(Vec<&'static str>),
    /// `[href]`
    HasAttr(String),
    /// `[data-gp-item="move-to-project"]`
    AttrEq(String, String),
    /// `#gp-panel-root`
    Id(String),
    Class(String),
    /// Every inner selector matches (compound selector).
    All(Vec<Selector>),
    /// Selector list.
    AnyOf(Vec<Selector>),
}

impl Selector {
    pub fn tags(tags: &[&'static str]) -> Self {
        Self::Tags(tags.to_vec())
    }

    pub fn tag(tag: &'static str) -> Self {
        Self::Tags(vec![tag])
    }

    pub fn roles(roles: &[&'static str]) -> Self {
        Self::Roles(roles.to_vec())
    }

    pub fn has_attr(name: impl Into<String>) -> Self {
        Self::HasAttr(name.into())
    }

    pub fn attr_eq(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::AttrEq(name.into(), value.into())
    }

    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    pub fn class(class: impl Into<String>) -> Self {
        Self::Class(class.into())
    }

    /// `a[href]`
    pub fn link() -> Self {
        Self::All(vec![Self::tag("a"), Self::has_attr("href")])
    }

    /// `nav, aside, [role="navigation"], [role="complementary"]`
    pub fn navigation_region() -> Self {
        Self::AnyOf(vec![
            Self::tags(&["nav", "aside"]),
            Self::roles(&["navigation", "complementary"]),
        ])
    }

    /// `[role="menu"], [role="listbox"]`
    pub fn menu_role() -> Self {
        Self::roles(&["menu", "listbox"])
    }

    /// `div, button, [role="menuitem"]`
    pub fn menu_entry() -> Self {
        Self::AnyOf(vec![Self::tags(&["div", "button"]), Self::roles(&["menuitem"])])
    }

    /// `[role="listitem"], li, div`
    pub fn chat_row() -> Self {
        Self::AnyOf(vec![Self::roles(&["listitem"]), Self::tags(&["li", "div"])])
    }

    /// `button, [role="button"]`
    pub fn button() -> Self {
        Self::AnyOf(vec![Self::tag("button"), Self::roles(&["button"])])
    }

    pub fn matches(&self, node: &Node) -> bool {
        if !node.is_element() {
            return false;
        }
        match self {
            Self::Any => true,
            Self::Tags(tags) => tags.iter().any(|t| node.tag() == *t),
            Self::Roles(roles) => node.role().is_some_and(|r| roles.contains(&r)),
            Self::HasAttr(name) => node.has_attr(name),
            Self::AttrEq(name, value) => node.attr(name) == Some(value.as_str()),
            Self::Id(id) => node.id() == Some(id.as_str()),
            Self::Class(class) => node.has_class(class),
            Self::All(parts) => parts.iter().all(|s| s.matches(node)),
            Self::AnyOf(parts) => parts.iter().any(|s| s.matches(node)),
        }
    }
}
