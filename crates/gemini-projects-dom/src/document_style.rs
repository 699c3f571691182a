//! Computed style resolution.

use crate::document::Document;
use crate::mutation::MutationRecord;
use crate::node::NodeId;

/// Properties that inherit from the composed parent when unset.
const INHERITED: [&str; 7] = [
    "visibility",
    "pointer-events",
    "color",
    "font-family",
    "font-size",
    "font-weight",
    "line-height",
];

fn initial_value(prop: &str) -> &'static str {
    match prop {
        "display" => "block",
        "visibility" => "visible",
        "pointer-events" => "auto",
        "z-index" => "auto",
        "position" => "static",
        _ => "",
    }
}

impl Document {
    /// Inline `element.style` override.
    pub fn set_style(&mut self, node: NodeId, prop: &str, value: &str) {
        if self.node(node).inline_style(prop) == Some(value) {
            return;
        }
        self.node_mut(node)
            .inline_styles
            .insert(prop.to_string(), value.to_string());
        self.style_changed(node);
    }

    pub fn set_styles(&mut self, node: NodeId, styles: &[(&str, &str)]) {
        for (prop, value) in styles {
            self.set_style(node, prop, value);
        }
    }

    pub fn remove_style(&mut self, node: NodeId, prop: &str) {
        if self.node_mut(node).inline_styles.remove(prop).is_some() {
            self.style_changed(node);
        }
    }

    /// Value produced by the host's own stylesheets.
    pub fn set_computed_style(&mut self, node: NodeId, prop: &str, value: &str) {
        self.node_mut(node)
            .computed_styles
            .insert(prop.to_string(), value.to_string());
        self.style_changed(node);
    }

    fn style_changed(&mut self, node: NodeId) {
        if self.is_connected(node) {
            self.records.push(MutationRecord::Attribute {
                target: node,
                name: "style".to_string(),
            });
        }
    }

    /// Resolved value: inline override, then host style, then the inherited
    /// value for inheritable properties, then the CSS initial value.
    pub fn computed_style(&self, node: NodeId, prop: &str) -> String {
        let mut current = Some(node);
        while let Some(id) = current {
            let n = self.node(id);
            if n.is_element() {
                if let Some(v) = n.inline_styles.get(prop).or_else(|| n.computed_styles.get(prop)) {
                    if v != "inherit" {
                        return v.clone();
                    }
                } else if !INHERITED.contains(&prop) {
                    break;
                }
            }
            current = self.composed_parent(id);
        }
        initial_value(prop).to_string()
    }

    /// Connected, and no inclusive ancestor has `display: none`.
    pub fn is_rendered(&self, node: NodeId) -> bool {
        if !self.is_connected(node) {
            return false;
        }
        let mut current = Some(node);
        while let Some(id) = current {
            if self.node(id).is_element() && self.computed_style(id, "display") == "none" {
                return false;
            }
            current = self.composed_parent(id);
        }
        true
    }

    /// Numeric `z-index`, `None` for `auto`.
    pub fn z_index(&self, node: NodeId) -> Option<i32> {
        self.computed_style(node, "z-index").trim().parse().ok()
    }

    /// z-index of the nearest inclusive ancestor that sets one.
    pub fn effective_z_index(&self, node: NodeId) -> i32 {
        let mut current = Some(node);
        while let Some(id) = current {
            if self.node(id).is_element() {
                if let Some(z) = self.z_index(id) {
                    return z;
                }
            }
            current = self.composed_parent(id);
        }
        0
    }

    /// `position: fixed | absolute`.
    pub fn is_out_of_flow(&self, node: NodeId) -> bool {
        matches!(
            self.computed_style(node, "position").as_str(),
            "fixed" | "absolute"
        )
    }
}
