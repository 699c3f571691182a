//! Look of the host's conversation menu, captured once and reused.

use gemini_projects_dom::{Document, NodeId};

const FONT_STACK: &str = "\"Google Sans Flex\", \"Google Sans\", \"Helvetica Neue\", sans-serif";

/// Visual snapshot applied to the move submenu and the injected item.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuTheme {
    pub font_family: String,
    pub font_size: String,
    pub font_weight: String,
    pub color: String,
    pub line_height: String,
    pub background: String,
    pub border_radius: String,
    pub box_shadow: String,
    pub border: String,
    pub hover: String,
    pub divider: String,
    pub item_radius: String,
    pub item_padding: String,
    pub item_height: String,
}

impl Default for MenuTheme {
    fn default() -> Self {
        Self::light()
    }
}

impl MenuTheme {
    pub fn light() -> Self {
        Self {
            font_family: FONT_STACK.to_string(),
            font_size: "14px".to_string(),
            font_weight: "500".to_string(),
            color: "#1b1a18".to_string(),
            line_height: "20px".to_string(),
            background: "#fbfaf6".to_string(),
            border_radius: "20px".to_string(),
            box_shadow: "0 4px 6px -1px rgba(0, 0, 0, 0.1), 0 2px 4px -1px rgba(0, 0, 0, 0.06), 0 12px 24px -4px rgba(0, 0, 0, 0.15)".to_string(),
            border: "1px solid rgba(91, 89, 84, 0.08)".to_string(),
            hover: "rgba(68, 71, 70, 0.08)".to_string(),
            divider: "rgba(91, 89, 84, 0.08)".to_string(),
            item_radius: "14px".to_string(),
            item_padding: "4px 12px".to_string(),
            item_height: "auto".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            color: "#ede9e0".to_string(),
            background: "#1b1a18".to_string(),
            box_shadow: "0 4px 6px -1px rgba(0, 0, 0, 0.4), 0 12px 24px -4px rgba(0, 0, 0, 0.5)".to_string(),
            border: "1px solid rgba(237, 233, 224, 0.16)".to_string(),
            hover: "rgba(237, 233, 224, 0.08)".to_string(),
            divider: "rgba(237, 233, 224, 0.16)".to_string(),
            ..Self::light()
        }
    }

    /// The body opts into dark mode through a class.
    pub fn body_is_dark(doc: &Document) -> bool {
        let body = doc.node(doc.body());
        body.has_class("dark") || body.has_class("dark-theme")
    }

    /// Theme the submenu renders with: the dark palette on a dark page,
    /// otherwise the captured snapshot.
    pub fn effective(doc: &Document, captured: Option<&MenuTheme>) -> MenuTheme {
        if Self::body_is_dark(doc) {
            return Self::dark();
        }
        captured.cloned().unwrap_or_else(Self::light)
    }

    /// Read the menu root's surface and one native item's typography.
    /// Anything the host leaves unset falls back to the light palette.
    pub fn capture(doc: &Document, menu_root: NodeId, style_source: Option<NodeId>) -> MenuTheme {
        let defaults = Self::light();
        let menu = |prop: &str| doc.computed_style(menu_root, prop);
        let item_node = style_source.unwrap_or(menu_root);
        let item = |prop: &str| doc.computed_style(item_node, prop);

        let box_shadow = menu("box-shadow");
        let item_height = style_source
            .map(|s| doc.bounding_box(s).height)
            .filter(|h| *h > 0.0)
            .map(|h| format!("{}px", h.round()))
            .unwrap_or(defaults.item_height.clone());

        MenuTheme {
            font_family: non_empty(item("font-family")).unwrap_or(defaults.font_family),
            font_size: non_empty(item("font-size")).unwrap_or(defaults.font_size),
            font_weight: non_empty(item("font-weight")).unwrap_or(defaults.font_weight),
            color: normalize_color(&item("color")).unwrap_or(defaults.color),
            line_height: normalize_line_height(&item("line-height")).unwrap_or(defaults.line_height),
            background: normalize_color(&menu("background-color")).unwrap_or(defaults.background),
            border_radius: normalize_radius(&menu("border-radius")).unwrap_or(defaults.border_radius),
            box_shadow: non_empty(box_shadow)
                .filter(|s| s != "none")
                .unwrap_or(defaults.box_shadow),
            border: build_border(doc, menu_root).unwrap_or(defaults.border),
            hover: defaults.hover,
            divider: defaults.divider,
            item_radius: normalize_radius(&item("border-radius")).unwrap_or(defaults.item_radius),
            item_padding: normalize_padding(doc, item_node).unwrap_or(defaults.item_padding),
            item_height,
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn normalize_color(value: &str) -> Option<String> {
    let normalized = value.trim().to_lowercase();
    match normalized.as_str() {
        "" | "transparent" | "rgba(0, 0, 0, 0)" => None,
        _ => Some(value.trim().to_string()),
    }
}

fn normalize_radius(value: &str) -> Option<String> {
    match value.trim() {
        "" | "0px" | "0" => None,
        v => Some(v.to_string()),
    }
}

fn normalize_line_height(value: &str) -> Option<String> {
    match value.trim() {
        "" | "normal" => None,
        v => Some(v.to_string()),
    }
}

fn normalize_padding(doc: &Document, node: NodeId) -> Option<String> {
    let sides: Vec<String> = ["padding-top", "padding-right", "padding-bottom", "padding-left"]
        .iter()
        .map(|p| doc.computed_style(node, p).trim().to_string())
        .collect();
    if sides.iter().any(String::is_empty) || sides.iter().all(|s| s == "0px") {
        return None;
    }
    Some(sides.join(" "))
}

fn build_border(doc: &Document, node: NodeId) -> Option<String> {
    let width = doc.computed_style(node, "border-width");
    let style = doc.computed_style(node, "border-style");
    let color = normalize_color(&doc.computed_style(node, "border-color"))?;
    let (width, style) = (width.trim(), style.trim());
    if width.is_empty() || width == "0px" || style.is_empty() || style == "none" {
        return None;
    }
    Some(format!("{width} {style} {color}"))
}
