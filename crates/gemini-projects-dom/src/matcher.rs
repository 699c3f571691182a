//! Locale-aware label matching against element text and attributes.

use gemini_projects_config::LocaleConfig;
use tracing::trace;

use crate::document::Document;
use crate::node::NodeId;

/// Languages the host is known to render its sidebar in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locale {
    En,
    Zh,
}

impl Locale {
    /// Primary subtag lookup: `zh-CN` and `zh` map to [`Locale::Zh`].
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Self::En),
            "zh" => Some(Self::Zh),
            _ => None,
        }
    }

    /// The language retried when the detected one finds nothing.
    pub fn alternate(self) -> Self {
        match self {
            Self::En => Self::Zh,
            Self::Zh => Self::En,
        }
    }

    /// Forced locale, then `<html lang>`, then the navigator list, then the
    /// configured default.
    pub fn detect(doc: &Document, config: &LocaleConfig) -> Self {
        if let Some(forced) = config.force.as_deref().and_then(Self::from_tag) {
            return forced;
        }
        if let Some(lang) = doc.lang().and_then(Self::from_tag) {
            return lang;
        }
        if let Some(nav) = doc
            .navigator_languages()
            .iter()
            .find_map(|tag| Self::from_tag(tag))
        {
            return nav;
        }
        Self::from_tag(&config.default).unwrap_or(Self::En)
    }
}

/// Groups of host labels the heuristics look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelGroup {
    /// Sidebar "Gems" section header.
    Gems,
    /// Sidebar "Chats" section header.
    Chats,
    /// Entries of the conversation context menu.
    MenuAction,
    /// The destructive entry the injected item sits after.
    Delete,
    /// aria-label/title tokens of the "more options" trigger.
    KebabTrigger,
    /// Composer toolbar button the prompt button sits after.
    ToolsButton,
    UploadButton,
}

impl LabelGroup {
    pub fn labels(self, locale: Locale) -> &'static [&'static str] {
        match (self, locale) {
            (Self::Gems, Locale::En) => &["Gems"],
            (Self::Gems, Locale::Zh) => &["Gem"],
            (Self::Chats, Locale::En) => &["Chats"],
            (Self::Chats, Locale::Zh) => &["对话", "聊天"],
            (Self::MenuAction, Locale::En) => &["share conversation", "share", "pin", "rename", "delete"],
            (Self::MenuAction, Locale::Zh) => &["分享", "置顶", "重命名", "删除"],
            (Self::Delete, Locale::En) => &["delete"],
            (Self::Delete, Locale::Zh) => &["删除"],
            (Self::KebabTrigger, Locale::En) => {
                &["more", "menu", "options", "open menu", "conversation actions"]
            }
            (Self::KebabTrigger, Locale::Zh) => &["更多", "菜单", "选项"],
            (Self::ToolsButton, Locale::En) => &["Tools"],
            (Self::ToolsButton, Locale::Zh) => &["工具"],
            (Self::UploadButton, Locale::En) => &["Upload", "Add files"],
            (Self::UploadButton, Locale::Zh) => &["上传", "添加文件"],
        }
    }
}

/// Glyphs hosts render inside icon-only "more" buttons.
pub const KEBAB_GLYPHS: &[&str] = &["⋮", "...", "…"];

/// Lowercase and collapse runs of whitespace.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Case-insensitive, whitespace-normalised substring test.
pub fn contains_label(haystack: &str, label: &str) -> bool {
    let label = normalize(label);
    !label.is_empty() && normalize(haystack).contains(&label)
}

/// Case-insensitive, whitespace-normalised equality.
pub fn equals_label(text: &str, label: &str) -> bool {
    normalize(text) == normalize(label)
}

/// Label matcher bound to the detected page locale.
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    locale: Locale,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(Locale::En)
    }
}

impl Matcher {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn detect(doc: &Document, config: &LocaleConfig) -> Self {
        let locale = Locale::detect(doc, config);
        trace!(?locale, "detected page locale");
        Self::new(locale)
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Detected-locale labels followed by the alternate language's.
    pub fn labels(&self, group: LabelGroup) -> Vec<&'static str> {
        let mut labels = group.labels(self.locale).to_vec();
        labels.extend_from_slice(group.labels(self.locale.alternate()));
        labels
    }

    /// Whether `text` contains any label of `group`, in either language.
    pub fn text_matches(&self, text: &str, group: LabelGroup) -> bool {
        self.labels(group).iter().any(|l| contains_label(text, l))
    }

    /// Whether text content, `aria-label` or `title` of `node` contains a
    /// label of `group`.
    pub fn element_matches(&self, doc: &Document, node: NodeId, group: LabelGroup) -> bool {
        let n = doc.node(node);
        let attrs = [n.aria_label(), n.title()];
        attrs
            .into_iter()
            .flatten()
            .any(|v| self.text_matches(v, group))
            || self.text_matches(&doc.text_content(node), group)
    }

    /// Run `strategy` with the detected locale, then once more with the
    /// alternate one.
    pub fn with_fallback<T>(&self, mut strategy: impl FnMut(Locale) -> Option<T>) -> Option<T> {
        strategy(self.locale).or_else(|| {
            let alternate = self.locale.alternate();
            trace!(?alternate, "retrying with alternate locale");
            strategy(alternate)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ViewportInfo;

    fn doc() -> Document {
        Document::new(ViewportInfo::default(), "https://gemini.google.com/app")
    }

    #[test]
    fn test_from_tag() {
        assert_eq!(Locale::from_tag("zh-CN"), Some(Locale::Zh));
        assert_eq!(Locale::from_tag("en_US"), Some(Locale::En));
        assert_eq!(Locale::from_tag("fr"), None);
        assert_eq!(Locale::from_tag(""), None);
    }

    #[test]
    fn test_detect_prefers_document_lang() {
        let mut doc = doc();
        let html = doc.document_element();
        doc.set_attribute(html, "lang", "zh-CN");
        doc.set_navigator_languages(vec!["en-US".into()]);
        assert_eq!(Locale::detect(&doc, &LocaleConfig::default()), Locale::Zh);
    }

    #[test]
    fn test_detect_falls_back_to_navigator_then_default() {
        let mut doc = doc();
        doc.set_navigator_languages(vec!["fr-FR".into(), "zh-TW".into()]);
        assert_eq!(Locale::detect(&doc, &LocaleConfig::default()), Locale::Zh);

        let doc = self::doc();
        assert_eq!(Locale::detect(&doc, &LocaleConfig::default()), Locale::En);
    }

    #[test]
    fn test_detect_force() {
        let mut doc = doc();
        let html = doc.document_element();
        doc.set_attribute(html, "lang", "en");
        let config = LocaleConfig {
            force: Some("zh".into()),
            ..Default::default()
        };
        assert_eq!(Locale::detect(&doc, &config), Locale::Zh);
    }

    #[test]
    fn test_normalized_containment() {
        assert!(contains_label("  Share   Conversation ", "share conversation"));
        assert!(contains_label("Delete", "DELETE"));
        assert!(!contains_label("Delete", ""));
        assert!(equals_label(" Chats\n", "chats"));
        assert!(!equals_label("Recent chats", "chats"));
    }

    #[test]
    fn test_labels_include_alternate_language() {
        let matcher = Matcher::new(Locale::En);
        assert!(matcher.text_matches("删除", LabelGroup::Delete));
        assert_eq!(matcher.labels(LabelGroup::Chats)[0], "Chats");
    }

    #[test]
    fn test_element_matches_attributes() {
        let mut doc = doc();
        let button = doc.create_element_with("button", &[("aria-label", "More options")], "");
        let matcher = Matcher::default();
        assert!(matcher.element_matches(&doc, button, LabelGroup::KebabTrigger));
        assert!(!matcher.element_matches(&doc, button, LabelGroup::Delete));
    }

    #[test]
    fn test_with_fallback_tries_alternate() {
        let matcher = Matcher::new(Locale::Zh);
        let mut tried = Vec::new();
        let found = matcher.with_fallback(|locale| {
            tried.push(locale);
            (locale == Locale::En).then_some(1)
        });
        assert_eq!(found, Some(1));
        assert_eq!(tried, vec![Locale::Zh, Locale::En]);
    }
}
