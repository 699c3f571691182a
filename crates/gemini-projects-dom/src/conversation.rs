//! Conversation id extraction from URLs and sidebar markup.

use gemini_projects_config::HostConfig;
use tracing::trace;
use url::Url;

use crate::document::Document;
use crate::matcher::normalize;
use crate::node::NodeId;
use crate::selector::Selector;

/// Attributes that may hold a link to the conversation.
const LINK_ATTRS: [&str; 3] = ["href", "data-href", "data-url"];
/// Attributes that may hold the bare id.
const ID_ATTRS: [&str; 4] = ["data-conversation-id", "data-id", "data-chat-id", "data-uuid"];

/// Anything a conversation id can be read from.
#[derive(Debug, Clone, Copy)]
pub enum ConversationSource<'a> {
    Url(&'a str),
    Element(NodeId),
}

/// Ids are at least eight characters with no whitespace.
pub fn looks_like_id(value: &str) -> bool {
    value.chars().count() >= 8 && !value.chars().any(char::is_whitespace)
}

/// Reads conversation ids the way the host addresses them.
#[derive(Debug, Clone)]
pub struct ConversationIds {
    base: Option<Url>,
    app_segment: String,
    query_params: Vec<String>,
}

impl ConversationIds {
    pub fn new(config: &HostConfig) -> Self {
        Self {
            base: Url::parse(&config.origin).ok(),
            app_segment: config.app_segment.clone(),
            query_params: config.id_query_params.clone(),
        }
    }

    pub fn resolve(&self, doc: &Document, source: ConversationSource<'_>) -> Option<String> {
        match source {
            ConversationSource::Url(url) => self.from_url(url),
            ConversationSource::Element(node) => self.from_element(doc, node),
        }
    }

    /// Path segment after `/app/`, then a known query parameter, then the
    /// fragment. Relative URLs resolve against the host origin.
    pub fn from_url(&self, input: &str) -> Option<String> {
        if input.trim().is_empty() {
            return None;
        }
        let url = match Url::parse(input) {
            Ok(url) => url,
            Err(_) => self.base.as_ref()?.join(input).ok()?,
        };

        if let Some(id) = self.id_from_path(&url) {
            return Some(id);
        }
        for param in &self.query_params {
            if let Some((_, value)) = url
                .query_pairs()
                .find(|(k, v)| k == param.as_str() && !v.is_empty())
            {
                return Some(value.into_owned());
            }
        }
        url.fragment()
            .filter(|f| !f.is_empty())
            .map(str::to_string)
    }

    fn id_from_path(&self, url: &Url) -> Option<String> {
        let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
        segments.find(|s| *s == self.app_segment)?;
        segments.next().map(str::to_string)
    }

    /// Dataset id, the element's own link, then its first descendant link.
    pub fn from_element(&self, doc: &Document, node: NodeId) -> Option<String> {
        let n = doc.node(node);
        if let Some(id) = dataset_id(doc, node) {
            return Some(id);
        }
        if n.tag() == "a" {
            if let Some(href) = n.href() {
                return self.from_url(href);
            }
        }
        let link = doc.query(node, &Selector::link())?;
        self.from_url(doc.node(link).href()?)
    }

    /// Id-bearing attributes of a single element.
    pub fn pick_from_element(&self, doc: &Document, node: NodeId) -> Option<String> {
        let n = doc.node(node);
        if let Some(href) = LINK_ATTRS.iter().find_map(|a| n.attr(a).filter(|v| !v.is_empty())) {
            if let Some(id) = self.from_url(href) {
                return Some(id);
            }
        }

        let from_dataset = n.dataset().find_map(|(key, value)| {
            let key = key.to_lowercase();
            let id_like_key = key.contains("conversation") || key.contains("chat") || key.ends_with("id");
            (id_like_key && looks_like_id(value)).then(|| value.to_string())
        });
        if from_dataset.is_some() {
            return from_dataset;
        }

        ID_ATTRS
            .iter()
            .find_map(|a| n.attr(a).filter(|v| looks_like_id(v)))
            .map(str::to_string)
    }

    /// The row itself, its first link, then every descendant in order.
    pub fn find_deep(&self, doc: &Document, root: NodeId) -> Option<String> {
        if let Some(id) = self.pick_from_element(doc, root) {
            return Some(id);
        }
        if let Some(href) = doc
            .query(root, &Selector::link())
            .and_then(|link| doc.node(link).href())
        {
            if let Some(id) = self.from_url(href) {
                return Some(id);
            }
        }
        doc.descendants(root, false).into_iter().find_map(|child| {
            self.pick_from_element(doc, child).or_else(|| {
                let n = doc.node(child);
                match (n.tag(), n.href()) {
                    ("a", Some(href)) => self.from_url(href),
                    _ => None,
                }
            })
        })
    }

    /// Match a visible title against sidebar links, then id-bearing nodes.
    /// Linear in sidebar size; only used when a row carries no structural
    /// cue.
    pub fn find_by_title(&self, doc: &Document, sidebar: NodeId, title: &str) -> Option<String> {
        let wanted = title.trim();
        if wanted.is_empty() {
            return None;
        }
        let by_link = doc
            .query_all(sidebar, &Selector::link())
            .into_iter()
            .filter(|link| doc.text_content(*link).trim() == wanted)
            .find_map(|link| self.from_url(doc.node(link).href()?));
        if by_link.is_some() {
            return by_link;
        }

        let data_nodes = Selector::AnyOf(vec![
            Selector::has_attr("data-conversation-id"),
            Selector::has_attr("data-id"),
            Selector::has_attr("data-chat-id"),
        ]);
        doc.query_all(sidebar, &data_nodes)
            .into_iter()
            .filter(|n| doc.text_content(*n).trim() == wanted)
            .find_map(|n| {
                let node = doc.node(n);
                ["conversationId", "id", "chatId"]
                    .iter()
                    .find_map(|k| node.data(k).filter(|v| !v.is_empty()))
                    .filter(|v| looks_like_id(v))
                    .map(str::to_string)
            })
    }

    /// Dataset, then a deep structural search, then a title lookup in
    /// `sidebar`.
    pub fn from_row(&self, doc: &Document, row: NodeId, sidebar: Option<NodeId>) -> Option<String> {
        if let Some(id) = dataset_id(doc, row) {
            return Some(id);
        }
        if let Some(id) = self.find_deep(doc, row) {
            return Some(id);
        }
        let title = doc.text_content(row);
        let id = self.find_by_title(doc, sidebar?, &title);
        trace!(title = %normalize(&title), found = id.is_some(), "conversation id by title");
        id
    }
}

impl Default for ConversationIds {
    fn default() -> Self {
        Self::new(&HostConfig::default())
    }
}

fn dataset_id(doc: &Document, node: NodeId) -> Option<String> {
    let n = doc.node(node);
    n.data("conversationId")
        .filter(|v| !v.is_empty())
        .or_else(|| n.data("id").filter(|v| !v.is_empty()))
        .map(str::to_string)
}
