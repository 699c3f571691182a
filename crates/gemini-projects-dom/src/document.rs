//! Document arena: tree edits, traversal and queries.

use crate::error::DomError;
use crate::geometry::{BoundingBox, ViewportInfo};
use crate::mutation::MutationRecord;
use crate::node::{Node, NodeId};
use crate::selector::Selector;

/// A text selection inside an editable element, in character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSelection {
    pub node: NodeId,
    pub start: usize,
    pub end: usize,
}

/// The host page as the core sees it.
///
/// Nodes live in an arena and are never freed, so a [`NodeId`] held across a
/// host re-render stays valid and simply reports `is_connected() == false`.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) nodes: Vec<Node>,
    document_element: NodeId,
    head: NodeId,
    body: NodeId,
    viewport: ViewportInfo,
    url: String,
    navigator_languages: Vec<String>,
    focused: Option<NodeId>,
    selection: Option<TextSelection>,
    pub(crate) records: Vec<MutationRecord>,
}

impl Document {
    /// Empty `<html><head/><body/></html>` filling the viewport.
    pub fn new(viewport: ViewportInfo, url: impl Into<String>) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            document_element: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
            viewport,
            url: url.into(),
            navigator_languages: Vec::new(),
            focused: None,
            selection: None,
            records: Vec::new(),
        };
        let html = doc.push_node(Node::element("html"));
        let head = doc.push_node(Node::element("head"));
        let body = doc.push_node(Node::element("body"));
        doc.nodes[html.index()].children = vec![head, body];
        doc.nodes[head.index()].parent = Some(html);
        doc.nodes[body.index()].parent = Some(html);
        doc.nodes[html.index()].bounding_box = viewport.as_box();
        doc.nodes[body.index()].bounding_box = viewport.as_box();
        doc.document_element = html;
        doc.head = head;
        doc.body = body;
        doc
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Node by id. Ids always come from this document.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    fn check(&self, id: NodeId) -> Result<(), DomError> {
        if id.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(DomError::UnknownNode(id))
        }
    }

    pub fn document_element(&self) -> NodeId {
        self.document_element
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn viewport(&self) -> ViewportInfo {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: ViewportInfo) {
        self.viewport = viewport;
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    /// `lang` attribute of the document element.
    pub fn lang(&self) -> Option<&str> {
        self.node(self.document_element)
            .attr("lang")
            .filter(|l| !l.trim().is_empty())
    }

    pub fn navigator_languages(&self) -> &[String] {
        &self.navigator_languages
    }

    pub fn set_navigator_languages(&mut self, languages: Vec<String>) {
        self.navigator_languages = languages;
    }

    /// Drain accumulated mutation records.
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    fn record(&mut self, record: MutationRecord) {
        if self.is_connected(record.target()) {
            self.records.push(record);
        }
    }

    // ----- creation and tree edits -----

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_node(Node::element(tag))
    }

    /// Create a detached element with attributes and own text.
    pub fn create_element_with(
        &mut self,
        tag: &str,
        attributes: &[(&str, &str)],
        text: &str,
    ) -> NodeId {
        let mut node = Node::element(tag);
        for (name, value) in attributes {
            node.attributes.insert(name.to_string(), value.to_string());
        }
        node.text = text.to_string();
        self.push_node(node)
    }

    /// Attach an open shadow root, returning the existing one if present.
    pub fn attach_shadow(&mut self, host: NodeId) -> NodeId {
        if let Some(existing) = self.node(host).shadow_root {
            return existing;
        }
        let root = self.push_node(Node::shadow_root(host));
        self.node_mut(host).shadow_root = Some(root);
        root
    }

    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.node(host).shadow_root
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference`, or append when `reference` is `None`.
    /// A child that is already attached somewhere is moved.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.check(parent)?;
        self.check(child)?;
        if self.contains_composed(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if let Some(r) = reference {
            self.check(r)?;
            if r == child {
                return Ok(());
            }
            if self.node(r).parent != Some(parent) {
                return Err(DomError::NotAChild {
                    parent,
                    reference: r,
                });
            }
        }

        self.detach(child);

        let index = match reference {
            Some(r) => self
                .node(parent)
                .children
                .iter()
                .position(|c| *c == r)
                .unwrap_or(self.node(parent).children.len()),
            None => self.node(parent).children.len(),
        };
        self.node_mut(parent).children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
        self.record(MutationRecord::ChildList {
            target: parent,
            added: vec![child],
            removed: vec![],
        });
        self.layout_inserted(child);
        Ok(())
    }

    /// Insert `new` directly after `node`.
    pub fn insert_after(&mut self, node: NodeId, new: NodeId) -> Result<(), DomError> {
        let parent = self.node(node).parent.ok_or(DomError::Detached(node))?;
        let next = self.next_sibling(node);
        self.insert_before(parent, new, next)
    }

    /// Detach a node from its parent. No-op when already detached.
    pub fn remove(&mut self, node: NodeId) {
        self.detach(node);
    }

    /// Remove every child of `node`.
    pub fn clear_children(&mut self, node: NodeId) {
        let children = self.node(node).children.clone();
        for child in children {
            self.detach(child);
        }
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.node(node).parent else {
            return;
        };
        self.layout_removing(node);
        self.node_mut(parent).children.retain(|c| *c != node);
        self.node_mut(node).parent = None;
        if let Some(focused) = self.focused {
            if self.contains_composed(node, focused) {
                self.focused = None;
            }
        }
        self.record(MutationRecord::ChildList {
            target: parent,
            added: vec![],
            removed: vec![node],
        });
    }

    // ----- attributes, text, classes -----

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if self.node(node).attr(name) == Some(value) {
            return;
        }
        self.node_mut(node)
            .attributes
            .insert(name.to_string(), value.to_string());
        self.record(MutationRecord::Attribute {
            target: node,
            name: name.to_string(),
        });
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if self.node_mut(node).attributes.remove(name).is_some() {
            self.record(MutationRecord::Attribute {
                target: node,
                name: name.to_string(),
            });
        }
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        self.toggle_class(node, class, true);
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        self.toggle_class(node, class, false);
    }

    pub fn toggle_class(&mut self, node: NodeId, class: &str, on: bool) {
        let n = self.node(node);
        if n.has_class(class) == on {
            return;
        }
        let mut classes: Vec<String> = n
            .class_list()
            .filter(|c| *c != class)
            .map(String::from)
            .collect();
        if on {
            classes.push(class.to_string());
        }
        let joined = classes.join(" ");
        if joined.is_empty() {
            self.remove_attribute(node, "class");
        } else {
            self.set_attribute(node, "class", &joined);
        }
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if self.node(node).text == text {
            return;
        }
        self.node_mut(node).text = text.to_string();
        self.record(MutationRecord::Text { target: node });
    }

    /// Host layout result. Layout never produces mutation records.
    pub fn set_bounding_box(&mut self, node: NodeId, bbox: BoundingBox) {
        self.node_mut(node).bounding_box = bbox;
    }

    pub fn bounding_box(&self, node: NodeId) -> BoundingBox {
        self.node(node).bounding_box
    }

    // ----- focus and selection -----

    pub fn focus(&mut self, node: NodeId) {
        self.focused = Some(node);
    }

    pub fn blur(&mut self) {
        self.focused = None;
    }

    /// Focused element, if it is still connected.
    pub fn active_element(&self) -> Option<NodeId> {
        self.focused.filter(|n| self.is_connected(*n))
    }

    pub fn set_selection(&mut self, selection: Option<TextSelection>) {
        self.selection = selection;
    }

    pub fn selection(&self) -> Option<TextSelection> {
        self.selection
    }

    // ----- traversal -----

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    /// Parent when it is an element (a shadow root parent yields `None`).
    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)
            .parent
            .filter(|p| self.node(*p).is_element())
    }

    /// Parent, crossing from a shadow root to its host.
    pub fn composed_parent(&self, node: NodeId) -> Option<NodeId> {
        let n = self.node(node);
        n.parent.or(n.host)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node).children.clone()
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.node(node).parent?;
        let siblings = &self.node(parent).children;
        let pos = siblings.iter().position(|c| *c == node)?;
        siblings.get(pos + 1).copied()
    }

    pub fn next_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.next_sibling(node)
    }

    pub fn previous_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.node(node).parent?;
        let siblings = &self.node(parent).children;
        let pos = siblings.iter().position(|c| *c == node)?;
        pos.checked_sub(1).map(|i| siblings[i])
    }

    /// Every following sibling in order.
    pub fn following_siblings(&self, node: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.node(node).parent else {
            return Vec::new();
        };
        let siblings = &self.node(parent).children;
        match siblings.iter().position(|c| *c == node) {
            Some(pos) => siblings[pos + 1..].to_vec(),
            None => Vec::new(),
        }
    }

    /// Elements below `root` in document order, excluding `root`.
    ///
    /// With `pierce_shadow`, a host's shadow tree is visited before its light
    /// children.
    pub fn descendants(&self, root: NodeId, pierce_shadow: bool) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.child_roots(root, pierce_shadow);
        stack.reverse();
        while let Some(id) = stack.pop() {
            let n = self.node(id);
            if n.is_element() {
                out.push(id);
            }
            let mut next = self.child_roots(id, pierce_shadow);
            next.reverse();
            stack.extend(next);
        }
        out
    }

    fn child_roots(&self, node: NodeId, pierce_shadow: bool) -> Vec<NodeId> {
        let n = self.node(node);
        let mut out = Vec::with_capacity(n.children.len());
        if pierce_shadow {
            if let Some(shadow) = n.shadow_root {
                out.extend(self.node(shadow).children.iter().copied());
            }
        }
        out.extend(n.children.iter().copied());
        out
    }

    /// `querySelectorAll` scoped to `root` (root excluded).
    pub fn query_all(&self, root: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(root, false)
            .into_iter()
            .filter(|id| selector.matches(self.node(*id)))
            .collect()
    }

    /// Like [`query_all`](Self::query_all) but descending into shadow trees.
    pub fn query_all_deep(&self, root: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(root, true)
            .into_iter()
            .filter(|id| selector.matches(self.node(*id)))
            .collect()
    }

    /// `querySelector` scoped to `root`.
    pub fn query(&self, root: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(root, false)
            .into_iter()
            .find(|id| selector.matches(self.node(*id)))
    }

    pub fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        selector.matches(self.node(node))
    }

    /// Nearest inclusive ancestor matching `selector`, within one tree scope.
    pub fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            let n = self.node(id);
            if !n.is_element() {
                return None;
            }
            if selector.matches(n) {
                return Some(id);
            }
            current = n.parent;
        }
        None
    }

    /// Inclusive, non-piercing containment.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).parent;
        }
        false
    }

    /// Inclusive containment crossing shadow boundaries.
    pub fn contains_composed(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.composed_parent(id);
        }
        false
    }

    /// Reachable from the document element through parent and host links.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.contains_composed(self.document_element, node)
    }

    /// `textContent`: own text followed by descendants', not piercing shadow
    /// roots.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let n = self.node(node);
        out.push_str(&n.text);
        for child in &n.children {
            self.collect_text(*child, out);
        }
    }

    /// Element with `id` in the document or any reachable shadow tree.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let html = self.document_element;
        if self.node(html).id() == Some(id) {
            return Some(html);
        }
        self.descendants(html, true)
            .into_iter()
            .find(|n| self.node(*n).id() == Some(id))
    }

    /// The document element plus every connected shadow root.
    pub fn search_roots(&self) -> Vec<NodeId> {
        let html = self.document_element;
        let mut roots = vec![html];
        roots.extend(
            std::iter::once(html)
                .chain(self.descendants(html, true))
                .filter_map(|n| self.node(n).shadow_root),
        );
        roots
    }

    /// Matches of `selector` across the document and all shadow trees.
    pub fn query_all_in_roots(&self, selector: &Selector) -> Vec<NodeId> {
        self.query_all_deep(self.document_element, selector)
    }

    /// Topmost rendered element under a point: highest effective z-index,
    /// then smallest area.
    pub fn element_from_point(&self, x: f64, y: f64) -> Option<NodeId> {
        let mut hits: Vec<(NodeId, i32, f64)> = self
            .descendants(self.document_element, true)
            .into_iter()
            .filter(|id| {
                let bbox = self.node(*id).bounding_box;
                !bbox.is_empty()
                    && bbox.contains(x, y)
                    && self.is_rendered(*id)
                    && self.computed_style(*id, "visibility") != "hidden"
                    && self.computed_style(*id, "pointer-events") != "none"
            })
            .map(|id| (id, self.effective_z_index(id), self.node(id).bounding_box.area()))
            .collect();
        hits.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then(a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal))
        });
        hits.first().map(|(id, _, _)| *id)
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
