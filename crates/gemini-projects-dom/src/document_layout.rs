//! Block-flow approximation for nodes the extension inserts.
//!
//! The host lays out its own nodes (fixtures set their boxes). Nodes inserted
//! without a box are stacked as blocks inside their parent so geometric
//! checks after an insert see realistic numbers.

use crate::document::Document;
use crate::geometry::BoundingBox;
use crate::node::NodeId;

impl Document {
    /// Box used as the layout container for children of `node`; a shadow
    /// root lays out inside its host.
    fn container_box(&self, node: NodeId) -> BoundingBox {
        let n = self.node(node);
        match n.host {
            Some(host) if n.is_shadow_root() => self.node(host).bounding_box,
            _ => n.bounding_box,
        }
    }

    /// Anything with a width was laid out by the host or by an earlier
    /// insert.
    fn is_placed(&self, node: NodeId) -> bool {
        self.node(node).bounding_box.width > 0.0
    }

    fn layout_container(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.node(node).parent?;
        let p = self.node(parent);
        if p.is_shadow_root() { p.host } else { Some(parent) }
    }

    pub(crate) fn layout_inserted(&mut self, node: NodeId) {
        if self.is_placed(node) {
            return;
        }
        let Some(parent) = self.node(node).parent else {
            return;
        };
        let container = self.container_box(parent);
        if container.width <= 0.0 {
            return;
        }

        let y = self
            .previous_element_sibling(node)
            .map(|prev| self.node(prev).bounding_box)
            .filter(|b| b.width > 0.0)
            .map(|b| b.bottom())
            .unwrap_or(container.y);
        self.place_block(node, container.x, y, container.width);

        let height = self.node(node).bounding_box.height;
        if height > 0.0 && !self.is_out_of_flow(node) {
            self.reflow(node, height);
        }
    }

    pub(crate) fn layout_removing(&mut self, node: NodeId) {
        let bbox = self.node(node).bounding_box;
        if bbox.width <= 0.0 || bbox.height <= 0.0 || self.is_out_of_flow(node) {
            return;
        }
        let Some(parent) = self.node(node).parent else {
            return;
        };
        if self.container_box(parent).width <= 0.0 {
            return;
        }
        self.reflow(node, -bbox.height);
    }

    /// Give `node` a box and stack its own unplaced children inside it.
    fn place_block(&mut self, node: NodeId, x: f64, y: f64, container_width: f64) {
        let n = self.node(node);
        let width = n.inline_px("width").unwrap_or(container_width);
        let own_height = n.inline_px("height");

        let mut cursor = y;
        let mut children = n.children.clone();
        if let Some(shadow) = n.shadow_root {
            children.splice(0..0, self.node(shadow).children.clone());
        }
        self.node_mut(node).bounding_box = BoundingBox::new(x, y, width, 0.0);
        for child in children {
            if self.is_placed(child) || self.is_out_of_flow(child) {
                continue;
            }
            self.place_block(child, x, cursor, width);
            cursor += self.node(child).bounding_box.height;
        }
        let height = own_height.unwrap_or(cursor - y);
        self.node_mut(node).bounding_box.height = height;
    }

    /// Shift later siblings and grow ancestors by `dy`, stopping at the first
    /// out-of-flow ancestor, at an ancestor with a fixed inline height, or at
    /// `<body>`.
    fn reflow(&mut self, node: NodeId, dy: f64) {
        let body = self.body();
        let html = self.document_element();
        let mut current = node;
        while let Some(container) = self.layout_container(current) {
            for sibling in self.following_siblings(current) {
                if !self.is_out_of_flow(sibling) {
                    self.shift_subtree(sibling, dy);
                }
            }
            if container == body || container == html {
                break;
            }
            let bbox = self.node(container).bounding_box;
            if bbox.width <= 0.0 || self.node(container).inline_px("height").is_some() {
                break;
            }
            self.node_mut(container).bounding_box.height = (bbox.height + dy).max(0.0);
            if self.is_out_of_flow(container) {
                break;
            }
            current = container;
        }
    }

    fn shift_subtree(&mut self, node: NodeId, dy: f64) {
        let mut targets = vec![node];
        targets.extend(self.descendants(node, true));
        for id in targets {
            let bbox = self.node(id).bounding_box;
            if bbox.width > 0.0 {
                self.node_mut(id).bounding_box = bbox.shifted(dy);
            }
        }
    }
}
