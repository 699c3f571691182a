//! Visibility checks and candidate scoring.
//!
//! Role attributes alone are unreliable (the host reuses `menu`/`listbox` for
//! unrelated widgets), so candidates are ranked by label hits first, compact
//! area second, then distance to the trigger and z-index.

use std::cmp::Ordering;

use gemini_projects_config::VisibilityConfig;
use tracing::debug;

use crate::document::Document;
use crate::geometry::BoundingBox;
use crate::matcher::{LabelGroup, Matcher};
use crate::node::NodeId;
use crate::selector::Selector;

/// Offset from the trigger's top-right corner hit-tested by
/// [`menu_from_point`].
const HIT_POINT_OFFSET: f64 = 8.0;
/// Keeps the hit point inside the viewport edge.
const HIT_POINT_MARGIN: f64 = 4.0;

/// Thresholds for "meaningfully visible".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityRules {
    /// Reject boxes at least this fraction of the viewport in either
    /// dimension. `None` disables the check.
    pub max_viewport_fraction: Option<f64>,
    /// Area must exceed this.
    pub min_area: f64,
}

impl VisibilityRules {
    /// Menu roots: compact, never a full-page overlay.
    pub fn menu(config: &VisibilityConfig) -> Self {
        Self {
            max_viewport_fraction: Some(config.max_viewport_fraction),
            min_area: config.min_menu_area,
        }
    }

    /// Any on-screen interactive element.
    pub fn interactive() -> Self {
        Self {
            max_viewport_fraction: None,
            min_area: 0.0,
        }
    }

    pub fn is_visible(&self, doc: &Document, node: NodeId) -> bool {
        if !doc.is_connected(node) {
            return false;
        }
        let viewport = doc.viewport();
        let bbox = doc.bounding_box(node);
        if !bbox.is_visible_in_viewport(&viewport) {
            return false;
        }
        if let Some(fraction) = self.max_viewport_fraction {
            if bbox.width >= f64::from(viewport.width) * fraction
                || bbox.height >= f64::from(viewport.height) * fraction
            {
                return false;
            }
        }
        bbox.area() > self.min_area
            && doc.is_rendered(node)
            && doc.computed_style(node, "visibility") != "hidden"
            && doc.computed_style(node, "pointer-events") != "none"
    }
}

/// Number of `div`/`button`/`menuitem` descendants whose text contains a
/// menu action label.
pub fn count_token_hits(doc: &Document, root: NodeId, matcher: &Matcher) -> usize {
    let tokens = matcher.labels(LabelGroup::MenuAction);
    doc.query_all(root, &Selector::menu_entry())
        .into_iter()
        .filter(|id| {
            let text = doc.text_content(*id).to_lowercase();
            tokens.iter().any(|t| text.contains(t))
        })
        .count()
}

/// A scored menu-root candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MenuCandidate {
    pub node: NodeId,
    pub hits: usize,
    pub area: f64,
}

/// Score `candidates`, most label hits first, smaller area breaking ties.
pub fn rank_by_hits(doc: &Document, candidates: &[NodeId], matcher: &Matcher) -> Vec<MenuCandidate> {
    let mut scored: Vec<MenuCandidate> = candidates
        .iter()
        .map(|node| MenuCandidate {
            node: *node,
            hits: count_token_hits(doc, *node, matcher),
            area: doc.bounding_box(*node).area(),
        })
        .collect();
    scored.sort_by(|a, b| {
        b.hits
            .cmp(&a.hits)
            .then(a.area.partial_cmp(&b.area).unwrap_or(Ordering::Equal))
    });
    scored
}

/// Candidate whose top-left corner is nearest the trigger's top-right.
pub fn pick_closest(doc: &Document, candidates: &[NodeId], trigger: &BoundingBox) -> Option<NodeId> {
    candidates
        .iter()
        .map(|id| (*id, doc.bounding_box(*id).offset_from(trigger)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        .map(|(id, _)| id)
}

/// Highest numeric z-index; the first candidate when none sets one.
pub fn pick_topmost(doc: &Document, candidates: &[NodeId]) -> Option<NodeId> {
    let mut best: Option<(NodeId, i32)> = None;
    for id in candidates {
        let z = doc.z_index(*id).unwrap_or(0);
        if best.is_none_or(|(_, bz)| z > bz) {
            best = Some((*id, z));
        }
    }
    best.map(|(id, _)| id)
}

/// Hit-test just right of the trigger and climb to an enclosing visible menu.
pub fn menu_from_point(doc: &Document, trigger: &BoundingBox, rules: &VisibilityRules) -> Option<NodeId> {
    let viewport = doc.viewport();
    let x = (trigger.right() + HIT_POINT_OFFSET).clamp(0.0, f64::from(viewport.width) - HIT_POINT_MARGIN);
    let y = (trigger.y + HIT_POINT_OFFSET).clamp(0.0, f64::from(viewport.height) - HIT_POINT_MARGIN);
    let hit = doc.element_from_point(x, y)?;
    doc.closest(hit, &Selector::menu_role())
        .filter(|menu| rules.is_visible(doc, *menu))
}

/// Pick the best menu root among visible role candidates.
///
/// A candidate with at least `min_hits` label hits wins outright. Otherwise
/// the element under the trigger's corner, then the closest candidate, or,
/// with no trigger, the topmost.
pub fn best_menu_root(
    doc: &Document,
    candidates: &[NodeId],
    trigger: Option<&BoundingBox>,
    matcher: &Matcher,
    rules: &VisibilityRules,
    min_hits: usize,
) -> Option<NodeId> {
    let visible: Vec<NodeId> = candidates
        .iter()
        .copied()
        .filter(|id| rules.is_visible(doc, *id))
        .collect();
    if visible.is_empty() {
        return None;
    }

    let ranked = rank_by_hits(doc, &visible, matcher);
    if let Some(best) = ranked.first().filter(|c| c.hits >= min_hits) {
        debug!(node = %best.node, hits = best.hits, area = best.area, "menu root by label hits");
        return Some(best.node);
    }

    match trigger {
        Some(trigger) => menu_from_point(doc, trigger, rules)
            .or_else(|| pick_closest(doc, &visible, trigger)),
        None => pick_topmost(doc, &visible),
    }
}
