//! DOM tree errors.

use thiserror::Error;

use crate::node::NodeId;

/// Structural errors raised by tree edits.
///
/// Heuristic misses are never errors; these only fire when a caller asks for
/// an impossible edit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomError {
    #[error("Node {0} is not part of this document")]
    UnknownNode(NodeId),

    #[error("Cannot insert {child} into its own subtree at {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    #[error("Reference node {reference} is not a child of {parent}")]
    NotAChild { parent: NodeId, reference: NodeId },

    #[error("Node {0} has no parent")]
    Detached(NodeId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchy_request_display() {
        let err = DomError::HierarchyRequest {
            parent: NodeId(3),
            child: NodeId(1),
        };
        let display = err.to_string();
        assert!(display.contains("#1"));
        assert!(display.contains("#3"));
    }

    #[test]
    fn test_detached_display() {
        assert!(DomError::Detached(NodeId(7)).to_string().contains("no parent"));
    }
}
