//! Mutation records produced by tree edits.

use crate::node::NodeId;

/// One observed change, shaped like a `MutationRecord`.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationRecord {
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    Attribute {
        target: NodeId,
        name: String,
    },
    Text {
        target: NodeId,
    },
}

impl MutationRecord {
    pub fn target(&self) -> NodeId {
        match self {
            Self::ChildList { target, .. } | Self::Attribute { target, .. } | Self::Text { target } => {
                *target
            }
        }
    }

    pub fn added_nodes(&self) -> &[NodeId] {
        match self {
            Self::ChildList { added, .. } => added,
            _ => &[],
        }
    }

    pub fn removed_nodes(&self) -> &[NodeId] {
        match self {
            Self::ChildList { removed, .. } => removed,
            _ => &[],
        }
    }

    pub fn is_child_list(&self) -> bool {
        matches!(self, Self::ChildList { .. })
    }
}
