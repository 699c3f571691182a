//! Host events delivered to the content script.

use gemini_projects_dom::NodeId;

/// A user or page event the content script reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Captured before the host's own click handlers run.
    PointerDown { target: NodeId },
    PointerEnter { target: NodeId },
    PointerLeave { target: NodeId },
    Click { target: NodeId },
    Scroll,
    KeyDown { key: String },
    /// The host's router moved to another URL.
    Navigate { url: String },
    /// The page is going away.
    Unload,
}

impl HostEvent {
    pub fn key(key: impl Into<String>) -> Self {
        Self::KeyDown { key: key.into() }
    }

    pub fn is_escape(&self) -> bool {
        matches!(self, Self::KeyDown { key } if key == "Escape")
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PointerDown { .. } => "pointerdown",
            Self::PointerEnter { .. } => "pointerenter",
            Self::PointerLeave { .. } => "pointerleave",
            Self::Click { .. } => "click",
            Self::Scroll => "scroll",
            Self::KeyDown { .. } => "keydown",
            Self::Navigate { .. } => "navigate",
            Self::Unload => "unload",
        }
    }
}
