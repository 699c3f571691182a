//! # Gemini Projects DOM
//!
//! The host page as seen by the core, and everything that reads it.
//!
//! ## Components
//!
//! - [`Document`] - node arena with shadow roots, boxes and computed style
//! - [`Page`] - shared handle that broadcasts [`MutationBatch`]es to
//!   [`MutationObserver`]s
//! - [`Matcher`] - locale-aware label matching
//! - [`VisibilityRules`] and the [`scorer`] functions - visibility and menu
//!   candidate ranking
//! - [`AnchorResolver`] - one `resolve(kind, ctx)` entry point over every
//!   anchor strategy
//! - [`ConversationIds`] - conversation id extraction
//! - [`inject_projects_section`] - the isolated render boundaries
//!
//! Resolution misses are `None`, never errors.

pub mod conversation;
pub mod document;
mod document_layout;
mod document_style;
pub mod error;
pub mod geometry;
pub mod isolation;
pub mod markers;
pub mod matcher;
pub mod mutation;
pub mod node;
pub mod page;
pub mod resolver;
pub mod scorer;
pub mod selector;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use conversation::{looks_like_id, ConversationIds, ConversationSource};
pub use document::{Document, TextSelection};
pub use error::DomError;
pub use geometry::{BoundingBox, ViewportInfo};
pub use isolation::{
    ensure_overlay_host, inject_projects_section, is_dark_theme, sync_theme, IsolatedHosts,
};
pub use matcher::{LabelGroup, Locale, Matcher};
pub use mutation::MutationRecord;
pub use node::{parse_px, Node, NodeId, NodeKind};
pub use page::{MutationBatch, MutationObserver, MutationOrigin, Page};
pub use resolver::{
    find_chat_row_from_target, find_chats_list_container, Anchor, AnchorKind, AnchorResolver,
    MenuList, ResolveContext,
};
pub use scorer::VisibilityRules;
pub use selector::Selector;
