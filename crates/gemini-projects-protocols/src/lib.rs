//! # Gemini Projects Protocols
//!
//! Shared data model and the request/response protocol spoken between the
//! content side and the persistence collaborator. Contains no I/O.
//!
//! ## Contents
//!
//! - [`Project`], [`ChatRef`], [`UiPrefs`], [`StoredState`] - persisted records
//! - [`ChatRefPatch`] - DOM-sourced chat observation (never carries assignment)
//! - [`PromptLibrary`], [`Prompt`], [`TagMeta`] - the saved prompt library
//! - [`BackgroundRequest`] / [`BackgroundResponse`] - message protocol
//! - [`ProtocolError`] - errors surfaced when reading a response

pub mod error;
pub mod message;
pub mod model;
pub mod prompt;

pub use error::ProtocolError;
pub use message::{BackgroundRequest, BackgroundResponse, ProjectExport};
pub use model::{
    now_millis, ChatRef, ChatRefPatch, Project, ProjectIcon, StoredState, UiPrefs, UiPrefsPatch,
    CURRENT_SCHEMA_VERSION,
};
pub use prompt::{
    Prompt, PromptDraft, PromptLibrary, TagColor, TagMeta, TagSummary, PROMPT_LIBRARY_VERSION,
};
