//! # Gemini Projects Store
//!
//! The persistence collaborator: where the state document lives, how older
//! documents are migrated, and the request handler the content side talks to.
//!
//! ## Components
//!
//! - [`StateStore`] - storage seam, with [`FileStateStore`] and
//!   [`MemoryStateStore`]
//! - [`migrate_state`] - schema migration of raw stored JSON
//! - [`reducers`] - pure state transitions
//! - [`StateService`] - cache-then-reconcile request handler
//! - [`PromptService`] - the saved prompt library over a [`PromptStore`],
//!   with its transitions in [`library`]

pub mod error;
pub mod library;
pub mod migrate;
pub mod prompt_service;
pub mod reducers;
pub mod service;
pub mod store;

pub use error::StoreError;
pub use migrate::{migrate_state, normalize_stored_title};
pub use prompt_service::PromptService;
pub use reducers::sanitize_filename;
pub use service::StateService;
pub use store::{
    FilePromptStore, FileStateStore, MemoryPromptStore, MemoryStateStore, PromptStore, StateStore,
};
