//! Prompt library hooks: the composer toolbar button, text insertion and
//! use of saved prompts. The picker itself is supplied by the embedder.

pub mod button;
pub mod composer;
pub mod library;

pub use button::{ensure_prompt_button, is_prompt_button, PromptPickerHandle};
pub use composer::insert_prompt;
pub use library::insert_saved_prompt;
