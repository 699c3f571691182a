//! Using saved prompts from the library.

use gemini_projects_store::PromptService;
use tracing::{debug, warn};

use crate::context::ContentContext;
use crate::error::SyncError;
use crate::prompts::composer::insert_prompt;

/// Insert a saved prompt into the composer and count the use.
///
/// Returns false, without counting, when no composer is usable. An unknown
/// prompt is an error.
pub async fn insert_saved_prompt(
    ctx: &ContentContext,
    library: &PromptService,
    prompt_id: &str,
) -> Result<bool, SyncError> {
    let Some(prompt) = library.get(prompt_id).await else {
        warn!(prompt = %prompt_id, "unknown prompt");
        return Err(SyncError::PromptNotFound(prompt_id.to_string()));
    };
    let inserted = ctx
        .page()
        .extension(|doc| insert_prompt(doc, ctx.resolver(), &prompt.content));
    if !inserted {
        return Ok(false);
    }
    let used = library.touch(prompt_id).await?;
    debug!(prompt = %prompt_id, uses = used.usage_count, "saved prompt inserted");
    Ok(true)
}
