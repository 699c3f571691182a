//! Cached access to the prompt library.

use std::sync::Arc;

use gemini_projects_protocols::{Prompt, PromptDraft, PromptLibrary, TagColor, TagSummary};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::library;
use crate::store::PromptStore;

/// Owns the prompt library document.
///
/// Loaded and migrated on first use, then cached. Every mutation runs on a
/// copy that replaces the cache only after the save succeeded; a mutation
/// that changes nothing is not saved.
pub struct PromptService {
    store: Arc<dyn PromptStore>,
    cache: Mutex<Option<PromptLibrary>>,
}

impl PromptService {
    pub fn new(store: Arc<dyn PromptStore>) -> Self {
        Self {
            store,
            cache: Mutex::new(None),
        }
    }

    /// Current library, loading it if needed.
    pub async fn library(&self) -> PromptLibrary {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(self.load().await);
        }
        cache.get_or_insert_with(PromptLibrary::default).clone()
    }

    /// Drop the cache and read the stored library again.
    pub async fn refresh(&self) -> PromptLibrary {
        let library = self.load().await;
        *self.cache.lock().await = Some(library.clone());
        library
    }

    /// Prompts in picker order.
    pub async fn prompts(&self) -> Vec<Prompt> {
        self.library().await.sorted().into_iter().cloned().collect()
    }

    pub async fn get(&self, prompt_id: &str) -> Option<Prompt> {
        self.library().await.get(prompt_id).cloned()
    }

    pub async fn tags(&self) -> Vec<TagSummary> {
        self.library().await.tag_summaries()
    }

    pub async fn tag_color(&self, name: &str) -> TagColor {
        self.library()
            .await
            .tag_color(&library::normalize_tag_name(name))
    }

    pub async fn save_prompt(&self, draft: PromptDraft) -> Result<Prompt, StoreError> {
        self.mutate("savePrompt", |lib| library::save_prompt(lib, draft))
            .await
    }

    pub async fn delete_prompt(&self, prompt_id: &str) -> Result<bool, StoreError> {
        self.mutate("deletePrompt", |lib| Ok(library::delete_prompt(lib, prompt_id)))
            .await
    }

    /// Count one use of a prompt.
    pub async fn touch(&self, prompt_id: &str) -> Result<Prompt, StoreError> {
        self.mutate("touchPrompt", |lib| library::touch_prompt(lib, prompt_id))
            .await
    }

    pub async fn toggle_favorite(&self, prompt_id: &str) -> Result<bool, StoreError> {
        self.mutate("toggleFavorite", |lib| library::toggle_favorite(lib, prompt_id))
            .await
    }

    pub async fn ensure_tag_color(&self, name: &str) -> Result<TagColor, StoreError> {
        self.mutate("ensureTagColor", |lib| Ok(library::ensure_tag_color(lib, name)))
            .await
    }

    pub async fn set_tag_color(&self, name: &str, color: TagColor) -> Result<bool, StoreError> {
        self.mutate("setTagColor", |lib| Ok(library::set_tag_color(lib, name, color)))
            .await
    }

    pub async fn rename_tag(&self, old_name: &str, new_name: &str) -> Result<bool, StoreError> {
        self.mutate("renameTag", |lib| Ok(library::rename_tag(lib, old_name, new_name)))
            .await
    }

    pub async fn delete_tag(&self, name: &str) -> Result<usize, StoreError> {
        self.mutate("deleteTag", |lib| Ok(library::delete_tag(lib, name)))
            .await
    }

    async fn mutate<T, F>(&self, kind: &'static str, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut PromptLibrary) -> Result<T, StoreError>,
    {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(self.load().await);
        }
        let current = cache.get_or_insert_with(PromptLibrary::default);

        let mut next = current.clone();
        let out = f(&mut next).inspect_err(|e| warn!(op = kind, error = %e, "prompt library update rejected"))?;
        if next == *current {
            return Ok(out);
        }
        self.store
            .save(&next)
            .await
            .inspect_err(|e| warn!(op = kind, error = %e, "prompt library save failed"))?;
        debug!(op = kind, "prompt library saved");
        *cache = Some(next);
        Ok(out)
    }

    /// Load and migrate. A library that needed cleaning is written back;
    /// an unreadable store starts from the seed prompts.
    async fn load(&self) -> PromptLibrary {
        let raw = match self.store.load_raw().await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "failed to load prompt library, starting from seeds");
                None
            }
        };
        let (library, dirty) = library::migrate_library(raw);
        if dirty {
            if let Err(e) = self.store.save(&library).await {
                warn!(error = %e, "failed to write back cleaned prompt library");
            }
        }
        info!(prompts = library.prompts.len(), tags = library.tag_meta.len(), "prompt library loaded");
        library
    }
}

impl std::fmt::Debug for PromptService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryPromptStore;
    use serde_json::json;

    fn service() -> (Arc<MemoryPromptStore>, PromptService) {
        let store = Arc::new(MemoryPromptStore::new());
        (store.clone(), PromptService::new(store))
    }

    #[tokio::test]
    async fn test_first_load_seeds_and_persists() {
        let (store, service) = service();
        let prompts = service.prompts().await;
        assert_eq!(prompts.len(), library::SEED_PROMPTS.len());
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.raw().unwrap()["version"], 1);

        service.prompts().await;
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_clean_library_is_not_rewritten() {
        let store = Arc::new(MemoryPromptStore::with_raw(json!({
            "prompts": {},
            "tagMeta": {},
            "version": 1
        })));
        let service = PromptService::new(store.clone());
        assert!(service.prompts().await.is_empty());
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_save_and_touch_persist() {
        let (store, service) = service();
        let prompt = service
            .save_prompt(PromptDraft::new("Translate", "Translate {{text}}").with_tags(["lang"]))
            .await
            .unwrap();

        let touched = service.touch(&prompt.id).await.unwrap();
        assert_eq!(touched.usage_count, 1);
        let raw = store.raw().unwrap();
        assert_eq!(raw["prompts"][&prompt.id]["usageCount"], 1);
        assert_eq!(raw["tagMeta"]["lang"]["color"], "gray");
        assert_eq!(service.prompts().await[0].id, prompt.id);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_cache() {
        let (store, service) = service();
        let id = service.prompts().await[0].id.clone();
        store.set_fail_saves(true);

        assert!(service.toggle_favorite(&id).await.is_err());
        assert!(!service.get(&id).await.unwrap().is_favorite);
    }

    #[tokio::test]
    async fn test_noop_mutation_skips_save() {
        let (store, service) = service();
        service.library().await;
        let saves = store.save_count();

        assert!(!service.delete_prompt("ghost").await.unwrap());
        assert_eq!(service.delete_tag("nothing").await.unwrap(), 0);
        assert_eq!(store.save_count(), saves);
    }

    #[tokio::test]
    async fn test_unknown_prompt_is_an_error() {
        let (_store, service) = service();
        assert!(matches!(
            service.touch("ghost").await,
            Err(StoreError::PromptNotFound(id)) if id == "ghost"
        ));
    }

    #[tokio::test]
    async fn test_tag_operations() {
        let (_store, service) = service();
        assert!(service.set_tag_color("coding", TagColor::Blue).await.unwrap());
        assert_eq!(service.tag_color(" coding ").await, TagColor::Blue);
        assert!(service.rename_tag("coding", "dev").await.unwrap());
        assert_eq!(service.tag_color("dev").await, TagColor::Blue);

        let tags = service.tags().await;
        assert_eq!(tags[0].count, 2);
        let color = service.ensure_tag_color("brand new").await.unwrap();
        assert_eq!(service.tag_color("brand new").await, color);
    }

    #[tokio::test]
    async fn test_refresh_reads_external_changes() {
        let (store, service) = service();
        service.library().await;
        let other = PromptService::new(store.clone());
        other.save_prompt(PromptDraft::new("Elsewhere", "x")).await.unwrap();

        assert_eq!(service.prompts().await.len(), library::SEED_PROMPTS.len());
        assert_eq!(service.refresh().await.prompts.len(), library::SEED_PROMPTS.len() + 1);
    }
}
