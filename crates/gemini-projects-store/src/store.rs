//! Storage backends for the persisted state document and the prompt library.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use gemini_projects_config::StorageConfig;
use gemini_projects_protocols::{PromptLibrary, StoredState};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::StoreError;

/// Key-value storage holding the single state document.
///
/// Loading returns the raw JSON so migration can inspect documents written
/// by older schema versions.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Raw stored document, `None` when nothing was saved yet.
    async fn load_raw(&self) -> Result<Option<Value>, StoreError>;

    /// Replace the stored document.
    async fn save(&self, state: &StoredState) -> Result<(), StoreError>;
}

/// Key-value storage holding the prompt library document.
#[async_trait]
pub trait PromptStore: Send + Sync {
    /// Raw stored library, `None` when nothing was saved yet.
    async fn load_raw(&self) -> Result<Option<Value>, StoreError>;

    /// Replace the stored library.
    async fn save(&self, library: &PromptLibrary) -> Result<(), StoreError>;
}

async fn create_parent(path: &Path) -> Result<(), StoreError> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    Ok(())
}

async fn read_json(path: &Path) -> Result<Option<Value>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let json = tokio::fs::read_to_string(path).await?;
    Ok(Some(serde_json::from_str(&json)?))
}

async fn write_json<T: Serialize + Sync>(path: &Path, document: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(document)?;
    // Write-then-rename so a crash never leaves half a document.
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Open a store at `path`, creating the parent directory.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        create_parent(&path).await?;
        Ok(Self { path })
    }

    pub async fn from_config(config: &StorageConfig) -> Result<Self, StoreError> {
        Self::open(config.state_path()).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load_raw(&self) -> Result<Option<Value>, StoreError> {
        read_json(&self.path).await
    }

    async fn save(&self, state: &StoredState) -> Result<(), StoreError> {
        write_json(&self.path, state).await?;
        debug!(path = ?self.path, "saved state");
        Ok(())
    }
}

/// Prompt library as a JSON file on disk.
#[derive(Debug, Clone)]
pub struct FilePromptStore {
    path: PathBuf,
}

impl FilePromptStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        create_parent(&path).await?;
        Ok(Self { path })
    }

    pub async fn from_config(config: &StorageConfig) -> Result<Self, StoreError> {
        Self::open(config.prompts_path()).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PromptStore for FilePromptStore {
    async fn load_raw(&self) -> Result<Option<Value>, StoreError> {
        read_json(&self.path).await
    }

    async fn save(&self, library: &PromptLibrary) -> Result<(), StoreError> {
        write_json(&self.path, library).await?;
        debug!(path = ?self.path, prompts = library.prompts.len(), "saved prompt library");
        Ok(())
    }
}

/// In-memory store with failure injection.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    raw: Mutex<Option<Value>>,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    loads: AtomicUsize,
    saves: AtomicUsize,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with a raw document, e.g. one written by an older version.
    pub fn with_raw(raw: Value) -> Self {
        Self {
            raw: Mutex::new(Some(raw)),
            ..Self::default()
        }
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Currently stored document.
    pub fn raw(&self) -> Option<Value> {
        self.raw.lock().clone()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load_raw(&self) -> Result<Option<Value>, StoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("injected load failure")));
        }
        Ok(self.raw.lock().clone())
    }

    async fn save(&self, state: &StoredState) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("injected save failure")));
        }
        let value = serde_json::to_value(state)?;
        *self.raw.lock() = Some(value);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory prompt library store.
#[derive(Debug, Default)]
pub struct MemoryPromptStore {
    raw: Mutex<Option<Value>>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryPromptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw(raw: Value) -> Self {
        Self {
            raw: Mutex::new(Some(raw)),
            ..Self::default()
        }
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn raw(&self) -> Option<Value> {
        self.raw.lock().clone()
    }
}

#[async_trait]
impl PromptStore for MemoryPromptStore {
    async fn load_raw(&self) -> Result<Option<Value>, StoreError> {
        Ok(self.raw.lock().clone())
    }

    async fn save(&self, library: &PromptLibrary) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("injected save failure")));
        }
        *self.raw.lock() = Some(serde_json::to_value(library)?);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
