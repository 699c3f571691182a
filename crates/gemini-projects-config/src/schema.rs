//! Configuration schema definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub host: HostConfig,

    #[serde(default)]
    pub locale: LocaleConfig,

    #[serde(default)]
    pub injection: InjectionConfig,

    #[serde(default)]
    pub visibility: VisibilityConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Shape of the host application's URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path segment that precedes a conversation id (`/app/<id>`).
    #[serde(default = "default_app_segment")]
    pub app_segment: String,

    /// Query parameters that may carry a conversation id, in priority order.
    #[serde(default = "default_id_query_params")]
    pub id_query_params: Vec<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            app_segment: default_app_segment(),
            id_query_params: default_id_query_params(),
        }
    }
}

fn default_origin() -> String {
    "https://gemini.google.com".to_string()
}

fn default_app_segment() -> String {
    "app".to_string()
}

fn default_id_query_params() -> Vec<String> {
    ["conversationId", "conversation_id", "id", "cid"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Label language selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocaleConfig {
    /// Used when the page gives no language signal.
    #[serde(default = "default_locale")]
    pub default: String,

    /// Skip detection entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force: Option<String>,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            default: default_locale(),
            force: None,
        }
    }
}

fn default_locale() -> String {
    "en".to_string()
}

/// Timing and retry bounds for menu detection and injection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjectionConfig {
    /// Animation-frame ticks to poll for a menu root before giving up.
    #[serde(default = "default_poll_max_frames")]
    pub poll_max_frames: u32,

    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Extra injection attempts after a failed geometric validation.
    #[serde(default = "default_inject_retries")]
    pub inject_retries: u32,

    /// Reinjections allowed while watching an open menu.
    #[serde(default = "default_reinject_limit")]
    pub reinject_limit: u32,

    #[serde(default = "default_watch_window_ms")]
    pub watch_window_ms: u64,

    /// Fraction of the injected item that must lie inside the menu root.
    #[serde(default = "default_min_overlap_ratio")]
    pub min_overlap_ratio: f64,

    #[serde(default = "default_min_menu_token_hits")]
    pub min_menu_token_hits: usize,

    /// How long a kebab press keeps its chat row as the menu's subject.
    #[serde(default = "default_active_row_ttl_ms")]
    pub active_row_ttl_ms: u64,

    #[serde(default = "default_submenu_close_grace_ms")]
    pub submenu_close_grace_ms: u64,

    #[serde(default = "default_submenu_width")]
    pub submenu_width: f64,
}

impl Default for InjectionConfig {
    fn default() -> Self {
        Self {
            poll_max_frames: default_poll_max_frames(),
            frame_interval_ms: default_frame_interval_ms(),
            inject_retries: default_inject_retries(),
            reinject_limit: default_reinject_limit(),
            watch_window_ms: default_watch_window_ms(),
            min_overlap_ratio: default_min_overlap_ratio(),
            min_menu_token_hits: default_min_menu_token_hits(),
            active_row_ttl_ms: default_active_row_ttl_ms(),
            submenu_close_grace_ms: default_submenu_close_grace_ms(),
            submenu_width: default_submenu_width(),
        }
    }
}

fn default_poll_max_frames() -> u32 {
    30
}

fn default_frame_interval_ms() -> u64 {
    16
}

fn default_inject_retries() -> u32 {
    2
}

fn default_reinject_limit() -> u32 {
    3
}

fn default_watch_window_ms() -> u64 {
    800
}

fn default_min_overlap_ratio() -> f64 {
    0.95
}

fn default_min_menu_token_hits() -> usize {
    2
}

fn default_active_row_ttl_ms() -> u64 {
    2000
}

fn default_submenu_close_grace_ms() -> u64 {
    200
}

fn default_submenu_width() -> f64 {
    240.0
}

/// Thresholds used by the visibility checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityConfig {
    /// Candidates wider or taller than this share of the viewport are
    /// treated as page overlays, not menus.
    #[serde(default = "default_max_viewport_fraction")]
    pub max_viewport_fraction: f64,

    #[serde(default = "default_min_menu_area")]
    pub min_menu_area: f64,

    #[serde(default = "default_composer_min_width")]
    pub composer_min_width: f64,

    #[serde(default = "default_composer_min_height")]
    pub composer_min_height: f64,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            max_viewport_fraction: default_max_viewport_fraction(),
            min_menu_area: default_min_menu_area(),
            composer_min_width: default_composer_min_width(),
            composer_min_height: default_composer_min_height(),
        }
    }
}

fn default_max_viewport_fraction() -> f64 {
    0.9
}

fn default_min_menu_area() -> f64 {
    2000.0
}

fn default_composer_min_width() -> f64 {
    120.0
}

fn default_composer_min_height() -> f64 {
    20.0
}

/// Where the persisted state document and the prompt library live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_state_file")]
    pub state_file: String,

    #[serde(default = "default_prompts_file")]
    pub prompts_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            state_file: default_state_file(),
            prompts_file: default_prompts_file(),
        }
    }
}

impl StorageConfig {
    /// Full path of the state file.
    pub fn state_path(&self) -> PathBuf {
        self.dir.join(&self.state_file)
    }

    /// Full path of the prompt library file.
    pub fn prompts_path(&self) -> PathBuf {
        self.dir.join(&self.prompts_file)
    }
}

fn default_storage_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".gemini-projects"))
        .unwrap_or_else(|| PathBuf::from(".gemini-projects"))
}

fn default_state_file() -> String {
    "gemini_projects_v1.json".to_string()
}

fn default_prompts_file() -> String {
    "gp_prompts_store.json".to_string()
}

/// Logging output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Enables the rolling file layer when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    #[serde(default = "default_max_files")]
    pub max_files: usize,

    #[serde(default = "default_ansi")]
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
            file_prefix: default_file_prefix(),
            max_files: default_max_files(),
            ansi: default_ansi(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_file_prefix() -> String {
    "gemini-projects".to_string()
}

fn default_max_files() -> usize {
    14
}

fn default_ansi() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_injection_defaults() {
        let cfg = InjectionConfig::default();
        assert_eq!(cfg.poll_max_frames, 30);
        assert_eq!(cfg.inject_retries, 2);
        assert_eq!(cfg.reinject_limit, 3);
        assert_eq!(cfg.watch_window_ms, 800);
        assert!((cfg.min_overlap_ratio - 0.95).abs() < f64::EPSILON);
        assert_eq!(cfg.min_menu_token_hits, 2);
    }

    #[test]
    fn test_host_defaults() {
        let cfg = HostConfig::default();
        assert_eq!(cfg.app_segment, "app");
        assert_eq!(
            cfg.id_query_params,
            vec!["conversationId", "conversation_id", "id", "cid"]
        );
    }

    #[test]
    fn test_state_path() {
        let cfg = StorageConfig {
            dir: PathBuf::from("/tmp/gp"),
            state_file: "state.json".to_string(),
            prompts_file: "prompts.json".to_string(),
        };
        assert_eq!(cfg.state_path(), PathBuf::from("/tmp/gp/state.json"));
        assert_eq!(cfg.prompts_path(), PathBuf::from("/tmp/gp/prompts.json"));
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let cfg: InjectionConfig = toml::from_str("poll_max_frames = 10").unwrap();
        assert_eq!(cfg.poll_max_frames, 10);
        assert_eq!(cfg.reinject_limit, 3);
    }

    #[test]
    fn test_logging_defaults() {
        let cfg = LoggingConfig::default();
        assert_eq!(cfg.level, "info");
        assert!(cfg.dir.is_none());
        assert_eq!(cfg.max_files, 14);
    }
}
