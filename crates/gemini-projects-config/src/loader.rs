//! Configuration loader.

use std::fs;
use std::path::Path;
use regex::Regex;

use crate::error::ConfigError;
use crate::schema::Config;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let mut config: Config = toml::from_str(&expanded)?;
        Self::expand_paths(&mut config);
        Ok(config)
    }

    /// Load from `path` when given, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Config::default()),
        }
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        let mut result = content.to_string();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    fn expand_paths(config: &mut Config) {
        let dir = config.storage.dir.to_string_lossy().to_string();
        config.storage.dir = Self::expand_path(&dir).into();
        if let Some(log_dir) = config.logging.dir.take() {
            config.logging.dir = Some(Self::expand_path(&log_dir.to_string_lossy()).into());
        }
    }

    /// Expand shell-style paths (e.g., `~/.gemini-projects`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.injection.poll_max_frames, 30);
        assert_eq!(config.host.origin, "https://gemini.google.com");
    }

    #[test]
    fn test_load_sections() {
        let content = r#"
            [host]
            origin = "https://example.test"

            [locale]
            force = "zh"

            [injection]
            reinject_limit = 5
            watch_window_ms = 1000

            [visibility]
            min_menu_area = 1500
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.host.origin, "https://example.test");
        assert_eq!(config.locale.force.as_deref(), Some("zh"));
        assert_eq!(config.injection.reinject_limit, 5);
        assert_eq!(config.injection.watch_window_ms, 1000);
        assert!((config.visibility.min_menu_area - 1500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[logging]").unwrap();
        writeln!(file, "level = \"debug\"").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/gemini-projects.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_or_default_none() {
        let config = ConfigLoader::load_or_default(None).unwrap();
        assert_eq!(config.injection.inject_retries, 2);
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: This test runs in isolation and sets a unique test-only env var
        unsafe {
            std::env::set_var("GP_TEST_STORAGE_DIR", "/tmp/gp-test");
        }
        let content = "[storage]\ndir = \"${GP_TEST_STORAGE_DIR}\"";
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.storage.dir.to_string_lossy(), "/tmp/gp-test");
        unsafe {
            std::env::remove_var("GP_TEST_STORAGE_DIR");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${GP_NONEXISTENT_TEST_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_tilde_paths_expanded() {
        let content = "[storage]\ndir = \"~/gp-data\"\n[logging]\ndir = \"~/gp-logs\"";
        let config = ConfigLoader::load_str(content).unwrap();
        assert!(!config.storage.dir.to_string_lossy().starts_with('~'));
        assert!(config.storage.dir.ends_with("gp-data"));
        let log_dir = config.logging.dir.unwrap();
        assert!(!log_dir.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_expand_path_no_tilde() {
        assert_eq!(ConfigLoader::expand_path("/usr/local"), "/usr/local");
    }
}
