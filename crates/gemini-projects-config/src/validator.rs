//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

const MAX_REASONABLE_POLL_FRAMES: u32 = 240;
const MAX_REASONABLE_RETRIES: u32 = 10;
const KNOWN_LOCALES: [&str; 2] = ["en", "zh"];

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_host(config, &mut result);
        Self::validate_locale(config, &mut result);
        Self::validate_injection(config, &mut result);
        Self::validate_visibility(config, &mut result);
        Self::validate_storage(config, &mut result);

        Ok(result)
    }

    fn validate_host(config: &Config, result: &mut ValidationResult) {
        let origin = &config.host.origin;
        if origin.is_empty() {
            result.add_error(ValidationError::new("host.origin", "Origin cannot be empty"));
        } else if !origin.starts_with("http://") && !origin.starts_with("https://") {
            result.add_error(ValidationError::new(
                "host.origin",
                "origin must start with http:// or https://",
            ));
        }

        if config.host.id_query_params.is_empty() {
            result.add_error(ValidationError::new(
                "host.id_query_params",
                "At least one conversation id query parameter is required",
            ));
        }

        if config.host.app_segment.contains('/') {
            result.add_error(ValidationError::new(
                "host.app_segment",
                "app_segment must be a single path segment",
            ));
        }
    }

    fn validate_locale(config: &Config, result: &mut ValidationResult) {
        let requested = std::iter::once(&config.locale.default).chain(config.locale.force.iter());
        for tag in requested {
            let primary = tag.split(['-', '_']).next().unwrap_or_default().to_lowercase();
            if !KNOWN_LOCALES.contains(&primary.as_str()) {
                result.add_warning(ValidationWarning::new(
                    "locale",
                    format!("No label set for locale '{}', English labels will be used", tag),
                ));
            }
        }
    }

    fn validate_injection(config: &Config, result: &mut ValidationResult) {
        let inj = &config.injection;

        if inj.poll_max_frames == 0 {
            result.add_error(ValidationError::new(
                "injection.poll_max_frames",
                "poll_max_frames must be greater than 0",
            ));
        } else if inj.poll_max_frames > MAX_REASONABLE_POLL_FRAMES {
            result.add_warning(ValidationWarning::new(
                "injection.poll_max_frames",
                format!(
                    "poll_max_frames is very high (>{}), menu detection may linger after the menu closes",
                    MAX_REASONABLE_POLL_FRAMES
                ),
            ));
        }

        if inj.frame_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "injection.frame_interval_ms",
                "frame_interval_ms must be greater than 0",
            ));
        }

        if inj.watch_window_ms == 0 {
            result.add_error(ValidationError::new(
                "injection.watch_window_ms",
                "watch_window_ms must be greater than 0",
            ));
        }

        for (path, value) in [
            ("injection.inject_retries", inj.inject_retries),
            ("injection.reinject_limit", inj.reinject_limit),
        ] {
            if value > MAX_REASONABLE_RETRIES {
                result.add_warning(ValidationWarning::new(
                    path,
                    format!("retry bound is very high (>{})", MAX_REASONABLE_RETRIES),
                ));
            }
        }

        if !(inj.min_overlap_ratio > 0.0 && inj.min_overlap_ratio <= 1.0) {
            result.add_error(ValidationError::new(
                "injection.min_overlap_ratio",
                "min_overlap_ratio must be in (0, 1]",
            ));
        }

        if inj.min_menu_token_hits == 0 {
            result.add_warning(ValidationWarning::new(
                "injection.min_menu_token_hits",
                "min_menu_token_hits of 0 accepts any visible menu",
            ));
        }

        if inj.submenu_width <= 0.0 {
            result.add_error(ValidationError::new(
                "injection.submenu_width",
                "submenu_width must be positive",
            ));
        }
    }

    fn validate_visibility(config: &Config, result: &mut ValidationResult) {
        let vis = &config.visibility;

        if !(vis.max_viewport_fraction > 0.0 && vis.max_viewport_fraction <= 1.0) {
            result.add_error(ValidationError::new(
                "visibility.max_viewport_fraction",
                "max_viewport_fraction must be in (0, 1]",
            ));
        }

        if vis.min_menu_area < 0.0 {
            result.add_error(ValidationError::new(
                "visibility.min_menu_area",
                "min_menu_area cannot be negative",
            ));
        }

        if vis.composer_min_width < 0.0 || vis.composer_min_height < 0.0 {
            result.add_error(ValidationError::new(
                "visibility.composer_min_size",
                "Composer size thresholds cannot be negative",
            ));
        }
    }

    fn validate_storage(config: &Config, result: &mut ValidationResult) {
        if config.storage.state_file.is_empty() {
            result.add_error(ValidationError::new(
                "storage.state_file",
                "state_file cannot be empty",
            ));
        }

        if config.storage.prompts_file.is_empty() {
            result.add_error(ValidationError::new(
                "storage.prompts_file",
                "prompts_file cannot be empty",
            ));
        } else if config.storage.prompts_file == config.storage.state_file {
            result.add_error(ValidationError::new(
                "storage.prompts_file",
                "prompts_file must differ from state_file",
            ));
        }

        if config.storage.dir.is_relative() {
            result.add_warning(ValidationWarning::new(
                "storage.dir",
                format!(
                    "Storage dir {:?} is relative and depends on the working directory",
                    config.storage.dir
                ),
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
