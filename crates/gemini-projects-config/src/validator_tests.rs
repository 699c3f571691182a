    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
    }

    #[test]
    fn test_validate_empty_origin() {
        let mut config = Config::default();
        config.host.origin = String::new();

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.path == "host.origin"));
    }

    #[test]
    fn test_validate_non_http_origin() {
        let mut config = Config::default();
        config.host.origin = "gemini.google.com".to_string();

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!result.is_valid());
    }

    #[test]
    fn test_validate_empty_id_params() {
        let mut config = Config::default();
        config.host.id_query_params.clear();

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.errors.iter().any(|e| e.path == "host.id_query_params"));
    }

    #[test]
    fn test_validate_zero_poll_frames() {
        let mut config = Config::default();
        config.injection.poll_max_frames = 0;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.path == "injection.poll_max_frames"));
    }

    #[test]
    fn test_validate_high_poll_frames_warning() {
        let mut config = Config::default();
        config.injection.poll_max_frames = 1000;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.path == "injection.poll_max_frames"));
    }

    #[test]
    fn test_validate_high_retries_warning() {
        let mut config = Config::default();
        config.injection.reinject_limit = 50;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.path == "injection.reinject_limit"));
    }

    #[test]
    fn test_validate_overlap_ratio_bounds() {
        for bad in [0.0, -0.5, 1.5] {
            let mut config = Config::default();
            config.injection.min_overlap_ratio = bad;
            let result = ConfigValidator::validate(&config).unwrap();
            assert!(!result.is_valid(), "ratio {} should be rejected", bad);
        }

        let mut config = Config::default();
        config.injection.min_overlap_ratio = 1.0;
        assert!(ConfigValidator::validate(&config).unwrap().is_valid());
    }

    #[test]
    fn test_validate_viewport_fraction_bounds() {
        let mut config = Config::default();
        config.visibility.max_viewport_fraction = 1.2;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.errors.iter().any(|e| e.path == "visibility.max_viewport_fraction"));
    }

    #[test]
    fn test_validate_unknown_locale_warning() {
        let mut config = Config::default();
        config.locale.force = Some("fr-FR".to_string());

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.message.contains("fr-FR")));
    }

    #[test]
    fn test_validate_regional_locale_accepted() {
        let mut config = Config::default();
        config.locale.default = "zh-CN".to_string();

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.warnings.iter().all(|w| w.path != "locale"));
    }

    #[test]
    fn test_validate_relative_storage_dir_warning() {
        let mut config = Config::default();
        config.storage.dir = "relative/dir".into();

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.warnings.iter().any(|w| w.path == "storage.dir"));
    }

    #[test]
    fn test_validate_prompts_file_shares_state_file() {
        let mut config = Config::default();
        config.storage.prompts_file = config.storage.state_file.clone();

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.path == "storage.prompts_file"));
    }

    #[test]
    fn test_validation_result_default() {
        let result = ValidationResult::default();
        assert!(result.is_valid());
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validation_error_new() {
        let err = ValidationError::new("injection.watch_window_ms", "must be positive");
        assert_eq!(err.path, "injection.watch_window_ms");
        assert_eq!(err.message, "must be positive");
    }
