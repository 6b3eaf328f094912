//! Tests for configuration constants, JSON loading and validation

#[cfg(test)]
mod tests {
    use partcurate::io::configuration::{
        ARRAY_FIELD_PRIORITY_STRIDE, CurationConfig, DEFAULT_MAX_CANDIDATES,
        DEFAULT_MAX_CONSECUTIVE, DEFAULT_MIN_DIMENSION, DEFAULT_PROBE_TIMEOUT_MS,
        DEFAULT_SWITCH_PROBABILITY, MIN_REFERENCE_LENGTH, OTHER_CATEGORY,
    };
    use partcurate::io::error::CurationError;

    // Tests documented defaults
    // Verified by changing constant values
    #[test]
    fn test_default_constants() {
        assert_eq!(DEFAULT_MAX_CONSECUTIVE, 2);
        assert!((DEFAULT_SWITCH_PROBABILITY - 0.7).abs() < f64::EPSILON);
        assert_eq!(DEFAULT_PROBE_TIMEOUT_MS, 10_000);
        assert_eq!(DEFAULT_MIN_DIMENSION, 50);
        assert_eq!(DEFAULT_MAX_CANDIDATES, 5);
        assert_eq!(MIN_REFERENCE_LENGTH, 10);
        assert_eq!(ARRAY_FIELD_PRIORITY_STRIDE, 100);
        assert_eq!(OTHER_CATEGORY, "Other");
    }

    // Tests the default configuration validates
    // Verified by defaulting max_consecutive to zero
    #[test]
    fn test_default_config_is_valid() {
        let config = CurationConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.distribution.max_consecutive, DEFAULT_MAX_CONSECUTIVE);
        assert_eq!(config.probe.timeout_ms, DEFAULT_PROBE_TIMEOUT_MS);
    }

    // Tests partial files keep defaults for omitted sections
    // Verified by removing serde default on the sections
    #[test]
    fn test_load_partial_file() {
        let Ok(dir) = tempfile::tempdir() else {
            return;
        };
        let path = dir.path().join("curation.json");
        let written = std::fs::write(
            &path,
            r#"{"distribution": {"max_consecutive": 3}, "fields": {"single_fields": ["hero"]}}"#,
        );
        assert!(written.is_ok());

        let config = CurationConfig::load(&path);
        assert!(config.is_ok());
        if let Ok(config) = config {
            assert_eq!(config.distribution.max_consecutive, 3);
            assert!((config.distribution.switch_probability - 0.7).abs() < f64::EPSILON);
            assert_eq!(config.fields.single_fields, vec!["hero".to_owned()]);
            assert_eq!(config.fields.array_fields.len(), 3);
            assert_eq!(config.probe.min_dimension, DEFAULT_MIN_DIMENSION);
        }
    }

    // Tests out-of-range values are rejected with the parameter name
    // Verified by skipping the probability range check
    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = CurationConfig::default();
        config.distribution.switch_probability = 1.5;
        assert!(matches!(
            config.validate(),
            Err(CurationError::InvalidParameter {
                parameter: "distribution.switch_probability",
                ..
            })
        ));

        let mut config = CurationConfig::default();
        config.probe.timeout_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(CurationError::InvalidParameter {
                parameter: "probe.timeout_ms",
                ..
            })
        ));

        let mut config = CurationConfig::default();
        config.filter.deny_patterns.push("[".to_owned());
        assert!(matches!(
            config.validate(),
            Err(CurationError::InvalidPattern { .. })
        ));
    }

    // Tests unreadable and malformed files report configuration errors
    // Verified by reporting them as catalog errors
    #[test]
    fn test_load_errors_are_configuration_errors() {
        let missing = CurationConfig::load(std::path::Path::new("/nonexistent/curation.json"));
        assert!(matches!(missing, Err(CurationError::ConfigLoad { .. })));

        let Ok(dir) = tempfile::tempdir() else {
            return;
        };
        let path = dir.path().join("curation.json");
        assert!(std::fs::write(&path, "{\"probe\": ").is_ok());

        let malformed = CurationConfig::load(&path);
        assert!(matches!(malformed, Err(CurationError::ConfigParse { .. })));
    }
}
