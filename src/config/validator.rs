use crate::config::{Config, SCHEMA_VERSION};
use crate::error::{PulseError, Result, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, reporting every failure at once
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_limits(config, &mut errors);
        Self::validate_sampling(config, &mut errors);
        Self::validate_taxonomy(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PulseError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != SCHEMA_VERSION {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_limits(config: &Config, errors: &mut Vec<ValidationError>) {
        let limits = &config.limits;
        let checks = [
            ("limits.top_contributors", limits.top_contributors),
            ("limits.top_words", limits.top_words),
            ("limits.example_chars", limits.example_chars),
            ("limits.question_chars", limits.question_chars),
            ("limits.staff_chars", limits.staff_chars),
        ];

        for (path, value) in checks {
            if value == 0 {
                errors.push(ValidationError::new(path, "Must be greater than 0"));
            }
        }
    }

    fn validate_sampling(config: &Config, errors: &mut Vec<ValidationError>) {
        let sampling = &config.sampling;

        if sampling.dashboard_max == 0 {
            errors.push(ValidationError::new(
                "sampling.dashboard_max",
                "Dashboard sample size must be greater than 0",
            ));
        }

        if sampling.summary_max == 0 {
            errors.push(ValidationError::new(
                "sampling.summary_max",
                "Summary sample size must be greater than 0",
            ));
        }

        if sampling.line_chars > sampling.block_chars {
            errors.push(ValidationError::new(
                "sampling.line_chars",
                format!(
                    "Line length ({}) cannot exceed block length ({})",
                    sampling.line_chars, sampling.block_chars
                ),
            ));
        }
    }

    fn validate_taxonomy(config: &Config, errors: &mut Vec<ValidationError>) {
        // Existence is checked when the taxonomy is loaded
        if let Some(file) = &config.taxonomy.file {
            if file.as_os_str().is_empty() {
                errors.push(ValidationError::new(
                    "taxonomy.file",
                    "Taxonomy file path cannot be empty",
                ));
            }
        }
    }
}
