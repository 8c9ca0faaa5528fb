// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes: the default report time shape, the default timezone, and
//! timeout bounds. Per-chat schedule values are validated again at
//! registration time; this pass only guards the configured defaults.

use crate::diagnostic::ConfigError;
use crate::model::DigestifConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &DigestifConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate database_path is not empty
    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    // Validate the default report time is a well-formed 24h HH:MM
    if !is_valid_report_time(&config.digest.default_report_time) {
        errors.push(ConfigError::Validation {
            message: format!(
                "digest.default_report_time `{}` is not a valid 24-hour HH:MM",
                config.digest.default_report_time
            ),
        });
    }

    // Validate the default timezone resolves to an IANA zone
    if config
        .digest
        .default_timezone
        .parse::<chrono_tz::Tz>()
        .is_err()
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "digest.default_timezone `{}` is not a resolvable IANA timezone",
                config.digest.default_timezone
            ),
        });
    }

    // Validate timeouts are non-zero
    if config.digest.generation_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "digest.generation_timeout_secs must be greater than 0".to_string(),
        });
    }

    if config.digest.delivery_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "digest.delivery_timeout_secs must be greater than 0".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check that a report time is a well-formed `HH:MM` within 24-hour bounds.
pub fn is_valid_report_time(value: &str) -> bool {
    let Some((hh, mm)) = value.split_once(':') else {
        return false;
    };
    if hh.is_empty() || hh.len() > 2 || mm.len() != 2 {
        return false;
    }
    let (Ok(hour), Ok(minute)) = (hh.parse::<u32>(), mm.parse::<u32>()) else {
        return false;
    };
    hour <= 23 && minute <= 59
}
