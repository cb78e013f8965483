//! Configuration validation.
//!
//! Every key is optional; these checks only reject values that are present
//! but unusable, before any data is loaded.

use crate::domain::error::MandiError;
use crate::domain::forecast::MAX_HORIZON_MONTHS;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Upper bound on a single model fit, in seconds.
pub const MAX_FIT_TIMEOUT_SECS: f64 = 3600.0;

pub fn validate_dashboard_config(config: &dyn ConfigPort) -> Result<(), MandiError> {
    validate_data_path(config)?;
    validate_filter_dates(config)?;
    validate_forecast_config(config)?;
    Ok(())
}

pub fn validate_forecast_config(config: &dyn ConfigPort) -> Result<(), MandiError> {
    validate_min_observations(config)?;
    validate_horizon(config)?;
    validate_timeout(config)?;
    for key in ["alpha", "beta", "gamma"] {
        validate_smoothing(config, key)?;
    }
    Ok(())
}

fn validate_data_path(config: &dyn ConfigPort) -> Result<(), MandiError> {
    match config.get_string("data", "path") {
        Some(s) if s.trim().is_empty() => Err(MandiError::ConfigInvalid {
            section: "data".to_string(),
            key: "path".to_string(),
            reason: "path must not be empty".to_string(),
        }),
        _ => Ok(()),
    }
}

fn validate_filter_dates(config: &dyn ConfigPort) -> Result<(), MandiError> {
    let from = parse_optional_date(config, "filter", "from")?;
    let to = parse_optional_date(config, "filter", "to")?;

    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(MandiError::ConfigInvalid {
                section: "filter".to_string(),
                key: "from".to_string(),
                reason: "from must not be after to".to_string(),
            });
        }
    }
    Ok(())
}

/// Parse `[section] key` as a `YYYY-MM-DD` date if it is set.
pub fn parse_optional_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, MandiError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map(Some)
            .map_err(|_| MandiError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", key),
            }),
    }
}

fn validate_min_observations(config: &dyn ConfigPort) -> Result<(), MandiError> {
    let value = config.get_int("forecast", "min_observations", 1);
    if value < 1 {
        return Err(MandiError::ConfigInvalid {
            section: "forecast".to_string(),
            key: "min_observations".to_string(),
            reason: "min_observations must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_horizon(config: &dyn ConfigPort) -> Result<(), MandiError> {
    let value = config.get_int("forecast", "horizon_months", 1);
    if value < 1 || value > MAX_HORIZON_MONTHS as i64 {
        return Err(MandiError::ConfigInvalid {
            section: "forecast".to_string(),
            key: "horizon_months".to_string(),
            reason: format!("horizon_months must be between 1 and {}", MAX_HORIZON_MONTHS),
        });
    }
    Ok(())
}

fn validate_timeout(config: &dyn ConfigPort) -> Result<(), MandiError> {
    let value = config.get_double("forecast", "fit_timeout_secs", 1.0);
    if !(value > 0.0 && value <= MAX_FIT_TIMEOUT_SECS) {
        return Err(MandiError::ConfigInvalid {
            section: "forecast".to_string(),
            key: "fit_timeout_secs".to_string(),
            reason: format!(
                "fit_timeout_secs must be positive and at most {}",
                MAX_FIT_TIMEOUT_SECS
            ),
        });
    }
    Ok(())
}

fn validate_smoothing(config: &dyn ConfigPort, key: &str) -> Result<(), MandiError> {
    let value = config.get_double("forecast", key, 0.5);
    if !(0.0 < value && value < 1.0) {
        return Err(MandiError::ConfigInvalid {
            section: "forecast".to_string(),
            key: key.to_string(),
            reason: format!("{} must be between 0 and 1 (exclusive)", key),
        });
    }
    Ok(())
}
