//! Per-region forecast orchestration.
//!
//! Each selected region gets its own daily mean-price series and its own
//! model. Regions are fitted in parallel, each fit on a worker thread bounded
//! by a timeout. A region with too little history, a failing fit, or a fit
//! that runs past the timeout is skipped with a warning; the rest of the
//! batch carries on. Output keeps the caller's selection order.

use crate::domain::dataset::PriceDataset;
use crate::domain::error::{ForecastError, MandiError};
use crate::domain::query::{aggregate_daily_mean, filter, DailyMean};
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub const MIN_FORECAST_OBSERVATIONS: usize = 20;
pub const DEFAULT_HORIZON_MONTHS: usize = 12;
pub const MAX_HORIZON_MONTHS: usize = 24;
pub const DEFAULT_FIT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl From<DailyMean> for SeriesPoint {
    fn from(d: DailyMean) -> Self {
        Self {
            date: d.date,
            value: d.mean_price,
        }
    }
}

/// A fitted model able to project a series forward.
pub trait ForecastModel: Send {
    /// Predicted points for the next `horizon` periods.
    fn predict(&self, horizon: usize) -> Result<Vec<SeriesPoint>, ForecastError>;
}

/// Fits a model to a dated history.
pub trait Forecaster: Send + Sync {
    fn fit(&self, history: &[SeriesPoint]) -> Result<Box<dyn ForecastModel>, ForecastError>;
}

#[derive(Debug, Clone)]
pub struct ForecastOptions {
    pub horizon_months: usize,
    pub min_observations: usize,
    pub fit_timeout: Duration,
}

impl Default for ForecastOptions {
    fn default() -> Self {
        Self {
            horizon_months: DEFAULT_HORIZON_MONTHS,
            min_observations: MIN_FORECAST_OBSERVATIONS,
            fit_timeout: DEFAULT_FIT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionForecast {
    pub region: String,
    pub points: Vec<SeriesPoint>,
}

impl RegionForecast {
    pub fn label(&self) -> String {
        format!("{} (Predicted)", self.region)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    InsufficientData { observations: usize, minimum: usize },
    FitFailed(ForecastError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastWarning {
    pub region: String,
    pub reason: SkipReason,
}

impl fmt::Display for ForecastWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            SkipReason::InsufficientData {
                observations,
                minimum,
            } => write!(
                f,
                "Not enough data for {} ({} observations, minimum {}). Skipping.",
                self.region, observations, minimum
            ),
            SkipReason::FitFailed(e) => {
                write!(f, "Forecast failed for {} ({}). Skipping.", self.region, e)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastBatch {
    pub commodity: String,
    pub horizon_months: usize,
    pub series: Vec<RegionForecast>,
    pub warnings: Vec<ForecastWarning>,
}

impl ForecastBatch {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Number of rows and the daily mean-price series for one region, over the
/// whole dataset.
pub fn region_history(
    dataset: &PriceDataset,
    commodity: &str,
    region: &str,
) -> (usize, Vec<SeriesPoint>) {
    let Some((from, to)) = dataset.date_range() else {
        return (0, Vec::new());
    };
    let subset = match filter(dataset, commodity, &[region], from, to) {
        Ok(s) => s,
        Err(_) => return (0, Vec::new()),
    };
    let series = aggregate_daily_mean(&subset)
        .into_iter()
        .map(SeriesPoint::from)
        .collect();
    (subset.len(), series)
}

pub fn validate_horizon(horizon_months: usize) -> Result<(), MandiError> {
    if horizon_months == 0 || horizon_months > MAX_HORIZON_MONTHS {
        return Err(MandiError::ConfigInvalid {
            section: "forecast".to_string(),
            key: "horizon_months".to_string(),
            reason: format!("horizon must be between 1 and {}", MAX_HORIZON_MONTHS),
        });
    }
    Ok(())
}

enum RegionOutcome {
    Fitted(RegionForecast),
    Skipped(ForecastWarning),
}

/// Fit one model per region and collect the predicted series.
///
/// Fails only on invalid requests (no regions, horizon out of range); every
/// per-region problem becomes a [`ForecastWarning`] in the returned batch.
pub fn forecast_regions<S: AsRef<str>>(
    dataset: &PriceDataset,
    commodity: &str,
    regions: &[S],
    forecaster: Arc<dyn Forecaster>,
    options: &ForecastOptions,
) -> Result<ForecastBatch, MandiError> {
    if regions.is_empty() {
        return Err(MandiError::NoForecastRegions);
    }
    validate_horizon(options.horizon_months)?;

    let mut seen = HashSet::new();
    let selected: Vec<&str> = regions
        .iter()
        .map(|r| r.as_ref())
        .filter(|r| seen.insert(*r))
        .collect();

    let outcomes: Vec<RegionOutcome> = selected
        .par_iter()
        .map(|region| forecast_one(dataset, commodity, region, Arc::clone(&forecaster), options))
        .collect();

    let mut series = Vec::new();
    let mut warnings = Vec::new();
    for outcome in outcomes {
        match outcome {
            RegionOutcome::Fitted(f) => series.push(f),
            RegionOutcome::Skipped(w) => {
                tracing::debug!(region = %w.region, "{}", w);
                warnings.push(w);
            }
        }
    }

    Ok(ForecastBatch {
        commodity: commodity.to_string(),
        horizon_months: options.horizon_months,
        series,
        warnings,
    })
}

fn forecast_one(
    dataset: &PriceDataset,
    commodity: &str,
    region: &str,
    forecaster: Arc<dyn Forecaster>,
    options: &ForecastOptions,
) -> RegionOutcome {
    let (observations, history) = region_history(dataset, commodity, region);
    if observations < options.min_observations {
        return RegionOutcome::Skipped(ForecastWarning {
            region: region.to_string(),
            reason: SkipReason::InsufficientData {
                observations,
                minimum: options.min_observations,
            },
        });
    }

    match fit_with_timeout(forecaster, history, options.horizon_months, options.fit_timeout) {
        Ok(points) => {
            tracing::debug!(region, points = points.len(), "forecast fitted");
            RegionOutcome::Fitted(RegionForecast {
                region: region.to_string(),
                points,
            })
        }
        Err(e) => RegionOutcome::Skipped(ForecastWarning {
            region: region.to_string(),
            reason: SkipReason::FitFailed(e),
        }),
    }
}

/// Runs fit + predict on a worker thread. A worker still running when the
/// timeout expires is abandoned; its result is dropped if it ever arrives.
fn fit_with_timeout(
    forecaster: Arc<dyn Forecaster>,
    history: Vec<SeriesPoint>,
    horizon: usize,
    timeout: Duration,
) -> Result<Vec<SeriesPoint>, ForecastError> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("forecast-fit".into())
        .spawn(move || {
            let result = forecaster
                .fit(&history)
                .and_then(|model| model.predict(horizon));
            let _ = tx.send(result);
        })
        .map_err(|e| ForecastError::Model(format!("failed to start fit worker: {e}")))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(ForecastError::TimedOut(timeout)),
        Err(RecvTimeoutError::Disconnected) => {
            Err(ForecastError::Model("fit worker exited without a result".into()))
        }
    }
}
