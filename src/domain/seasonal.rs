//! Additive seasonal forecaster.
//!
//! Daily history is bucketed into calendar months (mean per month) and gaps
//! between observed months are linearly interpolated, giving a regular
//! monthly series. With at least two full years of months the model is
//! additive Holt-Winters with a 12-month season; with less it falls back to
//! Holt's linear trend.
//!
//! - `alpha`: level smoothing
//! - `beta`: trend smoothing
//! - `gamma`: seasonal smoothing

use crate::domain::error::ForecastError;
use crate::domain::forecast::{ForecastModel, Forecaster, SeriesPoint};
use chrono::{Datelike, Months, NaiveDate};
use std::collections::BTreeMap;

pub const SEASON_LENGTH: usize = 12;
pub const MIN_TREND_MONTHS: usize = 3;

pub const DEFAULT_ALPHA: f64 = 0.3;
pub const DEFAULT_BETA: f64 = 0.1;
pub const DEFAULT_GAMMA: f64 = 0.2;

#[derive(Debug, Clone, Copy)]
pub struct SeasonalForecaster {
    alpha: f64,
    beta: f64,
    gamma: f64,
}

impl SeasonalForecaster {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Result<Self, ForecastError> {
        check_unit("alpha", alpha)?;
        check_unit("beta", beta)?;
        check_unit("gamma", gamma)?;
        Ok(Self { alpha, beta, gamma })
    }
}

impl Default for SeasonalForecaster {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            beta: DEFAULT_BETA,
            gamma: DEFAULT_GAMMA,
        }
    }
}

fn check_unit(name: &str, value: f64) -> Result<(), ForecastError> {
    if !(0.0 < value && value < 1.0) {
        return Err(ForecastError::InvalidParameter {
            name: name.to_string(),
            reason: "must be between 0 and 1 (exclusive)".to_string(),
        });
    }
    Ok(())
}

fn month_index(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

fn month_start(index: i64) -> Option<NaiveDate> {
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = index.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Mean value per calendar month from the first to the last observed month,
/// each dated on the first of its month. Months without observations are
/// interpolated between their observed neighbours.
pub fn monthly_means(history: &[SeriesPoint]) -> Vec<SeriesPoint> {
    let mut buckets: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for p in history {
        let entry = buckets.entry(month_index(p.date)).or_insert((0.0, 0));
        entry.0 += p.value;
        entry.1 += 1;
    }

    let observed: Vec<(i64, f64)> = buckets
        .into_iter()
        .map(|(idx, (sum, count))| (idx, sum / count as f64))
        .collect();

    let mut out = Vec::new();
    for (i, &(idx, value)) in observed.iter().enumerate() {
        if let Some(date) = month_start(idx) {
            out.push(SeriesPoint { date, value });
        }
        if let Some(&(next_idx, next_value)) = observed.get(i + 1) {
            let gap = next_idx - idx;
            for step in 1..gap {
                let frac = step as f64 / gap as f64;
                if let Some(date) = month_start(idx + step) {
                    out.push(SeriesPoint {
                        date,
                        value: value + (next_value - value) * frac,
                    });
                }
            }
        }
    }
    out
}

#[derive(Debug, Clone)]
enum Components {
    Trend {
        level: f64,
        trend: f64,
    },
    Seasonal {
        level: f64,
        trend: f64,
        seasonal: Vec<f64>,
        fitted_len: usize,
    },
}

#[derive(Debug, Clone)]
pub struct SeasonalModel {
    components: Components,
    last_month: NaiveDate,
}

impl SeasonalModel {
    fn value_at(&self, h: usize) -> f64 {
        match &self.components {
            Components::Trend { level, trend } => level + h as f64 * trend,
            Components::Seasonal {
                level,
                trend,
                seasonal,
                fitted_len,
            } => {
                let idx = (fitted_len + h - 1) % seasonal.len();
                level + h as f64 * trend + seasonal[idx]
            }
        }
    }
}

impl ForecastModel for SeasonalModel {
    fn predict(&self, horizon: usize) -> Result<Vec<SeriesPoint>, ForecastError> {
        (1..=horizon)
            .map(|h| {
                let date = self
                    .last_month
                    .checked_add_months(Months::new(h as u32))
                    .ok_or_else(|| ForecastError::Model("forecast date out of range".into()))?;
                Ok(SeriesPoint {
                    date,
                    value: self.value_at(h).max(0.0),
                })
            })
            .collect()
    }
}

impl SeasonalForecaster {
    fn fit_trend(&self, data: &[f64]) -> Components {
        let mut level = data[0];
        let mut trend = data[1] - data[0];
        for &value in &data[1..] {
            let prev_level = level;
            level = self.alpha * value + (1.0 - self.alpha) * (level + trend);
            trend = self.beta * (level - prev_level) + (1.0 - self.beta) * trend;
        }
        Components::Trend { level, trend }
    }

    fn fit_seasonal(&self, data: &[f64]) -> Components {
        let period = SEASON_LENGTH;
        let first_avg = data[..period].iter().sum::<f64>() / period as f64;
        let second_avg = data[period..2 * period].iter().sum::<f64>() / period as f64;

        let mut level = first_avg;
        let mut trend = (second_avg - first_avg) / period as f64;
        let mut seasonal: Vec<f64> = data[..period].iter().map(|v| v - first_avg).collect();

        for (i, &value) in data.iter().enumerate().skip(period) {
            let idx = i % period;
            let prev_level = level;
            let prev_seasonal = seasonal[idx];
            level = self.alpha * (value - prev_seasonal) + (1.0 - self.alpha) * (level + trend);
            trend = self.beta * (level - prev_level) + (1.0 - self.beta) * trend;
            seasonal[idx] = self.gamma * (value - level) + (1.0 - self.gamma) * prev_seasonal;
        }

        Components::Seasonal {
            level,
            trend,
            seasonal,
            fitted_len: data.len(),
        }
    }
}

impl Forecaster for SeasonalForecaster {
    fn fit(&self, history: &[SeriesPoint]) -> Result<Box<dyn ForecastModel>, ForecastError> {
        let monthly = monthly_means(history);
        let Some(last) = monthly.last() else {
            return Err(ForecastError::InsufficientHistory {
                required: MIN_TREND_MONTHS,
                actual: 0,
            });
        };
        let last_month = last.date;
        let data: Vec<f64> = monthly.iter().map(|p| p.value).collect();

        let components = if data.len() >= 2 * SEASON_LENGTH {
            self.fit_seasonal(&data)
        } else if data.len() >= MIN_TREND_MONTHS {
            self.fit_trend(&data)
        } else {
            return Err(ForecastError::InsufficientHistory {
                required: MIN_TREND_MONTHS,
                actual: data.len(),
            });
        };

        Ok(Box::new(SeasonalModel {
            components,
            last_month,
        }))
    }
}
