//! Summary metrics for the market snapshot.

use crate::domain::dataset::PriceDataset;
use crate::domain::observation::{mean_price, PriceObservation};
use crate::domain::query::{latest_snapshot, year_over_year_reference};
use chrono::NaiveDate;

/// Percent change from `reference_mean` to `latest_mean`.
///
/// Unavailable (`None`) when the reference is absent or zero.
pub fn percent_change(latest_mean: f64, reference_mean: Option<f64>) -> Option<f64> {
    match reference_mean {
        Some(reference) if reference != 0.0 => {
            Some((latest_mean - reference) / reference * 100.0)
        }
        _ => None,
    }
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn format_percent_change(change: Option<f64>) -> String {
    match change {
        Some(pct) => format!("{:.1}% vs Last Year", round_one_decimal(pct)),
        None => "Data N/A".to_string(),
    }
}

pub fn format_price(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("PKR {:.2}", v),
        None => "N/A".to_string(),
    }
}

/// The four headline metrics for one filtered view.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiSummary {
    pub commodity: String,
    pub latest_date: Option<NaiveDate>,
    pub current_avg_price: Option<f64>,
    pub yoy_reference: Option<f64>,
    pub yoy_change_pct: Option<f64>,
    pub highest_price: Option<f64>,
    pub lowest_price: Option<f64>,
    pub data_points: usize,
}

impl KpiSummary {
    /// Metrics for `subset`; the year-over-year reference is looked up in the
    /// full `dataset` for `commodity`, regardless of region or date filters.
    pub fn compute(
        dataset: &PriceDataset,
        commodity: &str,
        subset: &[&PriceObservation],
    ) -> Self {
        let latest = latest_snapshot(subset);
        let latest_date = latest.first().map(|o| o.date);
        let current_avg_price = mean_price(latest.iter().copied());

        let yoy_reference =
            latest_date.and_then(|d| year_over_year_reference(dataset, commodity, d));
        let yoy_change_pct = current_avg_price.and_then(|avg| percent_change(avg, yoy_reference));

        let highest_price = subset.iter().map(|o| o.price).reduce(f64::max);
        let lowest_price = subset.iter().map(|o| o.price).reduce(f64::min);

        Self {
            commodity: commodity.to_string(),
            latest_date,
            current_avg_price,
            yoy_reference,
            yoy_change_pct,
            highest_price,
            lowest_price,
            data_points: subset.len(),
        }
    }

    pub fn has_data(&self) -> bool {
        self.data_points > 0
    }
}
