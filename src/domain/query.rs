//! Query engine: filtering and aggregation over the immutable dataset.
//!
//! Every function here is pure. Subsets are vectors of borrowed rows, so a
//! query never copies or mutates the dataset.

use crate::domain::dataset::PriceDataset;
use crate::domain::error::MandiError;
use crate::domain::observation::{mean_price, PriceObservation};
use chrono::{Datelike, Months, NaiveDate};
use std::collections::{BTreeMap, HashSet};

/// A read-only view of dataset rows.
pub type Subset<'a> = Vec<&'a PriceObservation>;

/// Mean price of all rows sharing one date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyMean {
    pub date: NaiveDate,
    pub mean_price: f64,
}

/// Filter parameters: one commodity, a set of regions, an inclusive date range.
#[derive(Debug, Clone)]
pub struct PriceFilter {
    pub commodity: String,
    pub regions: Vec<String>,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

impl PriceFilter {
    /// Filter covering every region and the full date span of the dataset.
    pub fn all_for(dataset: &PriceDataset, commodity: &str) -> Option<Self> {
        let (date_from, date_to) = dataset.date_range()?;
        Some(Self {
            commodity: commodity.to_string(),
            regions: dataset.regions().to_vec(),
            date_from,
            date_to,
        })
    }

    pub fn apply<'a>(&self, dataset: &'a PriceDataset) -> Result<Subset<'a>, MandiError> {
        filter(
            dataset,
            &self.commodity,
            self.regions.as_slice(),
            self.date_from,
            self.date_to,
        )
    }
}

/// Rows matching `commodity` exactly, with `admin_region` in `regions` and
/// `date` in `[date_from, date_to]`.
///
/// An unknown commodity or an empty region set yields an empty subset.
pub fn filter<'a, S: AsRef<str>>(
    dataset: &'a PriceDataset,
    commodity: &str,
    regions: &[S],
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<Subset<'a>, MandiError> {
    if date_from > date_to {
        return Err(MandiError::InvalidDateRange {
            from: date_from,
            to: date_to,
        });
    }

    let regions: HashSet<&str> = regions.iter().map(|r| r.as_ref()).collect();
    if regions.is_empty() {
        return Ok(Vec::new());
    }

    Ok(dataset
        .observations()
        .iter()
        .filter(|o| {
            o.commodity == commodity
                && regions.contains(o.admin_region.as_str())
                && o.date >= date_from
                && o.date <= date_to
        })
        .collect())
}

/// Mean price per date, ascending by date, one entry per distinct date.
pub fn aggregate_daily_mean(subset: &[&PriceObservation]) -> Vec<DailyMean> {
    let mut groups: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for obs in subset {
        let entry = groups.entry(obs.date).or_insert((0.0, 0));
        entry.0 += obs.price;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(date, (sum, count))| DailyMean {
            date,
            mean_price: sum / count as f64,
        })
        .collect()
}

/// Rows of `subset` observed on its latest date. Empty in, empty out.
pub fn latest_snapshot<'a>(subset: &[&'a PriceObservation]) -> Subset<'a> {
    let Some(latest) = subset.iter().map(|o| o.date).max() else {
        return Vec::new();
    };
    subset.iter().copied().filter(|o| o.date == latest).collect()
}

/// `as_of` shifted back twelve calendar months.
///
/// Month and day are preserved; a date that does not exist a year earlier
/// (29 February) falls back to the last valid day of that month.
pub fn one_year_before(as_of: NaiveDate) -> Option<NaiveDate> {
    as_of.checked_sub_months(Months::new(12))
}

/// Mean price of `commodity` across the whole dataset during the calendar
/// month one year before `as_of`.
///
/// Matching is on year and month only, not on the exact day: monthly market
/// surveys rarely land on the same day twice, so the reference is "same
/// month last year". Keep it that way. `None` when that month has no rows.
pub fn year_over_year_reference(
    dataset: &PriceDataset,
    commodity: &str,
    as_of: NaiveDate,
) -> Option<f64> {
    let one_year_ago = one_year_before(as_of)?;
    mean_price(dataset.observations().iter().filter(|o| {
        o.commodity == commodity
            && o.date.year() == one_year_ago.year()
            && o.date.month() == one_year_ago.month()
    }))
}
