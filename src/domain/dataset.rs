//! Immutable in-memory price dataset.
//!
//! Built once from the rows a [`DataPort`](crate::ports::data_port::DataPort)
//! returns. Only retail rows are kept; after construction the rows are never
//! mutated and every query borrows them read-only.

use crate::domain::observation::PriceObservation;
use chrono::NaiveDate;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct PriceDataset {
    observations: Vec<PriceObservation>,
    commodities: Vec<String>,
    regions: Vec<String>,
}

impl PriceDataset {
    /// Keeps retail rows only and indexes distinct commodities and regions
    /// in first-seen order.
    pub fn new(observations: Vec<PriceObservation>) -> Self {
        let observations: Vec<PriceObservation> =
            observations.into_iter().filter(|o| o.is_retail()).collect();

        let commodities = distinct(observations.iter().map(|o| o.commodity.as_str()));
        let regions = distinct(observations.iter().map(|o| o.admin_region.as_str()));

        Self {
            observations,
            commodities,
            regions,
        }
    }

    pub fn observations(&self) -> &[PriceObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn commodities(&self) -> &[String] {
        &self.commodities
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn has_commodity(&self, commodity: &str) -> bool {
        self.commodities.iter().any(|c| c == commodity)
    }

    /// Earliest and latest observation dates.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.observations.iter().map(|o| o.date).min()?;
        let max = self.observations.iter().map(|o| o.date).max()?;
        Some((min, max))
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for v in values {
        if seen.insert(v) {
            out.push(v.to_string());
        }
    }
    out
}
