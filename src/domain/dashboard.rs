//! Everything one dashboard render needs, computed from a single filter.

use crate::domain::dataset::PriceDataset;
use crate::domain::distribution::{region_distributions, RegionDistribution};
use crate::domain::error::MandiError;
use crate::domain::forecast::ForecastBatch;
use crate::domain::kpi::KpiSummary;
use crate::domain::query::{aggregate_daily_mean, latest_snapshot, DailyMean, PriceFilter};

pub const DEFAULT_TITLE: &str = "MandiMetrics: Pakistan Food Price Intelligence";

/// One market on the latest-price map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub market: String,
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
    pub price: f64,
}

#[derive(Debug, Clone)]
pub struct DashboardView {
    pub title: String,
    pub filter: PriceFilter,
    pub kpis: KpiSummary,
    pub trend: Vec<DailyMean>,
    pub snapshot: Vec<MapMarker>,
    pub distributions: Vec<RegionDistribution>,
    pub forecast: Option<ForecastBatch>,
}

impl DashboardView {
    pub fn build(
        dataset: &PriceDataset,
        filter: &PriceFilter,
        title: &str,
    ) -> Result<Self, MandiError> {
        let subset = filter.apply(dataset)?;

        let snapshot = latest_snapshot(&subset)
            .into_iter()
            .map(|o| MapMarker {
                market: o.market.clone(),
                region: o.admin_region.clone(),
                latitude: o.latitude,
                longitude: o.longitude,
                price: o.price,
            })
            .collect();

        Ok(Self {
            title: title.to_string(),
            filter: filter.clone(),
            kpis: KpiSummary::compute(dataset, &filter.commodity, &subset),
            trend: aggregate_daily_mean(&subset),
            snapshot,
            distributions: region_distributions(&subset),
            forecast: None,
        })
    }

    pub fn with_forecast(mut self, batch: ForecastBatch) -> Self {
        self.forecast = Some(batch);
        self
    }
}
