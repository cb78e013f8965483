//! Price observation representation.

use chrono::NaiveDate;

/// Price type retained after load; wholesale and farm-gate rows are dropped.
pub const RETAIL_PRICE_TYPE: &str = "Retail";

/// One market price reading for one commodity on one date.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceObservation {
    pub date: NaiveDate,
    pub commodity: String,
    pub price_type: String,
    pub admin_region: String,
    pub market: String,
    pub latitude: f64,
    pub longitude: f64,
    pub price: f64,
    pub usd_price: f64,
}

impl PriceObservation {
    pub fn is_retail(&self) -> bool {
        self.price_type == RETAIL_PRICE_TYPE
    }
}

/// Arithmetic mean of `price` over the given rows, `None` when there are none.
pub fn mean_price<'a, I>(rows: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a PriceObservation>,
{
    let (sum, count) = rows
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), obs| (sum + obs.price, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
