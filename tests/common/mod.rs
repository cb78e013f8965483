#![allow(dead_code)]

use chrono::{Months, NaiveDate};
use mandimetrics::domain::error::{ForecastError, MandiError};
use mandimetrics::domain::forecast::{ForecastModel, Forecaster, SeriesPoint};
pub use mandimetrics::domain::observation::{PriceObservation, RETAIL_PRICE_TYPE};
use mandimetrics::ports::data_port::{DataPort, SourceFingerprint};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

pub const CSV_HEADER: &str = "date,admin1,admin2,market,latitude,longitude,category,commodity,unit,priceflag,pricetype,currency,price,usdprice";
pub const HXL_ROW: &str = "#date,#adm1+name,#adm2+name,#loc+market+name,#geo+lat,#geo+lon,#item+type,#item+name,#item+unit,#item+price+flag,#item+price+type,#currency,#value,#value+usd";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_obs(
    date: NaiveDate,
    commodity: &str,
    region: &str,
    price: f64,
) -> PriceObservation {
    PriceObservation {
        date,
        commodity: commodity.to_string(),
        price_type: RETAIL_PRICE_TYPE.to_string(),
        admin_region: region.to_string(),
        market: format!("{region} Mandi"),
        latitude: 30.0,
        longitude: 70.0,
        price,
        usd_price: price / 280.0,
    }
}

/// One row per month on the 15th, starting January of `start_year`.
pub fn monthly_rows(
    commodity: &str,
    region: &str,
    start_year: i32,
    months: usize,
    price: impl Fn(usize) -> f64,
) -> Vec<PriceObservation> {
    (0..months)
        .map(|i| {
            let d = date(start_year, 1, 15) + Months::new(i as u32);
            make_obs(d, commodity, region, price(i))
        })
        .collect()
}

/// In-memory data port counting loads; bump `len` to simulate a changed file.
pub struct MockDataPort {
    pub rows: Vec<PriceObservation>,
    pub len: Cell<u64>,
    pub loads: Cell<usize>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(rows: Vec<PriceObservation>) -> Self {
        Self {
            rows,
            len: Cell::new(1),
            loads: Cell::new(0),
            error: None,
        }
    }

    pub fn missing(path: &str) -> Self {
        Self {
            error: Some(path.to_string()),
            ..Self::new(Vec::new())
        }
    }
}

impl DataPort for MockDataPort {
    fn load_observations(&self) -> Result<Vec<PriceObservation>, MandiError> {
        self.loads.set(self.loads.get() + 1);
        Ok(self.rows.clone())
    }

    fn fingerprint(&self) -> Result<SourceFingerprint, MandiError> {
        if let Some(path) = &self.error {
            return Err(MandiError::SourceNotFound { path: path.clone() });
        }
        Ok(SourceFingerprint {
            identity: "mock".to_string(),
            modified: None,
            len: self.len.get(),
        })
    }
}

/// Predicts the last observed value for every future month.
pub struct StubForecaster;

struct FlatModel {
    last: SeriesPoint,
}

impl ForecastModel for FlatModel {
    fn predict(&self, horizon: usize) -> Result<Vec<SeriesPoint>, ForecastError> {
        Ok((1..=horizon)
            .map(|h| SeriesPoint {
                date: self.last.date + Months::new(h as u32),
                value: self.last.value,
            })
            .collect())
    }
}

impl Forecaster for StubForecaster {
    fn fit(&self, history: &[SeriesPoint]) -> Result<Box<dyn ForecastModel>, ForecastError> {
        let last = *history.last().ok_or(ForecastError::InsufficientHistory {
            required: 1,
            actual: 0,
        })?;
        Ok(Box::new(FlatModel { last }))
    }
}

/// Never finishes a fit within any reasonable timeout.
pub struct StallingForecaster {
    pub delay: Duration,
}

impl Forecaster for StallingForecaster {
    fn fit(&self, history: &[SeriesPoint]) -> Result<Box<dyn ForecastModel>, ForecastError> {
        thread::sleep(self.delay);
        StubForecaster.fit(history)
    }
}

pub fn csv_row(
    date: &str,
    region: &str,
    market: &str,
    commodity: &str,
    price_type: &str,
    price: f64,
) -> String {
    format!(
        "{date},{region},{market},{market},30.00,70.00,cereals and tubers,{commodity},KG,actual,{price_type},PKR,{price},{:.2}",
        price / 280.0
    )
}

/// Writes a WFP-style CSV (header, HXL row, `rows`) into `dir`.
pub fn write_price_csv(dir: &Path, rows: &[String]) -> PathBuf {
    let path = dir.join("wfp_food_prices_pak.csv");
    let mut content = format!("{CSV_HEADER}\n{HXL_ROW}\n");
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    std::fs::write(&path, content).unwrap();
    path
}
