//! CSV file data adapter for WFP food price exports.
//!
//! The export has a header row followed by an HXL metadata row (`#date`,
//! `#adm1+name`, ...), which is always discarded. Only the columns below are
//! read; others are ignored and column order does not matter.

use crate::domain::error::MandiError;
use crate::domain::observation::{PriceObservation, RETAIL_PRICE_TYPE};
use crate::ports::data_port::{DataPort, SourceFingerprint};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::PathBuf;

pub const DEFAULT_DATA_FILE: &str = "wfp_food_prices_pak.csv";

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

#[derive(Debug, Deserialize)]
struct RawRow {
    date: String,
    admin1: String,
    market: String,
    latitude: String,
    longitude: String,
    commodity: String,
    pricetype: String,
    price: String,
    usdprice: String,
}

impl RawRow {
    fn into_observation(self, line: u64) -> Result<PriceObservation, MandiError> {
        Ok(PriceObservation {
            date: parse_date(&self.date, line)?,
            latitude: parse_number(&self.latitude, "latitude", line)?,
            longitude: parse_number(&self.longitude, "longitude", line)?,
            price: parse_price(&self.price, "price", line)?,
            usd_price: parse_price(&self.usdprice, "usdprice", line)?,
            commodity: self.commodity,
            price_type: self.pricetype,
            admin_region: self.admin1,
            market: self.market,
        })
    }
}

fn coercion(line: u64, column: &str, value: &str, reason: impl Into<String>) -> MandiError {
    MandiError::Coercion {
        line,
        column: column.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_date(value: &str, line: u64) -> Result<NaiveDate, MandiError> {
    // Timestamps such as 2024-01-15T00:00:00 keep only their date part.
    let date_part = value.split('T').next().unwrap_or(value);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        .ok_or_else(|| coercion(line, "date", value, "expected YYYY-MM-DD"))
}

fn parse_number(value: &str, column: &str, line: u64) -> Result<f64, MandiError> {
    let n: f64 = value
        .parse()
        .map_err(|e: std::num::ParseFloatError| coercion(line, column, value, e.to_string()))?;
    if !n.is_finite() {
        return Err(coercion(line, column, value, "not a finite number"));
    }
    Ok(n)
}

fn parse_price(value: &str, column: &str, line: u64) -> Result<f64, MandiError> {
    let n = parse_number(value, column, line)?;
    if n < 0.0 {
        return Err(coercion(line, column, value, "price must be non-negative"));
    }
    Ok(n)
}

/// Reads retail observations from WFP CSV content.
///
/// Non-retail rows are skipped before coercion. A retail row whose date or
/// numbers cannot be read fails the whole load.
pub fn read_observations<R: Read>(reader: R, source: &str) -> Result<Vec<PriceObservation>, MandiError> {
    let load_err = |reason: String| MandiError::Load {
        path: source.to_string(),
        reason,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| load_err(format!("CSV header error: {}", e)))?
        .clone();

    let mut observations = Vec::new();
    let mut skipped = 0usize;

    for (idx, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| load_err(format!("CSV parse error: {}", e)))?;
        if idx == 0 {
            continue;
        }

        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let raw: RawRow = record
            .deserialize(Some(&headers))
            .map_err(|e| load_err(format!("line {}: {}", line, e)))?;

        if raw.pricetype != RETAIL_PRICE_TYPE {
            skipped += 1;
            continue;
        }
        observations.push(raw.into_observation(line)?);
    }

    tracing::debug!(
        source,
        retained = observations.len(),
        skipped,
        "read price observations"
    );
    Ok(observations)
}

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn io_error(&self, e: io::Error) -> MandiError {
        if e.kind() == io::ErrorKind::NotFound {
            MandiError::SourceNotFound {
                path: self.path.display().to_string(),
            }
        } else {
            MandiError::Load {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            }
        }
    }
}

impl DataPort for CsvAdapter {
    fn load_observations(&self) -> Result<Vec<PriceObservation>, MandiError> {
        let file = File::open(&self.path).map_err(|e| self.io_error(e))?;
        read_observations(file, &self.path.display().to_string())
    }

    fn fingerprint(&self) -> Result<SourceFingerprint, MandiError> {
        let metadata = fs::metadata(&self.path).map_err(|e| self.io_error(e))?;
        let identity = fs::canonicalize(&self.path)
            .unwrap_or_else(|_| self.path.clone())
            .display()
            .to_string();
        Ok(SourceFingerprint {
            identity,
            modified: metadata.modified().ok(),
            len: metadata.len(),
        })
    }
}
