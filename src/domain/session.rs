//! Session state: the loaded dataset, memoized by source fingerprint.

use crate::domain::dataset::PriceDataset;
use crate::domain::error::MandiError;
use crate::ports::data_port::{DataPort, SourceFingerprint};
use std::sync::Arc;

/// Holds at most one loaded dataset for the lifetime of a session.
///
/// The dataset is reloaded only when the source fingerprint (identity,
/// modification time, length) differs from the one it was loaded under.
#[derive(Debug, Default)]
pub struct Session {
    cached: Option<(SourceFingerprint, Arc<PriceDataset>)>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dataset(&mut self, port: &dyn DataPort) -> Result<Arc<PriceDataset>, MandiError> {
        let fingerprint = port.fingerprint()?;
        if let Some((cached_fp, dataset)) = &self.cached {
            if *cached_fp == fingerprint {
                tracing::debug!(source = %fingerprint.identity, "dataset cache hit");
                return Ok(Arc::clone(dataset));
            }
        }

        let dataset = Arc::new(PriceDataset::new(port.load_observations()?));
        tracing::debug!(
            source = %fingerprint.identity,
            rows = dataset.len(),
            commodities = dataset.commodities().len(),
            regions = dataset.regions().len(),
            "dataset loaded"
        );
        self.cached = Some((fingerprint, Arc::clone(&dataset)));
        Ok(dataset)
    }

    pub fn is_loaded(&self) -> bool {
        self.cached.is_some()
    }

    pub fn clear(&mut self) {
        self.cached = None;
    }
}
