//! Data access port trait.

use crate::domain::error::MandiError;
use crate::domain::observation::PriceObservation;
use std::time::SystemTime;

/// Identity of a data source at one point in time. Two equal fingerprints
/// mean the source has not changed between reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFingerprint {
    pub identity: String,
    pub modified: Option<SystemTime>,
    pub len: u64,
}

pub trait DataPort {
    /// Typed observations from the source. Adapters may drop non-retail rows
    /// early; the dataset filters again when it is built.
    fn load_observations(&self) -> Result<Vec<PriceObservation>, MandiError>;

    fn fingerprint(&self) -> Result<SourceFingerprint, MandiError>;
}
