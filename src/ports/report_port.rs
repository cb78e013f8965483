//! Report generation port trait.

use crate::domain::dashboard::DashboardView;
use crate::domain::error::MandiError;

/// Port for writing a rendered dashboard.
pub trait ReportPort {
    fn write(&self, view: &DashboardView, output_path: &str) -> Result<(), MandiError>;
}
