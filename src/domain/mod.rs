//! Core domain types and logic.

pub mod observation;
pub mod dataset;
pub mod query;
pub mod kpi;
pub mod distribution;
pub mod forecast;
pub mod seasonal;
pub mod session;
pub mod dashboard;
pub mod config_validation;
pub mod error;
