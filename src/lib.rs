//! Monthly electricity bill simulator for residential solar, battery and
//! tariff combinations.

pub mod config;
pub mod devices;
pub mod error;
/// Data ingestion, synthetic data and export.
pub mod io;
pub mod reporting;
/// Simulation engine, clock, and catalog runner.
pub mod sim;
pub mod tariff;

pub use error::{Result, SimError};
