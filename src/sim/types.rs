//! Core simulation types: configuration, input samples, step records, and combination keys.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::{Result, SimError};

/// Hours in a 365-day year, the base of the hourly degradation approximation.
pub const HOURS_PER_YEAR: f64 = 24.0 * 365.0;

/// Centralized simulation configuration.
///
/// Every model takes its step duration from here instead of a module-level
/// constant, so simulations with different step sizes can run side by side.
///
/// # Examples
///
/// ```
/// use solar_bill_sim::sim::types::SimConfig;
///
/// let cfg = SimConfig::new(1.0, 2).unwrap();
/// assert_eq!(cfg.step_hours, 1.0);
/// assert_eq!(cfg.years, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimConfig {
    /// Duration of one timestep in hours.
    pub step_hours: f64,
    /// Number of passes over the sample year.
    pub years: usize,
}

impl SimConfig {
    /// Creates a new simulation configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Configuration`] if `step_hours` is not a positive
    /// finite number or `years` is zero.
    pub fn new(step_hours: f64, years: usize) -> Result<Self> {
        if !(step_hours.is_finite() && step_hours > 0.0) {
            return Err(SimError::configuration(
                "simulation.step_hours",
                format!("must be > 0, got {step_hours}"),
            ));
        }
        if years == 0 {
            return Err(SimError::configuration("simulation.years", "must be >= 1"));
        }
        Ok(Self { step_hours, years })
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            step_hours: 1.0,
            years: 1,
        }
    }
}

/// One hour of weather data from the irradiance source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherSample {
    pub timestamp: NaiveDateTime,
    /// Plane-of-array irradiance (kW/m²).
    pub irradiance_kw_m2: f64,
    /// Ambient temperature (°C).
    pub ambient_temp_c: f64,
}

/// One hour of household consumption from the utility export.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadSample {
    pub timestamp: NaiveDateTime,
    /// Energy consumed during the step (kWh).
    pub load_kwh: f64,
}

/// Identity of one panel × battery × tariff combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CombinationKey {
    pub panel: String,
    pub battery: String,
    pub tariff: String,
}

impl CombinationKey {
    pub fn new(
        panel: impl Into<String>,
        battery: impl Into<String>,
        tariff: impl Into<String>,
    ) -> Self {
        Self {
            panel: panel.into(),
            battery: battery.into(),
            tariff: tariff.into(),
        }
    }
}

impl fmt::Display for CombinationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.panel, self.battery, self.tariff)
    }
}

/// Complete record of one simulated step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Global step index across all passes.
    pub step: usize,
    pub timestamp: NaiveDateTime,
    /// Panel generation after clamping negatives to zero (kWh).
    pub generation_kwh: f64,
    /// Household load (kWh).
    pub load_kwh: f64,
    /// `generation - load` (kWh; positive = surplus).
    pub net_kwh: f64,
    /// Energy the battery could not absorb or supply (kWh).
    pub residual_kwh: f64,
    /// Grid exchange (kWh; positive = import, negative = export).
    pub grid_kwh: f64,
    /// Battery SOC after this step (0.0 to 1.0).
    pub battery_soc: f64,
    /// Panel rated power after this step's degradation (kW).
    pub rated_power_kw: f64,
    /// Whether this step closed a billing period.
    pub settled: bool,
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>5} {} | gen={:>6.3} load={:>6.3} net={:>7.3} | resid={:>7.3} \
             grid={:>7.3} kWh | SoC={:>5.1}% | rated={:.4} kW{}",
            self.step,
            self.timestamp,
            self.generation_kwh,
            self.load_kwh,
            self.net_kwh,
            self.residual_kwh,
            self.grid_kwh,
            self.battery_soc * 100.0,
            self.rated_power_kw,
            if self.settled { " [bill]" } else { "" },
        )
    }
}
