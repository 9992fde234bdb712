//! Utility billing policies: per-step cost accumulation and period settlement.
//!
//! Each billing period is a small state machine: the policy accumulates
//! while the period is open, [`BillingPolicy::settle`] reads the final bill
//! without side effects, and [`BillingPolicy::reset`] reopens an empty
//! period. The simulator always calls them in that order through
//! [`BillingPolicy::close_period`].

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::Result;
use crate::sim::types::SimConfig;

/// Running totals shared by the tariff variants.
pub mod accumulator;
/// Seasons and on-peak windows.
pub mod calendar;
/// Time-of-use energy pricing with a daily demand charge.
pub mod demand;
/// Flat time-of-use energy pricing.
pub mod time_of_use;

pub use accumulator::BillingAccumulator;
pub use calendar::{HourWindow, Season, Seasonal, TouCalendar};
pub use demand::{DemandChargeRates, DemandChargeTariff};
pub use time_of_use::{TimeOfUseRates, TimeOfUseTariff, TouRate};

/// One settled billing period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bill {
    /// Timestamp of the last step in the period.
    pub period_end: NaiveDateTime,
    /// Signed energy cost accumulated in the period.
    pub usage_cost: f64,
    pub demand_charge: f64,
    pub service_charge: f64,
    /// Amount due.
    pub total: f64,
}

/// Billing behavior of a tariff.
///
/// `grid_kwh` follows the grid convention: positive is imported energy
/// (cost), negative is exported energy (credit). A policy knows nothing
/// about the calendar beyond the timestamps it is handed; the caller
/// decides where billing periods end.
pub trait BillingPolicy {
    /// Catalog identifier of the tariff.
    fn name(&self) -> &str;

    /// Adds one step's grid exchange to the open period.
    fn accumulate(&mut self, timestamp: NaiveDateTime, grid_kwh: f64);

    /// Computes the bill of the open period without modifying it.
    ///
    /// # Errors
    ///
    /// Returns an error if the period cannot be settled.
    fn settle(&self, timestamp: NaiveDateTime) -> Result<Bill>;

    /// Discards the open period's totals.
    fn reset(&mut self);

    /// Settles the open period and then resets it.
    ///
    /// # Errors
    ///
    /// Propagates the error from [`BillingPolicy::settle`]; the period is
    /// left untouched in that case.
    fn close_period(&mut self, timestamp: NaiveDateTime) -> Result<Bill> {
        let bill = self.settle(timestamp)?;
        self.reset();
        Ok(bill)
    }
}

/// The tariff variants available from configuration.
///
/// Tariffs outside this set implement [`BillingPolicy`] directly; the
/// simulator is generic over the trait.
#[derive(Debug, Clone)]
pub enum Tariff {
    TimeOfUse(TimeOfUseTariff),
    DemandCharge(DemandChargeTariff),
}

impl Tariff {
    pub fn time_of_use(name: impl Into<String>, rates: TimeOfUseRates, config: &SimConfig) -> Self {
        Self::TimeOfUse(TimeOfUseTariff::new(name, rates, config.step_hours))
    }

    pub fn demand_charge(
        name: impl Into<String>,
        rates: DemandChargeRates,
        config: &SimConfig,
    ) -> Self {
        Self::DemandCharge(DemandChargeTariff::new(name, rates, config.step_hours))
    }

    /// SRP E-13 time-of-use plan.
    pub fn srp_e13(config: &SimConfig) -> Self {
        Self::time_of_use("E13", TimeOfUseRates::srp_e13(), config)
    }

    /// SRP E-15 time-of-use plan with demand charge.
    pub fn srp_e15(config: &SimConfig) -> Self {
        Self::demand_charge("E15", DemandChargeRates::srp_e15(), config)
    }

    pub fn accumulator(&self) -> &BillingAccumulator {
        match self {
            Self::TimeOfUse(t) => t.accumulator(),
            Self::DemandCharge(t) => t.accumulator(),
        }
    }
}

impl BillingPolicy for Tariff {
    fn name(&self) -> &str {
        match self {
            Self::TimeOfUse(t) => t.name(),
            Self::DemandCharge(t) => t.name(),
        }
    }

    fn accumulate(&mut self, timestamp: NaiveDateTime, grid_kwh: f64) {
        match self {
            Self::TimeOfUse(t) => t.accumulate(timestamp, grid_kwh),
            Self::DemandCharge(t) => t.accumulate(timestamp, grid_kwh),
        }
    }

    fn settle(&self, timestamp: NaiveDateTime) -> Result<Bill> {
        match self {
            Self::TimeOfUse(t) => t.settle(timestamp),
            Self::DemandCharge(t) => t.settle(timestamp),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::TimeOfUse(t) => t.reset(),
            Self::DemandCharge(t) => t.reset(),
        }
    }
}
