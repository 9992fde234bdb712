use chrono::NaiveDateTime;
use serde::Deserialize;

use super::accumulator::BillingAccumulator;
use super::calendar::{Season, Seasonal, TouCalendar};
use super::{Bill, BillingPolicy};
use crate::error::Result;

/// On-peak and off-peak energy prices of one season (currency/kWh).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TouRate {
    pub on_peak: f64,
    pub off_peak: f64,
}

impl TouRate {
    pub fn pick(&self, on_peak: bool) -> f64 {
        if on_peak { self.on_peak } else { self.off_peak }
    }
}

/// Rate table of a flat time-of-use plan.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeOfUseRates {
    pub energy: Seasonal<TouRate>,
    /// Credit per exported kWh, independent of season and time of day.
    pub export_rate: f64,
    /// Fixed monthly charge.
    pub service_charge: f64,
    #[serde(default)]
    pub calendar: TouCalendar,
}

impl TimeOfUseRates {
    /// SRP E-13 residential time-of-use plan (April 2015 price sheet).
    pub fn srp_e13() -> Self {
        Self {
            energy: Seasonal {
                winter: TouRate {
                    on_peak: 0.0951,
                    off_peak: 0.0691,
                },
                summer: TouRate {
                    on_peak: 0.2094,
                    off_peak: 0.0727,
                },
                summer_peak: TouRate {
                    on_peak: 0.2409,
                    off_peak: 0.0730,
                },
            },
            export_rate: 0.0281,
            service_charge: 32.44,
            calendar: TouCalendar::default(),
        }
    }
}

/// Flat time-of-use billing: per-kWh prices plus a fixed service charge.
#[derive(Debug, Clone)]
pub struct TimeOfUseTariff {
    name: String,
    rates: TimeOfUseRates,
    step_hours: f64,
    acc: BillingAccumulator,
}

impl TimeOfUseTariff {
    pub fn new(name: impl Into<String>, rates: TimeOfUseRates, step_hours: f64) -> Self {
        Self {
            name: name.into(),
            rates,
            step_hours,
            acc: BillingAccumulator::new(),
        }
    }

    pub fn rates(&self) -> &TimeOfUseRates {
        &self.rates
    }

    pub fn accumulator(&self) -> &BillingAccumulator {
        &self.acc
    }

    /// Price applied to `grid_kwh` at `timestamp`.
    pub fn rate_at(&self, timestamp: NaiveDateTime, grid_kwh: f64) -> f64 {
        if grid_kwh < 0.0 {
            return self.rates.export_rate;
        }
        let on_peak = self.rates.calendar.is_on_peak(timestamp);
        self.rates.energy.get(Season::of(timestamp)).pick(on_peak)
    }
}

impl BillingPolicy for TimeOfUseTariff {
    fn name(&self) -> &str {
        &self.name
    }

    fn accumulate(&mut self, timestamp: NaiveDateTime, grid_kwh: f64) {
        let rate = self.rate_at(timestamp, grid_kwh);
        self.acc.add_cost(grid_kwh * rate);
        self.acc.record_import(grid_kwh / self.step_hours);
    }

    /// Service charge plus usage; a period of net credit bills the service charge alone.
    fn settle(&self, timestamp: NaiveDateTime) -> Result<Bill> {
        let service_charge = self.rates.service_charge;
        let usage_cost = self.acc.usage_cost;
        let total = if usage_cost > 0.0 {
            service_charge + usage_cost
        } else {
            service_charge
        };
        Ok(Bill {
            period_end: timestamp,
            usage_cost,
            demand_charge: 0.0,
            service_charge,
            total,
        })
    }

    fn reset(&mut self) {
        self.acc.reset();
    }
}
