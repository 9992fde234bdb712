use chrono::NaiveDateTime;
use serde::Deserialize;

use super::accumulator::BillingAccumulator;
use super::calendar::{Season, Seasonal, TouCalendar};
use super::time_of_use::TouRate;
use super::{Bill, BillingPolicy};
use crate::error::{Result, SimError};

/// Rate table of a time-of-use plan with a daily on-peak demand charge.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemandChargeRates {
    pub energy: Seasonal<TouRate>,
    /// Charge per kW of the mean daily on-peak demand.
    pub demand_per_kw: Seasonal<f64>,
    /// Fixed monthly charge.
    pub service_charge: f64,
    /// Dedicated export credit; exports are priced at the energy rate when absent.
    #[serde(default)]
    pub export_rate: Option<f64>,
    #[serde(default)]
    pub calendar: TouCalendar,
}

impl DemandChargeRates {
    /// SRP E-15 residential time-of-use plan with demand charge (April 2015 price sheet).
    pub fn srp_e15() -> Self {
        Self {
            energy: Seasonal {
                winter: TouRate {
                    on_peak: 0.0410,
                    off_peak: 0.0370,
                },
                summer: TouRate {
                    on_peak: 0.0462,
                    off_peak: 0.0360,
                },
                summer_peak: TouRate {
                    on_peak: 0.0622,
                    off_peak: 0.0412,
                },
            },
            demand_per_kw: Seasonal {
                winter: 19.29,
                summer: 8.13,
                summer_peak: 21.94,
            },
            service_charge: 32.44,
            export_rate: None,
            calendar: TouCalendar::default(),
        }
    }
}

/// Time-of-use billing plus a charge on the average daily on-peak import peak.
///
/// Each calendar day opens a zero-initialized peak slot on its first sample;
/// only on-peak imports can raise it.
#[derive(Debug, Clone)]
pub struct DemandChargeTariff {
    name: String,
    rates: DemandChargeRates,
    step_hours: f64,
    acc: BillingAccumulator,
}

impl DemandChargeTariff {
    pub fn new(name: impl Into<String>, rates: DemandChargeRates, step_hours: f64) -> Self {
        Self {
            name: name.into(),
            rates,
            step_hours,
            acc: BillingAccumulator::new(),
        }
    }

    pub fn rates(&self) -> &DemandChargeRates {
        &self.rates
    }

    pub fn accumulator(&self) -> &BillingAccumulator {
        &self.acc
    }
}

impl BillingPolicy for DemandChargeTariff {
    fn name(&self) -> &str {
        &self.name
    }

    fn accumulate(&mut self, timestamp: NaiveDateTime, grid_kwh: f64) {
        self.acc.open_day(timestamp.date());

        let on_peak = self.rates.calendar.is_on_peak(timestamp);
        let rate = match self.rates.export_rate {
            Some(export) if grid_kwh < 0.0 => export,
            _ => self.rates.energy.get(Season::of(timestamp)).pick(on_peak),
        };
        self.acc.add_cost(grid_kwh * rate);

        let kw = grid_kwh / self.step_hours;
        self.acc.record_import(kw);
        if on_peak {
            self.acc.raise_daily_peak(kw);
        }
    }

    /// Service charge plus usage plus the seasonal demand charge on the mean
    /// daily peak, floored at the service charge.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Configuration`] if the period recorded no day at all.
    fn settle(&self, timestamp: NaiveDateTime) -> Result<Bill> {
        let mean_peak_kw = self.acc.mean_daily_peak().ok_or_else(|| {
            SimError::configuration(
                format!("tariff[{}]", self.name),
                format!("no daily peaks recorded in billing period ending {timestamp}"),
            )
        })?;
        let demand_charge = mean_peak_kw * self.rates.demand_per_kw.get(Season::of(timestamp));

        let service_charge = self.rates.service_charge;
        let usage_cost = self.acc.usage_cost;
        let total = if usage_cost + demand_charge > 0.0 {
            service_charge + usage_cost + demand_charge
        } else {
            service_charge
        };
        Ok(Bill {
            period_end: timestamp,
            usage_cost,
            demand_charge,
            service_charge,
            total,
        })
    }

    fn reset(&mut self) {
        self.acc.reset();
    }
}
