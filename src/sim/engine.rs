//! Simulation engine that drives one panel, battery and tariff combination.

use tracing::{debug, trace, warn};

use crate::devices::{BatteryModel, PanelModel};
use crate::error::{Result, SimError};
use crate::tariff::{Bill, BillingPolicy};

use super::clock::{Clock, Tick, closes_billing_period};
use super::samples::SampleSet;
use super::types::{SimConfig, StepResult};

/// Simulation engine owning one combination's models.
///
/// Generic over `T: BillingPolicy` for static dispatch, so tariffs outside
/// the built-in [`crate::tariff::Tariff`] enum run through the same loop.
#[derive(Debug, Clone)]
pub struct Engine<T: BillingPolicy> {
    config: SimConfig,
    panel: PanelModel,
    battery: BatteryModel,
    tariff: T,
}

impl<T: BillingPolicy> Engine<T> {
    /// Creates a new simulation engine.
    ///
    /// # Arguments
    ///
    /// * `config` - Simulation configuration
    /// * `panel` - Panel model, consumed and degraded by the run
    /// * `battery` - Battery model, starting from its current state of charge
    /// * `tariff` - Billing policy with an open, empty period
    pub fn new(config: SimConfig, panel: PanelModel, battery: BatteryModel, tariff: T) -> Self {
        Self {
            config,
            panel,
            battery,
            tariff,
        }
    }

    /// Executes one simulation step.
    ///
    /// # Arguments
    ///
    /// * `tick` - Clock position; `tick.index` selects the samples
    /// * `samples` - Aligned weather and load series
    ///
    /// # Returns
    ///
    /// The step record, plus the bill when this step closed a billing period.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SimError::DataIntegrity`] when the weather and
    /// load timestamps disagree, or the tariff's settlement error.
    pub fn step(&mut self, tick: Tick, samples: &SampleSet) -> Result<(StepResult, Option<Bill>)> {
        let (weather, load) = samples.pair(tick.index)?;
        let timestamp = weather.timestamp;

        // 1. Panel output, degrading the panel
        let raw_kwh = self
            .panel
            .generate(weather.irradiance_kw_m2, weather.ambient_temp_c);
        if raw_kwh < 0.0 {
            trace!(step = tick.step, %timestamp, raw_kwh, "negative generation clamped to zero");
        }
        let generation_kwh = raw_kwh.max(0.0);

        // 2. Battery absorbs or supplies what it can
        let net_kwh = generation_kwh - load.load_kwh;
        let residual_kwh = self.battery.dispatch(net_kwh);

        // 3. Grid convention: positive import, negative export
        let grid_kwh = -residual_kwh;
        self.tariff.accumulate(timestamp, grid_kwh);

        // 4. Month end closes the billing period
        let bill = if closes_billing_period(timestamp, self.config.step_hours) {
            let bill = self.tariff.close_period(timestamp)?;
            debug!(
                tariff = self.tariff.name(),
                period_end = %timestamp,
                total = bill.total,
                "billing period settled"
            );
            Some(bill)
        } else {
            None
        };

        let result = StepResult {
            step: tick.step,
            timestamp,
            generation_kwh,
            load_kwh: load.load_kwh,
            net_kwh,
            residual_kwh,
            grid_kwh,
            battery_soc: self.battery.soc(),
            rated_power_kw: self.panel.rated_power_kw(),
            settled: bill.is_some(),
        };
        Ok((result, bill))
    }

    /// Runs every step over `config.years` passes of the sample year,
    /// handing each step record to `observe`.
    ///
    /// Multi-year runs require the sample data to end on a billing-period
    /// boundary, so no period spans the wrap from the last sample back to
    /// the first.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Configuration`] when the sample spacing differs
    /// from `step_hours`, or when `years > 1` and the samples end mid-period.
    /// Otherwise stops at the first failing step and returns its error.
    pub fn run_with(
        &mut self,
        samples: &SampleSet,
        mut observe: impl FnMut(&StepResult),
    ) -> Result<Vec<Bill>> {
        samples.check_spacing(self.config.step_hours)?;
        if self.config.years > 1 {
            let ends_period = samples
                .weather()
                .last()
                .is_some_and(|w| closes_billing_period(w.timestamp, self.config.step_hours));
            if !ends_period {
                return Err(SimError::configuration(
                    "simulation.years",
                    "multi-year runs need sample data ending on a month boundary",
                ));
            }
        }

        let mut clock = Clock::new(samples.len(), self.config.years);
        let mut bills = Vec::with_capacity(12 * self.config.years);
        let mut last_settled = true;

        while let Some(tick) = clock.tick() {
            let (result, bill) = self.step(tick, samples)?;
            last_settled = result.settled;
            observe(&result);
            bills.extend(bill);
        }

        if !last_settled {
            warn!(
                tariff = self.tariff.name(),
                "sample data ends mid-period; the open period was not billed"
            );
        }
        Ok(bills)
    }

    /// Runs every step and returns the settled bills in chronological order.
    ///
    /// # Errors
    ///
    /// See [`Engine::run_with`].
    pub fn run(&mut self, samples: &SampleSet) -> Result<Vec<Bill>> {
        self.run_with(samples, |_| {})
    }

    /// Runs every step and returns the bills together with the full step log.
    ///
    /// # Errors
    ///
    /// See [`Engine::run_with`].
    pub fn run_recorded(&mut self, samples: &SampleSet) -> Result<(Vec<Bill>, Vec<StepResult>)> {
        let mut steps = Vec::with_capacity(samples.len() * self.config.years);
        let bills = self.run_with(samples, |r| steps.push(r.clone()))?;
        Ok((bills, steps))
    }

    pub fn panel(&self) -> &PanelModel {
        &self.panel
    }

    pub fn battery(&self) -> &BatteryModel {
        &self.battery
    }

    pub fn tariff(&self) -> &T {
        &self.tariff
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}
