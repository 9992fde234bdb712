use crate::error::{Result, SimError};
use crate::sim::types::SimConfig;

/// A home battery driven by a greedy, single-step dispatch rule.
///
/// `BatteryModel` soaks up surplus generation and covers deficits without
/// any foresight. Whatever it cannot absorb or supply in a step is handed
/// back as residual energy for the grid.
///
/// # Energy Convention
/// - Positive input: surplus available to charge
/// - Negative input: deficit to be covered by discharge
/// - Positive residual: energy pushed to the grid
/// - Negative residual: energy drawn from the grid
#[derive(Debug, Clone)]
pub struct BatteryModel {
    name: String,

    /// Usable capacity in kilowatt-hours (0 models "no battery").
    capacity_kwh: f64,

    /// Inverter continuous power rating in kilowatts.
    max_power_kw: f64,

    /// Round-trip efficiency (0..1.0].
    efficiency: f64,

    /// State of charge as a fraction (0.0 to 1.0).
    soc: f64,

    /// Duration of one timestep in hours.
    step_hours: f64,
}

impl BatteryModel {
    /// Creates a new, empty battery.
    ///
    /// # Arguments
    ///
    /// * `name` - Catalog identifier
    /// * `capacity_kwh` - Usable capacity in kWh (>= 0)
    /// * `max_power_kw` - Inverter continuous power in kW (>= 0)
    /// * `efficiency` - Round-trip efficiency (0..1.0]
    /// * `config` - Simulation configuration for timing
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Configuration`] for a negative capacity or power,
    /// or an efficiency outside (0, 1].
    pub fn new(
        name: impl Into<String>,
        capacity_kwh: f64,
        max_power_kw: f64,
        efficiency: f64,
        config: &SimConfig,
    ) -> Result<Self> {
        let name = name.into();
        if !(capacity_kwh.is_finite() && capacity_kwh >= 0.0) {
            return Err(SimError::configuration(
                format!("battery[{name}].capacity_kwh"),
                "must be >= 0",
            ));
        }
        if !(max_power_kw.is_finite() && max_power_kw >= 0.0) {
            return Err(SimError::configuration(
                format!("battery[{name}].max_power_kw"),
                "must be >= 0",
            ));
        }
        if !(efficiency > 0.0 && efficiency <= 1.0) {
            return Err(SimError::configuration(
                format!("battery[{name}].efficiency"),
                "must be in (0, 1]",
            ));
        }

        Ok(Self {
            name,
            capacity_kwh,
            max_power_kw,
            efficiency,
            soc: 0.0,
            step_hours: config.step_hours,
        })
    }

    /// The "no battery installed" option: every step passes straight through.
    pub fn none(config: &SimConfig) -> Self {
        Self {
            name: "None".to_string(),
            capacity_kwh: 0.0,
            max_power_kw: 0.0,
            efficiency: 1.0,
            soc: 0.0,
            step_hours: config.step_hours,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity_kwh(&self) -> f64 {
        self.capacity_kwh
    }

    pub fn max_power_kw(&self) -> f64 {
        self.max_power_kw
    }

    pub fn soc(&self) -> f64 {
        self.soc
    }

    /// Energy currently stored (kWh).
    pub fn stored_kwh(&self) -> f64 {
        self.soc * self.capacity_kwh
    }

    /// Pushes one step's net energy through the battery.
    ///
    /// 1. Energy beyond the inverter limit (`±max_power × step`) bypasses
    ///    the battery.
    /// 2. Above capacity the battery saturates and the overflow leaves,
    ///    derated by the round-trip efficiency.
    /// 3. Below empty the battery saturates and the shortfall passes on
    ///    unchanged.
    ///
    /// # Arguments
    ///
    /// * `net_kwh` - `generation - load` for the step (kWh)
    ///
    /// # Returns
    ///
    /// The residual energy still to be exchanged with the grid (kWh).
    pub fn dispatch(&mut self, net_kwh: f64) -> f64 {
        if self.capacity_kwh <= 0.0 {
            return net_kwh;
        }

        let limit_kwh = self.max_power_kw * self.step_hours;
        let (through_kwh, bypass_kwh) = if net_kwh > limit_kwh {
            (limit_kwh, net_kwh - limit_kwh)
        } else if net_kwh < -limit_kwh {
            (-limit_kwh, net_kwh + limit_kwh)
        } else {
            (net_kwh, 0.0)
        };

        let candidate_kwh = self.stored_kwh() + through_kwh;
        if candidate_kwh > self.capacity_kwh {
            self.soc = 1.0;
            bypass_kwh + self.efficiency * (candidate_kwh - self.capacity_kwh)
        } else if candidate_kwh < 0.0 {
            self.soc = 0.0;
            bypass_kwh + candidate_kwh
        } else {
            self.soc = (candidate_kwh / self.capacity_kwh).clamp(0.0, 1.0);
            bypass_kwh
        }
    }
}
