use std::fmt;
use std::sync::Arc;

use crate::error::{Result, SimError};
use crate::sim::types::{HOURS_PER_YEAR, SimConfig};

/// Irradiance at standard test conditions (kW/m²).
pub const IRRADIANCE_STC_KW_M2: f64 = 1.0;
/// Cell temperature at standard test conditions (°C).
pub const TEMP_STC_C: f64 = 25.0;
/// Ambient temperature at nominal module operating conditions (°C).
pub const TEMP_AMBIENT_NMOT_C: f64 = 20.0;
/// Irradiance at nominal module operating conditions (kW/m²).
pub const IRRADIANCE_NMOT_KW_M2: f64 = 0.8;

/// Panel parameters a cell temperature model may depend on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalParams {
    /// Nominal module operating temperature (°C).
    pub nmot_c: f64,
    /// Temperature coefficient of power (1/°C, negative).
    pub tcp_per_c: f64,
}

/// Estimates the cell temperature of a module for one step.
///
/// Implementations are swapped into a [`PanelModel`] without touching the
/// simulator.
pub trait CellTemperatureModel: fmt::Debug + Send + Sync {
    /// Returns the cell temperature in °C.
    ///
    /// # Arguments
    ///
    /// * `params` - Thermal parameters of the panel
    /// * `irradiance_kw_m2` - Plane-of-array irradiance (kW/m²)
    /// * `ambient_c` - Ambient temperature (°C)
    fn cell_temp_c(&self, params: &ThermalParams, irradiance_kw_m2: f64, ambient_c: f64) -> f64;
}

/// Placeholder model: the cell always sits at a fixed temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantCellTemperature {
    pub cell_temp_c: f64,
}

impl Default for ConstantCellTemperature {
    fn default() -> Self {
        Self { cell_temp_c: 40.0 }
    }
}

impl CellTemperatureModel for ConstantCellTemperature {
    fn cell_temp_c(&self, _params: &ThermalParams, _irradiance_kw_m2: f64, _ambient_c: f64) -> f64 {
        self.cell_temp_c
    }
}

/// NMOT-based cell temperature with the efficiency correction used by HOMER.
///
/// ```text
///        Ta + (Tnmot - Ta,nmot)·(G / Gnmot)·(1 - η·(1 - αp·Tstc) / τα)
/// Tc = ─────────────────────────────────────────────────────────────────
///                1 + (Tnmot - Ta,nmot)·(G / Gnmot)·(αp·η / τα)
/// ```
///
/// With no irradiance the cell sits at ambient temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NmotCellTemperature {
    /// Module efficiency at standard test conditions (η).
    pub module_efficiency_stc: f64,
    /// Solar transmittance-absorptance product (τα).
    pub tau_alpha: f64,
}

impl Default for NmotCellTemperature {
    fn default() -> Self {
        Self {
            module_efficiency_stc: 0.20,
            tau_alpha: 0.9,
        }
    }
}

impl CellTemperatureModel for NmotCellTemperature {
    fn cell_temp_c(&self, params: &ThermalParams, irradiance_kw_m2: f64, ambient_c: f64) -> f64 {
        let eta = self.module_efficiency_stc;
        let k = (params.nmot_c - TEMP_AMBIENT_NMOT_C) * (irradiance_kw_m2 / IRRADIANCE_NMOT_KW_M2);
        let numerator =
            ambient_c + k * (1.0 - eta * (1.0 - params.tcp_per_c * TEMP_STC_C) / self.tau_alpha);
        let denominator = 1.0 + k * (params.tcp_per_c * eta / self.tau_alpha);
        numerator / denominator
    }
}

/// Datasheet values of a panel array.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSpec {
    pub name: String,
    /// Rated power at standard test conditions (kW, > 0).
    pub rated_kw: f64,
    /// Temperature coefficient of power (1/°C, negative).
    pub tcp_per_c: f64,
    /// Annual degradation rate (0 <= d < 1).
    pub degradation_per_year: f64,
    /// Nominal module operating temperature (°C).
    pub nmot_c: f64,
    /// Inverter and balance-of-system efficiency (0 < e <= 1).
    pub efficiency: f64,
}

/// A solar array that converts irradiance into energy and ages every step.
///
/// Output power follows
/// `rated × efficiency × (G / Gstc) × (1 + tcp × (Tcell − Tstc))` and is
/// reported raw: extreme inputs may yield a negative value, which the
/// simulator treats as zero generation.
#[derive(Debug, Clone)]
pub struct PanelModel {
    name: String,
    rated_power_kw: f64,
    thermal: ThermalParams,
    degradation_per_year: f64,
    efficiency: f64,
    step_hours: f64,
    temperature_model: Arc<dyn CellTemperatureModel>,
}

impl PanelModel {
    /// Creates a panel from its datasheet with the constant cell temperature model.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Configuration`] if the rated power is not positive,
    /// the efficiency is outside (0, 1], or the degradation rate is outside [0, 1).
    pub fn new(spec: PanelSpec, config: &SimConfig) -> Result<Self> {
        let field = |f: &str| format!("panel[{}].{f}", spec.name);
        if !(spec.rated_kw.is_finite() && spec.rated_kw > 0.0) {
            return Err(SimError::configuration(field("rated_kw"), "must be > 0"));
        }
        if !(spec.efficiency > 0.0 && spec.efficiency <= 1.0) {
            return Err(SimError::configuration(field("efficiency"), "must be in (0, 1]"));
        }
        if !(0.0..1.0).contains(&spec.degradation_per_year) {
            return Err(SimError::configuration(
                field("degradation_per_year"),
                "must be in [0, 1)",
            ));
        }
        if !spec.tcp_per_c.is_finite() || !spec.nmot_c.is_finite() {
            return Err(SimError::configuration(field("tcp_per_c"), "must be finite"));
        }

        Ok(Self {
            name: spec.name,
            rated_power_kw: spec.rated_kw,
            thermal: ThermalParams {
                nmot_c: spec.nmot_c,
                tcp_per_c: spec.tcp_per_c,
            },
            degradation_per_year: spec.degradation_per_year,
            efficiency: spec.efficiency,
            step_hours: config.step_hours,
            temperature_model: Arc::new(ConstantCellTemperature::default()),
        })
    }

    /// The "no panels installed" option: never generates anything.
    pub fn none(config: &SimConfig) -> Self {
        Self {
            name: "None".to_string(),
            rated_power_kw: 0.0,
            thermal: ThermalParams {
                nmot_c: 0.0,
                tcp_per_c: 0.0,
            },
            degradation_per_year: 0.0,
            efficiency: 1.0,
            step_hours: config.step_hours,
            temperature_model: Arc::new(ConstantCellTemperature::default()),
        }
    }

    /// Replaces the cell temperature model.
    #[must_use]
    pub fn with_temperature_model(mut self, model: Arc<dyn CellTemperatureModel>) -> Self {
        self.temperature_model = model;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current derated rated power (kW).
    pub fn rated_power_kw(&self) -> f64 {
        self.rated_power_kw
    }

    pub fn thermal(&self) -> ThermalParams {
        self.thermal
    }

    /// Multiplier applied to the rated power after every step.
    fn degradation_factor(&self) -> f64 {
        1.0 - self.degradation_per_year * self.step_hours / HOURS_PER_YEAR
    }

    /// Output power for the current rated power, without side effects (kW).
    pub fn power_kw(&self, irradiance_kw_m2: f64, ambient_c: f64) -> f64 {
        let cell_c = self
            .temperature_model
            .cell_temp_c(&self.thermal, irradiance_kw_m2, ambient_c);
        self.rated_power_kw
            * self.efficiency
            * (irradiance_kw_m2 / IRRADIANCE_STC_KW_M2)
            * (1.0 + self.thermal.tcp_per_c * (cell_c - TEMP_STC_C))
    }

    /// Computes the energy produced during one step and then degrades the panel.
    ///
    /// Degradation applies on every call, whether or not the sun was up.
    ///
    /// # Returns
    ///
    /// Energy in kWh for the step (may be negative for non-physical inputs).
    pub fn generate(&mut self, irradiance_kw_m2: f64, ambient_c: f64) -> f64 {
        let energy_kwh = self.power_kw(irradiance_kw_m2, ambient_c) * self.step_hours;
        self.rated_power_kw = (self.rated_power_kw * self.degradation_factor()).max(0.0);
        energy_kwh
    }
}
