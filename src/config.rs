//! TOML-based scenario configuration and preset definitions.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::devices::{
    BatteryModel, CellTemperatureModel, ConstantCellTemperature, NmotCellTemperature, PanelModel,
    PanelSpec,
};
use crate::error::{Result, SimError};
use crate::io::ingest::{load_pvwatts, load_usage};
use crate::io::synthetic::{SyntheticProfile, generate_year};
use crate::sim::runner::Catalog;
use crate::sim::samples::SampleSet;
use crate::sim::types::SimConfig;
use crate::tariff::{
    DemandChargeRates, HourWindow, Seasonal, TimeOfUseRates, TouCalendar, TouRate, Tariff,
};

/// Top-level scenario configuration parsed from TOML.
///
/// Load from TOML with [`ScenarioConfig::from_toml_file`] or start from a
/// built-in preset with [`ScenarioConfig::from_preset`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Horizon, step size and run options.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Input data files.
    #[serde(default)]
    pub data: DataConfig,
    /// Panel options to compare.
    #[serde(default)]
    pub panels: Vec<PanelConfig>,
    /// Battery options to compare.
    #[serde(default)]
    pub batteries: Vec<BatteryConfig>,
    /// Tariff options to compare.
    #[serde(default)]
    pub tariffs: Vec<TariffConfig>,
}

/// Horizon, step size and run options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of passes over the sample year (must be > 0).
    pub years: usize,
    /// Step duration in hours (must be > 0).
    pub step_hours: f64,
    /// Calendar year of the sample data.
    pub data_year: i32,
    /// Run combinations on the rayon thread pool.
    pub parallel: bool,
    /// Seed of the synthetic data year.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            years: 1,
            step_hours: 1.0,
            data_year: 2020,
            parallel: true,
            seed: 42,
        }
    }
}

/// Input data files. A synthetic year is generated when both are absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// PVWatts hourly CSV export.
    pub weather_csv: Option<PathBuf>,
    /// Utility hourly usage CSV.
    pub load_csv: Option<PathBuf>,
}

/// Cell temperature model of a panel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case", deny_unknown_fields)]
pub enum ThermalConfig {
    /// Fixed cell temperature (°C).
    Constant {
        #[serde(default = "default_cell_temp_c")]
        cell_temp_c: f64,
    },
    /// NMOT-based model.
    Nmot {
        #[serde(default = "default_module_efficiency")]
        module_efficiency_stc: f64,
        #[serde(default = "default_tau_alpha")]
        tau_alpha: f64,
    },
}

fn default_cell_temp_c() -> f64 {
    ConstantCellTemperature::default().cell_temp_c
}

fn default_module_efficiency() -> f64 {
    NmotCellTemperature::default().module_efficiency_stc
}

fn default_tau_alpha() -> f64 {
    NmotCellTemperature::default().tau_alpha
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self::Constant {
            cell_temp_c: default_cell_temp_c(),
        }
    }
}

impl ThermalConfig {
    fn model(&self) -> Arc<dyn CellTemperatureModel> {
        match *self {
            Self::Constant { cell_temp_c } => Arc::new(ConstantCellTemperature { cell_temp_c }),
            Self::Nmot {
                module_efficiency_stc,
                tau_alpha,
            } => Arc::new(NmotCellTemperature {
                module_efficiency_stc,
                tau_alpha,
            }),
        }
    }
}

/// One panel option.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PanelConfig {
    /// Catalog identifier, used in combination keys.
    pub name: String,
    /// The "no panels" option, keyed as `None`; all other fields are ignored.
    pub none: bool,
    /// Rated array power at STC (kW).
    pub rated_kw: f64,
    /// Temperature coefficient of power (1/°C).
    pub tcp_per_c: f64,
    /// Annual degradation rate.
    pub degradation_per_year: f64,
    /// Nominal module operating temperature (°C).
    pub nmot_c: f64,
    /// Inverter and system efficiency.
    pub efficiency: f64,
    pub thermal: ThermalConfig,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            none: false,
            rated_kw: 4.0,
            tcp_per_c: -0.0035,
            degradation_per_year: 0.005,
            nmot_c: 44.0,
            efficiency: 0.95,
            thermal: ThermalConfig::default(),
        }
    }
}

impl PanelConfig {
    /// The "no panels" entry.
    pub fn none() -> Self {
        Self {
            name: "None".to_string(),
            none: true,
            ..Self::default()
        }
    }

    fn datasheet(
        name: &str,
        rated_kw: f64,
        tcp_per_c: f64,
        degradation_per_year: f64,
        nmot_c: f64,
        efficiency: f64,
        thermal: ThermalConfig,
    ) -> Self {
        Self {
            name: name.to_string(),
            none: false,
            rated_kw,
            tcp_per_c,
            degradation_per_year,
            nmot_c,
            efficiency,
            thermal,
        }
    }

    /// Builds the panel model.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Configuration`] for out-of-range datasheet values.
    pub fn build(&self, config: &SimConfig) -> Result<PanelModel> {
        if self.none {
            return Ok(PanelModel::none(config));
        }
        let spec = PanelSpec {
            name: self.name.clone(),
            rated_kw: self.rated_kw,
            tcp_per_c: self.tcp_per_c,
            degradation_per_year: self.degradation_per_year,
            nmot_c: self.nmot_c,
            efficiency: self.efficiency,
        };
        Ok(PanelModel::new(spec, config)?.with_temperature_model(self.thermal.model()))
    }
}

/// One battery option.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Catalog identifier, used in combination keys.
    pub name: String,
    /// The "no battery" option, keyed as `None`; all other fields are ignored.
    pub none: bool,
    /// Usable capacity (kWh).
    pub capacity_kwh: f64,
    /// Inverter continuous power (kW).
    pub max_power_kw: f64,
    /// Round-trip efficiency.
    pub efficiency: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            none: false,
            capacity_kwh: 13.5,
            max_power_kw: 5.0,
            efficiency: 0.9,
        }
    }
}

impl BatteryConfig {
    /// The "no battery" entry.
    pub fn none() -> Self {
        Self {
            name: "None".to_string(),
            none: true,
            ..Self::default()
        }
    }

    /// Builds the battery model.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Configuration`] for out-of-range values.
    pub fn build(&self, config: &SimConfig) -> Result<BatteryModel> {
        if self.none {
            return Ok(BatteryModel::none(config));
        }
        BatteryModel::new(
            self.name.clone(),
            self.capacity_kwh,
            self.max_power_kw,
            self.efficiency,
            config,
        )
    }
}

/// One tariff option.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum TariffConfig {
    /// Flat time-of-use pricing with a full rate table.
    TimeOfUse { name: String, rates: TimeOfUseRates },
    /// Time-of-use pricing plus daily demand charge with a full rate table.
    DemandCharge {
        name: String,
        rates: DemandChargeRates,
    },
    /// A built-in published tariff, see [`ScenarioConfig::TARIFF_PRESETS`].
    Preset {
        preset: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl TariffConfig {
    fn preset(preset: &str) -> Self {
        Self::Preset {
            preset: preset.to_string(),
            name: None,
        }
    }

    /// Identifier the tariff will carry in combination keys.
    pub fn name(&self) -> &str {
        match self {
            Self::TimeOfUse { name, .. } | Self::DemandCharge { name, .. } => name,
            Self::Preset {
                name: Some(name), ..
            } => name,
            Self::Preset { preset, name: None } => match preset.as_str() {
                "srp_e13" => "E13",
                "srp_e15" => "E15",
                other => other,
            },
        }
    }

    /// Builds the tariff.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Configuration`] for an unknown preset.
    pub fn build(&self, config: &SimConfig) -> Result<Tariff> {
        let tariff = match self {
            Self::TimeOfUse { name, rates } => Tariff::time_of_use(name.clone(), rates.clone(), config),
            Self::DemandCharge { name, rates } => {
                Tariff::demand_charge(name.clone(), rates.clone(), config)
            }
            Self::Preset { preset, .. } => match preset.as_str() {
                "srp_e13" => Tariff::time_of_use(self.name(), TimeOfUseRates::srp_e13(), config),
                "srp_e15" => {
                    Tariff::demand_charge(self.name(), DemandChargeRates::srp_e15(), config)
                }
                other => {
                    return Err(SimError::configuration(
                        "tariffs.preset",
                        format!(
                            "unknown tariff preset \"{other}\", available: {}",
                            ScenarioConfig::TARIFF_PRESETS.join(", ")
                        ),
                    ));
                }
            },
        };
        Ok(tariff)
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.years"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for SimError {
    fn from(e: ConfigError) -> Self {
        SimError::Configuration {
            field: e.field,
            message: e.message,
        }
    }
}

impl ScenarioConfig {
    /// Returns the SRP preset: the residential catalog this tool was built
    /// around (three panel datasheets, one home battery, E-13 and E-15).
    pub fn srp() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            data: DataConfig::default(),
            panels: vec![
                PanelConfig::none(),
                PanelConfig::datasheet(
                    "LG",
                    0.335 * 0.98,
                    -0.0036,
                    0.0033,
                    42.0,
                    0.95,
                    ThermalConfig::default(),
                ),
                PanelConfig::datasheet(
                    "REC",
                    0.330 * 0.975,
                    -0.0034,
                    0.007,
                    44.6,
                    0.95,
                    ThermalConfig::default(),
                ),
                PanelConfig::datasheet(
                    "SILFAB",
                    0.330 * 0.98,
                    -0.00377,
                    0.006,
                    43.5,
                    0.95,
                    ThermalConfig::default(),
                ),
            ],
            batteries: vec![
                BatteryConfig::none(),
                BatteryConfig {
                    name: "Tesla".to_string(),
                    ..BatteryConfig::default()
                },
            ],
            tariffs: vec![
                TariffConfig::preset("srp_e13"),
                TariffConfig::preset("srp_e15"),
            ],
        }
    }

    /// Returns the demo preset: a small multi-year catalog on synthetic data,
    /// with the NMOT thermal model and a custom flat tariff.
    pub fn demo() -> Self {
        let flat = TimeOfUseRates {
            energy: Seasonal::uniform(TouRate {
                on_peak: 0.12,
                off_peak: 0.12,
            }),
            export_rate: 0.04,
            service_charge: 15.0,
            calendar: TouCalendar::all_off_peak(),
        };
        Self {
            simulation: SimulationConfig {
                years: 2,
                ..SimulationConfig::default()
            },
            data: DataConfig::default(),
            panels: vec![
                PanelConfig::none(),
                PanelConfig::datasheet(
                    "Roof6kW",
                    6.0,
                    -0.0035,
                    0.005,
                    44.0,
                    0.96,
                    ThermalConfig::Nmot {
                        module_efficiency_stc: default_module_efficiency(),
                        tau_alpha: default_tau_alpha(),
                    },
                ),
            ],
            batteries: vec![
                BatteryConfig::none(),
                BatteryConfig {
                    name: "Small".to_string(),
                    capacity_kwh: 5.0,
                    max_power_kw: 2.5,
                    efficiency: 0.92,
                    none: false,
                },
            ],
            tariffs: vec![
                TariffConfig::preset("srp_e13"),
                TariffConfig::TimeOfUse {
                    name: "Flat".to_string(),
                    rates: flat,
                },
            ],
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["srp", "demo"];

    /// Available built-in tariff names for `kind = "preset"`.
    pub const TARIFF_PRESETS: &[&str] = &["srp_e13", "srp_e15"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "srp" => Ok(Self::srp()),
            "demo" => Ok(Self::demo()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// Relative data paths are resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        let mut cfg = Self::from_toml_str(&content)?;
        if let Some(dir) = path.parent() {
            for p in [&mut cfg.data.weather_csv, &mut cfg.data.load_csv]
                .into_iter()
                .flatten()
            {
                if p.is_relative() {
                    *p = dir.join(&*p);
                }
            }
        }
        Ok(cfg)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if s.years == 0 {
            errors.push(ConfigError::new("simulation.years", "must be > 0"));
        }
        if !(s.step_hours.is_finite() && s.step_hours > 0.0) {
            errors.push(ConfigError::new("simulation.step_hours", "must be > 0"));
        }

        let d = &self.data;
        if d.weather_csv.is_some() != d.load_csv.is_some() {
            errors.push(ConfigError::new(
                "data",
                "weather_csv and load_csv must be given together",
            ));
        }
        // Both the file readers and the synthetic generator produce hourly rows.
        if s.step_hours != 1.0 {
            errors.push(ConfigError::new(
                "simulation.step_hours",
                "must be 1.0, sample data is hourly",
            ));
        }

        if self.panels.is_empty() {
            errors.push(ConfigError::new("panels", "at least one panel option is required"));
        }
        for (i, p) in self.panels.iter().enumerate() {
            let field = |f: &str| format!("panels[{i}].{f}");
            if p.name.is_empty() && !p.none {
                errors.push(ConfigError::new(field("name"), "must not be empty"));
            }
            if p.none {
                continue;
            }
            if !(p.rated_kw.is_finite() && p.rated_kw > 0.0) {
                errors.push(ConfigError::new(field("rated_kw"), "must be > 0"));
            }
            if !(p.efficiency > 0.0 && p.efficiency <= 1.0) {
                errors.push(ConfigError::new(field("efficiency"), "must be in (0.0, 1.0]"));
            }
            if !(0.0..1.0).contains(&p.degradation_per_year) {
                errors.push(ConfigError::new(
                    field("degradation_per_year"),
                    "must be in [0.0, 1.0)",
                ));
            }
            if let ThermalConfig::Nmot {
                module_efficiency_stc,
                tau_alpha,
            } = p.thermal
            {
                if !(module_efficiency_stc > 0.0 && module_efficiency_stc < 1.0) {
                    errors.push(ConfigError::new(
                        field("thermal.module_efficiency_stc"),
                        "must be in (0.0, 1.0)",
                    ));
                }
                if !(tau_alpha > 0.0 && tau_alpha <= 1.0) {
                    errors.push(ConfigError::new(
                        field("thermal.tau_alpha"),
                        "must be in (0.0, 1.0]",
                    ));
                }
            }
        }
        duplicate_names(
            "panels",
            self.panels.iter().map(|p| display_name(&p.name, p.none)),
            &mut errors,
        );

        if self.batteries.is_empty() {
            errors.push(ConfigError::new(
                "batteries",
                "at least one battery option is required",
            ));
        }
        for (i, b) in self.batteries.iter().enumerate() {
            let field = |f: &str| format!("batteries[{i}].{f}");
            if b.name.is_empty() && !b.none {
                errors.push(ConfigError::new(field("name"), "must not be empty"));
            }
            if b.none {
                continue;
            }
            if !(b.capacity_kwh.is_finite() && b.capacity_kwh >= 0.0) {
                errors.push(ConfigError::new(field("capacity_kwh"), "must be >= 0"));
            }
            if !(b.max_power_kw.is_finite() && b.max_power_kw >= 0.0) {
                errors.push(ConfigError::new(field("max_power_kw"), "must be >= 0"));
            }
            if !(b.efficiency > 0.0 && b.efficiency <= 1.0) {
                errors.push(ConfigError::new(field("efficiency"), "must be in (0.0, 1.0]"));
            }
        }
        duplicate_names(
            "batteries",
            self.batteries.iter().map(|b| display_name(&b.name, b.none)),
            &mut errors,
        );

        if self.tariffs.is_empty() {
            errors.push(ConfigError::new("tariffs", "at least one tariff option is required"));
        }
        for (i, t) in self.tariffs.iter().enumerate() {
            let field = |f: &str| format!("tariffs[{i}].{f}");
            if t.name().is_empty() {
                errors.push(ConfigError::new(field("name"), "must not be empty"));
            }
            match t {
                TariffConfig::TimeOfUse { rates, .. } => {
                    if rates.service_charge < 0.0 {
                        errors.push(ConfigError::new(field("rates.service_charge"), "must be >= 0"));
                    }
                    check_calendar(&rates.calendar, &field("rates.calendar"), &mut errors);
                }
                TariffConfig::DemandCharge { rates, .. } => {
                    if rates.service_charge < 0.0 {
                        errors.push(ConfigError::new(field("rates.service_charge"), "must be >= 0"));
                    }
                    let d = &rates.demand_per_kw;
                    if [d.winter, d.summer, d.summer_peak].iter().any(|r| *r < 0.0) {
                        errors.push(ConfigError::new(field("rates.demand_per_kw"), "must be >= 0"));
                    }
                    check_calendar(&rates.calendar, &field("rates.calendar"), &mut errors);
                }
                TariffConfig::Preset { preset, .. } => {
                    if !Self::TARIFF_PRESETS.contains(&preset.as_str()) {
                        errors.push(ConfigError::new(
                            field("preset"),
                            format!(
                                "unknown tariff preset \"{preset}\", available: {}",
                                Self::TARIFF_PRESETS.join(", ")
                            ),
                        ));
                    }
                }
            }
        }
        duplicate_names(
            "tariffs",
            self.tariffs.iter().map(|t| t.name().to_string()),
            &mut errors,
        );

        errors
    }

    /// Step size and horizon of the run.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Configuration`] for a zero horizon or non-positive step.
    pub fn sim_config(&self) -> Result<SimConfig> {
        SimConfig::new(self.simulation.step_hours, self.simulation.years)
    }

    /// Builds every configured model into a catalog.
    ///
    /// # Errors
    ///
    /// Returns the first model construction error.
    pub fn catalog(&self, config: &SimConfig) -> Result<Catalog> {
        let panels = self
            .panels
            .iter()
            .map(|p| p.build(config))
            .collect::<Result<Vec<_>>>()?;
        let batteries = self
            .batteries
            .iter()
            .map(|b| b.build(config))
            .collect::<Result<Vec<_>>>()?;
        let tariffs = self
            .tariffs
            .iter()
            .map(|t| t.build(config))
            .collect::<Result<Vec<_>>>()?;
        Ok(Catalog::new(panels, batteries, tariffs))
    }

    /// Loads the configured data files, or generates a synthetic year.
    ///
    /// # Errors
    ///
    /// Returns an ingest error for unreadable files, or
    /// [`SimError::Configuration`] when the two series differ in length.
    pub fn samples(&self) -> Result<SampleSet> {
        match (&self.data.weather_csv, &self.data.load_csv) {
            (Some(weather), Some(load)) => {
                let weather = load_pvwatts(weather, self.simulation.data_year)?;
                let load = load_usage(load)?;
                SampleSet::new(weather, load)
            }
            _ => {
                info!(
                    year = self.simulation.data_year,
                    seed = self.simulation.seed,
                    "no data files configured, generating a synthetic year"
                );
                generate_year(
                    self.simulation.data_year,
                    self.simulation.seed,
                    &SyntheticProfile::default(),
                )
            }
        }
    }
}

/// Name an option carries in combination keys; "none" options are always `None`.
fn display_name(name: &str, none: bool) -> String {
    if none {
        "None".to_string()
    } else {
        name.to_string()
    }
}

fn duplicate_names(
    section: &str,
    names: impl Iterator<Item = String>,
    errors: &mut Vec<ConfigError>,
) {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.clone()) {
            errors.push(ConfigError::new(
                section,
                format!("duplicate name \"{name}\""),
            ));
        }
    }
}

fn check_calendar(calendar: &TouCalendar, field: &str, errors: &mut Vec<ConfigError>) {
    let w = &calendar.windows;
    let bad = |windows: &[HourWindow]| windows.iter().any(|w| w.start >= w.end || w.end > 24);
    if bad(&w.winter) || bad(&w.summer) || bad(&w.summer_peak) {
        errors.push(ConfigError::new(
            format!("{field}.windows"),
            "each window needs start < end <= 24",
        ));
    }
}
