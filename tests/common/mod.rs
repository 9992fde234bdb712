//! Shared test fixtures for integration tests.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use solar_bill_sim::devices::{BatteryModel, PanelModel, PanelSpec};
use solar_bill_sim::sim::samples::SampleSet;
use solar_bill_sim::sim::types::{LoadSample, SimConfig, WeatherSample};
use solar_bill_sim::tariff::{Seasonal, Tariff, TimeOfUseRates, TouCalendar, TouRate};

/// Flat off-peak price of [`flat_tariff`] (per kWh).
pub const FLAT_RATE: f64 = 0.1;
/// Monthly service charge of [`flat_tariff`].
pub const FLAT_SERVICE: f64 = 10.0;

/// Hourly single-year configuration.
pub fn default_config() -> SimConfig {
    SimConfig::default()
}

/// Midnight on January 1st of `year`.
pub fn new_year(year: i32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
}

/// Aligned hourly series built from per-hour closures.
///
/// `irradiance` and `load` receive the hour offset from `start`.
pub fn hourly_samples(
    start: NaiveDateTime,
    hours: usize,
    irradiance: impl Fn(usize) -> f64,
    load: impl Fn(usize) -> f64,
) -> SampleSet {
    let mut weather = Vec::with_capacity(hours);
    let mut loads = Vec::with_capacity(hours);
    for h in 0..hours {
        let timestamp = start + TimeDelta::hours(h as i64);
        weather.push(WeatherSample {
            timestamp,
            irradiance_kw_m2: irradiance(h),
            ambient_temp_c: 25.0,
        });
        loads.push(LoadSample {
            timestamp,
            load_kwh: load(h),
        });
    }
    SampleSet::new(weather, loads).unwrap()
}

/// A full calendar year of darkness with a constant household load.
pub fn constant_load_year(year: i32, load_kwh: f64) -> SampleSet {
    let start = new_year(year);
    let hours = (new_year(year + 1) - start).num_hours() as usize;
    hourly_samples(start, hours, |_| 0.0, |_| load_kwh)
}

/// Time-of-use tariff with no on-peak hours: every import costs [`FLAT_RATE`].
pub fn flat_tariff(name: &str, config: &SimConfig) -> Tariff {
    let rates = TimeOfUseRates {
        energy: Seasonal::uniform(TouRate {
            on_peak: 0.3,
            off_peak: FLAT_RATE,
        }),
        export_rate: 0.05,
        service_charge: FLAT_SERVICE,
        calendar: TouCalendar::all_off_peak(),
    };
    Tariff::time_of_use(name, rates, config)
}

/// A loss-free 4 kW array with no temperature sensitivity.
pub fn ideal_panel(name: &str, degradation_per_year: f64, config: &SimConfig) -> PanelModel {
    let spec = PanelSpec {
        name: name.into(),
        rated_kw: 4.0,
        tcp_per_c: 0.0,
        degradation_per_year,
        nmot_c: 45.0,
        efficiency: 1.0,
    };
    PanelModel::new(spec, config).unwrap()
}

/// Tesla-like 13.5 kWh / 5 kW battery with 90% round-trip efficiency.
pub fn home_battery(config: &SimConfig) -> BatteryModel {
    BatteryModel::new("Home", 13.5, 5.0, 0.9, config).unwrap()
}
