//! Seeded synthetic weather and load year for demos and tests.

use std::f64::consts::PI;

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::error::{Result, SimError};
use crate::sim::samples::SampleSet;
use crate::sim::types::{LoadSample, WeatherSample};

/// Shape parameters of the synthetic year.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticProfile {
    /// Clear-sky plane-of-array irradiance at solar noon on the summer solstice (kW/m²).
    pub peak_irradiance_kw_m2: f64,
    /// Fraction of the summer peak still reached at solar noon in midwinter.
    pub winter_fraction: f64,
    /// Day length at the summer and winter solstice (hours).
    pub day_length_h: (f64, f64),
    /// Daily mean ambient temperature in midsummer and midwinter (°C).
    pub mean_temp_c: (f64, f64),
    /// Peak-to-mean daily temperature swing (°C).
    pub daily_swing_c: f64,
    /// Average household draw (kW).
    pub base_load_kw: f64,
    /// Amplitude of the daily load cycle (kW).
    pub load_amp_kw: f64,
    /// Standard deviation of the load noise (kW).
    pub load_noise_kw: f64,
    /// Standard deviation of the cloud attenuation (fraction of clear sky).
    pub cloud_noise: f64,
}

impl Default for SyntheticProfile {
    /// A sunny desert climate with an evening-heavy household load.
    fn default() -> Self {
        Self {
            peak_irradiance_kw_m2: 0.95,
            winter_fraction: 0.6,
            day_length_h: (14.3, 10.0),
            mean_temp_c: (35.0, 13.0),
            daily_swing_c: 7.0,
            base_load_kw: 1.2,
            load_amp_kw: 0.6,
            load_noise_kw: 0.1,
            cloud_noise: 0.1,
        }
    }
}

/// Gaussian noise via the Box-Muller transform.
///
/// # Returns
///
/// Random value with mean 0 and the given standard deviation
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-9, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    z0 * std_dev
}

/// Half-cosine daylight shape: 0 outside `[sunrise, sunset)`, 1 at solar noon.
pub fn daylight_frac(hour: f64, sunrise: f64, sunset: f64) -> f64 {
    if hour < sunrise || hour >= sunset {
        return 0.0;
    }
    let pos = (hour - sunrise) / (sunset - sunrise);
    (PI * pos).sin().max(0.0)
}

/// Seasonal position in [-1, 1]: 1 at the summer solstice, -1 in midwinter.
fn season(timestamp: NaiveDateTime) -> f64 {
    let day = f64::from(timestamp.ordinal0());
    // Solstice near day 171 (June 20).
    (2.0 * PI * (day - 171.0) / 365.0).cos()
}

fn lerp(summer: f64, winter: f64, season: f64) -> f64 {
    let w = (season + 1.0) / 2.0;
    winter + (summer - winter) * w
}

/// Generates one hourly year of weather and load.
///
/// The same `seed` always yields the same samples.
///
/// # Errors
///
/// Returns [`SimError::Configuration`] if `year` is outside chrono's range.
pub fn generate_year(year: i32, seed: u64, profile: &SyntheticProfile) -> Result<SampleSet> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| SimError::configuration("simulation.data_year", "year out of range"))?;
    let hours = if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366 * 24
    } else {
        365 * 24
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let mut weather = Vec::with_capacity(hours);
    let mut load = Vec::with_capacity(hours);

    for h in 0..hours {
        let timestamp = start + TimeDelta::hours(h as i64);
        let s = season(timestamp);
        let hour = f64::from(timestamp.hour()) + 0.5;

        let day_len = lerp(profile.day_length_h.0, profile.day_length_h.1, s);
        let sunrise = 12.0 - day_len / 2.0;
        let peak = profile.peak_irradiance_kw_m2 * lerp(1.0, profile.winter_fraction, s);
        let cloud = (1.0 - gaussian_noise(&mut rng, profile.cloud_noise).abs()).clamp(0.0, 1.0);
        let irradiance_kw_m2 = peak * daylight_frac(hour, sunrise, sunrise + day_len) * cloud;

        // Coldest before dawn, warmest mid-afternoon.
        let mean_c = lerp(profile.mean_temp_c.0, profile.mean_temp_c.1, s);
        let ambient_temp_c = mean_c + profile.daily_swing_c * (2.0 * PI * (hour - 9.0) / 24.0).sin();

        // Evening peak, overnight trough; more air conditioning in summer.
        let cycle = (2.0 * PI * (hour - 13.0) / 24.0).sin();
        let cooling = 1.0 + 0.5 * s.max(0.0);
        let load_kwh = (profile.base_load_kw * cooling
            + profile.load_amp_kw * cycle
            + gaussian_noise(&mut rng, profile.load_noise_kw))
        .max(0.0);

        weather.push(WeatherSample {
            timestamp,
            irradiance_kw_m2,
            ambient_temp_c,
        });
        load.push(LoadSample {
            timestamp,
            load_kwh,
        });
    }

    SampleSet::new(weather, load)
}
