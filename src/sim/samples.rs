//! The aligned weather and load series one sample year is built from.

use chrono::TimeDelta;

use crate::error::{Result, SimError};

use super::types::{LoadSample, WeatherSample};

/// Two ordered hourly series covering the same span of time.
///
/// Both series must have one record per step. Alignment of individual
/// timestamps is checked lazily by [`SampleSet::pair`], so a mismatch is
/// reported at the exact step where it happens.
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    weather: Vec<WeatherSample>,
    load: Vec<LoadSample>,
}

impl SampleSet {
    /// Bundles a weather series and a load series.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Configuration`] if the series differ in length or are empty.
    pub fn new(weather: Vec<WeatherSample>, load: Vec<LoadSample>) -> Result<Self> {
        if weather.len() != load.len() {
            return Err(SimError::configuration(
                "data",
                format!(
                    "weather has {} samples but load has {}",
                    weather.len(),
                    load.len()
                ),
            ));
        }
        if weather.is_empty() {
            return Err(SimError::configuration("data", "no samples"));
        }
        Ok(Self { weather, load })
    }

    pub fn len(&self) -> usize {
        self.weather.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weather.is_empty()
    }

    pub fn weather(&self) -> &[WeatherSample] {
        &self.weather
    }

    pub fn load(&self) -> &[LoadSample] {
        &self.load
    }

    /// Checks that consecutive samples are exactly `step_hours` apart.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Configuration`] naming the first sample whose
    /// distance to its predecessor differs from the step.
    pub fn check_spacing(&self, step_hours: f64) -> Result<()> {
        let step = TimeDelta::seconds((step_hours * 3600.0).round() as i64);
        for (i, pair) in self.weather.windows(2).enumerate() {
            let gap = pair[1].timestamp - pair[0].timestamp;
            if gap != step {
                return Err(SimError::configuration(
                    "simulation.step_hours",
                    format!(
                        "samples {i} and {} are {} min apart, expected {} min",
                        i + 1,
                        gap.num_minutes(),
                        step.num_minutes()
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Returns the weather and load samples at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::DataIntegrity`] when the two timestamps differ, and
    /// [`SimError::Configuration`] when `index` is past the end.
    pub fn pair(&self, index: usize) -> Result<(&WeatherSample, &LoadSample)> {
        let (Some(weather), Some(load)) = (self.weather.get(index), self.load.get(index)) else {
            return Err(SimError::configuration(
                "data",
                format!("sample {index} out of range ({} samples)", self.len()),
            ));
        };
        if weather.timestamp != load.timestamp {
            return Err(SimError::DataIntegrity {
                index,
                weather: weather.timestamp,
                load: load.timestamp,
            });
        }
        Ok((weather, load))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, 1)
            .and_then(|d| d.and_hms_opt(h, 0, 0))
            .unwrap()
    }

    fn weather(h: u32) -> WeatherSample {
        WeatherSample {
            timestamp: at(h),
            irradiance_kw_m2: 0.0,
            ambient_temp_c: 10.0,
        }
    }

    fn load(h: u32) -> LoadSample {
        LoadSample {
            timestamp: at(h),
            load_kwh: 1.0,
        }
    }

    #[test]
    fn rejects_length_mismatch() {
        assert!(SampleSet::new(vec![weather(0), weather(1)], vec![load(0)]).is_err());
    }

    #[test]
    fn rejects_empty_series() {
        assert!(SampleSet::new(Vec::new(), Vec::new()).is_err());
    }

    #[test]
    fn spacing_must_match_the_step() {
        let set = SampleSet::new(
            vec![weather(0), weather(1), weather(2)],
            vec![load(0), load(1), load(2)],
        )
        .unwrap();
        assert!(set.check_spacing(1.0).is_ok());
        assert!(matches!(
            set.check_spacing(2.0),
            Err(SimError::Configuration { .. })
        ));
        assert!(set.check_spacing(0.5).is_err());
    }

    #[test]
    fn gap_in_the_series_is_rejected() {
        let set = SampleSet::new(
            vec![weather(0), weather(1), weather(3)],
            vec![load(0), load(1), load(3)],
        )
        .unwrap();
        let err = set.check_spacing(1.0).unwrap_err();
        assert!(err.to_string().contains("samples 1 and 2"));
    }

    #[test]
    fn pair_returns_aligned_samples() {
        let set = SampleSet::new(vec![weather(0), weather(1)], vec![load(0), load(1)]).unwrap();
        let (w, l) = set.pair(1).unwrap();
        assert_eq!(w.timestamp, l.timestamp);
    }

    #[test]
    fn pair_reports_timestamp_mismatch() {
        let set = SampleSet::new(vec![weather(0), weather(2)], vec![load(0), load(1)]).unwrap();
        match set.pair(1) {
            Err(SimError::DataIntegrity {
                index,
                weather,
                load,
            }) => {
                assert_eq!(index, 1);
                assert_eq!(weather, at(2));
                assert_eq!(load, at(1));
            }
            other => panic!("expected DataIntegrity, got {other:?}"),
        }
    }
}
