//! Readers for PVWatts hourly weather exports and utility hourly usage downloads.
//!
//! Both formats arrive with quoted fields; the `csv` reader handles them in
//! place, so input files are never rewritten.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use tracing::{debug, warn};

use crate::error::{Result, SimError};
use crate::sim::types::{LoadSample, WeatherSample};

/// Timestamp layout of utility usage rows, e.g. `1/1/2020 12:0 am`.
const LOAD_TIMESTAMP_FORMAT: &str = "%m/%d/%Y %I:%M %p";

/// PVWatts column positions in the hourly table.
mod pvwatts {
    pub const MONTH: usize = 0;
    pub const DAY: usize = 1;
    pub const HOUR: usize = 2;
    pub const AMBIENT_TEMP_C: usize = 5;
    pub const POA_IRRADIANCE_W_M2: usize = 7;
}

fn reader<R: Read>(source: R, has_headers: bool) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source)
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, csv::Position::line)
}

fn field<'r>(record: &'r StringRecord, index: usize, path: &Path, name: &str) -> Result<&'r str> {
    record.get(index).ok_or_else(|| SimError::Ingest {
        path: path.to_path_buf(),
        line: line_of(record),
        message: format!("missing column {name} (index {index})"),
    })
}

fn number<T: std::str::FromStr>(
    record: &StringRecord,
    index: usize,
    path: &Path,
    name: &str,
) -> Result<T> {
    let raw = field(record, index, path, name)?;
    raw.parse().map_err(|_| SimError::Ingest {
        path: path.to_path_buf(),
        line: line_of(record),
        message: format!("{name}: cannot parse {raw:?}"),
    })
}

/// Reads a PVWatts hourly CSV export from disk.
///
/// # Errors
///
/// Returns [`SimError::Io`] if the file cannot be opened, or see
/// [`read_pvwatts`].
pub fn load_pvwatts(path: &Path, year: i32) -> Result<Vec<WeatherSample>> {
    let file = File::open(path)?;
    read_pvwatts(file, path, year)
}

/// Parses a PVWatts hourly table.
///
/// Metadata rows before the `Month` header are skipped and a trailing
/// `Totals` row ends the table. PVWatts rows carry no year, so every row is
/// stamped with `year`. Plane-of-array irradiance is converted from W/m² to
/// kW/m².
///
/// # Arguments
///
/// * `source` - CSV contents
/// * `path` - Origin of the data, used in error messages
/// * `year` - Calendar year of the samples
///
/// # Errors
///
/// Returns [`SimError::Ingest`] for a missing header, an unparsable number
/// or an impossible date.
pub fn read_pvwatts<R: Read>(source: R, path: &Path, year: i32) -> Result<Vec<WeatherSample>> {
    let mut rdr = reader(source, false);
    let mut samples = Vec::with_capacity(8760);
    let mut in_table = false;

    for record in rdr.records() {
        let record = record?;
        let first = record.get(0).unwrap_or_default();
        if !in_table {
            in_table = first.eq_ignore_ascii_case("month");
            continue;
        }
        if first.eq_ignore_ascii_case("totals") || first.is_empty() {
            break;
        }

        let month: u32 = number(&record, pvwatts::MONTH, path, "Month")?;
        let day: u32 = number(&record, pvwatts::DAY, path, "Day")?;
        let hour: u32 = number(&record, pvwatts::HOUR, path, "Hour")?;
        let ambient_temp_c: f64 =
            number(&record, pvwatts::AMBIENT_TEMP_C, path, "Ambient Temperature")?;
        let poa_w_m2: f64 = number(
            &record,
            pvwatts::POA_IRRADIANCE_W_M2,
            path,
            "Plane of Array Irradiance",
        )?;

        let timestamp = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .ok_or_else(|| SimError::Ingest {
                path: path.to_path_buf(),
                line: line_of(&record),
                message: format!("invalid date {year}-{month}-{day} hour {hour}"),
            })?;

        if poa_w_m2 < 0.0 {
            warn!(%timestamp, poa_w_m2, "negative irradiance in weather data");
        }
        samples.push(WeatherSample {
            timestamp,
            irradiance_kw_m2: poa_w_m2 / 1000.0,
            ambient_temp_c,
        });
    }

    if !in_table {
        return Err(SimError::Ingest {
            path: path.to_path_buf(),
            line: 0,
            message: "no \"Month\" header row found".to_string(),
        });
    }
    debug!(path = %path.display(), rows = samples.len(), "weather data loaded");
    Ok(samples)
}

/// Reads a utility hourly usage CSV from disk.
///
/// # Errors
///
/// Returns [`SimError::Io`] if the file cannot be opened, or see
/// [`read_usage`].
pub fn load_usage(path: &Path) -> Result<Vec<LoadSample>> {
    let file = File::open(path)?;
    read_usage(file, path)
}

/// Parses a utility hourly usage table with a header row and
/// `date, time, kWh` columns, e.g. `1/1/2020, 12:0 am, 1.2`.
///
/// # Errors
///
/// Returns [`SimError::Ingest`] for an unparsable timestamp or energy value.
pub fn read_usage<R: Read>(source: R, path: &Path) -> Result<Vec<LoadSample>> {
    let mut rdr = reader(source, true);
    let mut samples = Vec::with_capacity(8760);

    for record in rdr.records() {
        let record = record?;
        let date = field(&record, 0, path, "date")?;
        let time = field(&record, 1, path, "time")?;
        let stamp = format!("{date} {time}");
        let timestamp = NaiveDateTime::parse_from_str(&stamp, LOAD_TIMESTAMP_FORMAT).map_err(
            |e| SimError::Ingest {
                path: path.to_path_buf(),
                line: line_of(&record),
                message: format!("timestamp {stamp:?}: {e}"),
            },
        )?;
        let load_kwh: f64 = number(&record, 2, path, "kWh")?;
        if load_kwh < 0.0 {
            warn!(%timestamp, load_kwh, "negative load in usage data");
        }
        samples.push(LoadSample {
            timestamp,
            load_kwh,
        });
    }

    debug!(path = %path.display(), rows = samples.len(), "usage data loaded");
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const PVWATTS: &str = "\
\"Requested Location\",\"phoenix\"
\"Location\",\"Lat, Lng: 33.45, -112.06\"
\"Lat (deg N)\",\"33.45\"
\"DC System Size (kW)\",\"4\"
\"Month\",\"Day\",\"Hour\",\"Beam Irradiance (W/m^2)\",\"Diffuse Irradiance (W/m^2)\",\"Ambient Temperature (C)\",\"Wind Speed (m/s)\",\"Plane of Array Irradiance (W/m^2)\",\"Cell Temperature (C)\",\"DC Array Output (W)\",\"AC System Output (W)\"
\"1\",\"1\",\"0\",\"0\",\"0\",\"8.5\",\"1\",\"0\",\"8.5\",\"0\",\"0\"
\"1\",\"1\",\"12\",\"850\",\"90\",\"18\",\"2\",\"812.5\",\"40\",\"3000\",\"2900\"
\"Totals\",\"\",\"\",\"\",\"\",\"\",\"\",\"2000000\",\"\",\"\",\"7000\"
";

    const USAGE: &str = "\
\"Date\",\"Time\",\"kWh\"
\"1/1/2020\",\"12:0 am\",\"1.2\"
\"1/1/2020\",\"1:0 pm\",\"0.75\"
";

    fn ts(m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, m, d)
            .and_then(|d| d.and_hms_opt(h, 0, 0))
            .unwrap()
    }

    #[test]
    fn pvwatts_skips_preamble_and_totals() {
        let rows = read_pvwatts(PVWATTS.as_bytes(), Path::new("pv.csv"), 2020).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].timestamp, ts(1, 1, 0));
        assert_eq!(rows[1].timestamp, ts(1, 1, 12));
        assert_relative_eq!(rows[1].irradiance_kw_m2, 0.8125, epsilon = 1e-12);
        assert_relative_eq!(rows[1].ambient_temp_c, 18.0, epsilon = 1e-12);
    }

    #[test]
    fn pvwatts_without_header_is_rejected() {
        let err = read_pvwatts("a,b\n1,2\n".as_bytes(), Path::new("pv.csv"), 2020);
        assert!(matches!(err, Err(SimError::Ingest { .. })));
    }

    #[test]
    fn pvwatts_bad_number_reports_line() {
        let data = "Month,Day,Hour,b,d,t,w,p\n1,1,x,0,0,10,1,0\n";
        match read_pvwatts(data.as_bytes(), Path::new("pv.csv"), 2020) {
            Err(SimError::Ingest { line, message, .. }) => {
                assert_eq!(line, 2);
                assert!(message.contains("Hour"));
            }
            other => panic!("expected Ingest error, got {other:?}"),
        }
    }

    #[test]
    fn usage_parses_twelve_hour_clock() {
        let rows = read_usage(USAGE.as_bytes(), Path::new("usage.csv")).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].timestamp, ts(1, 1, 0));
        assert_eq!(rows[1].timestamp, ts(1, 1, 13));
        assert_relative_eq!(rows[0].load_kwh, 1.2, epsilon = 1e-12);
    }

    #[test]
    fn usage_rejects_bad_timestamp() {
        let data = "Date,Time,kWh\n13/45/2020,1:0 pm,1.0\n";
        let err = read_usage(data.as_bytes(), Path::new("usage.csv"));
        assert!(matches!(err, Err(SimError::Ingest { .. })));
    }
}
