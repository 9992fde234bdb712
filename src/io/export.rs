//! CSV and JSON export for settled bills and step telemetry.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::sim::runner::SimulationResult;
use crate::sim::types::StepResult;

/// Column header of the bills CSV.
const BILLS_HEADER: &str = "combination,period,usage_cost,demand_charge,service_charge,total";

/// Column header of the step telemetry CSV.
const TELEMETRY_HEADER: &str = "step,timestamp,generation_kwh,load_kwh,net_kwh,\
                                residual_kwh,grid_kwh,battery_soc,rated_power_kw,settled";

/// Timestamp layout used in exported files.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

fn create(path: &Path) -> io::Result<io::BufWriter<File>> {
    Ok(io::BufWriter::new(File::create(path)?))
}

/// Exports every settled bill to a CSV file at the given path.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn export_bills_csv(result: &SimulationResult, path: &Path) -> Result<()> {
    write_bills_csv(result, create(path)?)
}

/// Writes one row per settled bill, combinations in catalog order and
/// bills in chronological order within each combination.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_bills_csv(result: &SimulationResult, writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(BILLS_HEADER.split(','))?;
    for run in result.iter() {
        let key = run.key.to_string();
        for b in &run.bills {
            wtr.write_record(&[
                key.clone(),
                b.period_end.format("%Y-%m").to_string(),
                format!("{:.4}", b.usage_cost),
                format!("{:.4}", b.demand_charge),
                format!("{:.2}", b.service_charge),
                format!("{:.2}", b.total),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Exports a step log to a CSV file at the given path.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn export_telemetry_csv(steps: &[StepResult], path: &Path) -> Result<()> {
    write_telemetry_csv(steps, create(path)?)
}

/// Writes one row per simulated step.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_telemetry_csv(steps: &[StepResult], writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(TELEMETRY_HEADER.split(',').map(str::trim))?;
    for r in steps {
        wtr.write_record(&[
            r.step.to_string(),
            r.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.4}", r.generation_kwh),
            format!("{:.4}", r.load_kwh),
            format!("{:.4}", r.net_kwh),
            format!("{:.4}", r.residual_kwh),
            format!("{:.4}", r.grid_kwh),
            format!("{:.4}", r.battery_soc),
            format!("{:.5}", r.rated_power_kw),
            r.settled.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    combination: String,
    amounts: Vec<f64>,
    bills: &'a [crate::tariff::Bill],
}

/// Exports the result mapping as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn export_json(result: &SimulationResult, path: &Path) -> Result<()> {
    write_json(result, create(path)?)
}

/// Writes the result as a JSON array of
/// `{ "combination", "amounts", "bills" }` objects in catalog order.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json(result: &SimulationResult, mut writer: impl Write) -> Result<()> {
    let entries: Vec<JsonEntry<'_>> = result
        .iter()
        .map(|run| JsonEntry {
            combination: run.key.to_string(),
            amounts: run.amounts(),
            bills: &run.bills,
        })
        .collect();
    serde_json::to_writer_pretty(&mut writer, &entries).map_err(io::Error::from)?;
    writeln!(writer)?;
    Ok(())
}
