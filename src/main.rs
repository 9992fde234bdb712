//! Bill simulator entry point: CLI wiring and config-driven catalog runs.

mod cli;
mod telemetry;

use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::info;

use solar_bill_sim::config::ScenarioConfig;
use solar_bill_sim::io::export::{export_bills_csv, export_json, export_telemetry_csv};
use solar_bill_sim::reporting::print_summary;
use solar_bill_sim::sim::runner::{simulate, trace_combination};

use crate::cli::Cli;

/// Resolves the scenario: `--scenario` file, otherwise `--preset`, then CLI overrides.
fn load_scenario(cli: &Cli) -> anyhow::Result<ScenarioConfig> {
    let mut scenario = match cli.scenario {
        Some(ref path) => ScenarioConfig::from_toml_file(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => ScenarioConfig::from_preset(&cli.preset)?,
    };

    if let (Some(weather), Some(load)) = (&cli.weather, &cli.load) {
        scenario.data.weather_csv = Some(weather.clone());
        scenario.data.load_csv = Some(load.clone());
    }
    if let Some(years) = cli.years {
        scenario.simulation.years = years;
    }
    if cli.sequential {
        scenario.simulation.parallel = false;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        bail!("invalid scenario ({} errors)", errors.len());
    }
    Ok(scenario)
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let scenario = load_scenario(cli)?;
    let sim_config = scenario.sim_config()?;
    let catalog = scenario
        .catalog(&sim_config)
        .context("building equipment catalog")?;
    let samples = scenario.samples().context("loading sample data")?;

    let result = simulate(
        &sim_config,
        &catalog,
        &samples,
        scenario.simulation.parallel,
    );
    print_summary(&result);

    if let Some(ref path) = cli.bills_out {
        export_bills_csv(&result, path)
            .with_context(|| format!("writing bills to {}", path.display()))?;
        info!(path = %path.display(), "bills written");
    }
    if let Some(ref path) = cli.json_out {
        export_json(&result, path)
            .with_context(|| format!("writing results to {}", path.display()))?;
        info!(path = %path.display(), "results written");
    }
    if let (Some(path), Some(key)) = (&cli.telemetry_out, &cli.combination) {
        let (_, steps) = trace_combination(&sim_config, &catalog, &samples, key)?;
        export_telemetry_csv(&steps, path)
            .with_context(|| format!("writing telemetry to {}", path.display()))?;
        info!(path = %path.display(), steps = steps.len(), "telemetry written");
    }

    if result.failures().is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.verbose, cli.log_json);
    run(&cli)
}
