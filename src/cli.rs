//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

#[derive(Debug, Parser)]
#[command(name = "solar-bill-sim")]
#[command(author, version, about = "Monthly electricity bill simulator for solar, battery and tariff options")]
#[command(
    long_about = "Simulates every combination of panel, battery and tariff options over a year \
    of hourly weather and household load data, and reports the monthly bills.\n\
    \nWithout data files a seeded synthetic year is used.\n\
    \nExamples:\n  \
    solar-bill-sim\n  \
    solar-bill-sim --weather pvwatts_hourly.csv --load hourly_usage.csv --years 10\n  \
    solar-bill-sim --scenario house.toml --bills-out bills.csv\n  \
    solar-bill-sim --preset demo --telemetry-out steps.csv --combination Roof6kW:Small:E13"
)]
#[command(group(ArgGroup::new("source").args(["scenario", "preset"])))]
pub struct Cli {
    /// Scenario TOML file
    #[arg(long)]
    pub scenario: Option<PathBuf>,

    /// Built-in scenario (srp, demo)
    #[arg(long, default_value = "srp")]
    pub preset: String,

    /// PVWatts hourly CSV, overriding the scenario's weather data
    #[arg(long, requires = "load")]
    pub weather: Option<PathBuf>,

    /// Utility hourly usage CSV, overriding the scenario's load data
    #[arg(long, requires = "weather")]
    pub load: Option<PathBuf>,

    /// Number of passes over the sample year
    #[arg(long)]
    pub years: Option<usize>,

    /// Write every settled bill to this CSV file
    #[arg(long)]
    pub bills_out: Option<PathBuf>,

    /// Write the result mapping to this JSON file
    #[arg(long)]
    pub json_out: Option<PathBuf>,

    /// Write the hourly step log of one combination to this CSV file
    #[arg(long, requires = "combination")]
    pub telemetry_out: Option<PathBuf>,

    /// Combination key for --telemetry-out, as "<panel>:<battery>:<tariff>"
    #[arg(long)]
    pub combination: Option<String>,

    /// Run combinations one after another instead of in parallel
    #[arg(long)]
    pub sequential: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}
