//! End-to-end tests of the catalog simulator on hand-built sample years.

mod common;

use approx::assert_relative_eq;
use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Timelike};

use solar_bill_sim::SimError;
use solar_bill_sim::devices::{BatteryModel, PanelModel};
use solar_bill_sim::error::Result;
use solar_bill_sim::sim::engine::Engine;
use solar_bill_sim::sim::runner::{Catalog, run_combination, simulate};
use solar_bill_sim::sim::samples::SampleSet;
use solar_bill_sim::sim::types::SimConfig;
use solar_bill_sim::tariff::{Bill, BillingPolicy};

fn hours_in_month(year: i32, month: u32) -> f64 {
    let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1).unwrap()
    };
    ((next - first).num_days() * 24) as f64
}

/// Sun for four midday hours, one kWh of load every hour.
fn midday_sun_year(year: i32) -> SampleSet {
    let start = common::new_year(year);
    let hours = (common::new_year(year + 1) - start).num_hours() as usize;
    common::hourly_samples(
        start,
        hours,
        |h| if (10..14).contains(&(h % 24)) { 0.5 } else { 0.0 },
        |_| 1.0,
    )
}

#[test]
fn calendar_year_yields_twelve_month_end_bills() {
    let cfg = common::default_config();
    let samples = common::constant_load_year(2021, 1.0);
    assert_eq!(samples.len(), 8760);

    let mut engine = Engine::new(
        cfg,
        PanelModel::none(&cfg),
        BatteryModel::none(&cfg),
        common::flat_tariff("Flat", &cfg),
    );
    let bills = engine.run(&samples).unwrap();
    assert_eq!(bills.len(), 12);

    for (i, bill) in bills.iter().enumerate() {
        let month = i as u32 + 1;
        assert_eq!(bill.period_end.month(), month);
        assert_eq!(bill.period_end.hour(), 23);
        assert_eq!(
            bill.period_end.date().succ_opt().map(|d| d.month()),
            Some(month % 12 + 1)
        );

        let expected_usage = hours_in_month(2021, month) * common::FLAT_RATE;
        assert_relative_eq!(bill.usage_cost, expected_usage, epsilon = 1e-6);
        assert_relative_eq!(
            bill.total,
            common::FLAT_SERVICE + expected_usage,
            epsilon = 1e-6
        );
    }
}

#[test]
fn leap_year_february_has_twenty_nine_days() {
    let cfg = common::default_config();
    let samples = common::constant_load_year(2020, 1.0);
    let run = run_combination(
        &cfg,
        &PanelModel::none(&cfg),
        &BatteryModel::none(&cfg),
        &common::flat_tariff("Flat", &cfg),
        &samples,
    )
    .unwrap();

    let feb = &run.bills[1];
    assert_eq!(feb.period_end.day(), 29);
    assert_relative_eq!(feb.usage_cost, 29.0 * 24.0 * common::FLAT_RATE, epsilon = 1e-6);
}

#[test]
fn timestamp_mismatch_fails_only_that_run() {
    let cfg = common::default_config();
    let good = common::constant_load_year(2021, 1.0);
    let mut load = good.load().to_vec();
    load[100].timestamp += TimeDelta::hours(1);
    let bad = SampleSet::new(good.weather().to_vec(), load).unwrap();

    let catalog = Catalog::new(
        vec![PanelModel::none(&cfg)],
        vec![BatteryModel::none(&cfg)],
        vec![common::flat_tariff("Flat", &cfg)],
    );
    let result = simulate(&cfg, &catalog, &bad, false);
    assert!(result.is_empty());
    assert_eq!(result.failures().len(), 1);

    match &result.failures()[0] {
        SimError::Combination { key, source } => {
            assert_eq!(key, "None:None:Flat");
            assert!(matches!(
                **source,
                SimError::DataIntegrity { index: 100, .. }
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn combinations_do_not_share_state() {
    let cfg = common::default_config();
    let samples = midday_sun_year(2021);
    let catalog = Catalog::new(
        vec![
            PanelModel::none(&cfg),
            common::ideal_panel("Ideal", 0.01, &cfg),
        ],
        vec![BatteryModel::none(&cfg), common::home_battery(&cfg)],
        vec![
            common::flat_tariff("FlatA", &cfg),
            common::flat_tariff("FlatB", &cfg),
        ],
    );
    let result = simulate(&cfg, &catalog, &samples, false);
    assert_eq!(result.len(), 8);
    assert!(result.failures().is_empty());

    // Identical tariffs under different names must bill identically.
    for panel in ["None", "Ideal"] {
        for battery in ["None", "Home"] {
            let a = result.amounts(&format!("{panel}:{battery}:FlatA")).unwrap();
            let b = result.amounts(&format!("{panel}:{battery}:FlatB")).unwrap();
            assert_eq!(a, b);
        }
    }

    // A combination run alone matches the same combination inside the catalog.
    let alone = run_combination(
        &cfg,
        &common::ideal_panel("Ideal", 0.01, &cfg),
        &common::home_battery(&cfg),
        &common::flat_tariff("FlatB", &cfg),
        &samples,
    )
    .unwrap();
    assert_eq!(result.get("Ideal:Home:FlatB").unwrap().bills, alone.bills);
}

#[test]
fn parallel_and_sequential_runs_agree() {
    let cfg = common::default_config();
    let samples = midday_sun_year(2021);
    let catalog = Catalog::new(
        vec![
            PanelModel::none(&cfg),
            common::ideal_panel("A", 0.005, &cfg),
            common::ideal_panel("B", 0.02, &cfg),
        ],
        vec![BatteryModel::none(&cfg), common::home_battery(&cfg)],
        vec![common::flat_tariff("Flat", &cfg)],
    );

    let sequential = simulate(&cfg, &catalog, &samples, false);
    let parallel = simulate(&cfg, &catalog, &samples, true);
    assert_eq!(sequential.len(), 6);

    let keys = |r: &solar_bill_sim::sim::runner::SimulationResult| {
        r.iter().map(|run| run.key.to_string()).collect::<Vec<_>>()
    };
    assert_eq!(keys(&sequential), keys(&parallel));
    for (s, p) in sequential.iter().zip(parallel.iter()) {
        assert_eq!(s.bills, p.bills);
    }
}

#[test]
fn multi_year_run_repeats_the_sample_year() {
    let cfg = SimConfig::new(1.0, 2).unwrap();
    let samples = midday_sun_year(2021);
    let run = run_combination(
        &cfg,
        &common::ideal_panel("Ideal", 0.05, &cfg),
        &BatteryModel::none(&cfg),
        &common::flat_tariff("Flat", &cfg),
        &samples,
    )
    .unwrap();

    assert_eq!(run.bills.len(), 24);
    assert_eq!(run.bills[0].period_end, run.bills[12].period_end);
    // The panel keeps degrading across passes, so exports shrink.
    for month in 0..12 {
        assert!(run.bills[month + 12].usage_cost > run.bills[month].usage_cost);
    }
}

#[test]
fn empty_battery_is_no_better_than_none_without_sun() {
    let cfg = common::default_config();
    let samples = common::constant_load_year(2021, 0.8);
    let catalog = Catalog::new(
        vec![PanelModel::none(&cfg)],
        vec![BatteryModel::none(&cfg), common::home_battery(&cfg)],
        vec![common::flat_tariff("Flat", &cfg)],
    );
    let result = simulate(&cfg, &catalog, &samples, true);
    assert_eq!(
        result.amounts("None:None:Flat"),
        result.amounts("None:Home:Flat")
    );
}

/// Energy charge plus a charge on the highest import of the month.
#[derive(Debug, Clone)]
struct MonthlyPeakPolicy {
    energy_rate: f64,
    per_kw: f64,
    usage_cost: f64,
    peak_kw: f64,
}

impl MonthlyPeakPolicy {
    fn new(energy_rate: f64, per_kw: f64) -> Self {
        Self {
            energy_rate,
            per_kw,
            usage_cost: 0.0,
            peak_kw: 0.0,
        }
    }
}

impl BillingPolicy for MonthlyPeakPolicy {
    fn name(&self) -> &str {
        "MonthlyPeak"
    }

    fn accumulate(&mut self, _timestamp: NaiveDateTime, grid_kwh: f64) {
        self.usage_cost += grid_kwh * self.energy_rate;
        self.peak_kw = self.peak_kw.max(grid_kwh);
    }

    fn settle(&self, timestamp: NaiveDateTime) -> Result<Bill> {
        let demand_charge = self.peak_kw * self.per_kw;
        Ok(Bill {
            period_end: timestamp,
            usage_cost: self.usage_cost,
            demand_charge,
            service_charge: 0.0,
            total: self.usage_cost + demand_charge,
        })
    }

    fn reset(&mut self) {
        self.usage_cost = 0.0;
        self.peak_kw = 0.0;
    }
}

#[test]
fn custom_billing_policy_plugs_into_the_simulator() {
    let cfg = common::default_config();
    let start = common::new_year(2021);
    let hours = (common::new_year(2022) - start).num_hours() as usize;
    // One 3 kWh spike on the first day of every month.
    let samples = common::hourly_samples(
        start,
        hours,
        |_| 0.0,
        |h| {
            let ts = start + TimeDelta::hours(h as i64);
            if ts.day() == 1 && ts.hour() == 18 { 3.0 } else { 1.0 }
        },
    );

    let catalog = Catalog::new(
        vec![PanelModel::none(&cfg)],
        vec![BatteryModel::none(&cfg)],
        vec![MonthlyPeakPolicy::new(0.1, 5.0)],
    );
    let result = simulate(&cfg, &catalog, &samples, true);
    let run = result.get("None:None:MonthlyPeak").unwrap();
    assert_eq!(run.bills.len(), 12);

    for (i, bill) in run.bills.iter().enumerate() {
        let hours = hours_in_month(2021, i as u32 + 1);
        assert_relative_eq!(bill.demand_charge, 15.0, epsilon = 1e-9);
        assert_relative_eq!(bill.usage_cost, (hours + 2.0) * 0.1, epsilon = 1e-6);
    }
}

#[test]
fn unbilled_tail_is_dropped() {
    let cfg = common::default_config();
    // January plus the first ten days of February.
    let samples = common::hourly_samples(common::new_year(2021), (31 + 10) * 24, |_| 0.0, |_| 1.0);
    let mut engine = Engine::new(
        cfg,
        PanelModel::none(&cfg),
        BatteryModel::none(&cfg),
        common::flat_tariff("Flat", &cfg),
    );
    let bills = engine.run(&samples).unwrap();
    assert_eq!(bills.len(), 1);
    assert_eq!(bills[0].period_end.month(), 1);
}

#[test]
fn multi_year_run_refuses_a_tail_that_would_bleed_into_the_next_pass() {
    let cfg = SimConfig::new(1.0, 2).unwrap();
    // January plus the first ten days of February.
    let samples = common::hourly_samples(common::new_year(2021), (31 + 10) * 24, |_| 0.0, |_| 1.0);
    let catalog = Catalog::new(
        vec![PanelModel::none(&cfg)],
        vec![BatteryModel::none(&cfg)],
        vec![common::flat_tariff("Flat", &cfg)],
    );
    let result = simulate(&cfg, &catalog, &samples, false);
    assert!(result.get("None:None:Flat").is_none());
    match &result.failures()[0] {
        SimError::Combination { source, .. } => {
            assert!(matches!(**source, SimError::Configuration { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn step_size_that_disagrees_with_hourly_data_is_an_error() {
    let samples = common::constant_load_year(2021, 1.0);
    for step_hours in [2.0, 0.5] {
        let cfg = SimConfig::new(step_hours, 1).unwrap();
        let catalog = Catalog::new(
            vec![PanelModel::none(&cfg)],
            vec![BatteryModel::none(&cfg)],
            vec![common::flat_tariff("Flat", &cfg)],
        );
        let result = simulate(&cfg, &catalog, &samples, true);
        assert!(result.is_empty(), "step {step_hours} produced bills");
        assert_eq!(result.failures().len(), 1);
    }
}
