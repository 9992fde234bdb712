//! Console report of a catalog run.

use std::fmt::Write;

use crate::sim::kpi::BillSummary;
use crate::sim::runner::SimulationResult;

/// Renders one line per combination with its bill statistics, cheapest
/// combination first.
///
/// Usage is the signed sum of energy costs before the service-charge floor.
pub fn format_summary(result: &SimulationResult) -> String {
    let mut rows: Vec<(String, BillSummary)> = result
        .iter()
        .map(|run| (run.key.to_string(), BillSummary::from_bills(&run.bills)))
        .collect();
    rows.sort_by(|a, b| a.1.total.total_cmp(&b.1.total));

    let width = rows
        .iter()
        .map(|(key, _)| key.len())
        .max()
        .unwrap_or(0)
        .max("combination".len());

    let mut out = String::new();
    let _ = writeln!(out, "--- Bill Report ---");
    let _ = writeln!(
        out,
        "{:<width$}  {:>7}  {:>9}  {:>9}  {:>9}  {:>11}  {:>11}  {:>12}",
        "combination", "periods", "mean", "min", "max", "usage", "demand", "total"
    );
    for (key, s) in &rows {
        let _ = writeln!(
            out,
            "{key:<width$}  {:>7}  {:>9.2}  {:>9.2}  {:>9.2}  {:>11.2}  {:>11.2}  {:>12.2}",
            s.periods, s.mean, s.min, s.max, s.usage_cost, s.demand_charge, s.total
        );
    }
    for err in result.failures() {
        let _ = writeln!(out, "FAILED {err}");
    }
    out
}

pub fn print_summary(result: &SimulationResult) {
    print!("{}", format_summary(result));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{BatteryModel, PanelModel};
    use crate::io::synthetic::{SyntheticProfile, generate_year};
    use crate::sim::runner::{Catalog, simulate};
    use crate::sim::types::SimConfig;
    use crate::tariff::Tariff;

    #[test]
    fn report_lists_every_combination_cheapest_first() {
        let cfg = SimConfig::default();
        let samples = generate_year(2021, 5, &SyntheticProfile::default()).unwrap();
        let catalog = Catalog::new(
            vec![PanelModel::none(&cfg)],
            vec![BatteryModel::none(&cfg)],
            vec![Tariff::srp_e13(&cfg), Tariff::srp_e15(&cfg)],
        );
        let result = simulate(&cfg, &catalog, &samples, false);
        let report = format_summary(&result);

        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "--- Bill Report ---");
        assert!(lines[1].starts_with("combination"));
        assert_eq!(lines.len(), 4);
        assert!(report.contains("None:None:E13"));
        assert!(report.contains("None:None:E15"));
        assert!(lines[1].split_whitespace().eq([
            "combination", "periods", "mean", "min", "max", "usage", "demand", "total"
        ]));

        // Without panels or storage E13 never bills a demand charge.
        let e13 = lines.iter().find(|l| l.starts_with("None:None:E13")).unwrap();
        let cols: Vec<&str> = e13.split_whitespace().collect();
        assert_eq!(cols.len(), 8);
        assert_eq!(cols[6], "0.00");
        let min: f64 = cols[3].parse().unwrap();
        let max: f64 = cols[4].parse().unwrap();
        assert!(min <= max);

        let total = |line: &str| {
            line.split_whitespace()
                .last()
                .and_then(|t| t.parse::<f64>().ok())
                .unwrap()
        };
        assert!(total(lines[2]) <= total(lines[3]));
    }
}
