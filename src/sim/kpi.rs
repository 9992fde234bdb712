//! Post-hoc bill statistics per combination.

use crate::tariff::Bill;

/// Aggregate statistics over the settled bills of one combination.
#[derive(Debug, Clone, PartialEq)]
pub struct BillSummary {
    /// Number of settled billing periods.
    pub periods: usize,
    /// Sum of all bill totals.
    pub total: f64,
    /// Mean bill total per period.
    pub mean: f64,
    /// Smallest bill total.
    pub min: f64,
    /// Largest bill total.
    pub max: f64,
    /// Sum of usage costs, signed (negative when exports outweigh imports).
    pub usage_cost: f64,
    /// Sum of demand charges.
    pub demand_charge: f64,
}

impl BillSummary {
    /// Computes the summary from a bill sequence.
    ///
    /// An empty sequence yields an all-zero summary.
    pub fn from_bills(bills: &[Bill]) -> Self {
        if bills.is_empty() {
            return Self {
                periods: 0,
                total: 0.0,
                mean: 0.0,
                min: 0.0,
                max: 0.0,
                usage_cost: 0.0,
                demand_charge: 0.0,
            };
        }

        let mut total = 0.0_f64;
        let mut usage_cost = 0.0_f64;
        let mut demand_charge = 0.0_f64;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for b in bills {
            total += b.total;
            usage_cost += b.usage_cost;
            demand_charge += b.demand_charge;
            min = min.min(b.total);
            max = max.max(b.total);
        }

        Self {
            periods: bills.len(),
            total,
            mean: total / bills.len() as f64,
            min,
            max,
            usage_cost,
            demand_charge,
        }
    }
}
