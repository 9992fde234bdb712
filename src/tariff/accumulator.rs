use chrono::NaiveDate;

/// Running totals of one open billing period.
///
/// Only meaningful between two settlements; [`BillingAccumulator::reset`]
/// returns it to the freshly-opened state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BillingAccumulator {
    /// Signed energy cost so far (currency units; negative = net credit).
    pub usage_cost: f64,
    /// Highest import power seen in the period (kW).
    pub peak_kw: f64,
    /// On-peak import maximum of each day in the period (kW).
    pub daily_peaks: Vec<f64>,
    /// Day the last daily-peak slot was opened for.
    open_day: Option<NaiveDate>,
}

impl BillingAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_cost(&mut self, cost: f64) {
        self.usage_cost += cost;
    }

    /// Records an import so the period peak can be tracked; exports are ignored.
    pub fn record_import(&mut self, kw: f64) {
        if kw > self.peak_kw {
            self.peak_kw = kw;
        }
    }

    /// Opens a zero-initialized slot the first time a day is seen.
    pub fn open_day(&mut self, day: NaiveDate) {
        if self.open_day != Some(day) {
            self.daily_peaks.push(0.0);
            self.open_day = Some(day);
        }
    }

    /// Raises the current day's peak to `kw` if it is higher.
    pub fn raise_daily_peak(&mut self, kw: f64) {
        if let Some(peak) = self.daily_peaks.last_mut() {
            if kw > *peak {
                *peak = kw;
            }
        }
    }

    /// Arithmetic mean of the daily peaks, or `None` if no day was recorded.
    pub fn mean_daily_peak(&self) -> Option<f64> {
        if self.daily_peaks.is_empty() {
            return None;
        }
        Some(self.daily_peaks.iter().sum::<f64>() / self.daily_peaks.len() as f64)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 6, d).unwrap()
    }

    #[test]
    fn opens_one_slot_per_day() {
        let mut acc = BillingAccumulator::new();
        acc.open_day(day(1));
        acc.open_day(day(1));
        acc.open_day(day(2));
        assert_eq!(acc.daily_peaks, vec![0.0, 0.0]);
    }

    #[test]
    fn daily_peak_only_rises() {
        let mut acc = BillingAccumulator::new();
        acc.open_day(day(1));
        acc.raise_daily_peak(3.0);
        acc.raise_daily_peak(1.0);
        acc.raise_daily_peak(-4.0);
        assert_eq!(acc.daily_peaks, vec![3.0]);
    }

    #[test]
    fn mean_of_empty_period_is_none() {
        assert_eq!(BillingAccumulator::new().mean_daily_peak(), None);
    }

    #[test]
    fn reset_clears_everything() {
        let mut acc = BillingAccumulator::new();
        acc.open_day(day(1));
        acc.raise_daily_peak(2.0);
        acc.record_import(2.0);
        acc.add_cost(5.0);
        acc.reset();
        assert_eq!(acc, BillingAccumulator::new());
        // The same day opens a fresh slot after a reset.
        acc.open_day(day(1));
        assert_eq!(acc.daily_peaks.len(), 1);
    }
}
