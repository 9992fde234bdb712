use chrono::{Datelike, NaiveDateTime, TimeDelta};

/// Position of one simulated step within a repeated sample year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Global step number, starting from 0.
    pub step: usize,
    /// Which repetition of the sample year this step belongs to.
    pub pass: usize,
    /// Index into the sample series.
    pub index: usize,
}

/// A simulation clock that walks a sample year `passes` times.
///
/// # Examples
///
/// ```
/// use solar_bill_sim::sim::clock::Clock;
///
/// let mut clock = Clock::new(2, 2);
/// let mut indices = Vec::new();
///
/// clock.run(|tick| indices.push((tick.pass, tick.index)));
/// assert_eq!(indices, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
/// ```
pub struct Clock {
    /// Current step of the simulation
    current: usize,
    /// Samples in one pass
    per_pass: usize,
    /// Total steps to run in the simulation
    total: usize,
}

impl Clock {
    /// Creates a clock over `passes` repetitions of `per_pass` samples.
    pub fn new(per_pass: usize, passes: usize) -> Self {
        Self {
            current: 0,
            per_pass,
            total: per_pass * passes,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Advances the clock by one step.
    ///
    /// # Returns
    ///
    /// * `Some(tick)` - The step before advancing
    /// * `None` - If the clock has reached its total steps
    pub fn tick(&mut self) -> Option<Tick> {
        if self.current < self.total {
            let step = self.current;
            self.current += 1;
            Some(Tick {
                step,
                pass: step / self.per_pass,
                index: step % self.per_pass,
            })
        } else {
            None
        }
    }

    /// Runs a function for each remaining step in the clock.
    pub fn run(&mut self, mut f: impl FnMut(Tick)) {
        while let Some(tick) = self.tick() {
            f(tick);
        }
    }
}

/// Returns `true` when the step starting at `timestamp` is the last one of its month.
///
/// With hourly steps this is hour 23 of the month's last day.
pub fn closes_billing_period(timestamp: NaiveDateTime, step_hours: f64) -> bool {
    let step = TimeDelta::seconds((step_hours * 3600.0).round() as i64);
    timestamp
        .checked_add_signed(step)
        .is_none_or(|next| next.month() != timestamp.month())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, m, d)
            .and_then(|d| d.and_hms_opt(h, min, 0))
            .unwrap()
    }

    #[test]
    fn test_new_clock() {
        let clock = Clock::new(5, 3);
        assert_eq!(clock.current, 0);
        assert_eq!(clock.total(), 15);
    }

    #[test]
    fn test_tick_wraps_index_per_pass() {
        let mut clock = Clock::new(2, 2);
        assert_eq!(clock.tick().map(|t| (t.step, t.pass, t.index)), Some((0, 0, 0)));
        assert_eq!(clock.tick().map(|t| (t.step, t.pass, t.index)), Some((1, 0, 1)));
        assert_eq!(clock.tick().map(|t| (t.step, t.pass, t.index)), Some((2, 1, 0)));
        assert_eq!(clock.tick().map(|t| (t.step, t.pass, t.index)), Some((3, 1, 1)));
        assert_eq!(clock.tick(), None);
    }

    #[test]
    fn test_empty_clock() {
        let mut clock = Clock::new(0, 3);
        assert_eq!(clock.tick(), None);

        let mut was_called = false;
        clock.run(|_| was_called = true);
        assert!(!was_called);
    }

    #[test]
    fn last_hour_of_month_closes_period() {
        assert!(closes_billing_period(at(1, 31, 23, 0), 1.0));
        assert!(closes_billing_period(at(2, 29, 23, 0), 1.0));
        assert!(closes_billing_period(at(12, 31, 23, 0), 1.0));
    }

    #[test]
    fn other_hours_do_not_close_period() {
        assert!(!closes_billing_period(at(1, 31, 22, 0), 1.0));
        assert!(!closes_billing_period(at(1, 30, 23, 0), 1.0));
        assert!(!closes_billing_period(at(2, 28, 23, 0), 1.0));
    }

    #[test]
    fn sub_hourly_steps_close_on_last_quarter() {
        assert!(!closes_billing_period(at(4, 30, 23, 30), 0.25));
        assert!(closes_billing_period(at(4, 30, 23, 45), 0.25));
    }
}
