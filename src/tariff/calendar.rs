//! Seasons and on-peak windows of a time-of-use schedule.

use std::fmt;

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// Billing season, derived from the calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Season {
    /// November through April.
    Winter,
    /// May, June, September, and October.
    Summer,
    /// July and August.
    SummerPeak,
}

impl Season {
    /// Returns the season of a month number (1-12).
    pub fn from_month(month: u32) -> Self {
        match month {
            7 | 8 => Self::SummerPeak,
            5 | 6 | 9 | 10 => Self::Summer,
            _ => Self::Winter,
        }
    }

    pub fn of(timestamp: NaiveDateTime) -> Self {
        Self::from_month(timestamp.month())
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Winter => "winter",
            Self::Summer => "summer",
            Self::SummerPeak => "summer peak",
        })
    }
}

/// One value per season.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Seasonal<T> {
    pub winter: T,
    pub summer: T,
    pub summer_peak: T,
}

impl<T> Seasonal<T> {
    pub fn get(&self, season: Season) -> &T {
        match season {
            Season::Winter => &self.winter,
            Season::Summer => &self.summer,
            Season::SummerPeak => &self.summer_peak,
        }
    }
}

impl<T: Clone> Seasonal<T> {
    /// The same value in every season.
    pub fn uniform(value: T) -> Self {
        Self {
            winter: value.clone(),
            summer: value.clone(),
            summer_peak: value,
        }
    }
}

/// A half-open range of hours of the day, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HourWindow {
    pub start: u32,
    pub end: u32,
}

impl HourWindow {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, hour: u32) -> bool {
        hour >= self.start && hour < self.end
    }
}

/// On-peak membership rules: per-season hour windows plus a weekday filter.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TouCalendar {
    pub windows: Seasonal<Vec<HourWindow>>,
    /// Saturday and Sunday are always off-peak when set.
    pub weekdays_only: bool,
}

impl TouCalendar {
    /// A calendar with no on-peak hours at all.
    pub fn all_off_peak() -> Self {
        Self {
            windows: Seasonal::uniform(Vec::new()),
            weekdays_only: true,
        }
    }

    /// Returns `true` when `timestamp` falls inside an on-peak window.
    pub fn is_on_peak(&self, timestamp: NaiveDateTime) -> bool {
        if self.weekdays_only && matches!(timestamp.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        let hour = timestamp.hour();
        self.windows
            .get(Season::of(timestamp))
            .iter()
            .any(|w| w.contains(hour))
    }
}

/// SRP residential windows: 2pm-8pm in summer, 5am-9am and 5pm-9pm in winter.
impl Default for TouCalendar {
    fn default() -> Self {
        let afternoon = vec![HourWindow::new(14, 20)];
        Self {
            windows: Seasonal {
                winter: vec![HourWindow::new(5, 9), HourWindow::new(17, 21)],
                summer: afternoon.clone(),
                summer_peak: afternoon,
            },
            weekdays_only: true,
        }
    }
}
