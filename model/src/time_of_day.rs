use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::Demarcations;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    PreRush,
    MorningRush,
    Midday,
    EveningRush,
    PostRush,
    Weekend,
}

impl TimeOfDay {
    /// Weekends get their own bucket no matter the hour. On weekdays, a time exactly on a
    /// demarcation belongs to the earlier bucket.
    pub fn classify(time: NaiveDateTime, demarcations: &Demarcations) -> Self {
        if matches!(time.weekday(), Weekday::Sat | Weekday::Sun) {
            return TimeOfDay::Weekend;
        }
        // Seconds are ignored
        let hour = time.hour() as f64 + time.minute() as f64 / 60.0;
        let [b0, b1, b2, b3] = demarcations.hours();
        if hour <= b0 {
            TimeOfDay::PreRush
        } else if hour <= b1 {
            TimeOfDay::MorningRush
        } else if hour <= b2 {
            TimeOfDay::Midday
        } else if hour <= b3 {
            TimeOfDay::EveningRush
        } else {
            TimeOfDay::PostRush
        }
    }

    pub fn all() -> Vec<TimeOfDay> {
        vec![
            TimeOfDay::PreRush,
            TimeOfDay::MorningRush,
            TimeOfDay::Midday,
            TimeOfDay::EveningRush,
            TimeOfDay::PostRush,
            TimeOfDay::Weekend,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeOfDay::PreRush => "pre_rush",
            TimeOfDay::MorningRush => "morning_rush",
            TimeOfDay::Midday => "midday",
            TimeOfDay::EveningRush => "evening_rush",
            TimeOfDay::PostRush => "post_rush",
            TimeOfDay::Weekend => "weekend",
        }
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
