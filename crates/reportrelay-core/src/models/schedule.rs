use chrono::{NaiveTime, Weekday};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("Invalid time of day '{value}': expected HH:MM")]
    InvalidTimeOfDay { value: String },

    #[error("Invalid weekday {0}: expected 0 (Sunday) to 6 (Saturday)")]
    InvalidWeekday(u8),
}

/// Weekly upload slot: a time of day and a weekday (0 = Sunday).
///
/// The time string is kept as supplied; it is parsed on every scheduler cycle so
/// that a bad value degrades to a retry loop instead of a startup failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    time_of_day: String,
    weekday: u8,
}

impl ScheduleConfig {
    pub fn new(time_of_day: impl Into<String>, weekday: u8) -> Result<Self, ScheduleError> {
        if weekday > 6 {
            return Err(ScheduleError::InvalidWeekday(weekday));
        }
        Ok(Self {
            time_of_day: time_of_day.into(),
            weekday,
        })
    }

    pub fn time_of_day(&self) -> &str {
        &self.time_of_day
    }

    /// Weekday as configured, Sunday = 0.
    pub fn weekday_index(&self) -> u8 {
        self.weekday
    }

    pub fn weekday(&self) -> Weekday {
        weekday_from_sunday(self.weekday)
    }

    pub fn parse_time_of_day(&self) -> Result<NaiveTime, ScheduleError> {
        parse_time_of_day(&self.time_of_day)
    }
}

/// Parse an `HH:MM` string into a time with zero seconds.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, ScheduleError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| {
        ScheduleError::InvalidTimeOfDay {
            value: value.to_string(),
        }
    })
}

fn weekday_from_sunday(index: u8) -> Weekday {
    match index % 7 {
        0 => Weekday::Sun,
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        _ => Weekday::Sat,
    }
}
