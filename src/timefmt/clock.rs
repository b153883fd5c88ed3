use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ClockParseError;

/// Prefix marking a clock value that rolled past midnight.
pub const NEXT_DAY_PREFIX: &str = "익일";

fn clock_shape_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:(익일) )?([0-9]{2}):([0-9]{2})$").expect("clock shape pattern")
    })
}

/// A 24-hour wall clock value, optionally on the following day.
///
/// Field order gives the derived `Ord` chronological meaning: any next-day
/// value sorts after every same-day value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ClockTime {
    next_day: bool,
    hour: u32,
    minute: u32,
}

impl ClockTime {
    /// Same-day clock; `None` unless `hour < 24` and `minute < 60`.
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self {
            next_day: false,
            hour,
            minute,
        })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn is_next_day(&self) -> bool {
        self.next_day
    }

    /// Minutes since midnight of the start day (next-day values add 24h).
    pub fn minutes_since_midnight(&self) -> i64 {
        let day_offset = if self.next_day { 24 * 60 } else { 0 };
        day_offset + i64::from(self.hour) * 60 + i64::from(self.minute)
    }

    /// Add `delta` minutes. Reaching hour 24 or beyond tags the result as next
    /// day and folds the hour back into `0..24`. A negative total wraps the
    /// hour without a tag; there is no previous-day marker.
    pub fn add_minutes(self, delta: i64) -> ClockTime {
        let total = self.minutes_since_midnight() + delta;
        let hours = total.div_euclid(60);
        let minute = total.rem_euclid(60) as u32;

        ClockTime {
            next_day: hours >= 24,
            hour: hours.rem_euclid(24) as u32,
            minute,
        }
    }

    /// True when `text` has the `HH:MM` or `익일 HH:MM` shape, regardless of range.
    pub fn is_well_formed(text: &str) -> bool {
        clock_shape_re().is_match(text)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.next_day {
            write!(f, "{} ", NEXT_DAY_PREFIX)?;
        }
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ClockTime {
    type Err = ClockParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = clock_shape_re()
            .captures(s)
            .ok_or_else(|| ClockParseError::Shape(s.to_string()))?;

        let field = |group: usize| -> Result<u32, ClockParseError> {
            caps[group]
                .parse()
                .map_err(|_| ClockParseError::Shape(s.to_string()))
        };
        let hour = field(2)?;
        let minute = field(3)?;

        let mut clock =
            ClockTime::new(hour, minute).ok_or(ClockParseError::OutOfRange { hour, minute })?;
        clock.next_day = caps.get(1).is_some();
        Ok(clock)
    }
}

impl From<ClockTime> for String {
    fn from(clock: ClockTime) -> Self {
        clock.to_string()
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ClockParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
