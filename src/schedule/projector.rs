use std::fmt;

use chrono::Weekday;
use serde::Serialize;

use crate::config::WorkPolicy;
use crate::log_debug;
use crate::timefmt::{format_worded, ClockTime, Minutes};

/// Expected end of the working day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Projection {
    /// Weekend, or no start time to project from.
    NoProjection,
    EndTime(ClockTime),
    /// The weekly target is met exactly.
    ExactlyMet,
    /// Minutes worked beyond the weekly target.
    Overtime(Minutes),
}

impl Projection {
    pub fn is_shown(&self) -> bool {
        !matches!(self, Projection::NoProjection)
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Projection::NoProjection => Ok(()),
            Projection::EndTime(clock) => write!(f, "{clock}"),
            Projection::ExactlyMet => write!(f, "정시 퇴근 가능"),
            Projection::Overtime(minutes) => {
                write!(f, "초과근무 중 ({} 초과)", format_worded(*minutes))
            }
        }
    }
}

/// Project today's end time under `policy`.
///
/// Regular days end a fixed day plus lunch after the start. The flex day ends
/// once the weekly target is reached: `target - (week + today)` plus lunch.
/// `week_minutes` is taken as excluding today, so both totals are subtracted.
pub fn project(
    today_minutes: Minutes,
    week_minutes: Minutes,
    start_time: Option<ClockTime>,
    weekday: Weekday,
    policy: &WorkPolicy,
) -> Projection {
    let Some(start) = start_time else {
        return Projection::NoProjection;
    };

    let lunch = i64::from(policy.lunch_break_minutes);

    if policy.is_regular_day(weekday) {
        let daily = i64::from(policy.daily_work_hours) * 60;
        return Projection::EndTime(start.add_minutes(daily + lunch));
    }

    if policy.is_flex_day(weekday) {
        let worked = i64::from(week_minutes) + i64::from(today_minutes);
        let remaining = policy.weekly_target_minutes() - worked;

        return match remaining {
            r if r > 0 => Projection::EndTime(start.add_minutes(r + lunch)),
            0 => Projection::ExactlyMet,
            r => Projection::Overtime(Minutes::try_from(r.unsigned_abs()).unwrap_or(Minutes::MAX)),
        };
    }

    if policy.is_weekend_day(weekday) {
        log_debug!("{weekday} is a weekend day; no projection");
    } else {
        log_debug!("{weekday} is neither a regular nor the flex day; no projection");
    }
    Projection::NoProjection
}
