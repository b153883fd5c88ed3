use serde::Serialize;

use crate::config::{ValidationLimits, WorkPolicy};
use crate::timefmt::{ClockTime, Minutes};

pub const NO_DATA_MESSAGE: &str = "근무 시간 데이터가 없습니다.";
pub const BAD_START_TIME_MESSAGE: &str = "출근시간 형식이 올바르지 않습니다.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Sanity-check one cycle's parsed values.
///
/// Errors are fatal for the cycle; warnings are only logged by the caller.
/// A present start time makes an all-zero total acceptable.
pub fn validate(
    today_minutes: Minutes,
    week_minutes: Minutes,
    start_time: Option<&str>,
    policy: &WorkPolicy,
    limits: &ValidationLimits,
) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if today_minutes == 0 && week_minutes == 0 && start_time.is_none() {
        errors.push(NO_DATA_MESSAGE.to_string());
    }

    let total_hours = (f64::from(today_minutes) + f64::from(week_minutes)) / 60.0;
    let ceiling = f64::from(policy.weekly_target_hours) * f64::from(limits.plausibility_factor);
    if total_hours > ceiling {
        warnings.push(format!(
            "주간 근무시간이 {}시간으로 매우 높습니다.",
            total_hours.round()
        ));
    }

    if let Some(start) = start_time {
        if !ClockTime::is_well_formed(start) {
            errors.push(BAD_START_TIME_MESSAGE.to_string());
        }
    }

    ValidationResult {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(today: Minutes, week: Minutes, start: Option<&str>) -> ValidationResult {
        validate(
            today,
            week,
            start,
            &WorkPolicy::default(),
            &ValidationLimits::default(),
        )
    }

    #[test]
    fn all_zero_without_start_is_invalid() {
        let result = check(0, 0, None);
        assert!(!result.valid);
        assert_eq!(result.errors, vec![NO_DATA_MESSAGE.to_string()]);
    }

    #[test]
    fn week_total_with_start_is_valid() {
        let result = check(0, 480, Some("09:00"));
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn start_time_alone_is_enough() {
        assert!(check(0, 0, Some("08:30")).valid);
    }

    #[test]
    fn next_day_start_shape_is_accepted() {
        assert!(check(10, 0, Some("익일 00:30")).valid);
    }

    #[test]
    fn malformed_start_is_invalid() {
        let result = check(60, 0, Some("9:00"));
        assert!(!result.valid);
        assert_eq!(result.errors, vec![BAD_START_TIME_MESSAGE.to_string()]);
    }

    #[test]
    fn implausible_total_is_only_a_warning() {
        let result = check(60, 80 * 60 + 30, Some("09:00"));
        assert!(result.valid);
        assert_eq!(result.warnings, vec!["주간 근무시간이 82시간으로 매우 높습니다.".to_string()]);
    }

    #[test]
    fn exactly_twice_the_target_is_not_flagged() {
        assert!(check(0, 80 * 60, None).warnings.is_empty());
    }
}
