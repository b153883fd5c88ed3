use std::time::Duration;

use chrono::Weekday;

/// Work schedule: fixed days run `daily_work_hours` plus lunch, the flex day
/// absorbs whatever is left of the weekly target.
#[derive(Debug, Clone)]
pub struct WorkPolicy {
    pub lunch_break_minutes: u32,
    pub weekly_target_hours: u32,
    pub daily_work_hours: u32,
    pub regular_days: Vec<Weekday>,
    pub flex_day: Weekday,
    /// Days off. Like any day that is neither regular nor flex, they get no
    /// projection.
    pub weekend_days: Vec<Weekday>,
}

impl WorkPolicy {
    pub fn is_regular_day(&self, day: Weekday) -> bool {
        self.regular_days.contains(&day)
    }

    pub fn is_flex_day(&self, day: Weekday) -> bool {
        self.flex_day == day
    }

    pub fn is_weekend_day(&self, day: Weekday) -> bool {
        self.weekend_days.contains(&day)
    }

    pub fn weekly_target_minutes(&self) -> i64 {
        i64::from(self.weekly_target_hours) * 60
    }
}

impl Default for WorkPolicy {
    fn default() -> Self {
        Self {
            lunch_break_minutes: 60,
            weekly_target_hours: 40,
            daily_work_hours: 8,
            regular_days: vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu],
            flex_day: Weekday::Fri,
            weekend_days: vec![Weekday::Sat, Weekday::Sun],
        }
    }
}

/// Retry timing for the acquisition controller.
#[derive(Debug, Clone)]
pub struct AcquisitionTiming {
    /// Delay before the very first attempt.
    pub initial_delay: Duration,
    /// Period of the interval-driven fallback attempts.
    pub retry_interval: Duration,
    pub max_interval_retries: u32,
    /// Cap on attempts triggered by change notifications.
    pub max_notification_retries: u32,
    /// Hard timeout measured from the start of polling.
    pub notification_timeout: Duration,
}

impl Default for AcquisitionTiming {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(3500),
            retry_interval: Duration::from_millis(500),
            max_interval_retries: 5,
            max_notification_retries: 20,
            notification_timeout: Duration::from_millis(10_000),
        }
    }
}

impl AcquisitionTiming {
    /// The fallback interval needs both a budget and a non-zero period.
    pub fn interval_enabled(&self) -> bool {
        self.max_interval_retries > 0 && !self.retry_interval.is_zero()
    }

    pub fn notifications_enabled(&self) -> bool {
        self.max_notification_retries > 0
    }
}

/// Text markers the locators look for, and the length bounds that keep them
/// from matching unrelated prose.
#[derive(Debug, Clone)]
pub struct MarkerText {
    pub break_token: String,
    pub none_token: String,
    /// Exact "no break taken" label.
    pub no_break: String,
    /// "Actively tracking" label.
    pub recording: String,
    /// Label on the button showing today's running total.
    pub working: String,
    pub max_marker_len: usize,
    pub max_clock_len: usize,
    pub max_fallback_len: usize,
}

impl Default for MarkerText {
    fn default() -> Self {
        Self {
            break_token: "휴게".into(),
            none_token: "없음".into(),
            no_break: "휴게 없음".into(),
            recording: "기록 중".into(),
            working: "근무중".into(),
            max_marker_len: 20,
            max_clock_len: 30,
            max_fallback_len: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationLimits {
    /// Totals above `weekly_target_hours * plausibility_factor` are flagged.
    pub plausibility_factor: u32,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            plausibility_factor: 2,
        }
    }
}

/// Opaque hints handed to the host when asking for a snapshot or subscribing.
#[derive(Debug, Clone)]
pub struct SelectorHints {
    pub snapshot: String,
    pub change_scope: String,
}

impl Default for SelectorHints {
    fn default() -> Self {
        Self {
            snapshot: "body *".into(),
            change_scope: "body".into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlexConfig {
    pub schedule: WorkPolicy,
    pub timing: AcquisitionTiming,
    pub markers: MarkerText,
    pub validation: ValidationLimits,
    pub selectors: SelectorHints,
}
