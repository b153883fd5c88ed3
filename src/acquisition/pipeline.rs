use chrono::Weekday;
use log::warn;
use serde::Serialize;

use crate::config::FlexConfig;
use crate::error::FlexError;
use crate::locate::{locate_start_time, locate_worked_time};
use crate::log_debug;
use crate::schedule::{project, Projection};
use crate::snapshot::TimeSnapshot;
use crate::timefmt::{format_worded, parse_to_minutes, ClockTime, Minutes};
use crate::validation::validate;

/// Payload handed to the presenter after a successful cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkSummary {
    pub total_minutes: Minutes,
    pub today_minutes: Minutes,
    pub week_minutes: Minutes,
    pub start_time: Option<ClockTime>,
    pub projection: Projection,
}

/// One acquisition cycle over a snapshot: locate → parse → validate → project.
///
/// `NoDataFound` means the page has not rendered its totals yet;
/// `ValidationFailed` means it has, but the values are unusable.
pub fn evaluate(
    snapshot: &TimeSnapshot,
    config: &FlexConfig,
    weekday: Weekday,
) -> Result<WorkSummary, FlexError> {
    let texts = locate_worked_time(snapshot, &config.markers);
    if texts.is_empty() {
        log_debug!("no worked-time text in snapshot");
        return Err(FlexError::NoDataFound);
    }

    let today_minutes = texts.today.as_deref().map(parse_to_minutes).unwrap_or(0);
    let week_minutes = texts.week.as_deref().map(parse_to_minutes).unwrap_or(0);

    let start_time = locate_start_time(snapshot, &config.markers);
    let start_text = start_time.map(|clock| clock.to_string());

    let validation = validate(
        today_minutes,
        week_minutes,
        start_text.as_deref(),
        &config.schedule,
        &config.validation,
    );
    if !validation.valid {
        log_debug!("validation failed: {:?}", validation.errors);
        return Err(FlexError::ValidationFailed(validation.errors));
    }
    for warning in &validation.warnings {
        warn!("{warning}");
    }

    let projection = project(
        today_minutes,
        week_minutes,
        start_time,
        weekday,
        &config.schedule,
    );
    let total_minutes = today_minutes.saturating_add(week_minutes);

    log_debug!(
        "today={:?} week={:?} total={} start={:?} projection={}",
        texts.today,
        texts.week,
        format_worded(total_minutes),
        start_text,
        projection
    );

    Ok(WorkSummary {
        total_minutes,
        today_minutes,
        week_minutes,
        start_time,
        projection,
    })
}
