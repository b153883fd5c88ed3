use std::sync::OnceLock;

use regex::Regex;

use crate::config::MarkerText;
use crate::log_debug;
use crate::snapshot::TimeSnapshot;
use crate::timefmt::ClockTime;

const MORNING: &str = "오전";
const AFTERNOON: &str = "오후";

fn meridiem_clock_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(오전|오후)\s*([0-9]{1,2}):([0-9]{2})$").expect("meridiem clock pattern")
    })
}

/// A clock value found under the marker, with the text it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockCandidate {
    pub clock: ClockTime,
    pub original: String,
    pub fragment: usize,
}

/// Earliest `오전/오후 H:MM` clock reachable from the tracking-status marker.
///
/// Steps:
/// 1. find the marker fragment ("no break" first, "recording" as fallback);
/// 2. narrow the scope to that fragment and its descendants;
/// 3. collect every meridiem clock inside the scope;
/// 4. return the earliest one.
pub fn locate_start_time(snapshot: &TimeSnapshot, markers: &MarkerText) -> Option<ClockTime> {
    let Some(marker) = find_marker(snapshot, markers) else {
        log_debug!("no tracking marker in snapshot of {} fragments", snapshot.len());
        return None;
    };

    let scope = snapshot.subtree(marker);
    let candidates = collect_clock_candidates(snapshot, &scope, markers.max_clock_len);

    let earliest = candidates.iter().min_by_key(|candidate| candidate.clock)?;

    log_debug!(
        "start time {} from '{}' at fragment {} (candidates: {})",
        earliest.clock,
        earliest.original,
        earliest.fragment,
        candidates
            .iter()
            .map(|candidate| candidate.clock.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Some(earliest.clock)
}

/// Index of the first fragment that reads as the tracking-status marker.
pub fn find_marker(snapshot: &TimeSnapshot, markers: &MarkerText) -> Option<usize> {
    let no_break = snapshot.iter().find(|(_, fragment)| {
        let text = fragment.trimmed();
        text == markers.no_break
            || (text.contains(&markers.break_token)
                && text.contains(&markers.none_token)
                && text.chars().count() < markers.max_marker_len)
    });

    if let Some((index, fragment)) = no_break {
        log_debug!("no-break marker at {}: '{}'", index, fragment.trimmed());
        return Some(index);
    }

    let recording = snapshot.iter().find(|(_, fragment)| {
        let text = fragment.trimmed();
        text.contains(&markers.recording) && text.chars().count() < markers.max_marker_len
    });

    recording.map(|(index, fragment)| {
        log_debug!("recording marker at {}: '{}'", index, fragment.trimmed());
        index
    })
}

/// Every well-formed meridiem clock among `scope`, in document order.
///
/// Fragments longer than `max_len` characters are skipped, as are values that
/// are not valid 12-hour clocks (hour 0 or above 12, minute above 59).
pub fn collect_clock_candidates(
    snapshot: &TimeSnapshot,
    scope: &[usize],
    max_len: usize,
) -> Vec<ClockCandidate> {
    let mut candidates = Vec::new();

    for &index in scope {
        let Some(fragment) = snapshot.get(index) else {
            continue;
        };
        let text = fragment.trimmed();
        if text.chars().count() > max_len {
            continue;
        }

        let Some(caps) = meridiem_clock_re().captures(text) else {
            continue;
        };
        let (Ok(hour), Ok(minute)) = (caps[2].parse::<u32>(), caps[3].parse::<u32>()) else {
            continue;
        };
        let Some(clock) = to_24_hour(&caps[1], hour, minute) else {
            log_debug!("ignoring out-of-range clock '{}'", text);
            continue;
        };

        log_debug!("clock candidate {} from '{}'", clock, text);
        candidates.push(ClockCandidate {
            clock,
            original: text.to_string(),
            fragment: index,
        });
    }

    candidates
}

/// `오후 12` stays 12, `오전 12` becomes 0, other afternoon hours add 12.
fn to_24_hour(meridiem: &str, hour: u32, minute: u32) -> Option<ClockTime> {
    if !(1..=12).contains(&hour) {
        return None;
    }

    let hour24 = match (meridiem, hour) {
        (AFTERNOON, 12) => 12,
        (AFTERNOON, h) => h + 12,
        (MORNING, 12) => 0,
        (_, h) => h,
    };

    ClockTime::new(hour24, minute)
}
