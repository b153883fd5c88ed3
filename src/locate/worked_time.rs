use std::sync::OnceLock;

use regex::Regex;

use crate::config::MarkerText;
use crate::log_debug;
use crate::snapshot::{FragmentRole, TimeSnapshot};

fn running_total_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([0-9]+)시간\s*([0-9]+)분|([0-9]+)분").expect("running total pattern")
    })
}

fn colon_total_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9]+):([0-9]+)").expect("colon total pattern"))
}

fn bare_colon_total_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]+:[0-9]+$").expect("bare colon total pattern"))
}

/// Raw duration texts found in a snapshot, before parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkedTimeTexts {
    pub today: Option<String>,
    pub week: Option<String>,
}

impl WorkedTimeTexts {
    pub fn is_empty(&self) -> bool {
        self.today.is_none() && self.week.is_none()
    }
}

pub fn locate_worked_time(snapshot: &TimeSnapshot, markers: &MarkerText) -> WorkedTimeTexts {
    WorkedTimeTexts {
        today: locate_today_text(snapshot, markers),
        week: locate_week_text(snapshot, markers),
    }
}

/// Today's running total, normalized to `H시간 M분`.
///
/// Prefers the button labelled with the working marker; falls back to the
/// first `<time>` fragment's text.
pub fn locate_today_text(snapshot: &TimeSnapshot, markers: &MarkerText) -> Option<String> {
    for (_, fragment) in snapshot.iter() {
        if fragment.role != FragmentRole::Button {
            continue;
        }
        let text = fragment.trimmed();
        if !text.contains(&markers.working) {
            continue;
        }
        let Some(caps) = running_total_re().captures(text) else {
            continue;
        };

        let normalized = match (caps.get(1), caps.get(2), caps.get(3)) {
            (Some(hours), Some(minutes), _) => {
                format!("{}시간 {}분", hours.as_str(), minutes.as_str())
            }
            (_, _, Some(minutes)) => format!("0시간 {}분", minutes.as_str()),
            _ => continue,
        };

        log_debug!("today total '{}' from button '{}'", normalized, text);
        return Some(normalized);
    }

    let fallback = snapshot
        .iter()
        .find(|(_, fragment)| fragment.role == FragmentRole::Time)
        .map(|(_, fragment)| fragment.trimmed().to_string())
        .filter(|text| !text.is_empty());

    if let Some(text) = &fallback {
        log_debug!("today total '{}' from time element", text);
    }
    fallback
}

/// The week's accumulated total as `H:MM`, excluding today's running button.
pub fn locate_week_text(snapshot: &TimeSnapshot, markers: &MarkerText) -> Option<String> {
    for (_, fragment) in snapshot.iter() {
        if fragment.role != FragmentRole::Button {
            continue;
        }
        let text = fragment.trimmed();
        if text.contains(&markers.working) || text.contains("시간") {
            continue;
        }
        if let Some(found) = colon_total_re().find(text) {
            log_debug!("week total '{}' from button '{}'", found.as_str(), text);
            return Some(found.as_str().to_string());
        }
    }

    let fallback = snapshot.iter().find_map(|(_, fragment)| {
        let text = fragment.trimmed();
        (text.chars().count() < markers.max_fallback_len
            && bare_colon_total_re().is_match(text)
            && !text.contains(&markers.working))
            .then(|| text.to_string())
    });

    if let Some(text) = &fallback {
        log_debug!("week total '{}' from document scan", text);
    }
    fallback
}
