use std::io::Write;

use anyhow::{Context, Result};

use crate::timefmt::format_worded;

use super::pipeline::WorkSummary;

/// Receives the outcome of an acquisition cycle.
pub trait Presenter {
    /// Show a computed summary. An error here is reported back through
    /// [`Presenter::on_error`] as a non-retryable presentation failure.
    fn on_result(&mut self, summary: &WorkSummary) -> Result<()>;

    fn on_error(&mut self, message: &str, retryable: bool);

    /// Whether a result is already on screen; attempts become no-ops if so.
    fn has_presented(&self) -> bool {
        false
    }
}

/// Writes the summary as text (and optionally JSON) to any writer.
pub struct ConsolePresenter<W: Write> {
    out: W,
    json: bool,
    presented: bool,
}

impl<W: Write> ConsolePresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            json: false,
            presented: false,
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for ConsolePresenter<W> {
    fn on_result(&mut self, summary: &WorkSummary) -> Result<()> {
        writeln!(self.out, "이번 주 총 근무시간: {}", format_worded(summary.total_minutes))?;
        writeln!(
            self.out,
            "누적: {} + 오늘: {}",
            format_worded(summary.week_minutes),
            format_worded(summary.today_minutes)
        )?;

        if let (Some(start), true) = (summary.start_time, summary.projection.is_shown()) {
            writeln!(self.out, "예상 퇴근시간: {} (출근: {})", summary.projection, start)?;
        }

        if self.json {
            let json = serde_json::to_string_pretty(summary).context("failed to encode summary")?;
            writeln!(self.out, "{json}")?;
        }

        self.out.flush().context("failed to flush summary")?;
        self.presented = true;
        Ok(())
    }

    fn on_error(&mut self, message: &str, retryable: bool) {
        let hint = if retryable { " [새로고침]" } else { "" };
        if let Err(err) = writeln!(self.out, "⚠️ {message}{hint}") {
            log::error!("failed to write error message: {err}");
        }
    }

    fn has_presented(&self) -> bool {
        self.presented
    }
}
