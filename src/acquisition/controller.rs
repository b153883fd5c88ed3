use std::time::Duration;

use chrono::{Datelike, Local, Weekday};
use log::{error, info, warn};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::FlexConfig;
use crate::error::FlexError;
use crate::log_debug;

use super::host::{ChangeSubscription, HostDocument};
use super::pipeline::evaluate;
use super::presenter::Presenter;
use super::state::{AcquisitionSession, AcquisitionStatus};

/// Result of a single attempt at the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Already calculated, already on screen, or the cycle was cancelled.
    Skipped,
    /// Page not readable or totals not rendered yet.
    NotReady,
    Presented,
    /// An error was surfaced to the presenter; the cycle stops here.
    Halted,
}

impl AttemptOutcome {
    fn settled(self) -> Option<AcquisitionStatus> {
        match self {
            AttemptOutcome::Skipped | AttemptOutcome::Presented => Some(AcquisitionStatus::Done),
            AttemptOutcome::Halted => Some(AcquisitionStatus::Failed),
            AttemptOutcome::NotReady => None,
        }
    }
}

/// Waits for the host page to render its totals, then presents the summary.
///
/// One cycle: a deferred first attempt, then polling driven by change
/// notifications and a capped fallback interval, bounded by a hard timeout.
/// All sources run in one task and share a cancellation token, so attempts
/// never interleave and nothing fires after the cycle ends.
pub struct AcquisitionController {
    config: FlexConfig,
    session: AcquisitionSession,
    shutdown: CancellationToken,
    weekday_override: Option<Weekday>,
}

impl AcquisitionController {
    pub fn new(config: FlexConfig) -> Self {
        Self {
            config,
            session: AcquisitionSession::new(),
            shutdown: CancellationToken::new(),
            weekday_override: None,
        }
    }

    /// Pin the day of week instead of reading the local clock.
    pub fn with_weekday(mut self, weekday: Weekday) -> Self {
        self.weekday_override = Some(weekday);
        self
    }

    pub fn session(&self) -> &AcquisitionSession {
        &self.session
    }

    pub fn config(&self) -> &FlexConfig {
        &self.config
    }

    /// Token that aborts any running cycle when cancelled (e.g. page unload).
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    fn weekday(&self) -> Weekday {
        self.weekday_override
            .unwrap_or_else(|| Local::now().weekday())
    }

    /// Run one full acquisition cycle and return its terminal status.
    ///
    /// Returns `Idle` if the shutdown token fires before the cycle settles.
    pub async fn run<H, P>(&mut self, host: &H, presenter: &mut P) -> AcquisitionStatus
    where
        H: HostDocument,
        P: Presenter,
    {
        let cycle = self.shutdown.child_token();
        let timing = self.config.timing.clone();

        self.session.begin_waiting();
        log_debug!("first attempt in {:?}", timing.initial_delay);

        tokio::select! {
            biased;
            _ = cycle.cancelled() => return self.settle(&cycle, AcquisitionStatus::Idle),
            _ = time::sleep(timing.initial_delay) => {}
        }

        if let Some(status) = self.attempt(host, presenter, &cycle).settled() {
            log_debug!("first attempt settled: {:?}", status);
            return self.settle(&cycle, status);
        }

        info!("totals not rendered yet; polling for changes");
        self.session.begin_polling();

        let mut changes = if timing.notifications_enabled() {
            host.subscribe_to_changes(&self.config.selectors.change_scope)
        } else {
            ChangeSubscription::closed()
        };
        let mut notification_attempts: u32 = 0;

        // interval_at rejects a zero period; a disabled ticker is never polled.
        let period = timing.retry_interval.max(Duration::from_millis(1));
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut interval_attempts: u32 = 0;
        let mut interval_active = timing.interval_enabled();

        let deadline = time::sleep(timing.notification_timeout);
        tokio::pin!(deadline);

        let status = loop {
            tokio::select! {
                biased;
                _ = cycle.cancelled() => break AcquisitionStatus::Idle,
                _ = &mut deadline => {
                    changes.cancel();
                    if self.session.is_calculated() {
                        break AcquisitionStatus::Done;
                    }
                    warn!("no result after {:?}; making a final attempt", timing.notification_timeout);
                    break match self.attempt(host, presenter, &cycle).settled() {
                        Some(status) => status,
                        None => {
                            let err = FlexError::AcquisitionTimedOut;
                            presenter.on_error(&err.to_string(), err.is_retryable());
                            AcquisitionStatus::TimedOut
                        }
                    };
                }
                notified = changes.next(), if changes.is_active() => {
                    if notified.is_none() {
                        log_debug!("change feed closed by host");
                        changes.cancel();
                        continue;
                    }
                    notification_attempts += 1;
                    if let Some(status) = self.attempt(host, presenter, &cycle).settled() {
                        log_debug!("settled on change notification #{}", notification_attempts);
                        break status;
                    }
                    if notification_attempts >= timing.max_notification_retries {
                        info!("change-notification retry cap ({}) reached", timing.max_notification_retries);
                        changes.cancel();
                    }
                }
                _ = ticker.tick(), if interval_active => {
                    interval_attempts += 1;
                    if let Some(status) = self.attempt(host, presenter, &cycle).settled() {
                        log_debug!("settled on interval retry #{}", interval_attempts);
                        break status;
                    }
                    if interval_attempts >= timing.max_interval_retries {
                        info!("interval retry cap ({}) reached", timing.max_interval_retries);
                        interval_active = false;
                    }
                }
            }
        };

        changes.cancel();
        self.settle(&cycle, status)
    }

    /// User-initiated retry: reset the session and run the pipeline once.
    ///
    /// No timers are involved; if the page still has no totals the
    /// `NoDataFound` error is surfaced. After shutdown nothing is read and the
    /// result is `Idle`.
    pub fn retry<H, P>(&mut self, host: &H, presenter: &mut P) -> AcquisitionStatus
    where
        H: HostDocument,
        P: Presenter,
    {
        if self.shutdown.is_cancelled() {
            log_debug!("retry ignored after shutdown");
            return AcquisitionStatus::Idle;
        }

        self.session.reset();
        let cycle = self.shutdown.child_token();

        let status = match self.attempt(host, presenter, &cycle) {
            AttemptOutcome::Presented | AttemptOutcome::Skipped => AcquisitionStatus::Done,
            AttemptOutcome::Halted => AcquisitionStatus::Failed,
            AttemptOutcome::NotReady => {
                let err = FlexError::NoDataFound;
                presenter.on_error(&err.to_string(), err.is_retryable());
                AcquisitionStatus::Failed
            }
        };

        self.settle(&cycle, status)
    }

    /// One guarded pass through the pipeline.
    fn attempt<H, P>(&mut self, host: &H, presenter: &mut P, cycle: &CancellationToken) -> AttemptOutcome
    where
        H: HostDocument,
        P: Presenter,
    {
        if cycle.is_cancelled() || self.session.is_calculated() || presenter.has_presented() {
            return AttemptOutcome::Skipped;
        }

        self.session.record_attempt();
        let attempt = self.session.attempts;

        let snapshot = match host.snapshot_text(&self.config.selectors.snapshot) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                log_debug!("attempt {}: snapshot unavailable: {err:#}", attempt);
                return AttemptOutcome::NotReady;
            }
        };

        let summary = match evaluate(&snapshot, &self.config, self.weekday()) {
            Ok(summary) => summary,
            Err(FlexError::NoDataFound) => {
                log_debug!("attempt {}: no totals in {} fragments", attempt, snapshot.len());
                return AttemptOutcome::NotReady;
            }
            Err(err) => {
                warn!("attempt {}: {}", attempt, err);
                presenter.on_error(&err.to_string(), err.is_retryable());
                return AttemptOutcome::Halted;
            }
        };

        match presenter.on_result(&summary) {
            Ok(()) => {
                self.session.mark_calculated();
                info!("presented weekly total after {} attempt(s)", attempt);
                AttemptOutcome::Presented
            }
            Err(err) => {
                error!("presentation failed: {err:#}");
                let err = FlexError::PresentationFailure {
                    detail: format!("{err:#}"),
                };
                presenter.on_error(&err.to_string(), err.is_retryable());
                AttemptOutcome::Halted
            }
        }
    }

    fn settle(&mut self, cycle: &CancellationToken, status: AcquisitionStatus) -> AcquisitionStatus {
        cycle.cancel();
        self.session.finish(status);
        status
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Result};

    use super::*;
    use crate::acquisition::host::FixtureDocument;
    use crate::config::AcquisitionTiming;
    use crate::acquisition::pipeline::WorkSummary;
    use crate::schedule::Projection;
    use crate::snapshot::{SnapshotBuilder, TimeSnapshot};

    #[derive(Default)]
    struct RecordingPresenter {
        results: Vec<WorkSummary>,
        errors: Vec<(String, bool)>,
        fail_results: bool,
    }

    impl Presenter for RecordingPresenter {
        fn on_result(&mut self, summary: &WorkSummary) -> Result<()> {
            if self.fail_results {
                return Err(anyhow!("display element missing"));
            }
            self.results.push(summary.clone());
            Ok(())
        }

        fn on_error(&mut self, message: &str, retryable: bool) {
            self.errors.push((message.to_string(), retryable));
        }

        fn has_presented(&self) -> bool {
            !self.results.is_empty()
        }
    }

    fn rendered_page() -> TimeSnapshot {
        let mut b = SnapshotBuilder::new();
        let body = b.element("근무 현황 대시보드 본문 텍스트가 길게 이어집니다", None);
        b.button("근무중 1시간 0분", Some(body));
        b.button("30:00", Some(body));
        let marker = b.element("기록 중", Some(body));
        b.element("오전 9:00", Some(marker));
        b.build().unwrap()
    }

    fn loading_page() -> TimeSnapshot {
        let mut b = SnapshotBuilder::new();
        b.element("로딩 중", None);
        b.build().unwrap()
    }

    fn invalid_page() -> TimeSnapshot {
        let mut b = SnapshotBuilder::new();
        b.button("근무중 0분", None);
        b.build().unwrap()
    }

    fn controller() -> AcquisitionController {
        AcquisitionController::new(FlexConfig::default()).with_weekday(Weekday::Fri)
    }

    fn controller_with(adjust: impl FnOnce(&mut AcquisitionTiming)) -> AcquisitionController {
        let mut config = FlexConfig::default();
        adjust(&mut config.timing);
        AcquisitionController::new(config).with_weekday(Weekday::Fri)
    }

    #[tokio::test(start_paused = true)]
    async fn first_attempt_after_initial_delay_succeeds() {
        let host = FixtureDocument::rendered(rendered_page());
        let mut presenter = RecordingPresenter::default();
        let mut controller = controller();
        let started = Instant::now();

        let status = controller.run(&host, &mut presenter).await;

        assert_eq!(status, AcquisitionStatus::Done);
        assert!(started.elapsed() >= Duration::from_millis(3500));
        assert!(started.elapsed() < Duration::from_millis(4000));
        assert_eq!(host.read_count(), 1);
        assert_eq!(host.active_subscriptions(), 0);
        assert_eq!(presenter.results.len(), 1);
        assert_eq!(
            presenter.results[0].projection,
            Projection::EndTime("19:00".parse().unwrap())
        );
        assert!(controller.session().is_calculated());
    }

    #[tokio::test(start_paused = true)]
    async fn change_notification_triggers_success() {
        let host = FixtureDocument::new();
        let mut presenter = RecordingPresenter::default();
        let mut controller = controller();

        let (status, delivered) = tokio::join!(controller.run(&host, &mut presenter), async {
            time::sleep(Duration::from_millis(3700)).await;
            host.publish(rendered_page())
        });

        assert_eq!(delivered, 1);
        assert_eq!(status, AcquisitionStatus::Done);
        assert_eq!(host.read_count(), 2);
        assert_eq!(host.active_subscriptions(), 0);
        assert_eq!(presenter.results.len(), 1);
        assert!(presenter.errors.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn interval_retry_picks_up_silent_render() {
        let host = FixtureDocument::new();
        let mut presenter = RecordingPresenter::default();
        let mut controller = controller();

        let (status, _) = tokio::join!(controller.run(&host, &mut presenter), async {
            time::sleep(Duration::from_millis(4200)).await;
            host.replace(rendered_page());
        });

        assert_eq!(status, AcquisitionStatus::Done);
        // initial at 3.5s, interval at 4.0s (not ready) and 4.5s (ready)
        assert_eq!(host.read_count(), 3);
        assert_eq!(presenter.results.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn never_rendering_times_out_once_and_goes_quiet() {
        let host = FixtureDocument::new();
        let mut presenter = RecordingPresenter::default();
        let mut controller = controller();

        let status = controller.run(&host, &mut presenter).await;

        assert_eq!(status, AcquisitionStatus::TimedOut);
        // initial + 5 interval retries + final attempt at the timeout
        assert_eq!(host.read_count(), 7);
        assert_eq!(host.active_subscriptions(), 0);
        assert_eq!(
            presenter.errors,
            vec![(FlexError::AcquisitionTimedOut.to_string(), true)]
        );

        let reads = host.read_count();
        assert_eq!(host.notify(), 0);
        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(host.read_count(), reads);
        assert_eq!(presenter.errors.len(), 1);
        assert!(presenter.results.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn final_attempt_at_timeout_can_still_succeed() {
        let host = FixtureDocument::new();
        let mut presenter = RecordingPresenter::default();
        let mut controller = controller();

        let (status, _) = tokio::join!(controller.run(&host, &mut presenter), async {
            // after the last interval retry at 6.0s, before the deadline at 13.5s
            time::sleep(Duration::from_millis(8000)).await;
            host.replace(rendered_page());
        });

        assert_eq!(status, AcquisitionStatus::Done);
        assert_eq!(host.read_count(), 7);
        assert_eq!(presenter.results.len(), 1);
        assert!(presenter.errors.is_empty());
        assert!(controller.session().is_calculated());
    }

    #[tokio::test(start_paused = true)]
    async fn validation_failure_while_polling_ends_the_cycle() {
        let host = FixtureDocument::new();
        let mut presenter = RecordingPresenter::default();
        let mut controller = controller();

        let (status, delivered) = tokio::join!(controller.run(&host, &mut presenter), async {
            time::sleep(Duration::from_millis(3700)).await;
            host.publish(invalid_page())
        });

        assert_eq!(delivered, 1);
        assert_eq!(status, AcquisitionStatus::Failed);
        assert_eq!(host.read_count(), 2);
        assert_eq!(host.active_subscriptions(), 0);
        assert_eq!(presenter.errors.len(), 1);
        assert!(presenter.errors[0].1);

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(host.read_count(), 2);
        assert_eq!(presenter.errors.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_notification_budget_never_subscribes() {
        let host = FixtureDocument::new();
        let mut presenter = RecordingPresenter::default();
        let mut controller = controller_with(|timing| timing.max_notification_retries = 0);

        let (status, delivered) = tokio::join!(controller.run(&host, &mut presenter), async {
            time::sleep(Duration::from_millis(3600)).await;
            let mut delivered = 0;
            for _ in 0..10 {
                delivered += host.notify();
                time::sleep(Duration::from_millis(10)).await;
            }
            delivered
        });

        assert_eq!(delivered, 0);
        assert_eq!(status, AcquisitionStatus::TimedOut);
        // initial + 5 interval retries + final
        assert_eq!(host.read_count(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retry_interval_disables_the_interval() {
        let host = FixtureDocument::new();
        let mut presenter = RecordingPresenter::default();
        let mut controller = controller_with(|timing| timing.retry_interval = Duration::ZERO);

        let status = controller.run(&host, &mut presenter).await;

        assert_eq!(status, AcquisitionStatus::TimedOut);
        // initial + final
        assert_eq!(host.read_count(), 2);
        assert_eq!(presenter.errors.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn notification_storm_is_capped() {
        let host = FixtureDocument::new();
        let mut presenter = RecordingPresenter::default();
        let mut controller = controller();

        let (status, _) = tokio::join!(controller.run(&host, &mut presenter), async {
            time::sleep(Duration::from_millis(3600)).await;
            for _ in 0..50 {
                host.replace(loading_page());
                host.notify();
                time::sleep(Duration::from_millis(10)).await;
            }
        });

        assert_eq!(status, AcquisitionStatus::TimedOut);
        // initial + 20 notification retries + 5 interval retries + final
        assert_eq!(host.read_count(), 27);
        assert_eq!(host.active_subscriptions(), 0);
        assert_eq!(presenter.errors.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn validation_failure_halts_without_retrying() {
        let host = FixtureDocument::rendered(invalid_page());
        let mut presenter = RecordingPresenter::default();
        let mut controller = controller();

        let status = controller.run(&host, &mut presenter).await;

        assert_eq!(status, AcquisitionStatus::Failed);
        assert_eq!(host.read_count(), 1);
        assert_eq!(host.active_subscriptions(), 0);
        assert_eq!(presenter.errors.len(), 1);
        assert!(presenter.errors[0].1);
        assert!(!controller.session().is_calculated());
    }

    #[tokio::test(start_paused = true)]
    async fn presentation_failure_is_not_retryable() {
        let host = FixtureDocument::rendered(rendered_page());
        let mut presenter = RecordingPresenter {
            fail_results: true,
            ..Default::default()
        };
        let mut controller = controller();

        let status = controller.run(&host, &mut presenter).await;

        assert_eq!(status, AcquisitionStatus::Failed);
        assert_eq!(
            presenter.errors,
            vec![(
                FlexError::PresentationFailure { detail: String::new() }.to_string(),
                false
            )]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn existing_result_makes_attempts_no_ops() {
        let host = FixtureDocument::rendered(rendered_page());
        let mut presenter = RecordingPresenter::default();
        let mut controller = controller();

        assert_eq!(controller.run(&host, &mut presenter).await, AcquisitionStatus::Done);
        assert_eq!(controller.run(&host, &mut presenter).await, AcquisitionStatus::Done);

        assert_eq!(host.read_count(), 1);
        assert_eq!(presenter.results.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_pending_cycle() {
        let host = FixtureDocument::new();
        let mut presenter = RecordingPresenter::default();
        let mut controller = controller();
        let shutdown = controller.shutdown_token();

        let (status, _) = tokio::join!(controller.run(&host, &mut presenter), async {
            time::sleep(Duration::from_millis(5000)).await;
            shutdown.cancel();
        });

        assert_eq!(status, AcquisitionStatus::Idle);
        assert_eq!(host.active_subscriptions(), 0);
        assert!(presenter.errors.is_empty());

        let reads = host.read_count();
        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(host.read_count(), reads);
    }

    #[test]
    fn retry_after_validation_failure_presents_once() {
        let host = FixtureDocument::rendered(invalid_page());
        let mut presenter = RecordingPresenter::default();
        let mut controller = controller();

        assert_eq!(controller.retry(&host, &mut presenter), AcquisitionStatus::Failed);
        assert_eq!(presenter.errors.len(), 1);

        host.replace(rendered_page());
        assert_eq!(controller.retry(&host, &mut presenter), AcquisitionStatus::Done);
        assert_eq!(presenter.results.len(), 1);
        assert!(controller.session().is_calculated());
    }

    #[test]
    fn retry_after_shutdown_does_nothing() {
        let host = FixtureDocument::rendered(rendered_page());
        let mut presenter = RecordingPresenter::default();
        let mut controller = controller();
        controller.shutdown_token().cancel();

        assert_eq!(controller.retry(&host, &mut presenter), AcquisitionStatus::Idle);
        assert_eq!(host.read_count(), 0);
        assert!(presenter.results.is_empty());
        assert!(presenter.errors.is_empty());
        assert!(!controller.session().is_calculated());
    }

    #[test]
    fn retry_on_unrendered_page_reports_no_data() {
        let host = FixtureDocument::new();
        let mut presenter = RecordingPresenter::default();
        let mut controller = controller();

        assert_eq!(controller.retry(&host, &mut presenter), AcquisitionStatus::Failed);
        assert_eq!(
            presenter.errors,
            vec![(FlexError::NoDataFound.to_string(), true)]
        );
        assert_eq!(host.read_count(), 1);
    }
}
