//! Core Janitor implementation for the stale-content policies

use crate::{CancellationToken, JanitorConfig, JanitorError, JanitorMetrics, StepFailure, SweepReport, SweepStep};
use solvr_domain::traits::{NotificationSink, StaleContentStore, WarningCandidate};
use solvr_domain::{Approach, NewNotification, NotificationKind, Recipient};
use std::fmt::Display;
use std::time::Instant;

/// Result of the warn step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarnOutcome {
    /// Warnings claimed and sent (candidates, in dry-run mode)
    pub sent: usize,
    /// Rows skipped because the claim or the notification failed; retried on
    /// the next sweep
    pub failed: usize,
}

/// Whole days until abandonment, rounded up, at least one
fn days_remaining(time_left: chrono::Duration) -> i64 {
    let hours = time_left.num_hours().max(0);
    ((hours + 23) / 24).max(1)
}

/// Build the abandonment warning for one candidate
pub fn abandonment_warning(candidate: &WarningCandidate) -> NewNotification {
    let days = days_remaining(candidate.time_left);
    let unit = if days == 1 { "day" } else { "days" };
    NewNotification {
        kind: NotificationKind::ApproachAbandonmentWarning,
        title: format!(
            "Your approach on \"{}\" will be auto-abandoned in {} {}",
            candidate.problem_title, days, unit
        ),
        body: format!(
            "Approach {} has been inactive. Update it to prevent auto-abandonment.",
            candidate.approach.id
        ),
        link: format!("/problems/{}", candidate.approach.problem_id),
        recipient: Recipient::for_author(&candidate.approach.author),
    }
}

/// Janitor service for the stale-content lifecycle
///
/// Responsible for:
/// - Warning authors before their inactive approaches are abandoned
/// - Abandoning approaches left in `working`/`starting`
/// - Marking problems nobody attempted as dormant
/// - Collecting metrics on each cycle
///
/// # Examples
///
/// ```no_run
/// use solvr_janitor::{Janitor, JanitorConfig};
/// use solvr_store::SqliteStore;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = SqliteStore::new("solvr.db")?;
/// let mut janitor = Janitor::new(JanitorConfig::default());
///
/// // The store is also the notification emitter
/// let report = janitor.sweep(&store, &store);
/// println!("{} warned, {} abandoned", report.warned, report.abandoned);
/// println!("{}", janitor.metrics().summary());
/// # Ok(())
/// # }
/// ```
pub struct Janitor {
    config: JanitorConfig,
    metrics: JanitorMetrics,
    cancel: CancellationToken,
}

impl Janitor {
    /// Create a new Janitor with the given configuration
    pub fn new(config: JanitorConfig) -> Self {
        Self {
            config,
            metrics: JanitorMetrics::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Create a Janitor with default configuration
    pub fn default_config() -> Self {
        Self::new(JanitorConfig::default())
    }

    /// Share an existing cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops a running sweep between approaches
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Active configuration
    pub fn config(&self) -> &JanitorConfig {
        &self.config
    }

    /// Get a reference to the current metrics
    pub fn metrics(&self) -> &JanitorMetrics {
        &self.metrics
    }

    /// Reset metrics counters
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    /// Perform a complete sweep cycle
    ///
    /// Runs warn, abandon, then dormant. The steps are independent: a failing
    /// step is logged and recorded in the report, and the remaining steps
    /// still run. An approach that crosses both thresholds between two sweeps
    /// is abandoned without a warning.
    pub fn sweep<S, N>(&mut self, store: &S, notifier: &N) -> SweepReport
    where
        S: StaleContentStore,
        S::Error: Display,
        N: NotificationSink,
        N::Error: Display,
    {
        let start = Instant::now();
        let mut report = SweepReport {
            dry_run: self.config.dry_run,
            ..Default::default()
        };

        match self.warn_approaching_abandonment(store, notifier) {
            Ok(outcome) => {
                report.warned = outcome.sent;
                report.notification_failures = outcome.failed;
            }
            Err(e) => Self::record_failure(&mut report, SweepStep::Warn, e),
        }

        match self.guarded(|janitor| janitor.abandon_stale_approaches(store)) {
            Ok(count) => report.abandoned = count,
            Err(e) => Self::record_failure(&mut report, SweepStep::Abandon, e),
        }

        match self.guarded(|janitor| janitor.mark_dormant_problems(store)) {
            Ok(count) => report.dormant = count,
            Err(e) => Self::record_failure(&mut report, SweepStep::Dormant, e),
        }

        self.metrics.record_sweep(&report);
        self.metrics.total_runtime_ms += start.elapsed().as_millis() as u64;

        if report.is_empty() && report.is_clean() {
            tracing::debug!(dry_run = report.dry_run, "Sweep found nothing to do");
        } else {
            tracing::info!(
                warned = report.warned,
                abandoned = report.abandoned,
                dormant = report.dormant,
                failed_steps = report.failures.len(),
                dry_run = report.dry_run,
                "Sweep completed"
            );
        }

        report
    }

    /// Run `step` unless cancellation was requested
    fn guarded<T>(&self, step: impl FnOnce(&Self) -> Result<T, JanitorError>) -> Result<T, JanitorError> {
        if self.cancel.is_cancelled() {
            return Err(JanitorError::Cancelled);
        }
        step(self)
    }

    fn record_failure(report: &mut SweepReport, step: SweepStep, error: JanitorError) {
        match error {
            JanitorError::Cancelled => tracing::info!(step = %step, "Sweep step skipped after cancellation"),
            ref e => tracing::error!(step = %step, error = %e, "Sweep step failed"),
        }
        report.failures.push(StepFailure {
            step,
            message: error.to_string(),
        });
    }

    /// Warn authors whose approaches sit inside the warning window
    ///
    /// One notification per approach per inactivity window. The window is
    /// claimed before notifying, so a window another sweep already claimed is
    /// skipped without a notification. A row whose claim or notification
    /// fails is logged and skipped; a failed notification releases its claim
    /// so the next sweep tries again.
    pub fn warn_approaching_abandonment<S, N>(&self, store: &S, notifier: &N) -> Result<WarnOutcome, JanitorError>
    where
        S: StaleContentStore,
        S::Error: Display,
        N: NotificationSink,
        N::Error: Display,
    {
        if self.cancel.is_cancelled() {
            return Err(JanitorError::Cancelled);
        }

        let candidates = store
            .approaches_due_for_warning(self.config.warning_threshold(), self.config.abandon_threshold())
            .map_err(JanitorError::store)?;

        if self.config.dry_run {
            tracing::info!("DRY RUN: Would warn {} approach authors", candidates.len());
            return Ok(WarnOutcome {
                sent: candidates.len(),
                failed: 0,
            });
        }

        let mut outcome = WarnOutcome::default();
        for candidate in &candidates {
            if self.cancel.is_cancelled() {
                tracing::info!(sent = outcome.sent, "Warn step cancelled");
                break;
            }

            match self.warn_one(store, notifier, candidate) {
                Ok(true) => outcome.sent += 1,
                Ok(false) => {
                    tracing::debug!(approach_id = %candidate.approach.id, "Warning already claimed for this window");
                }
                Err(e) => {
                    tracing::warn!(
                        approach_id = %candidate.approach.id,
                        error = %e,
                        "Failed to send abandonment warning, skipping"
                    );
                    outcome.failed += 1;
                }
            }
        }

        Ok(outcome)
    }

    /// Claim, notify, confirm; `Ok(false)` when the window was already claimed
    fn warn_one<S, N>(&self, store: &S, notifier: &N, candidate: &WarningCandidate) -> Result<bool, JanitorError>
    where
        S: StaleContentStore,
        S::Error: Display,
        N: NotificationSink,
        N::Error: Display,
    {
        let key = candidate.key();
        if !store.claim_warning(key).map_err(JanitorError::store)? {
            return Ok(false);
        }

        let notification = match notifier.create_notification(abandonment_warning(candidate)) {
            Ok(notification) => notification,
            Err(e) => {
                if let Err(release) = store.release_warning(key) {
                    tracing::error!(
                        approach_id = %candidate.approach.id,
                        error = %release,
                        "Failed to release warning claim; this window will not be warned"
                    );
                }
                return Err(JanitorError::notification(e));
            }
        };

        // Already sent, so the claim stays even if the link fails
        if let Err(e) = store.confirm_warning(key, notification.id) {
            tracing::warn!(
                approach_id = %candidate.approach.id,
                notification_id = %notification.id,
                error = %e,
                "Warning sent but not linked to its notification"
            );
        }

        Ok(true)
    }

    /// Abandon approaches idle past the abandon threshold
    pub fn abandon_stale_approaches<S>(&self, store: &S) -> Result<usize, JanitorError>
    where
        S: StaleContentStore,
        S::Error: Display,
    {
        let threshold = self.config.abandon_threshold();

        if self.config.dry_run {
            let count = store.count_abandon_candidates(threshold).map_err(JanitorError::store)?;
            tracing::info!("DRY RUN: Would abandon {} approaches", count);
            return Ok(count);
        }

        store.abandon_stale_approaches(threshold).map_err(JanitorError::store)
    }

    /// Mark open problems with no live approaches as dormant
    pub fn mark_dormant_problems<S>(&self, store: &S) -> Result<usize, JanitorError>
    where
        S: StaleContentStore,
        S::Error: Display,
    {
        let threshold = self.config.dormant_threshold();

        if self.config.dry_run {
            let count = store.count_dormant_candidates(threshold).map_err(JanitorError::store)?;
            tracing::info!("DRY RUN: Would mark {} problems dormant", count);
            return Ok(count);
        }

        store.mark_dormant_problems(threshold).map_err(JanitorError::store)
    }

    /// Approaches due for archival under the configured age limits
    pub fn stale_approaches<S>(&self, store: &S) -> Result<Vec<Approach>, JanitorError>
    where
        S: StaleContentStore,
        S::Error: Display,
    {
        store
            .list_stale_approaches(self.config.failed_after_days, self.config.superseded_after_days)
            .map_err(JanitorError::store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use solvr_domain::{
        ApproachId, ApproachStatus, Author, Notification, NotificationId, ProblemId, WarningKey,
    };
    use std::cell::{Cell, RefCell};
    use std::collections::HashSet;
    use std::time::Duration;

    // Mock store for testing
    #[derive(Default)]
    struct MockStore {
        candidates: Vec<WarningCandidate>,
        warned: RefCell<HashSet<WarningKey>>,
        confirmed: RefCell<Vec<NotificationId>>,
        claim_failures: Cell<usize>,
        claimed_elsewhere: bool,
        stale: usize,
        empty_problems: usize,
        fail_abandon: bool,
        abandon_calls: Cell<usize>,
    }

    impl StaleContentStore for MockStore {
        type Error = String;

        fn abandon_stale_approaches(&self, _older_than: Duration) -> Result<usize, Self::Error> {
            self.abandon_calls.set(self.abandon_calls.get() + 1);
            if self.fail_abandon {
                return Err("database is locked".to_string());
            }
            Ok(self.stale)
        }

        fn count_abandon_candidates(&self, _older_than: Duration) -> Result<usize, Self::Error> {
            Ok(self.stale)
        }

        fn approaches_due_for_warning(
            &self,
            _warning: Duration,
            _abandon: Duration,
        ) -> Result<Vec<WarningCandidate>, Self::Error> {
            let warned = self.warned.borrow();
            Ok(self
                .candidates
                .iter()
                .filter(|c| !warned.contains(&c.key()))
                .cloned()
                .collect())
        }

        fn claim_warning(&self, key: WarningKey) -> Result<bool, Self::Error> {
            if self.claim_failures.get() > 0 {
                self.claim_failures.set(self.claim_failures.get() - 1);
                return Err("database is locked".to_string());
            }
            if self.claimed_elsewhere {
                return Ok(false);
            }
            Ok(self.warned.borrow_mut().insert(key))
        }

        fn confirm_warning(&self, _key: WarningKey, notification_id: NotificationId) -> Result<(), Self::Error> {
            self.confirmed.borrow_mut().push(notification_id);
            Ok(())
        }

        fn release_warning(&self, key: WarningKey) -> Result<(), Self::Error> {
            self.warned.borrow_mut().remove(&key);
            Ok(())
        }

        fn mark_dormant_problems(&self, _older_than: Duration) -> Result<usize, Self::Error> {
            Ok(self.empty_problems)
        }

        fn count_dormant_candidates(&self, _older_than: Duration) -> Result<usize, Self::Error> {
            Ok(self.empty_problems)
        }

        fn list_stale_approaches(&self, _failed: u32, _superseded: u32) -> Result<Vec<Approach>, Self::Error> {
            Ok(Vec::new())
        }

        fn archive_approach(&self, _id: ApproachId, _archive_ref: &str) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    // Mock emitter that rejects one recipient
    #[derive(Default)]
    struct MockSink {
        sent: RefCell<Vec<NewNotification>>,
        reject: Option<Recipient>,
    }

    impl NotificationSink for MockSink {
        type Error = String;

        fn create_notification(&self, notification: NewNotification) -> Result<Notification, Self::Error> {
            if self.reject.as_ref() == Some(&notification.recipient) {
                return Err("emitter unavailable".to_string());
            }
            self.sent.borrow_mut().push(notification.clone());
            Ok(Notification {
                id: NotificationId::new(),
                kind: notification.kind,
                title: notification.title,
                body: notification.body,
                link: notification.link,
                recipient: notification.recipient,
                created_at: Utc::now(),
            })
        }
    }

    fn candidate(author: Author, hours_left: i64) -> WarningCandidate {
        let now = Utc::now();
        let approach = Approach {
            id: ApproachId::new(),
            problem_id: ProblemId::new(),
            author,
            angle: "shard the index".to_string(),
            method: String::new(),
            outcome: None,
            solution: None,
            status: ApproachStatus::Working,
            is_latest: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            archived_at: None,
            archive_ref: None,
        };
        WarningCandidate {
            approach,
            problem_title: "Slow search".to_string(),
            abandon_at: now + ChronoDuration::hours(hours_left),
            time_left: ChronoDuration::hours(hours_left),
        }
    }

    #[test]
    fn test_janitor_creation() {
        let janitor = Janitor::default_config();
        assert_eq!(janitor.metrics().sweep_count, 0);
        assert!(!janitor.config().dry_run);
    }

    #[test]
    fn test_days_remaining() {
        assert_eq!(days_remaining(ChronoDuration::hours(168)), 7);
        assert_eq!(days_remaining(ChronoDuration::hours(138)), 6);
        assert_eq!(days_remaining(ChronoDuration::hours(2)), 1);
        assert_eq!(days_remaining(ChronoDuration::hours(-5)), 1);
    }

    #[test]
    fn test_warning_content() {
        let c = candidate(Author::human("u-1"), 168);
        let warning = abandonment_warning(&c);

        assert_eq!(warning.kind, NotificationKind::ApproachAbandonmentWarning);
        assert_eq!(warning.title, "Your approach on \"Slow search\" will be auto-abandoned in 7 days");
        assert!(warning.body.contains(&c.approach.id.to_string()));
        assert_eq!(warning.link, format!("/problems/{}", c.approach.problem_id));
        assert_eq!(warning.recipient, Recipient::Human("u-1".to_string()));

        let last_day = abandonment_warning(&candidate(Author::agent("a-1"), 20));
        assert!(last_day.title.ends_with("in 1 day"));
        assert_eq!(last_day.recipient, Recipient::Agent("a-1".to_string()));
    }

    #[test]
    fn test_sweep_runs_all_steps() {
        let store = MockStore {
            candidates: vec![candidate(Author::agent("a"), 100), candidate(Author::human("h"), 50)],
            stale: 3,
            empty_problems: 1,
            ..Default::default()
        };
        let sink = MockSink::default();
        let mut janitor = Janitor::default_config();

        let report = janitor.sweep(&store, &sink);

        assert_eq!(report.warned, 2);
        assert_eq!(report.abandoned, 3);
        assert_eq!(report.dormant, 1);
        assert!(report.is_clean());
        assert_eq!(sink.sent.borrow().len(), 2);
        assert_eq!(janitor.metrics().sweep_count, 1);
        assert_eq!(janitor.metrics().abandoned, 3);
    }

    #[test]
    fn test_warnings_sent_once_per_window() {
        let store = MockStore {
            candidates: vec![candidate(Author::agent("a"), 100)],
            ..Default::default()
        };
        let sink = MockSink::default();
        let mut janitor = Janitor::default_config();

        assert_eq!(janitor.sweep(&store, &sink).warned, 1);
        assert_eq!(janitor.sweep(&store, &sink).warned, 0);
        assert_eq!(sink.sent.borrow().len(), 1);
    }

    #[test]
    fn test_failed_step_does_not_stop_others() {
        let store = MockStore {
            candidates: vec![candidate(Author::agent("a"), 100)],
            empty_problems: 2,
            fail_abandon: true,
            ..Default::default()
        };
        let sink = MockSink::default();
        let mut janitor = Janitor::default_config();

        let report = janitor.sweep(&store, &sink);

        assert_eq!(report.warned, 1);
        assert_eq!(report.dormant, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].step, SweepStep::Abandon);
        assert!(report.failures[0].message.contains("database is locked"));
        assert_eq!(janitor.metrics().failed_steps, 1);
    }

    #[test]
    fn test_rejected_notification_is_skipped_and_retried() {
        let store = MockStore {
            candidates: vec![candidate(Author::agent("ok"), 100), candidate(Author::agent("down"), 100)],
            ..Default::default()
        };
        let mut sink = MockSink {
            reject: Some(Recipient::Agent("down".to_string())),
            ..Default::default()
        };
        let mut janitor = Janitor::default_config();

        let report = janitor.sweep(&store, &sink);
        assert_eq!(report.warned, 1);
        assert_eq!(report.notification_failures, 1);
        assert!(report.is_clean());

        sink.reject = None;
        let report = janitor.sweep(&store, &sink);
        assert_eq!(report.warned, 1, "The skipped warning goes out on the next sweep");
    }

    #[test]
    fn test_failed_claim_skips_only_that_row() {
        let store = MockStore {
            candidates: vec![
                candidate(Author::agent("a"), 100),
                candidate(Author::agent("b"), 100),
                candidate(Author::agent("c"), 100),
            ],
            claim_failures: Cell::new(1),
            ..Default::default()
        };
        let sink = MockSink::default();
        let mut janitor = Janitor::default_config();

        let report = janitor.sweep(&store, &sink);
        assert!(report.is_clean());
        assert_eq!(report.warned, 2);
        assert_eq!(report.notification_failures, 1);
        assert_eq!(sink.sent.borrow().len(), 2);
        assert_eq!(store.confirmed.borrow().len(), 2);

        let report = janitor.sweep(&store, &sink);
        assert_eq!(report.warned, 1, "The skipped row is warned on the next sweep");
        assert_eq!(sink.sent.borrow().len(), 3);
    }

    #[test]
    fn test_window_claimed_elsewhere_sends_nothing() {
        let store = MockStore {
            candidates: vec![candidate(Author::agent("a"), 100)],
            claimed_elsewhere: true,
            ..Default::default()
        };
        let sink = MockSink::default();
        let mut janitor = Janitor::default_config();

        let report = janitor.sweep(&store, &sink);

        assert_eq!(report.warned, 0);
        assert_eq!(report.notification_failures, 0);
        assert!(sink.sent.borrow().is_empty());
    }

    #[test]
    fn test_rejected_notification_releases_claim() {
        let store = MockStore {
            candidates: vec![candidate(Author::agent("down"), 100)],
            ..Default::default()
        };
        let sink = MockSink {
            reject: Some(Recipient::Agent("down".to_string())),
            ..Default::default()
        };
        let janitor = Janitor::default_config();

        let outcome = janitor.warn_approaching_abandonment(&store, &sink).unwrap();

        assert_eq!(outcome, WarnOutcome { sent: 0, failed: 1 });
        assert!(store.warned.borrow().is_empty());
        assert!(store.confirmed.borrow().is_empty());
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let store = MockStore {
            candidates: vec![candidate(Author::agent("a"), 100)],
            stale: 4,
            empty_problems: 1,
            ..Default::default()
        };
        let sink = MockSink::default();
        let mut janitor = Janitor::new(JanitorConfig {
            dry_run: true,
            ..Default::default()
        });

        let report = janitor.sweep(&store, &sink);

        assert!(report.dry_run);
        assert_eq!(report.warned, 1);
        assert_eq!(report.abandoned, 4);
        assert_eq!(report.dormant, 1);
        assert!(sink.sent.borrow().is_empty());
        assert_eq!(store.abandon_calls.get(), 0);
        assert!(store.warned.borrow().is_empty());
    }

    #[test]
    fn test_cancelled_sweep_skips_work() {
        let store = MockStore {
            candidates: vec![candidate(Author::agent("a"), 100)],
            stale: 1,
            ..Default::default()
        };
        let sink = MockSink::default();
        let mut janitor = Janitor::default_config();
        janitor.cancellation_token().cancel();

        let report = janitor.sweep(&store, &sink);

        assert_eq!(report.failures.len(), 3);
        assert!(sink.sent.borrow().is_empty());
        assert_eq!(store.abandon_calls.get(), 0);
    }
}
