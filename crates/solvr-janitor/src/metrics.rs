//! Metrics collection for Janitor operations

use serde::Serialize;

/// One policy of the sweep cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepStep {
    /// Warn authors of approaches nearing abandonment
    Warn,
    /// Abandon inactive approaches
    Abandon,
    /// Mark empty problems dormant
    Dormant,
}

impl SweepStep {
    /// Name used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            SweepStep::Warn => "warn",
            SweepStep::Abandon => "abandon",
            SweepStep::Dormant => "dormant",
        }
    }
}

impl std::fmt::Display for SweepStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A step that failed during a sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    /// Which step
    pub step: SweepStep,
    /// Error message
    pub message: String,
}

/// Outcome of one sweep cycle
///
/// In dry-run mode the counts are candidates, not changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Warnings sent
    pub warned: usize,
    /// Approaches abandoned
    pub abandoned: usize,
    /// Problems marked dormant
    pub dormant: usize,
    /// Notifications that could not be created
    pub notification_failures: usize,
    /// Steps that failed; the other steps still ran
    pub failures: Vec<StepFailure>,
    /// Whether this was a dry run
    pub dry_run: bool,
}

impl SweepReport {
    /// Whether every step succeeded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether the sweep changed (or in dry-run would change) anything
    pub fn is_empty(&self) -> bool {
        self.warned == 0 && self.abandoned == 0 && self.dormant == 0
    }
}

/// Metrics accumulated across sweep cycles
#[derive(Debug, Clone, Default, Serialize)]
pub struct JanitorMetrics {
    /// Total warnings sent
    pub warned: usize,

    /// Total approaches abandoned
    pub abandoned: usize,

    /// Total problems marked dormant
    pub dormant: usize,

    /// Notifications that failed and were skipped
    pub notification_failures: usize,

    /// Steps that failed
    pub failed_steps: usize,

    /// Total sweep iterations completed
    pub sweep_count: usize,

    /// Total runtime in milliseconds
    pub total_runtime_ms: u64,
}

impl JanitorMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a finished sweep into the totals
    pub fn record_sweep(&mut self, report: &SweepReport) {
        self.sweep_count += 1;
        if report.dry_run {
            return;
        }
        self.warned += report.warned;
        self.abandoned += report.abandoned;
        self.dormant += report.dormant;
        self.notification_failures += report.notification_failures;
        self.failed_steps += report.failures.len();
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Janitor Metrics Summary".to_string(),
            "======================".to_string(),
            format!("Sweep cycles: {}", self.sweep_count),
            format!("Total runtime: {}ms", self.total_runtime_ms),
            String::new(),
            format!("Warned: {}", self.warned),
            format!("Abandoned: {}", self.abandoned),
            format!("Dormant: {}", self.dormant),
        ];

        if self.notification_failures > 0 {
            lines.push(format!("Notification failures: {}", self.notification_failures));
        }
        if self.failed_steps > 0 {
            lines.push(format!("Failed steps: {}", self.failed_steps));
        }

        lines.join("\n")
    }
}
