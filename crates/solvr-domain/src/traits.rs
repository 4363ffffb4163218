//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Implementations live in other crates (`solvr-store` for SQLite).
//!
//! Methods take `&self`: implementations are shared between request handlers
//! and the sweep worker and do their own locking.

use crate::{
    Approach, ApproachId, ApproachRelationship, ApproachStatus, ApproachUpdate, Author,
    NewApproach, NewNotification, NewProblem, Notification, NotificationId, Problem, ProblemId,
    RelationType, VersionHistory, WarningKey,
};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Storing and mutating approaches
pub trait ApproachStore {
    /// Error type for store operations
    type Error;

    /// Persist a new approach; assigns ID and timestamps, `is_latest = true`
    fn create_approach(&self, approach: NewApproach) -> Result<Approach, Self::Error>;

    /// Get a live (not soft-deleted) approach by ID
    fn get_approach(&self, id: ApproachId) -> Result<Option<Approach>, Self::Error>;

    /// Move an approach to `status`, validated against the state machine
    fn set_status(&self, id: ApproachId, status: ApproachStatus) -> Result<(), Self::Error>;

    /// Set the latest flag; returns rows affected (0 when the approach is
    /// absent or soft-deleted)
    fn set_latest(&self, id: ApproachId, is_latest: bool) -> Result<usize, Self::Error>;

    /// Apply a partial update and return the updated approach
    fn update_approach(&self, id: ApproachId, update: ApproachUpdate) -> Result<Approach, Self::Error>;

    /// Soft-delete an approach
    fn soft_delete_approach(&self, id: ApproachId) -> Result<(), Self::Error>;

    /// Query live approaches matching criteria
    fn query_approaches(&self, query: &ApproachQuery) -> Result<Vec<Approach>, Self::Error>;
}

/// Query criteria for listing approaches
#[derive(Debug, Clone, Default)]
pub struct ApproachQuery {
    /// Filter by problem
    pub problem_id: Option<ProblemId>,

    /// Filter by author
    pub author: Option<Author>,

    /// Filter by status
    pub status: Option<ApproachStatus>,

    /// Only latest versions
    pub latest_only: bool,

    /// Maximum results to return
    pub limit: Option<usize>,

    /// Results to skip
    pub offset: Option<usize>,
}

/// The relationship graph: supersession edges and version chains
pub trait RelationshipStore {
    /// Error type for graph operations
    type Error;

    /// Link `from` (newer) to `to` (older). For "updates" edges this clears
    /// `to.is_latest` in the same transaction.
    fn create_relationship(
        &self,
        from: ApproachId,
        to: ApproachId,
        relation_type: RelationType,
    ) -> Result<ApproachRelationship, Self::Error>;

    /// All edges touching an approach, in either direction, oldest first
    fn get_relationships(&self, id: ApproachId) -> Result<Vec<ApproachRelationship>, Self::Error>;

    /// Ancestors of an approach via "updates" edges; `depth = 0` is unlimited
    fn get_version_chain(&self, id: ApproachId, depth: usize) -> Result<VersionHistory, Self::Error>;

    /// Newest version in the lineage containing `id`
    fn latest_in_lineage(&self, id: ApproachId) -> Result<Approach, Self::Error>;
}

/// An approach inside the warning window
#[derive(Debug, Clone, PartialEq)]
pub struct WarningCandidate {
    /// The inactive approach
    pub approach: Approach,

    /// Title of its problem, for the notification text
    pub problem_title: String,

    /// When the abandon sweep will pick it up
    pub abandon_at: DateTime<Utc>,

    /// Time left until `abandon_at`, measured when the candidate was selected
    pub time_left: chrono::Duration,
}

impl WarningCandidate {
    /// Deduplication key of this warning opportunity
    pub fn key(&self) -> WarningKey {
        WarningKey {
            approach_id: self.approach.id,
            window_epoch: self.approach.updated_at,
        }
    }
}

/// Time-window queries and transitions used by the stale sweep
pub trait StaleContentStore {
    /// Error type for store operations
    type Error;

    /// Abandon `working`/`starting` approaches idle longer than `older_than`;
    /// returns rows changed
    fn abandon_stale_approaches(&self, older_than: Duration) -> Result<usize, Self::Error>;

    /// Count what [`abandon_stale_approaches`](Self::abandon_stale_approaches)
    /// would change
    fn count_abandon_candidates(&self, older_than: Duration) -> Result<usize, Self::Error>;

    /// Approaches idle for at least `warning` but less than `abandon` that have
    /// not been warned in their current window
    fn approaches_due_for_warning(
        &self,
        warning: Duration,
        abandon: Duration,
    ) -> Result<Vec<WarningCandidate>, Self::Error>;

    /// Claim the warning for this window before notifying; returns false if
    /// it was already claimed
    fn claim_warning(&self, key: WarningKey) -> Result<bool, Self::Error>;

    /// Attach the notification that was sent for a claimed warning
    fn confirm_warning(&self, key: WarningKey, notification_id: NotificationId) -> Result<(), Self::Error>;

    /// Drop a claim whose notification could not be sent, so a later sweep
    /// can try again
    fn release_warning(&self, key: WarningKey) -> Result<(), Self::Error>;

    /// Mark open problems older than `older_than` with no live approaches as
    /// dormant; returns rows changed
    fn mark_dormant_problems(&self, older_than: Duration) -> Result<usize, Self::Error>;

    /// Count what [`mark_dormant_problems`](Self::mark_dormant_problems) would change
    fn count_dormant_candidates(&self, older_than: Duration) -> Result<usize, Self::Error>;

    /// Failed approaches idle more than `failed_after_days`, plus superseded
    /// ones idle more than `superseded_after_days`; oldest update first
    fn list_stale_approaches(
        &self,
        failed_after_days: u32,
        superseded_after_days: u32,
    ) -> Result<Vec<Approach>, Self::Error>;

    /// Mark an approach archived, pointing at its stored snapshot
    fn archive_approach(&self, id: ApproachId, archive_ref: &str) -> Result<(), Self::Error>;
}

/// Write side of the notification emitter
pub trait NotificationSink {
    /// Error type for emitter operations
    type Error;

    /// Record a notification for delivery
    fn create_notification(&self, notification: NewNotification) -> Result<Notification, Self::Error>;
}

/// Minimal problem records
pub trait ProblemStore {
    /// Error type for store operations
    type Error;

    /// Post a new open problem
    fn create_problem(&self, problem: NewProblem) -> Result<Problem, Self::Error>;

    /// Get a live problem by ID
    fn get_problem(&self, id: ProblemId) -> Result<Option<Problem>, Self::Error>;
}
