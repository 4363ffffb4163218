//! Approach module - candidate solution attempts attached to a problem

use crate::id::uuid_id;
use crate::{ApproachStatus, ProblemId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

uuid_id! {
    /// Unique identifier for an approach
    ApproachId
}

/// Kind of identity that authored an approach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorKind {
    /// An AI agent, notified on its agent channel
    Agent,

    /// A human user, notified on their user channel
    Human,
}

impl AuthorKind {
    /// Get the kind name as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorKind::Agent => "agent",
            AuthorKind::Human => "human",
        }
    }

    /// Parse an author kind from its stored name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "agent" => Some(AuthorKind::Agent),
            "human" => Some(AuthorKind::Human),
            _ => None,
        }
    }
}

/// Author identity (type + ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Author {
    /// Agent or human
    pub kind: AuthorKind,

    /// Agent ID or user ID, opaque to this crate
    pub id: String,
}

impl Author {
    /// Agent author
    pub fn agent(id: impl Into<String>) -> Self {
        Self { kind: AuthorKind::Agent, id: id.into() }
    }

    /// Human author
    pub fn human(id: impl Into<String>) -> Self {
        Self { kind: AuthorKind::Human, id: id.into() }
    }
}

/// A persisted approach
///
/// Approaches are never physically deleted. They are soft-deleted, archived,
/// or moved through [`ApproachStatus`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Approach {
    /// Unique identifier
    pub id: ApproachId,

    /// Problem this approach belongs to
    pub problem_id: ProblemId,

    /// Who declared it
    pub author: Author,

    /// Perspective being taken
    pub angle: String,

    /// Specific technique being used
    pub method: String,

    /// Learnings reported by the author
    pub outcome: Option<String>,

    /// Solution, if the approach succeeded
    pub solution: Option<String>,

    /// Current lifecycle status
    pub status: ApproachStatus,

    /// Whether this is the authoritative version of its lineage
    pub is_latest: bool,

    /// When the approach was created
    pub created_at: DateTime<Utc>,

    /// Last modification, the clock the stale sweep runs on
    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,

    /// When the approach was archived after stale cleanup
    pub archived_at: Option<DateTime<Utc>>,

    /// Where the archived snapshot lives
    pub archive_ref: Option<String>,
}

impl Approach {
    /// Whether the approach has been soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Time since the last update, measured against `now`
    pub fn idle_for(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.updated_at
    }
}

/// Input for creating an approach
///
/// The store assigns the ID and timestamps and sets `is_latest = true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewApproach {
    /// Problem this approach belongs to
    pub problem_id: ProblemId,

    /// Who declares it
    pub author: Author,

    /// Perspective being taken
    pub angle: String,

    /// Specific technique being used
    #[serde(default)]
    pub method: String,

    /// Initial status (defaults to `starting`)
    #[serde(default = "default_status")]
    pub status: ApproachStatus,
}

fn default_status() -> ApproachStatus {
    ApproachStatus::Starting
}

impl NewApproach {
    /// New approach in the `starting` state
    pub fn new(problem_id: ProblemId, author: Author, angle: impl Into<String>) -> Self {
        Self {
            problem_id,
            author,
            angle: angle.into(),
            method: String::new(),
            status: ApproachStatus::Starting,
        }
    }

    /// Set the method
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Set the initial status
    pub fn with_status(mut self, status: ApproachStatus) -> Self {
        self.status = status;
        self
    }
}

/// Partial update of an approach; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApproachUpdate {
    /// New status (validated against the state machine)
    pub status: Option<ApproachStatus>,

    /// New outcome text
    pub outcome: Option<String>,

    /// New solution text
    pub solution: Option<String>,

    /// New method text
    pub method: Option<String>,
}

impl ApproachUpdate {
    /// Whether the update would change nothing
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.outcome.is_none()
            && self.solution.is_none()
            && self.method.is_none()
    }
}
