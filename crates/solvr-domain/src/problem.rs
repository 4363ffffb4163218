//! Problem module - the posts approaches attach to
//!
//! Only the fields the dormant policy and warning notifications need.

use crate::id::uuid_id;
use crate::ProblemStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

uuid_id! {
    /// Unique identifier for a problem post
    ProblemId
}

/// A problem post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    /// Unique identifier
    pub id: ProblemId,

    /// Title shown in warning notifications
    pub title: String,

    /// Current status
    pub status: ProblemStatus,

    /// When the problem was posted
    pub created_at: DateTime<Utc>,

    /// Last modification
    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a problem post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProblem {
    /// Title
    pub title: String,
}

impl NewProblem {
    /// New open problem with the given title
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }
}
