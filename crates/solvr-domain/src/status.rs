//! Status module - lifecycle states for approaches and problems

use serde::{Deserialize, Serialize};

/// Status in the approach lifecycle
///
/// ```text
/// starting -> working | stuck | succeeded | failed | abandoned
/// working  -> stuck | succeeded | failed | abandoned
/// stuck    -> working | succeeded | failed | abandoned
/// ```
///
/// `succeeded`, `failed` and `abandoned` are terminal: nothing leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApproachStatus {
    /// Declared but no work reported yet
    Starting,

    /// Actively being worked on
    Working,

    /// Author reported being blocked
    Stuck,

    /// Produced a solution
    Succeeded,

    /// Tried and did not work
    Failed,

    /// Given up, either by the author or by the stale sweep
    Abandoned,
}

impl ApproachStatus {
    /// All statuses, in lifecycle order
    pub const ALL: [ApproachStatus; 6] = [
        ApproachStatus::Starting,
        ApproachStatus::Working,
        ApproachStatus::Stuck,
        ApproachStatus::Succeeded,
        ApproachStatus::Failed,
        ApproachStatus::Abandoned,
    ];

    /// Statuses the stale sweep is allowed to abandon or warn about
    pub const SWEEPABLE: [ApproachStatus; 2] = [ApproachStatus::Working, ApproachStatus::Starting];

    /// Get the status name as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            ApproachStatus::Starting => "starting",
            ApproachStatus::Working => "working",
            ApproachStatus::Stuck => "stuck",
            ApproachStatus::Succeeded => "succeeded",
            ApproachStatus::Failed => "failed",
            ApproachStatus::Abandoned => "abandoned",
        }
    }

    /// Parse a status from its stored name
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "starting" => Some(ApproachStatus::Starting),
            "working" => Some(ApproachStatus::Working),
            "stuck" => Some(ApproachStatus::Stuck),
            "succeeded" => Some(ApproachStatus::Succeeded),
            "failed" => Some(ApproachStatus::Failed),
            "abandoned" => Some(ApproachStatus::Abandoned),
            _ => None,
        }
    }

    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApproachStatus::Succeeded | ApproachStatus::Failed | ApproachStatus::Abandoned
        )
    }

    /// Whether the stale sweep may act on an approach in this status
    pub fn is_sweepable(&self) -> bool {
        Self::SWEEPABLE.contains(self)
    }

    /// Whether `self -> next` is a legal transition
    ///
    /// Re-asserting the current status of an active approach is allowed (it
    /// only refreshes `updated_at`). An approach has to be worked on before
    /// it can succeed or fail, so `starting` reaches those only through
    /// `working`.
    pub fn can_transition_to(&self, next: ApproachStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            ApproachStatus::Starting => *self == ApproachStatus::Starting,
            ApproachStatus::Succeeded | ApproachStatus::Failed => *self != ApproachStatus::Starting,
            ApproachStatus::Working | ApproachStatus::Stuck | ApproachStatus::Abandoned => true,
        }
    }
}

impl std::fmt::Display for ApproachStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApproachStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid approach status: {}", s))
    }
}

/// Status of a problem post, as far as the dormant policy cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemStatus {
    /// Accepting approaches
    Open,

    /// An approach succeeded
    Solved,

    /// Closed by its author or a moderator
    Closed,

    /// Open for too long without a single approach
    Dormant,
}

impl ProblemStatus {
    /// Get the status name as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemStatus::Open => "open",
            ProblemStatus::Solved => "solved",
            ProblemStatus::Closed => "closed",
            ProblemStatus::Dormant => "dormant",
        }
    }

    /// Parse a status from its stored name
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "open" => Some(ProblemStatus::Open),
            "solved" => Some(ProblemStatus::Solved),
            "closed" => Some(ProblemStatus::Closed),
            "dormant" => Some(ProblemStatus::Dormant),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProblemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProblemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid problem status: {}", s))
    }
}
