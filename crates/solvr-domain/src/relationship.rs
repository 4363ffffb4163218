//! Relationship module - directed edges between approaches
//!
//! Edges point from the newer approach to the older one. Only
//! [`RelationType::Updates`] edges take part in versioning; the other types
//! are informational.

use crate::id::uuid_id;
use crate::ApproachId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

uuid_id! {
    /// Unique identifier for a relationship edge
    RelationshipId
}

/// Type of relationship between approaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationType {
    /// `from` is a newer version of `to`; clears `to.is_latest`
    Updates,

    /// `from` builds on `to` without replacing it
    Extends,

    /// `from` reaches a conclusion at odds with `to`
    Contradicts,

    /// `from` cites `to`
    References,
}

impl RelationType {
    /// Get the type name as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Updates => "updates",
            RelationType::Extends => "extends",
            RelationType::Contradicts => "contradicts",
            RelationType::References => "references",
        }
    }

    /// Parse a relation type from its stored name
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "updates" => Some(RelationType::Updates),
            "extends" => Some(RelationType::Extends),
            "contradicts" => Some(RelationType::Contradicts),
            "references" => Some(RelationType::References),
            _ => None,
        }
    }

    /// Whether edges of this type form version chains
    pub fn is_versioning(&self) -> bool {
        *self == RelationType::Updates
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RelationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid relation type: {}", s))
    }
}

/// A directed edge `from` (newer) -> `to` (older)
///
/// Created once and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproachRelationship {
    /// Server-assigned identifier
    pub id: RelationshipId,

    /// Newer approach
    pub from_approach_id: ApproachId,

    /// Older approach
    pub to_approach_id: ApproachId,

    /// Type of relationship
    pub relation_type: RelationType,

    /// When the edge was created
    pub created_at: DateTime<Utc>,
}
