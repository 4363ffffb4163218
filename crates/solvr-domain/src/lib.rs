//! Solvr Domain Layer
//!
//! Core model for approach versioning and the stale-content lifecycle.
//! Infrastructure (SQLite, scheduling) lives in other crates; this crate only
//! defines the entities, the status state machine, the version-chain walk and
//! the trait boundaries the other layers implement.
//!
//! ## Key Concepts
//!
//! - **Approach**: a candidate solution attempt attached to a problem
//! - **Lineage**: the chain of approaches connected by "updates" relationships
//! - **Latest version**: the one approach per lineage with `is_latest = true`
//! - **Stale sweep**: periodic batch that abandons, warns, or marks dormant
//!
//! ## Architecture
//!
//! - Pure business logic, no I/O
//! - Chain traversal is written against a lookup closure so it can be tested
//!   without storage
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod approach;
pub mod clock;
pub mod id;
pub mod notification;
pub mod problem;
pub mod relationship;
pub mod status;
pub mod traits;
pub mod version;

// Re-exports for convenience
pub use approach::{Approach, ApproachId, ApproachUpdate, Author, AuthorKind, NewApproach};
pub use clock::{Clock, ManualClock, SystemClock};
pub use notification::{
    NewNotification, Notification, NotificationId, NotificationKind, Recipient, WarningKey,
};
pub use problem::{NewProblem, Problem, ProblemId};
pub use relationship::{ApproachRelationship, RelationType, RelationshipId};
pub use status::{ApproachStatus, ProblemStatus};
pub use version::{walk_predecessors, ChainFault, LineageIndex, VersionHistory, WalkError};
