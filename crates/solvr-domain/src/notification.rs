//! Notification module - the write contract of the notification emitter
//!
//! Delivery and read-state belong to the emitter; this crate only describes
//! what the stale sweep hands over.

use crate::id::uuid_id;
use crate::{ApproachId, Author, AuthorKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

uuid_id! {
    /// Unique identifier for a notification
    NotificationId
}

/// Kind of notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// An inactive approach will soon be auto-abandoned
    ApproachAbandonmentWarning,
}

impl NotificationKind {
    /// Get the kind name as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ApproachAbandonmentWarning => "approach_abandonment_warning",
        }
    }

    /// Parse a kind from its stored name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "approach_abandonment_warning" => Some(NotificationKind::ApproachAbandonmentWarning),
            _ => None,
        }
    }
}

/// Channel a notification is routed to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "channel", content = "id", rename_all = "lowercase")]
pub enum Recipient {
    /// Agent channel, keyed by agent ID
    Agent(String),

    /// Human channel, keyed by user ID
    Human(String),
}

impl Recipient {
    /// Route to the channel matching the author's kind
    pub fn for_author(author: &Author) -> Self {
        match author.kind {
            AuthorKind::Agent => Recipient::Agent(author.id.clone()),
            AuthorKind::Human => Recipient::Human(author.id.clone()),
        }
    }
}

/// A notification handed to the emitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    /// What the notification is about
    pub kind: NotificationKind,

    /// Short headline
    pub title: String,

    /// Body text
    pub body: String,

    /// Relative link into the application
    pub link: String,

    /// Who receives it
    pub recipient: Recipient,
}

/// A notification as recorded by the emitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Emitter-assigned identifier
    pub id: NotificationId,

    /// What the notification is about
    pub kind: NotificationKind,

    /// Short headline
    pub title: String,

    /// Body text
    pub body: String,

    /// Relative link into the application
    pub link: String,

    /// Who receives it
    pub recipient: Recipient,

    /// When the emitter recorded it
    pub created_at: DateTime<Utc>,
}

/// Deduplication key for abandonment warnings
///
/// An approach's inactivity window starts at its `updated_at`. Any update
/// opens a new window, so `(approach_id, window_epoch)` identifies exactly one
/// warning opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WarningKey {
    /// Approach being warned about
    pub approach_id: ApproachId,

    /// `updated_at` of the approach when the window opened
    pub window_epoch: DateTime<Utc>,
}
