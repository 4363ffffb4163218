//! Notification table, the local notification emitter

use rusqlite::params;
use solvr_domain::traits::NotificationSink;
use solvr_domain::{NewNotification, Notification, NotificationId, NotificationKind, Recipient};

use crate::codec::{self, key, millis};
use crate::error::SqliteContext;
use crate::{SqliteStore, StoreError};

fn recipient_columns(recipient: &Recipient) -> (&'static str, &str) {
    match recipient {
        Recipient::Agent(id) => ("agent", id.as_str()),
        Recipient::Human(id) => ("human", id.as_str()),
    }
}

impl NotificationSink for SqliteStore {
    type Error = StoreError;

    fn create_notification(&self, new: NewNotification) -> Result<Notification, Self::Error> {
        let now = self.now();
        let id = NotificationId::new();
        let (channel, recipient_id) = recipient_columns(&new.recipient);
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO notifications (id, kind, title, body, link, recipient_channel, recipient_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                key(id.value()),
                new.kind.as_str(),
                &new.title,
                &new.body,
                &new.link,
                channel,
                recipient_id,
                millis(now),
            ],
        )
        .ctx("create_notification", "notifications")?;

        tracing::debug!(notification_id = %id, channel, recipient_id, kind = new.kind.as_str(), "notification recorded");

        Ok(Notification {
            id,
            kind: new.kind,
            title: new.title,
            body: new.body,
            link: new.link,
            recipient: new.recipient,
            created_at: now,
        })
    }
}

impl SqliteStore {
    /// Notifications addressed to one recipient, newest first
    pub fn notifications_for(&self, recipient: &Recipient) -> Result<Vec<Notification>, StoreError> {
        let (channel, recipient_id) = recipient_columns(recipient);
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, kind, title, body, link, created_at FROM notifications
                 WHERE recipient_channel = ?1 AND recipient_id = ?2
                 ORDER BY created_at DESC, id DESC",
            )
            .ctx("notifications_for.prepare", "notifications")?;

        let rows = stmt
            .query_map(params![channel, recipient_id], |row| {
                let kind: String = row.get(1)?;
                Ok((
                    codec::notification_id_from_row(row, 0)?,
                    kind,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    codec::read_time_at(row, 5)?,
                ))
            })
            .ctx("notifications_for", "notifications")?
            .collect::<Result<Vec<_>, _>>()
            .ctx("notifications_for.row", "notifications")?;

        rows.into_iter()
            .map(|(id, kind, title, body, link, created_at)| {
                let kind = NotificationKind::parse(&kind)
                    .ok_or_else(|| StoreError::InvalidData(format!("Unknown notification kind: {}", kind)))?;
                Ok(Notification {
                    id,
                    kind,
                    title,
                    body,
                    link,
                    recipient: recipient.clone(),
                    created_at,
                })
            })
            .collect()
    }
}
