//! Time-window queries behind the stale-content sweep
//!
//! Every window is measured against the store's clock, so the same calls are
//! deterministic under a [`ManualClock`](solvr_domain::ManualClock).

use rusqlite::{params, OptionalExtension};
use solvr_domain::traits::{StaleContentStore, WarningCandidate};
use solvr_domain::{Approach, ApproachId, NotificationId, WarningKey};
use std::time::Duration;

use crate::codec::{self, key, millis, APPROACH_COLUMNS, APPROACH_COLUMNS_A, APPROACH_COLUMN_COUNT};
use crate::error::SqliteContext;
use crate::{SqliteStore, StoreError};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

fn days(n: u32) -> Duration {
    Duration::from_secs(u64::from(n) * SECONDS_PER_DAY)
}

impl StaleContentStore for SqliteStore {
    type Error = StoreError;

    fn abandon_stale_approaches(&self, older_than: Duration) -> Result<usize, Self::Error> {
        let cutoff = self.cutoff(older_than)?;
        let now = self.now();
        let conn = self.lock()?;

        let changed = conn
            .execute(
                "UPDATE approaches
                 SET status = 'abandoned', updated_at = ?2
                 WHERE status IN ('working', 'starting')
                   AND updated_at < ?1
                   AND deleted_at IS NULL",
                params![millis(cutoff), millis(now)],
            )
            .ctx("abandon_stale_approaches", "approaches")?;

        tracing::debug!(changed, cutoff = %cutoff, "abandon sweep applied");
        Ok(changed)
    }

    fn count_abandon_candidates(&self, older_than: Duration) -> Result<usize, Self::Error> {
        let cutoff = self.cutoff(older_than)?;
        let conn = self.lock()?;

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM approaches
                 WHERE status IN ('working', 'starting')
                   AND updated_at < ?1
                   AND deleted_at IS NULL",
                params![millis(cutoff)],
                |row| row.get(0),
            )
            .ctx("count_abandon_candidates", "approaches")?;

        Ok(count as usize)
    }

    fn approaches_due_for_warning(
        &self,
        warning: Duration,
        abandon: Duration,
    ) -> Result<Vec<WarningCandidate>, Self::Error> {
        if warning >= abandon {
            return Err(StoreError::InvalidArgument(format!(
                "warning threshold {:?} must be shorter than abandon threshold {:?}",
                warning, abandon
            )));
        }

        let now = self.now();
        let warn_cutoff = self.cutoff(warning)?;
        let abandon_cutoff = self.cutoff(abandon)?;
        let abandon_after = chrono::Duration::from_std(abandon)
            .map_err(|_| StoreError::InvalidArgument(format!("window {:?} is too large", abandon)))?;

        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {}, p.title
                 FROM approaches a
                 JOIN problems p ON p.id = a.problem_id
                 WHERE a.status IN ('working', 'starting')
                   AND a.updated_at < ?1
                   AND a.updated_at >= ?2
                   AND a.deleted_at IS NULL
                   AND NOT EXISTS (
                       SELECT 1 FROM approach_warnings w
                       WHERE w.approach_id = a.id AND w.window_epoch = a.updated_at
                   )
                 ORDER BY a.updated_at ASC, a.id ASC",
                APPROACH_COLUMNS_A
            ))
            .ctx("approaches_due_for_warning.prepare", "approaches")?;

        let rows = stmt
            .query_map(params![millis(warn_cutoff), millis(abandon_cutoff)], |row| {
                let approach = codec::approach_from_row(row)?;
                let title: String = row.get(APPROACH_COLUMN_COUNT)?;
                Ok((approach, title))
            })
            .ctx("approaches_due_for_warning", "approaches")?
            .collect::<Result<Vec<_>, _>>()
            .ctx("approaches_due_for_warning.row", "approaches")?;

        Ok(rows
            .into_iter()
            .map(|(approach, problem_title)| {
                let abandon_at = approach.updated_at + abandon_after;
                WarningCandidate {
                    time_left: abandon_at - now,
                    abandon_at,
                    problem_title,
                    approach,
                }
            })
            .collect())
    }

    fn claim_warning(&self, warning: WarningKey) -> Result<bool, Self::Error> {
        let now = self.now();
        let conn = self.lock()?;

        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO approach_warnings (approach_id, window_epoch, created_at)
                 VALUES (?1, ?2, ?3)",
                params![key(warning.approach_id.value()), millis(warning.window_epoch), millis(now)],
            )
            .ctx("claim_warning", "approach_warnings")?;

        Ok(inserted == 1)
    }

    fn confirm_warning(&self, warning: WarningKey, notification_id: NotificationId) -> Result<(), Self::Error> {
        let conn = self.lock()?;

        let changed = conn
            .execute(
                "UPDATE approach_warnings SET notification_id = ?3
                 WHERE approach_id = ?1 AND window_epoch = ?2",
                params![
                    key(warning.approach_id.value()),
                    millis(warning.window_epoch),
                    key(notification_id.value()),
                ],
            )
            .ctx("confirm_warning", "approach_warnings")?;

        if changed == 0 {
            return Err(StoreError::not_found("warning", warning.approach_id));
        }
        Ok(())
    }

    fn release_warning(&self, warning: WarningKey) -> Result<(), Self::Error> {
        let conn = self.lock()?;

        conn.execute(
            "DELETE FROM approach_warnings
             WHERE approach_id = ?1 AND window_epoch = ?2 AND notification_id IS NULL",
            params![key(warning.approach_id.value()), millis(warning.window_epoch)],
        )
        .ctx("release_warning", "approach_warnings")?;

        Ok(())
    }

    fn mark_dormant_problems(&self, older_than: Duration) -> Result<usize, Self::Error> {
        let cutoff = self.cutoff(older_than)?;
        let now = self.now();
        let conn = self.lock()?;

        let changed = conn
            .execute(
                "UPDATE problems
                 SET status = 'dormant', updated_at = ?2
                 WHERE status = 'open'
                   AND created_at < ?1
                   AND deleted_at IS NULL
                   AND NOT EXISTS (
                       SELECT 1 FROM approaches a
                       WHERE a.problem_id = problems.id AND a.deleted_at IS NULL
                   )",
                params![millis(cutoff), millis(now)],
            )
            .ctx("mark_dormant_problems", "problems")?;

        tracing::debug!(changed, cutoff = %cutoff, "dormant sweep applied");
        Ok(changed)
    }

    fn count_dormant_candidates(&self, older_than: Duration) -> Result<usize, Self::Error> {
        let cutoff = self.cutoff(older_than)?;
        let conn = self.lock()?;

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM problems p
                 WHERE p.status = 'open'
                   AND p.created_at < ?1
                   AND p.deleted_at IS NULL
                   AND NOT EXISTS (
                       SELECT 1 FROM approaches a
                       WHERE a.problem_id = p.id AND a.deleted_at IS NULL
                   )",
                params![millis(cutoff)],
                |row| row.get(0),
            )
            .ctx("count_dormant_candidates", "problems")?;

        Ok(count as usize)
    }

    fn list_stale_approaches(
        &self,
        failed_after_days: u32,
        superseded_after_days: u32,
    ) -> Result<Vec<Approach>, Self::Error> {
        let failed_cutoff = self.cutoff(days(failed_after_days))?;
        let superseded_cutoff = self.cutoff(days(superseded_after_days))?;
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM approaches
                 WHERE deleted_at IS NULL
                   AND archived_at IS NULL
                   AND (
                       (status = 'failed' AND updated_at < ?1)
                       OR (is_latest = 0 AND updated_at < ?2)
                   )
                 ORDER BY updated_at ASC, id ASC",
                APPROACH_COLUMNS
            ))
            .ctx("list_stale_approaches.prepare", "approaches")?;

        let approaches = stmt
            .query_map(
                params![millis(failed_cutoff), millis(superseded_cutoff)],
                codec::approach_from_row,
            )
            .ctx("list_stale_approaches", "approaches")?
            .collect::<Result<Vec<_>, _>>()
            .ctx("list_stale_approaches.row", "approaches")?;

        Ok(approaches)
    }

    fn archive_approach(&self, id: ApproachId, archive_ref: &str) -> Result<(), Self::Error> {
        let now = self.now();
        let conn = self.lock()?;

        let changed = conn
            .execute(
                "UPDATE approaches SET archived_at = ?2, archive_ref = ?3
                 WHERE id = ?1 AND deleted_at IS NULL AND archived_at IS NULL",
                params![key(id.value()), millis(now), archive_ref],
            )
            .ctx("archive_approach", "approaches")?;

        if changed == 1 {
            tracing::info!(approach_id = %id, archive_ref, "approach archived");
            return Ok(());
        }

        let exists = conn
            .query_row(
                "SELECT 1 FROM approaches WHERE id = ?1 AND deleted_at IS NULL",
                params![key(id.value())],
                |_| Ok(()),
            )
            .optional()
            .ctx("archive_approach.check", "approaches")?
            .is_some();

        if exists {
            Err(StoreError::IntegrityViolation(format!("approach {} is already archived", id)))
        } else {
            Err(StoreError::not_found("approach", id))
        }
    }
}
