//! Approach and problem records

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use solvr_domain::traits::{ApproachQuery, ApproachStore, ProblemStore};
use solvr_domain::{
    Approach, ApproachId, ApproachStatus, ApproachUpdate, Author, NewApproach, NewProblem, Problem,
    ProblemId, ProblemStatus,
};

use crate::codec::{self, key, millis, APPROACH_COLUMNS, PROBLEM_COLUMNS};
use crate::error::SqliteContext;
use crate::{SqliteStore, StoreError};

/// Fetch a live approach
pub(crate) fn fetch_approach(conn: &Connection, id: ApproachId) -> Result<Option<Approach>, StoreError> {
    conn.query_row(
        &format!("SELECT {} FROM approaches WHERE id = ?1 AND deleted_at IS NULL", APPROACH_COLUMNS),
        params![key(id.value())],
        codec::approach_from_row,
    )
    .optional()
    .ctx("fetch_approach", "approaches")
}

/// Fetch a live approach or fail with `NotFound`
pub(crate) fn require_approach(conn: &Connection, id: ApproachId) -> Result<Approach, StoreError> {
    fetch_approach(conn, id)?.ok_or_else(|| StoreError::not_found("approach", id))
}

fn problem_exists(conn: &Connection, id: ProblemId) -> Result<bool, StoreError> {
    conn.query_row(
        "SELECT 1 FROM problems WHERE id = ?1 AND deleted_at IS NULL",
        params![key(id.value())],
        |_| Ok(true),
    )
    .optional()
    .map(|found| found.unwrap_or(false))
    .ctx("problem_exists", "problems")
}

fn check_transition(from: ApproachStatus, to: ApproachStatus) -> Result<(), StoreError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(StoreError::InvalidTransition { from, to })
    }
}

impl ApproachStore for SqliteStore {
    type Error = StoreError;

    fn create_approach(&self, new: NewApproach) -> Result<Approach, Self::Error> {
        let now = self.now();
        let id = ApproachId::new();
        let conn = self.lock()?;

        if !problem_exists(&conn, new.problem_id)? {
            return Err(StoreError::not_found("problem", new.problem_id));
        }

        conn.execute(
            "INSERT INTO approaches (id, problem_id, author_type, author_id, angle, method, status,
                                     is_latest, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?8)",
            params![
                key(id.value()),
                key(new.problem_id.value()),
                new.author.kind.as_str(),
                &new.author.id,
                &new.angle,
                &new.method,
                new.status.as_str(),
                millis(now),
            ],
        )
        .ctx("create_approach", "approaches")?;

        tracing::debug!(approach_id = %id, problem_id = %new.problem_id, "approach created");

        Ok(Approach {
            id,
            problem_id: new.problem_id,
            author: new.author,
            angle: new.angle,
            method: new.method,
            outcome: None,
            solution: None,
            status: new.status,
            is_latest: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            archived_at: None,
            archive_ref: None,
        })
    }

    fn get_approach(&self, id: ApproachId) -> Result<Option<Approach>, Self::Error> {
        let conn = self.lock()?;
        fetch_approach(&conn, id)
    }

    fn set_status(&self, id: ApproachId, status: ApproachStatus) -> Result<(), Self::Error> {
        self.update_approach(
            id,
            ApproachUpdate {
                status: Some(status),
                ..Default::default()
            },
        )
        .map(|_| ())
    }

    fn set_latest(&self, id: ApproachId, is_latest: bool) -> Result<usize, Self::Error> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE approaches SET is_latest = ?2 WHERE id = ?1 AND deleted_at IS NULL",
            params![key(id.value()), is_latest],
        )
        .ctx("set_latest", "approaches")
    }

    fn update_approach(&self, id: ApproachId, update: ApproachUpdate) -> Result<Approach, Self::Error> {
        let now = self.now();
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .ctx("update_approach.begin", "approaches")?;

        let current = require_approach(&tx, id)?;
        if let Some(status) = update.status {
            check_transition(current.status, status)?;
        }

        tx.execute(
            "UPDATE approaches
             SET status = COALESCE(?2, status),
                 outcome = COALESCE(?3, outcome),
                 solution = COALESCE(?4, solution),
                 method = COALESCE(?5, method),
                 updated_at = ?6
             WHERE id = ?1 AND deleted_at IS NULL",
            params![
                key(id.value()),
                update.status.map(|s| s.as_str()),
                update.outcome,
                update.solution,
                update.method,
                millis(now),
            ],
        )
        .ctx("update_approach", "approaches")?;

        let updated = require_approach(&tx, id)?;
        tx.commit().ctx("update_approach.commit", "approaches")?;

        if current.status != updated.status {
            tracing::debug!(approach_id = %id, from = %current.status, to = %updated.status, "approach status changed");
        }
        Ok(updated)
    }

    fn soft_delete_approach(&self, id: ApproachId) -> Result<(), Self::Error> {
        let now = self.now();
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE approaches SET deleted_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
                params![key(id.value()), millis(now)],
            )
            .ctx("soft_delete_approach", "approaches")?;

        if changed == 0 {
            return Err(StoreError::not_found("approach", id));
        }
        Ok(())
    }

    fn query_approaches(&self, query: &ApproachQuery) -> Result<Vec<Approach>, Self::Error> {
        let mut sql = format!("SELECT {} FROM approaches WHERE deleted_at IS NULL", APPROACH_COLUMNS);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(problem_id) = query.problem_id {
            sql.push_str(" AND problem_id = ?");
            params.push(Box::new(key(problem_id.value())));
        }

        if let Some(author) = &query.author {
            sql.push_str(" AND author_type = ? AND author_id = ?");
            params.push(Box::new(author.kind.as_str()));
            params.push(Box::new(author.id.clone()));
        }

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            params.push(Box::new(status.as_str()));
        }

        if query.latest_only {
            sql.push_str(" AND is_latest = 1");
        }

        sql.push_str(" ORDER BY created_at DESC, id DESC");

        if query.limit.is_some() || query.offset.is_some() {
            sql.push_str(" LIMIT ? OFFSET ?");
            params.push(Box::new(query.limit.map(|l| l as i64).unwrap_or(-1)));
            params.push(Box::new(query.offset.unwrap_or(0) as i64));
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql).ctx("query_approaches.prepare", "approaches")?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let approaches = stmt
            .query_map(&param_refs[..], codec::approach_from_row)
            .ctx("query_approaches", "approaches")?
            .collect::<Result<Vec<_>, _>>()
            .ctx("query_approaches.row", "approaches")?;

        Ok(approaches)
    }
}

impl ProblemStore for SqliteStore {
    type Error = StoreError;

    fn create_problem(&self, new: NewProblem) -> Result<Problem, Self::Error> {
        let now = self.now();
        let id = ProblemId::new();
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO problems (id, title, status, created_at, updated_at)
             VALUES (?1, ?2, 'open', ?3, ?3)",
            params![key(id.value()), &new.title, millis(now)],
        )
        .ctx("create_problem", "problems")?;

        Ok(Problem {
            id,
            title: new.title,
            status: ProblemStatus::Open,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }

    fn get_problem(&self, id: ProblemId) -> Result<Option<Problem>, Self::Error> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {} FROM problems WHERE id = ?1 AND deleted_at IS NULL", PROBLEM_COLUMNS),
            params![key(id.value())],
            codec::problem_from_row,
        )
        .optional()
        .ctx("get_problem", "problems")
    }
}

impl SqliteStore {
    /// Change a problem's status (closing or solving it outside the sweep)
    pub fn set_problem_status(&self, id: ProblemId, status: ProblemStatus) -> Result<(), StoreError> {
        let now = self.now();
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE problems SET status = ?2, updated_at = ?3 WHERE id = ?1 AND deleted_at IS NULL",
                params![key(id.value()), status.as_str(), millis(now)],
            )
            .ctx("set_problem_status", "problems")?;

        if changed == 0 {
            return Err(StoreError::not_found("problem", id));
        }
        Ok(())
    }

    /// Approaches of one problem, newest first
    pub fn list_for_problem(
        &self,
        problem_id: ProblemId,
        status: Option<ApproachStatus>,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<Approach>, StoreError> {
        self.query_approaches(&ApproachQuery {
            problem_id: Some(problem_id),
            status,
            limit,
            offset,
            ..Default::default()
        })
    }

    /// Every live approach declared by `author`, newest first
    pub fn list_by_author(&self, author: &Author) -> Result<Vec<Approach>, StoreError> {
        self.query_approaches(&ApproachQuery {
            author: Some(author.clone()),
            ..Default::default()
        })
    }

    /// Parse a caller-supplied approach ID
    pub fn parse_approach_id(raw: &str) -> Result<ApproachId, StoreError> {
        ApproachId::parse(raw.trim()).map_err(StoreError::InvalidReference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_problem() -> (SqliteStore, ProblemId) {
        let store = SqliteStore::in_memory().unwrap();
        let problem = store.create_problem(NewProblem::new("flaky test")).unwrap();
        (store, problem.id)
    }

    #[test]
    fn test_create_requires_problem() {
        let store = SqliteStore::in_memory().unwrap();
        let result = store.create_approach(NewApproach::new(ProblemId::new(), Author::agent("a"), "x"));
        assert!(matches!(result, Err(StoreError::NotFound { entity: "problem", .. })));
    }

    #[test]
    fn test_create_defaults() {
        let (store, problem_id) = store_with_problem();
        let approach = store
            .create_approach(NewApproach::new(problem_id, Author::agent("a"), "retry"))
            .unwrap();

        assert!(approach.is_latest);
        assert_eq!(approach.status, ApproachStatus::Starting);
        assert_eq!(approach.created_at, approach.updated_at);

        let fetched = store.get_approach(approach.id).unwrap().unwrap();
        assert_eq!(fetched, approach);
    }

    #[test]
    fn test_set_latest_reports_rows() {
        let (store, problem_id) = store_with_problem();
        let approach = store
            .create_approach(NewApproach::new(problem_id, Author::agent("a"), "retry"))
            .unwrap();

        assert_eq!(store.set_latest(approach.id, false).unwrap(), 1);
        assert_eq!(store.set_latest(ApproachId::new(), false).unwrap(), 0);

        store.soft_delete_approach(approach.id).unwrap();
        assert_eq!(store.set_latest(approach.id, true).unwrap(), 0);
    }

    #[test]
    fn test_check_transition() {
        assert!(check_transition(ApproachStatus::Working, ApproachStatus::Failed).is_ok());
        assert!(matches!(
            check_transition(ApproachStatus::Failed, ApproachStatus::Working),
            Err(StoreError::InvalidTransition { .. })
        ));
        assert!(matches!(
            check_transition(ApproachStatus::Starting, ApproachStatus::Succeeded),
            Err(StoreError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_listing_filters_and_pages() {
        let (store, problem_id) = store_with_problem();
        for angle in ["a", "b", "c"] {
            store
                .create_approach(NewApproach::new(problem_id, Author::agent("agent-1"), angle))
                .unwrap();
        }
        let human = store
            .create_approach(NewApproach::new(problem_id, Author::human("u-1"), "d"))
            .unwrap();
        store.set_status(human.id, ApproachStatus::Working).unwrap();

        assert_eq!(store.list_for_problem(problem_id, None, None, None).unwrap().len(), 4);
        assert_eq!(store.list_for_problem(problem_id, None, Some(2), None).unwrap().len(), 2);
        assert_eq!(store.list_for_problem(problem_id, None, None, Some(3)).unwrap().len(), 1);

        let working = store
            .list_for_problem(problem_id, Some(ApproachStatus::Working), None, None)
            .unwrap();
        assert_eq!(working.len(), 1);
        assert_eq!(working[0].id, human.id);

        assert_eq!(store.list_by_author(&Author::agent("agent-1")).unwrap().len(), 3);
        assert!(store.list_by_author(&Author::agent("u-1")).unwrap().is_empty());
    }

    #[test]
    fn test_parse_approach_id() {
        let id = ApproachId::new();
        assert_eq!(SqliteStore::parse_approach_id(&id.to_string()).unwrap(), id);
        assert!(matches!(
            SqliteStore::parse_approach_id("approach-17"),
            Err(StoreError::InvalidReference(_))
        ));
    }
}
