//! Conversions between domain values and SQLite columns

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use solvr_domain::{
    Approach, ApproachId, ApproachRelationship, ApproachStatus, Author, AuthorKind,
    NotificationId, Problem, ProblemId, ProblemStatus, RelationType, RelationshipId,
};

use crate::StoreError;

/// Approach columns in the order [`approach_from_row`] reads them
pub(crate) const APPROACH_COLUMNS: &str = "id, problem_id, author_type, author_id, angle, method, \
     outcome, solution, status, is_latest, created_at, updated_at, deleted_at, archived_at, archive_ref";

/// [`APPROACH_COLUMNS`] qualified with the `a` table alias
pub(crate) const APPROACH_COLUMNS_A: &str = "a.id, a.problem_id, a.author_type, a.author_id, a.angle, \
     a.method, a.outcome, a.solution, a.status, a.is_latest, a.created_at, a.updated_at, a.deleted_at, \
     a.archived_at, a.archive_ref";

/// Number of columns in [`APPROACH_COLUMNS`]
pub(crate) const APPROACH_COLUMN_COUNT: usize = 15;

pub(crate) const RELATIONSHIP_COLUMNS: &str = "id, from_approach_id, to_approach_id, relation_type, created_at";

pub(crate) const PROBLEM_COLUMNS: &str = "id, title, status, created_at, updated_at, deleted_at";

/// Encode a 128-bit identifier as 16 big-endian bytes (sorts like the ID)
pub(crate) fn key(value: u128) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

/// Decode a 16-byte identifier
pub(crate) fn decode_key(bytes: &[u8]) -> Result<u128, StoreError> {
    let arr: [u8; 16] = bytes.try_into().map_err(|_| {
        StoreError::InvalidData(format!("Expected 16 bytes for an identifier, got {}", bytes.len()))
    })?;
    Ok(u128::from_be_bytes(arr))
}

/// Timestamp to Unix milliseconds
pub(crate) fn millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

/// Unix milliseconds to timestamp
pub(crate) fn from_millis(ms: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::InvalidData(format!("Timestamp out of range: {}", ms)))
}

/// Wrap a decoding failure so it can be returned from a row mapper
fn conversion<E>(idx: usize, ty: Type, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(e))
}

fn read_key(row: &Row<'_>, idx: usize) -> rusqlite::Result<u128> {
    let bytes: Vec<u8> = row.get(idx)?;
    decode_key(&bytes).map_err(|e| conversion(idx, Type::Blob, e))
}

fn read_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let ms: i64 = row.get(idx)?;
    from_millis(ms).map_err(|e| conversion(idx, Type::Integer, e))
}

fn read_opt_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let ms: Option<i64> = row.get(idx)?;
    ms.map(|ms| from_millis(ms).map_err(|e| conversion(idx, Type::Integer, e)))
        .transpose()
}

fn read_enum<T>(row: &Row<'_>, idx: usize, parse: fn(&str) -> Option<T>, what: &str) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    parse(&s).ok_or_else(|| {
        conversion(idx, Type::Text, StoreError::InvalidData(format!("Unknown {}: {}", what, s)))
    })
}

/// Map a row selected with [`APPROACH_COLUMNS`] (starting at column 0)
pub(crate) fn approach_from_row(row: &Row<'_>) -> rusqlite::Result<Approach> {
    let kind = read_enum(row, 2, AuthorKind::parse, "author type")?;
    Ok(Approach {
        id: ApproachId::from_value(read_key(row, 0)?),
        problem_id: ProblemId::from_value(read_key(row, 1)?),
        author: Author { kind, id: row.get(3)? },
        angle: row.get(4)?,
        method: row.get(5)?,
        outcome: row.get(6)?,
        solution: row.get(7)?,
        status: read_enum(row, 8, ApproachStatus::parse, "approach status")?,
        is_latest: row.get(9)?,
        created_at: read_time(row, 10)?,
        updated_at: read_time(row, 11)?,
        deleted_at: read_opt_time(row, 12)?,
        archived_at: read_opt_time(row, 13)?,
        archive_ref: row.get(14)?,
    })
}

/// Map a row selected with [`RELATIONSHIP_COLUMNS`]
pub(crate) fn relationship_from_row(row: &Row<'_>) -> rusqlite::Result<ApproachRelationship> {
    Ok(ApproachRelationship {
        id: RelationshipId::from_value(read_key(row, 0)?),
        from_approach_id: ApproachId::from_value(read_key(row, 1)?),
        to_approach_id: ApproachId::from_value(read_key(row, 2)?),
        relation_type: read_enum(row, 3, RelationType::parse, "relation type")?,
        created_at: read_time(row, 4)?,
    })
}

/// Map a row selected with [`PROBLEM_COLUMNS`]
pub(crate) fn problem_from_row(row: &Row<'_>) -> rusqlite::Result<Problem> {
    Ok(Problem {
        id: ProblemId::from_value(read_key(row, 0)?),
        title: row.get(1)?,
        status: read_enum(row, 2, ProblemStatus::parse, "problem status")?,
        created_at: read_time(row, 3)?,
        updated_at: read_time(row, 4)?,
        deleted_at: read_opt_time(row, 5)?,
    })
}

pub(crate) fn notification_id_from_row(row: &Row<'_>, idx: usize) -> rusqlite::Result<NotificationId> {
    read_key(row, idx).map(NotificationId::from_value)
}

pub(crate) fn read_time_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    read_time(row, idx)
}
