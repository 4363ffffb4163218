//! Relationship graph and version chains

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use solvr_domain::traits::RelationshipStore;
use solvr_domain::{
    walk_predecessors, Approach, ApproachId, ApproachRelationship, RelationType, RelationshipId,
    VersionHistory, WalkError,
};
use std::collections::HashSet;

use crate::approaches::{fetch_approach, require_approach};
use crate::codec::{self, key, millis, RELATIONSHIP_COLUMNS};
use crate::error::SqliteContext;
use crate::{SqliteStore, StoreError};

/// The outgoing "updates" edge of `id`, if any
fn outgoing_update(conn: &Connection, id: ApproachId) -> Result<Option<ApproachRelationship>, StoreError> {
    conn.query_row(
        &format!(
            "SELECT {} FROM approach_relationships
             WHERE from_approach_id = ?1 AND relation_type = 'updates'
             ORDER BY created_at DESC, id DESC
             LIMIT 1",
            RELATIONSHIP_COLUMNS
        ),
        params![key(id.value())],
        codec::relationship_from_row,
    )
    .optional()
    .ctx("outgoing_update", "approach_relationships")
}

/// The incoming "updates" edge of `id`, if any
fn incoming_update(conn: &Connection, id: ApproachId) -> Result<Option<ApproachRelationship>, StoreError> {
    conn.query_row(
        &format!(
            "SELECT {} FROM approach_relationships
             WHERE to_approach_id = ?1 AND relation_type = 'updates'
             ORDER BY created_at DESC, id DESC
             LIMIT 1",
            RELATIONSHIP_COLUMNS
        ),
        params![key(id.value())],
        codec::relationship_from_row,
    )
    .optional()
    .ctx("incoming_update", "approach_relationships")
}

/// One step of a predecessor walk: the edge and the live approach it points at
fn predecessor_step(
    conn: &Connection,
    id: ApproachId,
) -> Result<Option<(ApproachRelationship, Approach)>, StoreError> {
    let Some(edge) = outgoing_update(conn, id)? else {
        return Ok(None);
    };

    match fetch_approach(conn, edge.to_approach_id)? {
        Some(parent) => Ok(Some((edge, parent))),
        None => {
            // A soft-deleted predecessor ends the chain
            tracing::debug!(
                approach_id = %id,
                predecessor = %edge.to_approach_id,
                "version chain stops at missing predecessor"
            );
            Ok(None)
        }
    }
}

fn walk_fault(err: WalkError<StoreError>) -> StoreError {
    match err {
        WalkError::Fault(fault) => StoreError::IntegrityViolation(fault.to_string()),
        WalkError::Lookup(e) => e,
    }
}

/// Reject an "updates" edge that would fork a lineage or close a loop
fn check_supersession(conn: &Connection, from: ApproachId, to: ApproachId) -> Result<(), StoreError> {
    if let Some(existing) = incoming_update(conn, to)? {
        return Err(StoreError::IntegrityViolation(format!(
            "approach {} is already updated by {}",
            to, existing.from_approach_id
        )));
    }
    if let Some(existing) = outgoing_update(conn, from)? {
        return Err(StoreError::IntegrityViolation(format!(
            "approach {} already updates {}",
            from, existing.to_approach_id
        )));
    }

    // Walking back from `to` must never reach `from`. Edges are followed even
    // through deleted approaches here, since a loop is a loop either way.
    let ancestors = walk_predecessors(to, 0, |current| -> Result<_, StoreError> {
        Ok(outgoing_update(conn, current)?.map(|edge| {
            let parent = edge.to_approach_id;
            (edge, parent)
        }))
    })
    .map_err(walk_fault)?;

    if ancestors.iter().any(|(_, ancestor)| *ancestor == from) {
        return Err(StoreError::IntegrityViolation(format!(
            "approach {} updating {} would create a cycle",
            from, to
        )));
    }
    Ok(())
}

impl RelationshipStore for SqliteStore {
    type Error = StoreError;

    fn create_relationship(
        &self,
        from: ApproachId,
        to: ApproachId,
        relation_type: RelationType,
    ) -> Result<ApproachRelationship, Self::Error> {
        if from == to {
            return Err(StoreError::IntegrityViolation(format!(
                "approach {} cannot relate to itself",
                from
            )));
        }

        let now = self.now();
        let id = RelationshipId::new();
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .ctx("create_relationship.begin", "approach_relationships")?;

        require_approach(&tx, from)?;
        require_approach(&tx, to)?;

        if relation_type.is_versioning() {
            check_supersession(&tx, from, to)?;
        }

        tx.execute(
            "INSERT INTO approach_relationships (id, from_approach_id, to_approach_id, relation_type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                key(id.value()),
                key(from.value()),
                key(to.value()),
                relation_type.as_str(),
                millis(now),
            ],
        )
        .ctx("create_relationship", "approach_relationships")?;

        if relation_type.is_versioning() {
            tx.execute(
                "UPDATE approaches SET is_latest = 0 WHERE id = ?1 AND deleted_at IS NULL",
                params![key(to.value())],
            )
            .ctx("create_relationship.supersede", "approaches")?;
        }

        tx.commit().ctx("create_relationship.commit", "approach_relationships")?;

        tracing::info!(
            from = %from,
            to = %to,
            relation_type = %relation_type,
            "relationship created"
        );

        Ok(ApproachRelationship {
            id,
            from_approach_id: from,
            to_approach_id: to,
            relation_type,
            created_at: now,
        })
    }

    fn get_relationships(&self, id: ApproachId) -> Result<Vec<ApproachRelationship>, Self::Error> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM approach_relationships
                 WHERE from_approach_id = ?1 OR to_approach_id = ?1
                 ORDER BY created_at ASC, id ASC",
                RELATIONSHIP_COLUMNS
            ))
            .ctx("get_relationships.prepare", "approach_relationships")?;

        let edges = stmt
            .query_map(params![key(id.value())], codec::relationship_from_row)
            .ctx("get_relationships", "approach_relationships")?
            .collect::<Result<Vec<_>, _>>()
            .ctx("get_relationships.row", "approach_relationships")?;

        Ok(edges)
    }

    fn get_version_chain(&self, id: ApproachId, depth: usize) -> Result<VersionHistory, Self::Error> {
        let mut conn = self.lock()?;
        // One read transaction so the walk sees a single snapshot
        let tx = conn.transaction().ctx("get_version_chain.begin", "approaches")?;

        let current = require_approach(&tx, id)?;
        let steps = walk_predecessors(id, depth, |cursor| predecessor_step(&tx, cursor)).map_err(walk_fault)?;

        tx.commit().ctx("get_version_chain.commit", "approaches")?;

        Ok(VersionHistory::from_steps(current, steps))
    }

    fn latest_in_lineage(&self, id: ApproachId) -> Result<Approach, Self::Error> {
        let conn = self.lock()?;
        let mut latest = require_approach(&conn, id)?;
        let mut visited = HashSet::from([id]);

        while let Some(edge) = incoming_update(&conn, latest.id)? {
            let next = edge.from_approach_id;
            if !visited.insert(next) {
                return Err(StoreError::IntegrityViolation(format!(
                    "cycle in version chain at approach {}",
                    next
                )));
            }
            match fetch_approach(&conn, next)? {
                Some(successor) => latest = successor,
                None => break,
            }
        }

        Ok(latest)
    }
}

impl SqliteStore {
    /// Every "updates" edge as `(from, to)` pairs, for building a
    /// [`LineageIndex`](solvr_domain::LineageIndex)
    pub fn update_edges(&self) -> Result<Vec<(ApproachId, ApproachId)>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM approach_relationships WHERE relation_type = 'updates' ORDER BY created_at",
                RELATIONSHIP_COLUMNS
            ))
            .ctx("update_edges.prepare", "approach_relationships")?;

        let edges = stmt
            .query_map([], codec::relationship_from_row)
            .ctx("update_edges", "approach_relationships")?
            .map(|row| row.map(|edge| (edge.from_approach_id, edge.to_approach_id)))
            .collect::<Result<Vec<_>, _>>()
            .ctx("update_edges.row", "approach_relationships")?;

        Ok(edges)
    }
}
