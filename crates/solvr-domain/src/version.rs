//! Version chains over "updates" edges
//!
//! A lineage is a linked list: every approach has at most one predecessor
//! (its outgoing "updates" edge) and at most one successor. The set of all
//! lineages is a forest of simple chains. Nothing here trusts storage to keep
//! it that way; walks are bounded by a visited set and [`LineageIndex`]
//! rejects forks and cycles when it is built.

use crate::{Approach, ApproachId, ApproachRelationship};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Version history of one approach (read model, never persisted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionHistory {
    /// The queried approach
    pub current: Approach,

    /// Ancestors, oldest first
    pub history: Vec<Approach>,

    /// Edges traversed to build `history`, nearest first
    pub relationships: Vec<ApproachRelationship>,
}

impl VersionHistory {
    /// Assemble a history from walk steps given nearest-first
    pub fn from_steps(current: Approach, steps: Vec<(ApproachRelationship, Approach)>) -> Self {
        let (relationships, mut history): (Vec<_>, Vec<_>) = steps.into_iter().unzip();
        history.reverse();
        Self { current, history, relationships }
    }

    /// IDs of `history` in order
    pub fn history_ids(&self) -> Vec<ApproachId> {
        self.history.iter().map(|a| a.id).collect()
    }
}

/// Structural faults in the "updates" graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainFault {
    /// Following predecessors came back to an approach already visited
    Cycle {
        /// First approach seen twice
        at: ApproachId,
    },

    /// An approach has more than one outgoing "updates" edge
    MultiplePredecessors {
        /// The approach with several predecessors
        approach_id: ApproachId,
    },

    /// An approach has more than one incoming "updates" edge
    Fork {
        /// The predecessor that was superseded twice
        approach_id: ApproachId,
    },
}

impl std::fmt::Display for ChainFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainFault::Cycle { at } => write!(f, "cycle in version chain at approach {}", at),
            ChainFault::MultiplePredecessors { approach_id } => {
                write!(f, "approach {} updates more than one approach", approach_id)
            }
            ChainFault::Fork { approach_id } => {
                write!(f, "approach {} is updated by more than one approach", approach_id)
            }
        }
    }
}

impl std::error::Error for ChainFault {}

/// Failure while walking a chain through a fallible lookup
#[derive(Debug)]
pub enum WalkError<E> {
    /// The graph itself is malformed
    Fault(ChainFault),

    /// The lookup failed
    Lookup(E),
}

/// Walk predecessors starting at `start`
///
/// `next(id)` returns the outgoing "updates" edge of `id` together with the
/// predecessor it points at, or `None` when the chain ends there (no edge, or
/// the predecessor is gone). `depth = 0` means unlimited; otherwise at most
/// `depth` steps are taken. Steps come back nearest first.
pub fn walk_predecessors<T, E, F>(
    start: ApproachId,
    depth: usize,
    mut next: F,
) -> Result<Vec<(ApproachRelationship, T)>, WalkError<E>>
where
    F: FnMut(ApproachId) -> Result<Option<(ApproachRelationship, T)>, E>,
{
    let mut steps = Vec::new();
    let mut visited = HashSet::from([start]);
    let mut current = start;

    loop {
        if depth > 0 && steps.len() >= depth {
            break;
        }

        let Some((edge, node)) = next(current).map_err(WalkError::Lookup)? else {
            break;
        };

        let parent = edge.to_approach_id;
        if !visited.insert(parent) {
            return Err(WalkError::Fault(ChainFault::Cycle { at: parent }));
        }

        steps.push((edge, node));
        current = parent;
    }

    Ok(steps)
}

/// In-memory adjacency of "updates" edges, validated as a forest of chains
#[derive(Debug, Clone, Default)]
pub struct LineageIndex {
    predecessor: HashMap<ApproachId, ApproachId>,
    successor: HashMap<ApproachId, ApproachId>,
}

impl LineageIndex {
    /// Build the index from `(from, to)` pairs of "updates" edges
    ///
    /// Fails on the first fork, double predecessor, or cycle.
    pub fn from_edges<I>(edges: I) -> Result<Self, ChainFault>
    where
        I: IntoIterator<Item = (ApproachId, ApproachId)>,
    {
        let mut index = Self::default();

        for (from, to) in edges {
            if from == to {
                return Err(ChainFault::Cycle { at: from });
            }
            if index.predecessor.contains_key(&from) {
                return Err(ChainFault::MultiplePredecessors { approach_id: from });
            }
            if index.successor.contains_key(&to) {
                return Err(ChainFault::Fork { approach_id: to });
            }
            index.predecessor.insert(from, to);
            index.successor.insert(to, from);
        }

        // With in/out degree <= 1 every component is a path or a simple cycle.
        // A cycle has no root, so any edge node that cannot reach a root is on one.
        let mut on_path = HashSet::new();
        for &node in index.predecessor.keys() {
            if on_path.contains(&node) {
                continue;
            }
            let mut seen = HashSet::new();
            let mut cursor = node;
            while let Some(&prev) = index.predecessor.get(&cursor) {
                if !seen.insert(cursor) {
                    return Err(ChainFault::Cycle { at: cursor });
                }
                cursor = prev;
            }
            on_path.extend(seen);
        }

        Ok(index)
    }

    /// The approach `id` updates, if any
    pub fn predecessor(&self, id: ApproachId) -> Option<ApproachId> {
        self.predecessor.get(&id).copied()
    }

    /// The approach that updates `id`, if any
    pub fn successor(&self, id: ApproachId) -> Option<ApproachId> {
        self.successor.get(&id).copied()
    }

    /// Newest member of the lineage containing `id`
    pub fn head_of(&self, id: ApproachId) -> ApproachId {
        let mut cursor = id;
        while let Some(next) = self.successor(cursor) {
            cursor = next;
        }
        cursor
    }

    /// Oldest member of the lineage containing `id`
    pub fn root_of(&self, id: ApproachId) -> ApproachId {
        let mut cursor = id;
        while let Some(prev) = self.predecessor(cursor) {
            cursor = prev;
        }
        cursor
    }

    /// Whole lineage containing `id`, oldest first
    pub fn lineage_of(&self, id: ApproachId) -> Vec<ApproachId> {
        let mut cursor = self.root_of(id);
        let mut lineage = vec![cursor];
        while let Some(next) = self.successor(cursor) {
            lineage.push(next);
            cursor = next;
        }
        lineage
    }

    /// Group `nodes` into lineages (oldest first); unlinked nodes form
    /// singleton lineages
    pub fn lineages<I>(&self, nodes: I) -> Vec<Vec<ApproachId>>
    where
        I: IntoIterator<Item = ApproachId>,
    {
        let mut seen_roots = HashSet::new();
        let mut out = Vec::new();
        for node in nodes {
            let root = self.root_of(node);
            if seen_roots.insert(root) {
                out.push(self.lineage_of(root));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RelationType;
    use chrono::Utc;

    fn id(n: u128) -> ApproachId {
        ApproachId::from_value(n)
    }

    fn edge(from: u128, to: u128) -> ApproachRelationship {
        ApproachRelationship {
            id: crate::RelationshipId::from_value(from * 1000 + to),
            from_approach_id: id(from),
            to_approach_id: id(to),
            relation_type: RelationType::Updates,
            created_at: Utc::now(),
        }
    }

    /// Lookup over a plain edge list, returning the predecessor ID as the node
    fn lookup(edges: &[(u128, u128)]) -> impl FnMut(ApproachId) -> Result<Option<(ApproachRelationship, ApproachId)>, ()> + '_ {
        move |current| {
            Ok(edges
                .iter()
                .find(|(from, _)| id(*from) == current)
                .map(|&(from, to)| (edge(from, to), id(to))))
        }
    }

    #[test]
    fn test_walk_unlimited_depth() {
        // v3 -> v2 -> v1
        let edges = [(3, 2), (2, 1)];
        let steps = walk_predecessors(id(3), 0, lookup(&edges)).unwrap();
        let nodes: Vec<_> = steps.iter().map(|(_, n)| *n).collect();
        assert_eq!(nodes, vec![id(2), id(1)]);
    }

    #[test]
    fn test_walk_depth_limit() {
        let edges = [(3, 2), (2, 1)];
        let steps = walk_predecessors(id(3), 1, lookup(&edges)).unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].1, id(2));
    }

    #[test]
    fn test_walk_no_predecessors() {
        let steps = walk_predecessors(id(1), 0, lookup(&[])).unwrap();
        assert!(steps.is_empty());
    }

    #[test]
    fn test_walk_detects_cycle() {
        let edges = [(1, 2), (2, 3), (3, 1)];
        match walk_predecessors(id(1), 0, lookup(&edges)) {
            Err(WalkError::Fault(ChainFault::Cycle { at })) => assert_eq!(at, id(1)),
            other => panic!("expected cycle, got {:?}", other.map(|s| s.len())),
        }
    }

    #[test]
    fn test_walk_cycle_beyond_depth_is_not_reached() {
        let edges = [(1, 2), (2, 1)];
        let steps = walk_predecessors(id(1), 1, lookup(&edges)).unwrap();
        assert_eq!(steps.len(), 1);
    }

    #[test]
    fn test_walk_propagates_lookup_error() {
        let result = walk_predecessors::<(), _, _>(id(1), 0, |_| Err("boom"));
        assert!(matches!(result, Err(WalkError::Lookup("boom"))));
    }

    #[test]
    fn test_index_rejects_fork() {
        let result = LineageIndex::from_edges([(id(2), id(1)), (id(3), id(1))]);
        assert_eq!(result.unwrap_err(), ChainFault::Fork { approach_id: id(1) });
    }

    #[test]
    fn test_index_rejects_double_predecessor() {
        let result = LineageIndex::from_edges([(id(3), id(1)), (id(3), id(2))]);
        assert_eq!(result.unwrap_err(), ChainFault::MultiplePredecessors { approach_id: id(3) });
    }

    #[test]
    fn test_index_rejects_cycle() {
        let result = LineageIndex::from_edges([(id(1), id(2)), (id(2), id(3)), (id(3), id(1))]);
        assert!(matches!(result, Err(ChainFault::Cycle { .. })));
        assert!(matches!(
            LineageIndex::from_edges([(id(1), id(1))]),
            Err(ChainFault::Cycle { .. })
        ));
    }

    #[test]
    fn test_index_lineages() {
        let index = LineageIndex::from_edges([(id(2), id(1)), (id(3), id(2)), (id(5), id(4))]).unwrap();

        assert_eq!(index.head_of(id(1)), id(3));
        assert_eq!(index.root_of(id(3)), id(1));
        assert_eq!(index.lineage_of(id(2)), vec![id(1), id(2), id(3)]);

        let lineages = index.lineages([id(1), id(2), id(3), id(4), id(5), id(6)]);
        assert_eq!(lineages.len(), 3);
        assert!(lineages.contains(&vec![id(6)]));
        assert!(lineages.contains(&vec![id(4), id(5)]));
    }
}
