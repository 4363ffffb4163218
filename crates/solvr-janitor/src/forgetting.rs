//! Archival of stale approaches
//!
//! Failed and superseded approaches that have sat untouched past their age
//! limit are written out as a JSON snapshot and then marked archived, with
//! the reference returned by the snapshot sink.

use crate::{Janitor, JanitorError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use solvr_domain::traits::StaleContentStore;
use solvr_domain::{Approach, ApproachId, ApproachStatus, ProblemId};
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Snapshot format version
pub const SNAPSHOT_VERSION: &str = "1.0";

/// Origin recorded in every snapshot
pub const SNAPSHOT_ORIGIN: &str = "solvr.dev";

/// Archived copy of an approach
#[derive(Debug, Clone, Serialize)]
pub struct ApproachSnapshot {
    /// Snapshot format version
    pub version: &'static str,
    /// Where the approach was archived from
    pub origin: &'static str,
    /// Archived approach
    pub approach_id: ApproachId,
    /// Problem it attempted
    pub problem_id: ProblemId,
    /// `agent` or `human`
    pub author_type: &'static str,
    /// Author identifier
    pub author_id: String,
    /// Angle taken
    pub angle: String,
    /// Method, omitted when empty
    #[serde(skip_serializing_if = "String::is_empty")]
    pub method: String,
    /// Status when archived
    pub status: ApproachStatus,
    /// Outcome notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    /// Solution text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    /// Whether it headed its lineage
    pub is_latest: bool,
    /// When the approach was created
    pub created_at: DateTime<Utc>,
    /// Last update before archival
    pub updated_at: DateTime<Utc>,
    /// When the snapshot was taken
    pub archived_at: DateTime<Utc>,
}

impl ApproachSnapshot {
    /// Snapshot `approach` as archived at `archived_at`
    pub fn of(approach: &Approach, archived_at: DateTime<Utc>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            origin: SNAPSHOT_ORIGIN,
            approach_id: approach.id,
            problem_id: approach.problem_id,
            author_type: approach.author.kind.as_str(),
            author_id: approach.author.id.clone(),
            angle: approach.angle.clone(),
            method: approach.method.clone(),
            status: approach.status,
            outcome: approach.outcome.clone(),
            solution: approach.solution.clone(),
            is_latest: approach.is_latest,
            created_at: approach.created_at,
            updated_at: approach.updated_at,
            archived_at,
        }
    }

    /// Pretty-printed JSON document
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }
}

/// Destination for archived snapshots
pub trait SnapshotSink {
    /// Error type for sink operations
    type Error;

    /// Store `document` for `approach_id`; returns the reference to record on
    /// the approach
    fn store_snapshot(&self, approach_id: ApproachId, document: &[u8]) -> Result<String, Self::Error>;
}

/// Writes each snapshot to `<dir>/<approach_id>.json`
#[derive(Debug, Clone)]
pub struct DirectorySnapshotSink {
    dir: PathBuf,
}

impl DirectorySnapshotSink {
    /// Sink rooted at `dir`; the directory is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SnapshotSink for DirectorySnapshotSink {
    type Error = io::Error;

    fn store_snapshot(&self, approach_id: ApproachId, document: &[u8]) -> Result<String, Self::Error> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{approach_id}.json"));
        fs::write(&path, document)?;
        Ok(path.display().to_string())
    }
}

/// Result of one archival pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ForgettingReport {
    /// Stale approaches found
    pub processed: usize,
    /// Approaches snapshotted and marked archived
    pub archived: usize,
    /// Approaches skipped after a snapshot or archive failure
    pub failed: usize,
}

impl Janitor {
    /// Snapshot and archive every stale approach
    ///
    /// A failure on one approach is logged and counted; the rest are still
    /// archived. Only the listing itself can fail the pass. In dry-run mode
    /// the stale approaches are counted and nothing is written.
    pub fn forget_stale_approaches<S, K>(&self, store: &S, sink: &K) -> Result<ForgettingReport, JanitorError>
    where
        S: StaleContentStore,
        S::Error: Display,
        K: SnapshotSink,
        K::Error: Display,
    {
        let stale = self.stale_approaches(store)?;
        let mut report = ForgettingReport {
            processed: stale.len(),
            ..Default::default()
        };

        if self.config().dry_run {
            tracing::info!("DRY RUN: Would archive {} approaches", report.processed);
            return Ok(report);
        }

        let cancel = self.cancellation_token();
        for approach in &stale {
            if cancel.is_cancelled() {
                tracing::info!(archived = report.archived, "Archival cancelled");
                break;
            }

            match archive_one(store, sink, approach) {
                Ok(archive_ref) => {
                    tracing::debug!(approach_id = %approach.id, archive_ref = %archive_ref, "Approach archived");
                    report.archived += 1;
                }
                Err(e) => {
                    tracing::warn!(approach_id = %approach.id, error = %e, "Failed to archive approach, skipping");
                    report.failed += 1;
                }
            }
        }

        if report.archived > 0 {
            tracing::info!(
                processed = report.processed,
                archived = report.archived,
                failed = report.failed,
                "Archived stale approaches"
            );
        }

        Ok(report)
    }
}

fn archive_one<S, K>(store: &S, sink: &K, approach: &Approach) -> Result<String, JanitorError>
where
    S: StaleContentStore,
    S::Error: Display,
    K: SnapshotSink,
    K::Error: Display,
{
    let document = ApproachSnapshot::of(approach, Utc::now())
        .to_json()
        .map_err(JanitorError::snapshot)?;
    let archive_ref = sink
        .store_snapshot(approach.id, &document)
        .map_err(JanitorError::snapshot)?;
    store
        .archive_approach(approach.id, &archive_ref)
        .map_err(JanitorError::store)?;
    Ok(archive_ref)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JanitorConfig;
    use solvr_domain::traits::WarningCandidate;
    use solvr_domain::{Author, NotificationId, WarningKey};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::time::Duration;

    #[derive(Default)]
    struct MockStore {
        stale: Vec<Approach>,
        fail_listing: bool,
        fail_archive: Option<ApproachId>,
        archived: RefCell<HashMap<ApproachId, String>>,
    }

    impl StaleContentStore for MockStore {
        type Error = String;

        fn abandon_stale_approaches(&self, _older_than: Duration) -> Result<usize, Self::Error> {
            Ok(0)
        }

        fn count_abandon_candidates(&self, _older_than: Duration) -> Result<usize, Self::Error> {
            Ok(0)
        }

        fn approaches_due_for_warning(
            &self,
            _warning: Duration,
            _abandon: Duration,
        ) -> Result<Vec<WarningCandidate>, Self::Error> {
            Ok(Vec::new())
        }

        fn claim_warning(&self, _key: WarningKey) -> Result<bool, Self::Error> {
            Ok(true)
        }

        fn confirm_warning(&self, _key: WarningKey, _notification_id: NotificationId) -> Result<(), Self::Error> {
            Ok(())
        }

        fn release_warning(&self, _key: WarningKey) -> Result<(), Self::Error> {
            Ok(())
        }

        fn mark_dormant_problems(&self, _older_than: Duration) -> Result<usize, Self::Error> {
            Ok(0)
        }

        fn count_dormant_candidates(&self, _older_than: Duration) -> Result<usize, Self::Error> {
            Ok(0)
        }

        fn list_stale_approaches(&self, _failed: u32, _superseded: u32) -> Result<Vec<Approach>, Self::Error> {
            if self.fail_listing {
                return Err("database is locked".to_string());
            }
            let archived = self.archived.borrow();
            Ok(self
                .stale
                .iter()
                .filter(|a| !archived.contains_key(&a.id))
                .cloned()
                .collect())
        }

        fn archive_approach(&self, id: ApproachId, archive_ref: &str) -> Result<(), Self::Error> {
            if self.fail_archive == Some(id) {
                return Err("database is locked".to_string());
            }
            self.archived.borrow_mut().insert(id, archive_ref.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemorySink {
        documents: RefCell<HashMap<ApproachId, Vec<u8>>>,
        reject: Option<ApproachId>,
    }

    impl SnapshotSink for MemorySink {
        type Error = String;

        fn store_snapshot(&self, approach_id: ApproachId, document: &[u8]) -> Result<String, Self::Error> {
            if self.reject == Some(approach_id) {
                return Err("content store unavailable".to_string());
            }
            self.documents.borrow_mut().insert(approach_id, document.to_vec());
            Ok(format!("mem://{approach_id}"))
        }
    }

    fn failed_approach(angle: &str) -> Approach {
        let now = Utc::now();
        Approach {
            id: ApproachId::new(),
            problem_id: ProblemId::new(),
            author: Author::agent("claude"),
            angle: angle.to_string(),
            method: String::new(),
            outcome: Some("did not converge".to_string()),
            solution: None,
            status: ApproachStatus::Failed,
            is_latest: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            archived_at: None,
            archive_ref: None,
        }
    }

    #[test]
    fn test_snapshot_fields() {
        let approach = failed_approach("binary search");
        let json: serde_json::Value =
            serde_json::from_slice(&ApproachSnapshot::of(&approach, Utc::now()).to_json().unwrap()).unwrap();

        assert_eq!(json["version"], "1.0");
        assert_eq!(json["origin"], "solvr.dev");
        assert_eq!(json["approach_id"], approach.id.to_string());
        assert_eq!(json["author_type"], "agent");
        assert_eq!(json["author_id"], "claude");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["outcome"], "did not converge");
        assert!(json.get("solution").is_none());
        assert!(json.get("method").is_none());
    }

    #[test]
    fn test_archives_every_stale_approach() {
        let store = MockStore {
            stale: vec![failed_approach("a"), failed_approach("b")],
            ..Default::default()
        };
        let sink = MemorySink::default();
        let janitor = Janitor::default_config();

        let report = janitor.forget_stale_approaches(&store, &sink).unwrap();

        assert_eq!(report, ForgettingReport { processed: 2, archived: 2, failed: 0 });
        assert_eq!(sink.documents.borrow().len(), 2);
        for approach in &store.stale {
            assert_eq!(store.archived.borrow()[&approach.id], format!("mem://{}", approach.id));
        }

        let again = janitor.forget_stale_approaches(&store, &sink).unwrap();
        assert_eq!(again, ForgettingReport::default());
    }

    #[test]
    fn test_failed_item_does_not_stop_the_pass() {
        let rejected = failed_approach("rejected by sink");
        let unarchivable = failed_approach("archive fails");
        let fine = failed_approach("fine");
        let store = MockStore {
            fail_archive: Some(unarchivable.id),
            stale: vec![rejected.clone(), unarchivable.clone(), fine.clone()],
            ..Default::default()
        };
        let sink = MemorySink {
            reject: Some(rejected.id),
            ..Default::default()
        };
        let janitor = Janitor::default_config();

        let report = janitor.forget_stale_approaches(&store, &sink).unwrap();

        assert_eq!(report, ForgettingReport { processed: 3, archived: 1, failed: 2 });
        let archived = store.archived.borrow();
        assert!(archived.contains_key(&fine.id));
        assert!(!archived.contains_key(&rejected.id));
        assert!(!archived.contains_key(&unarchivable.id));
    }

    #[test]
    fn test_listing_failure_fails_the_pass() {
        let store = MockStore {
            fail_listing: true,
            ..Default::default()
        };
        let janitor = Janitor::default_config();

        let err = janitor.forget_stale_approaches(&store, &MemorySink::default()).unwrap_err();
        assert!(matches!(err, JanitorError::Store(_)));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let store = MockStore {
            stale: vec![failed_approach("a")],
            ..Default::default()
        };
        let sink = MemorySink::default();
        let config = JanitorConfig {
            dry_run: true,
            ..Default::default()
        };
        let janitor = Janitor::new(config);

        let report = janitor.forget_stale_approaches(&store, &sink).unwrap();

        assert_eq!(report, ForgettingReport { processed: 1, archived: 0, failed: 0 });
        assert!(sink.documents.borrow().is_empty());
        assert!(store.archived.borrow().is_empty());
    }

    #[test]
    fn test_directory_sink_writes_file() {
        let dir = std::env::temp_dir().join(format!("solvr-snapshots-{}", ApproachId::new()));
        let sink = DirectorySnapshotSink::new(&dir);
        let id = ApproachId::new();

        let archive_ref = sink.store_snapshot(id, b"{}").unwrap();

        let path = dir.join(format!("{id}.json"));
        assert_eq!(archive_ref, path.display().to_string());
        assert_eq!(fs::read(&path).unwrap(), b"{}");
        fs::remove_dir_all(&dir).unwrap();
    }
}
