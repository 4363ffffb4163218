//! Command tests against an in-memory store

use solvr_cli::cli::{ArchiveArgs, ChainArgs, ForgetArgs, LatestArgs, StaleArgs};
use solvr_cli::commands::{self, stale::forget, stale::stale_approaches, sweep::sweep};
use solvr_cli::{CliError, Formatter, OutputFormat, SolvrConfig};
use solvr_domain::traits::{ApproachStore, ProblemStore, RelationshipStore};
use solvr_domain::{ApproachId, ApproachStatus, Author, ManualClock, NewApproach, NewProblem, RelationType};
use solvr_janitor::JanitorConfig;
use solvr_store::{SqliteStore, StoreError};
use std::sync::Arc;

fn setup() -> (Arc<SqliteStore>, ManualClock) {
    let clock = ManualClock::starting_now();
    let store = SqliteStore::in_memory().unwrap().with_clock(Arc::new(clock.clone()));
    (Arc::new(store), clock)
}

fn approach(store: &SqliteStore, angle: &str, status: ApproachStatus) -> ApproachId {
    let problem = store.create_problem(NewProblem::new("Slow test suite")).unwrap();
    store
        .create_approach(NewApproach::new(problem.id, Author::agent("agent-1"), angle).with_status(status))
        .unwrap()
        .id
}

fn no_overrides() -> StaleArgs {
    StaleArgs {
        failed_after: None,
        superseded_after: None,
    }
}

fn quiet() -> Formatter {
    Formatter::new(OutputFormat::Quiet, false)
}

#[tokio::test]
async fn test_sweep_abandons_idle_approach() {
    let (store, clock) = setup();
    let id = approach(&store, "parallelize", ApproachStatus::Working);
    clock.advance(chrono::Duration::days(31));

    let report = sweep(JanitorConfig::default(), &store).await.unwrap();

    assert_eq!(report.abandoned, 1);
    assert_eq!(store.get_approach(id).unwrap().unwrap().status, ApproachStatus::Abandoned);
}

#[tokio::test]
async fn test_dry_run_sweep_changes_nothing() {
    let (store, clock) = setup();
    let id = approach(&store, "parallelize", ApproachStatus::Working);
    clock.advance(chrono::Duration::days(31));

    let config = JanitorConfig {
        dry_run: true,
        ..Default::default()
    };
    let report = sweep(config, &store).await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.abandoned, 1);
    assert_eq!(store.get_approach(id).unwrap().unwrap().status, ApproachStatus::Working);
}

#[test]
fn test_stale_overrides_failed_age() {
    let (store, clock) = setup();
    let id = approach(&store, "cache fixtures", ApproachStatus::Failed);
    clock.advance(chrono::Duration::days(40));

    let defaults = stale_approaches(&no_overrides(), &JanitorConfig::default(), &store).unwrap();
    assert!(defaults.is_empty());

    let args = StaleArgs {
        failed_after: Some(30),
        superseded_after: None,
    };
    let stale = stale_approaches(&args, &JanitorConfig::default(), &store).unwrap();
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].id, id);
}

#[test]
fn test_archive_removes_from_stale_listing() {
    let (store, clock) = setup();
    let old = approach(&store, "v1", ApproachStatus::Working);
    let problem_id = store.get_approach(old).unwrap().unwrap().problem_id;
    let new = store
        .create_approach(NewApproach::new(problem_id, Author::agent("agent-1"), "v2"))
        .unwrap()
        .id;
    store.create_relationship(new, old, RelationType::Updates).unwrap();
    clock.advance(chrono::Duration::days(181));

    let stale = stale_approaches(&no_overrides(), &JanitorConfig::default(), &store).unwrap();
    assert_eq!(stale.iter().map(|a| a.id).collect::<Vec<_>>(), vec![old]);

    let args = ArchiveArgs {
        id: old.to_string(),
        archive_ref: "archive/v1.json".to_string(),
    };
    commands::execute_archive(args, &store, &quiet()).unwrap();

    assert!(stale_approaches(&no_overrides(), &JanitorConfig::default(), &store)
        .unwrap()
        .is_empty());
    let archived = store.get_approach(old).unwrap().unwrap();
    assert_eq!(archived.archive_ref.as_deref(), Some("archive/v1.json"));
}

#[test]
fn test_forget_snapshots_and_archives() {
    let (store, clock) = setup();
    let id = approach(&store, "retry flaky tests", ApproachStatus::Failed);
    clock.advance(chrono::Duration::days(91));
    let dir = tempfile::tempdir().unwrap();

    let dry = ForgetArgs {
        dir: dir.path().to_path_buf(),
        ages: no_overrides(),
        dry_run: true,
    };
    let report = forget(&dry, &JanitorConfig::default(), &store).unwrap();
    assert_eq!((report.processed, report.archived), (1, 0));
    assert!(store.get_approach(id).unwrap().unwrap().archived_at.is_none());

    let args = ForgetArgs { dry_run: false, ..dry };
    let report = forget(&args, &JanitorConfig::default(), &store).unwrap();
    assert_eq!((report.processed, report.archived, report.failed), (1, 1, 0));

    let archived = store.get_approach(id).unwrap().unwrap();
    assert!(archived.archived_at.is_some());
    let snapshot_path = dir.path().join(format!("{}.json", id));
    assert_eq!(archived.archive_ref, Some(snapshot_path.display().to_string()));

    let snapshot: serde_json::Value = serde_json::from_slice(&std::fs::read(&snapshot_path).unwrap()).unwrap();
    assert_eq!(snapshot["approach_id"], id.to_string());
    assert_eq!(snapshot["status"], "failed");

    assert!(stale_approaches(&no_overrides(), &JanitorConfig::default(), &store)
        .unwrap()
        .is_empty());
}

#[test]
fn test_chain_and_latest() {
    let (store, _) = setup();
    let v1 = approach(&store, "v1", ApproachStatus::Working);
    let problem_id = store.get_approach(v1).unwrap().unwrap().problem_id;
    let v2 = store
        .create_approach(NewApproach::new(problem_id, Author::agent("agent-1"), "v2"))
        .unwrap()
        .id;
    store.create_relationship(v2, v1, RelationType::Updates).unwrap();

    let chain = ChainArgs {
        id: v2.to_string(),
        depth: 0,
    };
    commands::execute_chain(chain, &store, &quiet()).unwrap();

    let latest = LatestArgs { id: v1.to_string() };
    commands::execute_latest(latest, &store, &quiet()).unwrap();
    assert_eq!(store.latest_in_lineage(v1).unwrap().id, v2);
}

#[test]
fn test_bad_ids() {
    let (store, _) = setup();

    let garbled = ChainArgs {
        id: "not-a-uuid".to_string(),
        depth: 0,
    };
    let err = commands::execute_chain(garbled, &store, &quiet()).unwrap_err();
    assert!(matches!(err, CliError::Store(StoreError::InvalidReference(_))));

    let unknown = LatestArgs {
        id: ApproachId::new().to_string(),
    };
    let err = commands::execute_latest(unknown, &store, &quiet()).unwrap_err();
    assert!(matches!(err, CliError::Store(ref e) if e.is_not_found()));
}

#[test]
fn test_config_needs_no_database() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = SolvrConfig::default();
    config.store.path = dir.path().join("missing").join("solvr.db");

    commands::execute_config(&config, OutputFormat::Json).unwrap();
    commands::execute_config(&config, OutputFormat::Table).unwrap();
    assert!(!config.store.path.exists());
}
