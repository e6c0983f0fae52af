use tempfile::tempdir;

use itr_core::config::StoreConfig;
use itr_core::demo::{seed_demo_dataset, DEMO_INCIDENT_COUNT};
use itr_core::domain::Severity;
use itr_core::repo::count_incidents;
use itr_core::workspace::{
    create_workspace, create_workspace_connection, db_is_empty, open_workspace_connection,
};

#[test]
fn workspace_isolation_create_open_switch() {
    let tmp = tempdir().unwrap();
    let w1 = tmp.path().join("w1.sqlite");
    let w2 = tmp.path().join("w2.sqlite");

    let mut conn1 = create_workspace_connection(&w1).expect("create w1");
    seed_demo_dataset(&mut conn1).expect("seed w1");
    assert!(count_incidents(&conn1).unwrap() > 0);

    let conn2 = create_workspace_connection(&w2).expect("create w2");
    assert_eq!(count_incidents(&conn2).unwrap(), 0);
    assert!(db_is_empty(&w2).expect("is_empty"));

    let conn1b = open_workspace_connection(&w1).expect("open w1");
    assert_eq!(count_incidents(&conn1b).unwrap(), DEMO_INCIDENT_COUNT as i64);
}

#[test]
fn create_refuses_existing_and_open_refuses_missing() {
    let tmp = tempdir().unwrap();
    let w = tmp.path().join("nested").join("w.sqlite");

    let err = open_workspace_connection(&w).unwrap_err();
    assert_eq!(err.code, "WORKSPACE_DB_NOT_FOUND");

    let meta = create_workspace(&w).expect("create meta");
    assert!(meta.is_empty);

    let err = create_workspace_connection(&w).unwrap_err();
    assert_eq!(err.code, "WORKSPACE_CREATE_FAILED");

    let err = open_workspace_connection(tmp.path()).unwrap_err();
    assert_eq!(err.code, "WORKSPACE_INVALID_PATH");
}

#[test]
fn store_config_connects_and_creates_when_allowed() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("cfg.sqlite");
    let text = format!("db_path = {:?}\ncreate_if_missing = false\n", path.display().to_string());

    let strict = StoreConfig::from_toml_str(&text).expect("parse");
    assert!(strict.connect().is_err());

    let lenient = StoreConfig {
        create_if_missing: true,
        ..strict
    };
    let mut conn = lenient.connect().expect("create via config");
    seed_demo_dataset(&mut conn).expect("seed");
    assert!(!db_is_empty(&path).expect("not empty"));
}

#[test]
fn demo_seed_covers_every_severity_and_status() {
    let tmp = tempdir().unwrap();
    let mut conn = create_workspace_connection(&tmp.path().join("demo.sqlite")).expect("create");
    let summary = seed_demo_dataset(&mut conn).expect("seed");

    assert_eq!(summary.inserted, DEMO_INCIDENT_COUNT);
    assert!(summary.by_severity.iter().all(|(_, n)| *n > 0));
    assert!(summary.by_status.iter().all(|(_, n)| *n > 0));
    assert_eq!(summary.by_severity[0].0, Severity::Sev1);
    assert_eq!(
        summary.by_severity.iter().map(|(_, n)| n).sum::<usize>(),
        DEMO_INCIDENT_COUNT
    );
    assert_eq!(itr_core::repo::list_services(&conn).unwrap().len(), 20);
}
