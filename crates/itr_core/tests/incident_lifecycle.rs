use pretty_assertions::assert_eq;

use itr_core::api::{self, respond};
use itr_core::db;
use itr_core::domain::{IncidentStatus, Severity};
use itr_core::validate::{parse_json_body, CreateIncidentRequest, UpdateIncidentRequest};

fn create_request(title: &str, service: &str, severity: &str) -> CreateIncidentRequest {
    CreateIncidentRequest {
        title: Some(title.to_string()),
        service: Some(service.to_string()),
        severity: Some(severity.to_string()),
        ..CreateIncidentRequest::default()
    }
}

#[test]
fn create_defaults_status_then_partial_update_changes_only_status() {
    let mut conn = db::open_in_memory_migrated().expect("db");

    let created = api::create_incident(&mut conn, &create_request("Checkout errors", "Payment Gateway", "SEV2"))
        .expect("create");
    assert_eq!(created.status, 201);
    let before = created.data;
    assert_eq!(before.status, IncidentStatus::Open);
    assert_eq!(before.severity, Severity::Sev2);

    let body: UpdateIncidentRequest = parse_json_body(r#"{"status":"RESOLVED"}"#).expect("body");
    let after = api::update_incident(&mut conn, &before.id, &body)
        .expect("update")
        .data;

    assert_eq!(after.status, IncidentStatus::Resolved);
    assert_eq!(after.title, before.title);
    assert_eq!(after.service, before.service);
    assert_eq!(after.severity, before.severity);
    assert_eq!(after.owner, before.owner);
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at > before.updated_at, "updated_at must advance");
    assert!(after.updated_at >= after.created_at);
}

#[test]
fn repeated_updates_keep_advancing_updated_at() {
    let mut conn = db::open_in_memory_migrated().expect("db");
    let inc = api::create_incident(&mut conn, &create_request("Queue backlog", "Message Queue", "SEV3"))
        .expect("create")
        .data;

    let mut last = inc.updated_at.clone();
    for sev in ["SEV1", "SEV2", "SEV1"] {
        let body = UpdateIncidentRequest {
            severity: Some(sev.to_string()),
            ..UpdateIncidentRequest::default()
        };
        let updated = api::update_incident(&mut conn, &inc.id, &body).expect("update").data;
        assert!(updated.updated_at > last);
        last = updated.updated_at;
    }
}

#[test]
fn deleting_a_nonexistent_incident_is_not_found_and_touches_nothing() {
    let mut conn = db::open_in_memory_migrated().expect("db");
    api::create_incident(&mut conn, &create_request("Keep me", "CDN", "SEV4")).expect("create");

    let (status, body) = respond(api::delete_incident(
        &mut conn,
        "3f2504e0-4f89-41d3-9a0c-0305e82c3301",
    ));
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
    assert_eq!(itr_core::repo::count_incidents(&conn).unwrap(), 1);
}

#[test]
fn delete_returns_the_removed_record() {
    let mut conn = db::open_in_memory_migrated().expect("db");
    let inc = api::create_incident(&mut conn, &create_request("Remove me", "CDN", "SEV4"))
        .expect("create")
        .data;

    let deleted = api::delete_incident(&mut conn, &inc.id).expect("delete");
    assert_eq!(deleted.data, inc);
    assert_eq!(deleted.message.as_deref(), Some("Incident deleted successfully"));

    let err = api::get_incident(&conn, &inc.id).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn update_of_missing_incident_is_not_found() {
    let mut conn = db::open_in_memory_migrated().expect("db");
    let body = UpdateIncidentRequest {
        title: Some("New title".to_string()),
        ..UpdateIncidentRequest::default()
    };
    let err = api::update_incident(&mut conn, "3f2504e0-4f89-41d3-9a0c-0305e82c3301", &body)
        .unwrap_err();
    assert_eq!(err.status(), 404);
}

#[test]
fn invalid_create_is_rejected_before_the_store() {
    let mut conn = db::open_in_memory_migrated().expect("db");
    let (status, body) = respond(api::create_incident(
        &mut conn,
        &create_request("ok title", "CDN", "SEV5"),
    ));
    assert_eq!(status, 400);
    assert_eq!(body["errors"][0]["field"], "severity");
    assert_eq!(itr_core::repo::count_incidents(&conn).unwrap(), 0);
}

#[test]
fn services_listing_is_distinct_for_filter_population() {
    let mut conn = db::open_in_memory_migrated().expect("db");
    for (title, service) in [("First outage", "User API"), ("Second outage", "CDN"), ("Third outage", "CDN")] {
        api::create_incident(&mut conn, &create_request(title, service, "SEV3")).expect("create");
    }
    let services = api::list_services(&conn).expect("services").data;
    assert_eq!(services, vec!["CDN".to_string(), "User API".to_string()]);
}
