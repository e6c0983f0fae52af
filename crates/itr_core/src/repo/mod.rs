use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};

use crate::domain::{Incident, IncidentPatch, NewIncident};
use crate::error::AppError;
use crate::normalize::timestamps::{next_timestamp, now_timestamp};
use crate::query::plan::INCIDENT_COLUMNS;
use crate::query::{IncidentPage, IncidentQuery, Pagination, QueryPlan};

fn map_incident(row: &Row<'_>) -> rusqlite::Result<Incident> {
    Ok(Incident {
        id: row.get(0)?,
        title: row.get(1)?,
        service: row.get(2)?,
        severity: row.get(3)?,
        status: row.get(4)?,
        owner: row.get(5)?,
        summary: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Run the count and the page fetch for one query; both use the same predicates.
pub fn search_incidents(conn: &Connection, query: &IncidentQuery) -> Result<IncidentPage, AppError> {
    let plan = QueryPlan::build(query);
    tracing::debug!(
        predicates = plan.predicates.len(),
        sort_by = plan.sort_by.as_param(),
        sort_order = plan.sort_order.as_param(),
        page = plan.page,
        limit = plan.limit,
        "searching incidents"
    );

    let total: i64 = conn
        .query_row(&plan.count_sql(), params_from_iter(plan.filter_params()), |row| {
            row.get(0)
        })
        .map_err(|e| {
            AppError::new("DB_QUERY_FAILED", "Failed to count incidents")
                .with_details(e.to_string())
                .with_retryable(true)
        })?;

    let mut stmt = conn.prepare(&plan.fetch_sql()).map_err(|e| {
        AppError::new("DB_QUERY_FAILED", "Failed to prepare incidents query")
            .with_details(e.to_string())
    })?;

    let rows = stmt
        .query_map(params_from_iter(plan.fetch_params()), map_incident)
        .map_err(|e| {
            AppError::new("DB_QUERY_FAILED", "Failed to query incidents")
                .with_details(e.to_string())
                .with_retryable(true)
        })?;

    let mut data = Vec::new();
    for r in rows {
        data.push(r.map_err(|e| {
            AppError::new("DB_QUERY_FAILED", "Failed to decode incident row")
                .with_details(e.to_string())
        })?);
    }

    Ok(IncidentPage {
        data,
        pagination: Pagination::new(plan.page, plan.limit, u64::try_from(total).unwrap_or(0)),
    })
}

pub fn count_incidents(conn: &Connection) -> Result<i64, AppError> {
    conn.query_row("SELECT COUNT(*) FROM incidents", [], |row| row.get(0))
        .map_err(|e| {
            AppError::new("DB_QUERY_FAILED", "Failed to count incidents")
                .with_details(e.to_string())
        })
}

fn find_incident(conn: &Connection, id: &str) -> Result<Option<Incident>, AppError> {
    conn.query_row(
        &format!("SELECT {INCIDENT_COLUMNS} FROM incidents WHERE id = ?1"),
        [id],
        map_incident,
    )
    .optional()
    .map_err(|e| {
        AppError::new("DB_QUERY_FAILED", "Failed to query incident").with_details(e.to_string())
    })
}

pub fn get_incident(conn: &Connection, id: &str) -> Result<Incident, AppError> {
    find_incident(conn, id)?.ok_or_else(|| {
        AppError::not_found("Incident not found").with_details(format!("id={id}"))
    })
}

pub fn insert_incident(conn: &mut Connection, new: &NewIncident) -> Result<Incident, AppError> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = now_timestamp()?;

    conn.execute(
        &format!(
            "INSERT INTO incidents({INCIDENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)"
        ),
        rusqlite::params![
            id,
            new.title,
            new.service,
            new.severity,
            new.status,
            new.owner,
            new.summary,
            now
        ],
    )
    .map_err(|e| {
        AppError::new("DB_WRITE_FAILED", "Failed to create incident").with_details(e.to_string())
    })?;

    tracing::info!(incident_id = %id, severity = %new.severity, "created incident");
    get_incident(conn, &id)
}

/// Insert a fully specified record (id and timestamps included), e.g. from a seed or import.
pub fn import_incident(conn: &Connection, incident: &Incident) -> Result<(), AppError> {
    conn.execute(
        &format!(
            "INSERT INTO incidents({INCIDENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
        ),
        rusqlite::params![
            incident.id,
            incident.title,
            incident.service,
            incident.severity,
            incident.status,
            incident.owner,
            incident.summary,
            incident.created_at,
            incident.updated_at
        ],
    )
    .map_err(|e| {
        AppError::new("DB_WRITE_FAILED", "Failed to import incident")
            .with_details(format!("id={}; err={}", incident.id, e))
    })?;
    Ok(())
}

/// Apply a partial update; only supplied fields change and `updated_at` always advances.
pub fn update_incident(
    conn: &mut Connection,
    id: &str,
    patch: &IncidentPatch,
) -> Result<Incident, AppError> {
    if patch.is_empty() {
        return Err(AppError::new("VALIDATION_NO_FIELDS", "No fields to update"));
    }

    let tx = conn.transaction().map_err(|e| {
        AppError::new("DB_TX_FAILED", "Failed to start update transaction")
            .with_details(e.to_string())
    })?;

    let existing = get_incident(&tx, id)?;

    // Column names are static; every value is bound.
    let mut sets: Vec<(&'static str, Value)> = Vec::new();
    if let Some(title) = &patch.title {
        sets.push(("title", Value::Text(title.clone())));
    }
    if let Some(service) = &patch.service {
        sets.push(("service", Value::Text(service.clone())));
    }
    if let Some(severity) = patch.severity {
        sets.push(("severity", Value::Text(severity.as_str().to_string())));
    }
    if let Some(status) = patch.status {
        sets.push(("status", Value::Text(status.as_str().to_string())));
    }
    if let Some(owner) = &patch.owner {
        sets.push(("owner", owner.clone().map_or(Value::Null, Value::Text)));
    }
    if let Some(summary) = &patch.summary {
        sets.push(("summary", summary.clone().map_or(Value::Null, Value::Text)));
    }
    sets.push(("updated_at", Value::Text(next_timestamp(&existing.updated_at)?)));

    let assignments = sets
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{column} = ?{}", i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("UPDATE incidents SET {assignments} WHERE id = ?{}", sets.len() + 1);

    let mut values = sets.into_iter().map(|(_, v)| v).collect::<Vec<_>>();
    values.push(Value::Text(id.to_string()));

    let changed = tx.execute(&sql, params_from_iter(values)).map_err(|e| {
        AppError::new("DB_WRITE_FAILED", "Failed to update incident").with_details(e.to_string())
    })?;
    if changed == 0 {
        return Err(AppError::not_found("Incident not found").with_details(format!("id={id}")));
    }

    let updated = get_incident(&tx, id)?;
    tx.commit().map_err(|e| {
        AppError::new("DB_TX_FAILED", "Failed to commit update transaction")
            .with_details(e.to_string())
    })?;

    tracing::info!(incident_id = %id, "updated incident");
    Ok(updated)
}

/// Hard delete; returns the removed record.
pub fn delete_incident(conn: &mut Connection, id: &str) -> Result<Incident, AppError> {
    let deleted = conn
        .query_row(
            &format!("DELETE FROM incidents WHERE id = ?1 RETURNING {INCIDENT_COLUMNS}"),
            [id],
            map_incident,
        )
        .optional()
        .map_err(|e| {
            AppError::new("DB_WRITE_FAILED", "Failed to delete incident")
                .with_details(e.to_string())
        })?;

    match deleted {
        Some(incident) => {
            tracing::info!(incident_id = %id, "deleted incident");
            Ok(incident)
        }
        None => Err(AppError::not_found("Incident not found").with_details(format!("id={id}"))),
    }
}

/// Distinct service names, ascending; used to populate the service filter.
pub fn list_services(conn: &Connection) -> Result<Vec<String>, AppError> {
    let mut stmt = conn
        .prepare("SELECT DISTINCT service FROM incidents ORDER BY service ASC")
        .map_err(|e| {
            AppError::new("DB_QUERY_FAILED", "Failed to prepare services query")
                .with_details(e.to_string())
        })?;

    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| {
            AppError::new("DB_QUERY_FAILED", "Failed to query services")
                .with_details(e.to_string())
        })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| {
            AppError::new("DB_QUERY_FAILED", "Failed to decode service row")
                .with_details(e.to_string())
        })?);
    }
    Ok(out)
}
