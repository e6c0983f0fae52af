//! Transport-agnostic handlers for the incident endpoints.
//!
//! Each handler validates its raw input, calls the store, and returns the success envelope; a
//! transport adapter only has to map [`respond`]'s `(status, body)` onto its own response type.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::domain::Incident;
use crate::error::{AppError, FieldError};
use crate::query::Pagination;
use crate::repo;
use crate::validate::{
    validate_create, validate_incident_id, validate_list_params, validate_update,
    CreateIncidentRequest, ListParams, UpdateIncidentRequest,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiResponse<T> {
    #[serde(skip)]
    pub status: u16,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            status: 200,
            success: true,
            message: None,
            data,
            pagination: None,
        }
    }

    fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        Self {
            success: false,
            message: err.message.clone(),
            errors: err.errors.clone(),
        }
    }
}

/// Replace the message of unexpected failures with the operation-level one; validation and
/// not-found errors pass through untouched.
fn unexpected(operation: &'static str) -> impl Fn(AppError) -> AppError {
    move |err| {
        if err.status() != 500 {
            return err;
        }
        tracing::error!(code = %err.code, details = ?err.details, "{operation}");
        let details = err.details.clone().unwrap_or_else(|| err.message.clone());
        AppError {
            message: operation.to_string(),
            details: Some(details),
            ..err
        }
    }
}

pub fn list_incidents(
    conn: &Connection,
    params: &ListParams,
) -> Result<ApiResponse<Vec<Incident>>, AppError> {
    let query = validate_list_params(params)?;
    let page = repo::search_incidents(conn, &query).map_err(unexpected("Failed to fetch incidents"))?;
    Ok(ApiResponse {
        pagination: Some(page.pagination),
        ..ApiResponse::ok(page.data)
    })
}

pub fn get_incident(conn: &Connection, id: &str) -> Result<ApiResponse<Incident>, AppError> {
    let id = validate_incident_id(id)?;
    let incident = repo::get_incident(conn, &id).map_err(unexpected("Failed to fetch incident"))?;
    Ok(ApiResponse::ok(incident))
}

pub fn create_incident(
    conn: &mut Connection,
    req: &CreateIncidentRequest,
) -> Result<ApiResponse<Incident>, AppError> {
    let new = validate_create(req)?;
    let incident =
        repo::insert_incident(conn, &new).map_err(unexpected("Failed to create incident"))?;
    Ok(ApiResponse::ok(incident)
        .with_status(201)
        .with_message("Incident created successfully"))
}

pub fn update_incident(
    conn: &mut Connection,
    id: &str,
    req: &UpdateIncidentRequest,
) -> Result<ApiResponse<Incident>, AppError> {
    let id = validate_incident_id(id)?;
    let patch = validate_update(req)?;
    let incident = repo::update_incident(conn, &id, &patch)
        .map_err(unexpected("Failed to update incident"))?;
    Ok(ApiResponse::ok(incident).with_message("Incident updated successfully"))
}

pub fn delete_incident(conn: &mut Connection, id: &str) -> Result<ApiResponse<Incident>, AppError> {
    let id = validate_incident_id(id)?;
    let incident =
        repo::delete_incident(conn, &id).map_err(unexpected("Failed to delete incident"))?;
    Ok(ApiResponse::ok(incident).with_message("Incident deleted successfully"))
}

pub fn list_services(conn: &Connection) -> Result<ApiResponse<Vec<String>>, AppError> {
    let services = repo::list_services(conn).map_err(unexpected("Failed to fetch services"))?;
    Ok(ApiResponse::ok(services))
}

/// HTTP-equivalent status plus JSON body for either outcome of a handler.
pub fn respond<T: Serialize>(result: Result<ApiResponse<T>, AppError>) -> (u16, serde_json::Value) {
    let encoded = match &result {
        Ok(resp) => serde_json::to_value(resp).map(|body| (resp.status, body)),
        Err(err) => serde_json::to_value(ErrorResponse::from(err)).map(|body| (err.status(), body)),
    };
    encoded.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to encode response");
        (
            500,
            serde_json::json!({ "success": false, "message": "Failed to encode response" }),
        )
    })
}
