use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{IncidentPatch, IncidentStatus, NewIncident, Severity};
use crate::error::{AppError, FieldError};
use crate::normalize::non_blank;
use crate::query::{IncidentQuery, SortDirection, SortKey, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

const TITLE_MIN: usize = 3;
const TITLE_MAX: usize = 255;
const SERVICE_MAX: usize = 100;
const OWNER_MAX: usize = 100;
const SUMMARY_MAX: usize = 5000;

/// Raw list parameters as they arrive on the wire (query-string key/values).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub service: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateIncidentRequest {
    pub title: Option<String>,
    pub service: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub owner: Option<String>,
    pub summary: Option<String>,
}

/// Partial update body. Unknown keys are rejected.
///
/// `owner`/`summary` distinguish "absent" from an explicit `null`, which clears the field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct UpdateIncidentRequest {
    pub title: Option<String>,
    pub service: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub owner: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub summary: Option<Option<String>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Decode a JSON request body; malformed bodies and unknown fields are validation failures.
pub fn parse_json_body<T: DeserializeOwned>(raw: &str) -> Result<T, AppError> {
    serde_json::from_str(raw).map_err(|e| {
        AppError::validation(vec![FieldError::new("body", "Malformed request body")])
            .with_details(e.to_string())
    })
}

fn check_len(
    field: &str,
    value: &str,
    min: usize,
    max: usize,
    message: &str,
    errors: &mut Vec<FieldError>,
) {
    let len = value.chars().count();
    if len < min || len > max {
        errors.push(FieldError::new(field, message));
    }
}

fn parse_severity(raw: Option<&str>, errors: &mut Vec<FieldError>) -> Option<Severity> {
    let raw = non_blank(raw)?;
    let parsed = Severity::parse(&raw);
    if parsed.is_none() {
        errors.push(FieldError::new(
            "severity",
            "Severity must be one of: SEV1, SEV2, SEV3, SEV4",
        ));
    }
    parsed
}

fn parse_status(raw: Option<&str>, errors: &mut Vec<FieldError>) -> Option<IncidentStatus> {
    let raw = non_blank(raw)?;
    let parsed = IncidentStatus::parse(&raw);
    if parsed.is_none() {
        errors.push(FieldError::new(
            "status",
            "Status must be one of: OPEN, MITIGATED, RESOLVED",
        ));
    }
    parsed
}

fn parse_bounded(
    field: &str,
    raw: Option<&str>,
    min: u32,
    max: u32,
    message: &str,
    errors: &mut Vec<FieldError>,
) -> Option<u32> {
    let raw = non_blank(raw)?;
    match raw.parse::<u32>() {
        Ok(v) if (min..=max).contains(&v) => Some(v),
        _ => {
            errors.push(FieldError::new(field, message));
            None
        }
    }
}

fn finish<T>(value: T, errors: Vec<FieldError>) -> Result<T, AppError> {
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(AppError::validation(errors))
    }
}

/// Turn wire list parameters into a Query Specification.
///
/// `page`, `limit`, `severity` and `status` are checked; `sortBy`/`sortOrder` are never rejected,
/// unknown values coerce to `created_at` / `DESC`.
pub fn validate_list_params(params: &ListParams) -> Result<IncidentQuery, AppError> {
    let mut errors = Vec::new();

    let page = parse_bounded(
        "page",
        params.page.as_deref(),
        1,
        u32::MAX,
        "Page must be a positive integer",
        &mut errors,
    );
    let limit = parse_bounded(
        "limit",
        params.limit.as_deref(),
        1,
        MAX_PAGE_SIZE,
        "Limit must be between 1 and 100",
        &mut errors,
    );
    let severity = parse_severity(params.severity.as_deref(), &mut errors);
    let status = parse_status(params.status.as_deref(), &mut errors);

    let query = IncidentQuery {
        page: page.unwrap_or(1),
        limit: limit.unwrap_or(DEFAULT_PAGE_SIZE),
        search: non_blank(params.search.as_deref()),
        severity,
        status,
        service: non_blank(params.service.as_deref()),
        sort_by: params
            .sort_by
            .as_deref()
            .map(SortKey::from_param)
            .unwrap_or_default(),
        sort_order: params
            .sort_order
            .as_deref()
            .map(SortDirection::from_param)
            .unwrap_or_default(),
    };

    finish(query, errors)
}

pub fn validate_create(req: &CreateIncidentRequest) -> Result<NewIncident, AppError> {
    let mut errors = Vec::new();

    let title = non_blank(req.title.as_deref());
    match &title {
        Some(t) => check_len(
            "title",
            t,
            TITLE_MIN,
            TITLE_MAX,
            "Title must be between 3 and 255 characters",
            &mut errors,
        ),
        None => errors.push(FieldError::new("title", "Title is required")),
    }

    let service = non_blank(req.service.as_deref());
    match &service {
        Some(s) => check_len(
            "service",
            s,
            1,
            SERVICE_MAX,
            "Service must not exceed 100 characters",
            &mut errors,
        ),
        None => errors.push(FieldError::new("service", "Service is required")),
    }

    let severity = if non_blank(req.severity.as_deref()).is_none() {
        errors.push(FieldError::new("severity", "Severity is required"));
        None
    } else {
        parse_severity(req.severity.as_deref(), &mut errors)
    };
    let status = parse_status(req.status.as_deref(), &mut errors);

    let owner = non_blank(req.owner.as_deref());
    if let Some(o) = &owner {
        check_len("owner", o, 0, OWNER_MAX, "Owner must not exceed 100 characters", &mut errors);
    }
    let summary = non_blank(req.summary.as_deref());
    if let Some(s) = &summary {
        check_len(
            "summary",
            s,
            0,
            SUMMARY_MAX,
            "Summary must not exceed 5000 characters",
            &mut errors,
        );
    }

    match (title, service, severity) {
        (Some(title), Some(service), Some(severity)) if errors.is_empty() => Ok(NewIncident {
            title,
            service,
            severity,
            status: status.unwrap_or_default(),
            owner,
            summary,
        }),
        _ => Err(AppError::validation(errors)),
    }
}

pub fn validate_update(req: &UpdateIncidentRequest) -> Result<IncidentPatch, AppError> {
    let mut errors = Vec::new();
    let mut patch = IncidentPatch::default();

    if let Some(raw) = req.title.as_deref() {
        let title = raw.trim().to_string();
        check_len(
            "title",
            &title,
            TITLE_MIN,
            TITLE_MAX,
            "Title must be between 3 and 255 characters",
            &mut errors,
        );
        patch.title = Some(title);
    }
    if let Some(raw) = req.service.as_deref() {
        let service = raw.trim().to_string();
        check_len(
            "service",
            &service,
            1,
            SERVICE_MAX,
            "Service must be between 1 and 100 characters",
            &mut errors,
        );
        patch.service = Some(service);
    }
    if req.severity.is_some() {
        patch.severity = parse_severity(req.severity.as_deref(), &mut errors);
        if patch.severity.is_none() && errors.iter().all(|e| e.field != "severity") {
            errors.push(FieldError::new("severity", "Severity must not be empty"));
        }
    }
    if req.status.is_some() {
        patch.status = parse_status(req.status.as_deref(), &mut errors);
        if patch.status.is_none() && errors.iter().all(|e| e.field != "status") {
            errors.push(FieldError::new("status", "Status must not be empty"));
        }
    }
    if let Some(owner) = &req.owner {
        let owner = non_blank(owner.as_deref());
        if let Some(o) = &owner {
            check_len("owner", o, 0, OWNER_MAX, "Owner must not exceed 100 characters", &mut errors);
        }
        patch.owner = Some(owner);
    }
    if let Some(summary) = &req.summary {
        let summary = non_blank(summary.as_deref());
        if let Some(s) = &summary {
            check_len(
                "summary",
                s,
                0,
                SUMMARY_MAX,
                "Summary must not exceed 5000 characters",
                &mut errors,
            );
        }
        patch.summary = Some(summary);
    }

    if errors.is_empty() && patch.is_empty() {
        return Err(AppError::new("VALIDATION_NO_FIELDS", "No fields to update"));
    }
    finish(patch, errors)
}

/// Incident identifiers are UUIDs; returns the canonical (lowercase, hyphenated) form.
pub fn validate_incident_id(raw: &str) -> Result<String, AppError> {
    uuid::Uuid::parse_str(raw.trim())
        .map(|id| id.to_string())
        .map_err(|e| {
            AppError::validation(vec![FieldError::new("id", "Invalid incident ID format")])
                .with_details(e.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fields(err: &AppError) -> Vec<&str> {
        err.errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn list_params_default_when_absent() {
        let q = validate_list_params(&ListParams::default()).expect("valid");
        assert_eq!(q, IncidentQuery::default());
    }

    #[test]
    fn list_params_reject_bad_window_and_enums() {
        let params = ListParams {
            page: Some("0".to_string()),
            limit: Some("101".to_string()),
            severity: Some("SEV9".to_string()),
            status: Some("closed".to_string()),
            ..ListParams::default()
        };
        let err = validate_list_params(&params).unwrap_err();
        assert_eq!(err.status(), 400);
        assert_eq!(fields(&err), vec!["page", "limit", "severity", "status"]);
    }

    #[test]
    fn list_params_coerce_sort_instead_of_rejecting() {
        let params = ListParams {
            sort_by: Some("foo".to_string()),
            sort_order: Some("sideways".to_string()),
            ..ListParams::default()
        };
        let q = validate_list_params(&params).expect("sort is lenient");
        assert_eq!(q.sort_by, SortKey::CreatedAt);
        assert_eq!(q.sort_order, SortDirection::Desc);
    }

    #[test]
    fn list_params_deserialize_from_camel_case_keys() {
        let params: ListParams =
            serde_json::from_str(r#"{"sortBy":"title","sortOrder":"asc","page":"2"}"#).unwrap();
        let q = validate_list_params(&params).unwrap();
        assert_eq!(q.sort_by, SortKey::Title);
        assert_eq!(q.sort_order, SortDirection::Asc);
        assert_eq!(q.page, 2);
    }

    #[test]
    fn create_defaults_status_to_open_and_trims() {
        let req = CreateIncidentRequest {
            title: Some("  Database outage ".to_string()),
            service: Some("db".to_string()),
            severity: Some("SEV2".to_string()),
            owner: Some("   ".to_string()),
            ..CreateIncidentRequest::default()
        };
        let new = validate_create(&req).expect("valid");
        assert_eq!(new.title, "Database outage");
        assert_eq!(new.status, IncidentStatus::Open);
        assert_eq!(new.owner, None);
    }

    #[test]
    fn create_reports_every_missing_required_field() {
        let err = validate_create(&CreateIncidentRequest::default()).unwrap_err();
        assert_eq!(fields(&err), vec!["title", "service", "severity"]);
    }

    #[test]
    fn create_enforces_length_bounds() {
        let req = CreateIncidentRequest {
            title: Some("ab".to_string()),
            service: Some("s".repeat(101)),
            severity: Some("SEV1".to_string()),
            summary: Some("x".repeat(5001)),
            ..CreateIncidentRequest::default()
        };
        let err = validate_create(&req).unwrap_err();
        assert_eq!(fields(&err), vec!["title", "service", "summary"]);
    }

    #[test]
    fn update_requires_at_least_one_field() {
        let err = validate_update(&UpdateIncidentRequest::default()).unwrap_err();
        assert_eq!(err.code, "VALIDATION_NO_FIELDS");
    }

    #[test]
    fn update_distinguishes_null_from_absent() {
        let req: UpdateIncidentRequest = parse_json_body(r#"{"owner":null}"#).unwrap();
        let patch = validate_update(&req).unwrap();
        assert_eq!(patch.owner, Some(None));
        assert_eq!(patch.summary, None);
    }

    #[test]
    fn update_rejects_unknown_fields() {
        let err = parse_json_body::<UpdateIncidentRequest>(r#"{"id":"x"}"#).unwrap_err();
        assert_eq!(err.status(), 400);
        assert_eq!(fields(&err), vec!["body"]);
    }

    #[test]
    fn incident_id_must_be_uuid() {
        assert!(validate_incident_id("not-a-uuid").is_err());
        let id = validate_incident_id("6F9619FF-8B86-D011-B42D-00C04FC964FF").unwrap();
        assert_eq!(id, "6f9619ff-8b86-d011-b42d-00c04fc964ff");
    }
}
