use std::time::Duration;

use itr_core::error::{AppError, FieldError, DB_NOT_FOUND, VALIDATION_FAILED};
use itr_core::query::{IncidentPage, IncidentQuery};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::source::IncidentSource;

#[derive(Debug, Clone, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// Error body as sent by the API. Validation failures may carry only `errors`.
#[derive(Debug, Clone, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<FieldError>,
}

/// Blocking HTTP source for the incident list endpoints (`GET /incidents`, `GET /services`).
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let scheme_ok = base_url.starts_with("http://") || base_url.starts_with("https://");
        let host = base_url.split("://").nth(1).unwrap_or_default();
        if !scheme_ok || host.is_empty() || host.starts_with('/') {
            return Err(AppError::new(
                "HTTP_INVALID_BASE_URL",
                "Incident API base URL must be an http(s) URL with a host",
            )
            .with_details(format!("base_url={base_url}")));
        }
        Ok(Self { base_url, timeout })
    }

    pub fn from_config(config: &crate::config::ClientConfig) -> Result<Self, AppError> {
        Self::new(&config.base_url, config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, AppError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = ureq::get(&url).timeout(self.timeout);
        for (key, value) in params {
            req = req.query(key, value);
        }

        match req.call() {
            Ok(resp) => resp.into_json::<T>().map_err(|e| {
                AppError::new("HTTP_DECODE_FAILED", "Failed to decode incident API response")
                    .with_details(format!("url={url}; err={e}"))
            }),
            Err(ureq::Error::Status(status, resp)) => Err(status_error(status, resp)),
            Err(e) => Err(AppError::new(
                "HTTP_UNREACHABLE",
                "Failed to reach incident API",
            )
            .with_details(e.to_string())
            .with_retryable(true)),
        }
    }
}

fn status_error(status: u16, resp: ureq::Response) -> AppError {
    let body: ErrorBody = resp.into_json().unwrap_or_default();
    let (code, fallback) = match status {
        400 => (VALIDATION_FAILED, "Validation failed".to_string()),
        404 => (DB_NOT_FOUND, "Incident not found".to_string()),
        _ => ("HTTP_STATUS_FAILED", format!("Incident API returned status {status}")),
    };

    let mut err = AppError::new(code, body.message.unwrap_or(fallback))
        .with_details(format!("status={status}"))
        .with_retryable(status >= 500);
    err.errors = body.errors;
    err
}

impl IncidentSource for HttpSource {
    fn fetch_incidents(&self, query: &IncidentQuery) -> Result<IncidentPage, AppError> {
        self.get("/incidents", &query.to_params())
    }

    fn list_services(&self) -> Result<Vec<String>, AppError> {
        self.get::<DataEnvelope<Vec<String>>>("/services", &[])
            .map(|envelope| envelope.data)
    }
}
