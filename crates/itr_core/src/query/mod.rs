use serde::{Deserialize, Serialize};

use crate::domain::{Incident, IncidentStatus, Severity};

pub mod plan;

pub use plan::{Predicate, QueryPlan};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Allow-listed sort columns. Anything else falls back to [`SortKey::CreatedAt`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
    Severity,
    Status,
    Service,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        Self::CreatedAt,
        Self::UpdatedAt,
        Self::Title,
        Self::Severity,
        Self::Status,
        Self::Service,
    ];

    /// Wire value (`sortBy`), which is also the stored column name.
    pub fn as_param(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Title => "title",
            Self::Severity => "severity",
            Self::Status => "status",
            Self::Service => "service",
        }
    }

    pub fn column(self) -> &'static str {
        self.as_param()
    }

    /// Lenient lookup: unknown keys coerce to the default instead of failing.
    pub fn from_param(raw: &str) -> Self {
        match raw.trim() {
            "created_at" => Self::CreatedAt,
            "updated_at" => Self::UpdatedAt,
            "title" => Self::Title,
            "severity" => Self::Severity,
            "status" => Self::Status,
            "service" => Self::Service,
            other => {
                tracing::debug!(sort_by = other, "unknown sort key; using created_at");
                Self::default()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    pub fn sql(self) -> &'static str {
        self.as_param()
    }

    /// Case-insensitive; anything other than `asc` is descending.
    pub fn from_param(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            if !raw.trim().eq_ignore_ascii_case("desc") {
                tracing::debug!(sort_order = raw, "unknown sort order; using DESC");
            }
            Self::Desc
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Query Specification: the full description of one list retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IncidentQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub severity: Option<Severity>,
    pub status: Option<IncidentStatus>,
    pub service: Option<String>,
    pub sort_by: SortKey,
    pub sort_order: SortDirection,
}

impl Default for IncidentQuery {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl IncidentQuery {
    pub fn with_page_size(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            search: None,
            severity: None,
            status: None,
            service: None,
            sort_by: SortKey::default(),
            sort_order: SortDirection::default(),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.limit)
    }

    /// Query-string pairs in wire form; absent filters are omitted.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut out = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            out.push(("search", search.to_string()));
        }
        if let Some(severity) = self.severity {
            out.push(("severity", severity.as_str().to_string()));
        }
        if let Some(status) = self.status {
            out.push(("status", status.as_str().to_string()));
        }
        if let Some(service) = self.service.as_deref().filter(|s| !s.trim().is_empty()) {
            out.push(("service", service.to_string()));
        }
        out.push(("sortBy", self.sort_by.as_param().to_string()));
        out.push(("sortOrder", self.sort_order.as_param().to_string()));
        out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: total_pages(total, limit),
        }
    }
}

/// Retrieval Result: one page of incidents plus metadata for the whole filtered set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IncidentPage {
    pub data: Vec<Incident>,
    pub pagination: Pagination,
}

pub fn total_pages(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    let pages = total.div_ceil(u64::from(limit));
    u32::try_from(pages).unwrap_or(u32::MAX)
}
