use rusqlite::types::Value;

use crate::domain::{IncidentStatus, Severity};
use crate::normalize::{escape_like, non_blank};

use super::{IncidentQuery, SortDirection, SortKey, MAX_PAGE_SIZE};

pub(crate) const INCIDENT_COLUMNS: &str =
    "id, title, service, severity, status, owner, summary, created_at, updated_at";

/// One filter condition with its own bound value.
///
/// The SQL fragment for a predicate is static apart from its placeholder index; the value only
/// ever travels as a bound parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Case-insensitive (Unicode) substring match on title, summary or owner.
    Search(String),
    Severity(Severity),
    Status(IncidentStatus),
    /// Exact match.
    Service(String),
}

impl Predicate {
    fn sql(&self, idx: usize) -> String {
        match self {
            // Columns go through `db::UNICODE_LOWER_FN`; the bound pattern is lowercased to match.
            Self::Search(_) => format!(
                r"(unicode_lower(title) LIKE ?{idx} ESCAPE '\' OR unicode_lower(summary) LIKE ?{idx} ESCAPE '\' OR unicode_lower(owner) LIKE ?{idx} ESCAPE '\')"
            ),
            Self::Severity(_) => format!("severity = ?{idx}"),
            Self::Status(_) => format!("status = ?{idx}"),
            Self::Service(_) => format!("service = ?{idx}"),
        }
    }

    pub fn bound_value(&self) -> Value {
        match self {
            Self::Search(term) => Value::Text(format!("%{}%", escape_like(&term.to_lowercase()))),
            Self::Severity(s) => Value::Text(s.as_str().to_string()),
            Self::Status(s) => Value::Text(s.as_str().to_string()),
            Self::Service(s) => Value::Text(s.clone()),
        }
    }
}

/// Retrieval plan for one Query Specification: a count and a page fetch sharing one predicate
/// list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub predicates: Vec<Predicate>,
    pub sort_by: SortKey,
    pub sort_order: SortDirection,
    pub page: u32,
    pub limit: u32,
}

impl QueryPlan {
    pub fn build(query: &IncidentQuery) -> Self {
        let mut predicates = Vec::new();
        if let Some(term) = non_blank(query.search.as_deref()) {
            predicates.push(Predicate::Search(term));
        }
        if let Some(severity) = query.severity {
            predicates.push(Predicate::Severity(severity));
        }
        if let Some(status) = query.status {
            predicates.push(Predicate::Status(status));
        }
        if let Some(service) = non_blank(query.service.as_deref()) {
            predicates.push(Predicate::Service(service));
        }

        Self {
            predicates,
            sort_by: query.sort_by,
            sort_order: query.sort_order,
            page: query.page.max(1),
            limit: query.limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// `WHERE ...` joined with AND, or the empty string when no filter is active.
    pub fn where_clause(&self) -> String {
        if self.predicates.is_empty() {
            return String::new();
        }
        let parts = self
            .predicates
            .iter()
            .enumerate()
            .map(|(i, p)| p.sql(i + 1))
            .collect::<Vec<_>>();
        format!("WHERE {}", parts.join(" AND "))
    }

    fn from_clause(&self) -> String {
        let filter = self.where_clause();
        if filter.is_empty() {
            "FROM incidents".to_string()
        } else {
            format!("FROM incidents {filter}")
        }
    }

    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) {}", self.from_clause())
    }

    pub fn fetch_sql(&self) -> String {
        let n = self.predicates.len();
        // `id` breaks ties so that pages are disjoint and stable.
        format!(
            "SELECT {INCIDENT_COLUMNS} {} ORDER BY {} {}, id ASC LIMIT ?{} OFFSET ?{}",
            self.from_clause(),
            self.sort_by.column(),
            self.sort_order.sql(),
            n + 1,
            n + 2
        )
    }

    pub fn filter_params(&self) -> Vec<Value> {
        self.predicates.iter().map(Predicate::bound_value).collect()
    }

    pub fn fetch_params(&self) -> Vec<Value> {
        let mut params = self.filter_params();
        params.push(Value::Integer(i64::from(self.limit)));
        params.push(Value::Integer(
            i64::try_from(self.offset()).unwrap_or(i64::MAX),
        ));
        params
    }
}
