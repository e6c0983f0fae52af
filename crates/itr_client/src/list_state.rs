use std::time::{Duration, Instant};

use itr_core::domain::{Incident, IncidentStatus, Severity};
use itr_core::error::AppError;
use itr_core::normalize::non_blank;
use itr_core::query::{IncidentPage, IncidentQuery, SortDirection, SortKey, MAX_PAGE_SIZE};

use crate::config::ClientConfig;
use crate::debounce::Debouncer;
use crate::pagination::PaginationView;
use crate::source::IncidentSource;

/// A retrieval the caller must run, tagged with the sequence number it was issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub query: IncidentQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Response matched the latest request and is now displayed.
    Applied,
    /// Latest request failed; the previous result stays on screen.
    Failed,
    /// Superseded or already settled; ignored.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortIndicator {
    Unsorted,
    Ascending,
    Descending,
}

/// Client-side list state: the active query, the pending search text, and the last
/// successfully applied page.
///
/// Every transition that changes the query returns a [`FetchTicket`]. Only the response for
/// the most recently issued ticket is ever applied.
#[derive(Debug)]
pub struct ListState {
    query: IncidentQuery,
    default_query: IncidentQuery,
    search_input: String,
    search_debounce: Debouncer<String>,
    result: Option<IncidentPage>,
    /// Query whose response is in `result`.
    result_query: Option<IncidentQuery>,
    error: Option<AppError>,
    services: Vec<String>,
    last_issued: u64,
    in_flight: Option<FetchTicket>,
}

/// Whether two queries select the same rows with the same page size, so one's page count
/// is valid for the other. Page and sort do not matter.
fn same_result_set(a: &IncidentQuery, b: &IncidentQuery) -> bool {
    a.search == b.search
        && a.severity == b.severity
        && a.status == b.status
        && a.service == b.service
        && a.limit == b.limit
}

impl ListState {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_settings(config.page_size, config.debounce())
    }

    pub fn with_settings(page_size: u32, debounce: Duration) -> Self {
        let default_query = IncidentQuery::with_page_size(page_size.clamp(1, MAX_PAGE_SIZE));
        Self {
            query: default_query.clone(),
            default_query,
            search_input: String::new(),
            search_debounce: Debouncer::new(debounce),
            result: None,
            result_query: None,
            error: None,
            services: Vec::new(),
            last_issued: 0,
            in_flight: None,
        }
    }

    pub fn query(&self) -> &IncidentQuery {
        &self.query
    }

    /// Raw text in the search box, which may not be committed yet.
    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn result(&self) -> Option<&IncidentPage> {
        self.result.as_ref()
    }

    pub fn incidents(&self) -> &[Incident] {
        self.result.as_ref().map(|r| r.data.as_slice()).unwrap_or(&[])
    }

    pub fn total(&self) -> u64 {
        self.result.as_ref().map(|r| r.pagination.total).unwrap_or(0)
    }

    /// Page count of the last applied result, whatever query produced it.
    pub fn total_pages(&self) -> u32 {
        self.result
            .as_ref()
            .map(|r| r.pagination.total_pages)
            .unwrap_or(0)
    }

    /// Page count valid for the current query: 0 until a result for the current filters and
    /// page size has been applied.
    pub fn navigable_pages(&self) -> u32 {
        match &self.result_query {
            Some(q) if same_result_set(q, &self.query) => self.total_pages(),
            _ => 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }

    pub fn services(&self) -> &[String] {
        &self.services
    }

    pub fn latest_seq(&self) -> u64 {
        self.last_issued
    }

    /// When the pending search text will be committed, if any.
    pub fn search_deadline(&self) -> Option<Instant> {
        self.search_debounce.deadline()
    }

    pub fn pagination_view(&self) -> PaginationView {
        PaginationView::new(self.query.page, self.navigable_pages())
    }

    pub fn sort_indicator(&self, key: SortKey) -> SortIndicator {
        if self.query.sort_by != key {
            return SortIndicator::Unsorted;
        }
        match self.query.sort_order {
            SortDirection::Asc => SortIndicator::Ascending,
            SortDirection::Desc => SortIndicator::Descending,
        }
    }

    /// Issue a retrieval for the current query unconditionally (initial load, manual reload).
    pub fn refresh(&mut self) -> FetchTicket {
        self.issue()
    }

    fn issue(&mut self) -> FetchTicket {
        self.last_issued += 1;
        self.error = None;
        tracing::debug!(seq = self.last_issued, query = ?self.query, "issuing incident retrieval");
        let ticket = FetchTicket {
            seq: self.last_issued,
            query: self.query.clone(),
        };
        self.in_flight = Some(ticket.clone());
        ticket
    }

    fn transition(&mut self, next: IncidentQuery) -> Option<FetchTicket> {
        if next == self.query {
            return None;
        }
        self.query = next;
        Some(self.issue())
    }

    /// Record a keystroke. Nothing is issued until [`ListState::poll`] sees the quiet period elapse.
    pub fn set_search_input(&mut self, text: impl Into<String>, now: Instant) {
        let text = text.into();
        self.search_input.clone_from(&text);
        self.search_debounce.push(text, now);
    }

    /// Commit the pending search text once its quiet period has passed.
    pub fn poll(&mut self, now: Instant) -> Option<FetchTicket> {
        let raw = self.search_debounce.poll(now)?;
        let search = non_blank(Some(raw.as_str()));
        if search == self.query.search {
            return None;
        }
        let mut next = self.query.clone();
        next.search = search;
        next.page = 1;
        self.transition(next)
    }

    pub fn set_severity(&mut self, severity: Option<Severity>) -> Option<FetchTicket> {
        if severity == self.query.severity {
            return None;
        }
        let mut next = self.query.clone();
        next.severity = severity;
        next.page = 1;
        self.transition(next)
    }

    pub fn set_status(&mut self, status: Option<IncidentStatus>) -> Option<FetchTicket> {
        if status == self.query.status {
            return None;
        }
        let mut next = self.query.clone();
        next.status = status;
        next.page = 1;
        self.transition(next)
    }

    pub fn set_service(&mut self, service: Option<&str>) -> Option<FetchTicket> {
        let service = non_blank(service);
        if service == self.query.service {
            return None;
        }
        let mut next = self.query.clone();
        next.service = service;
        next.page = 1;
        self.transition(next)
    }

    /// Change the page size; resets to page 1.
    pub fn set_page_size(&mut self, limit: u32) -> Option<FetchTicket> {
        if !(1..=MAX_PAGE_SIZE).contains(&limit) || limit == self.query.limit {
            return None;
        }
        let mut next = self.query.clone();
        next.limit = limit;
        next.page = 1;
        self.transition(next)
    }

    /// Column header activation: the active column flips direction, any other column becomes
    /// active in descending order. The page is kept.
    pub fn activate_sort(&mut self, key: SortKey) -> Option<FetchTicket> {
        let mut next = self.query.clone();
        if next.sort_by == key {
            next.sort_order = next.sort_order.toggled();
        } else {
            next.sort_by = key;
            next.sort_order = SortDirection::Desc;
        }
        self.transition(next)
    }

    /// Navigate to `page`, bounded by [`ListState::navigable_pages`]. While a filter or page
    /// size change is still loading there is no valid bound and navigation is ignored.
    pub fn go_to_page(&mut self, page: u32) -> Option<FetchTicket> {
        let total_pages = self.navigable_pages();
        if page < 1 || page > total_pages {
            tracing::debug!(page, total_pages, "ignoring out-of-range page navigation");
            return None;
        }
        let mut next = self.query.clone();
        next.page = page;
        self.transition(next)
    }

    pub fn next_page(&mut self) -> Option<FetchTicket> {
        self.go_to_page(self.query.page.saturating_add(1))
    }

    pub fn previous_page(&mut self) -> Option<FetchTicket> {
        self.go_to_page(self.query.page.saturating_sub(1))
    }

    /// Back to the default query; also drops any uncommitted search text.
    pub fn clear_filters(&mut self) -> Option<FetchTicket> {
        self.search_input.clear();
        self.search_debounce.cancel();
        self.transition(self.default_query.clone())
    }

    /// Settle a response. Anything other than the latest outstanding request is discarded.
    pub fn apply_response(
        &mut self,
        seq: u64,
        result: Result<IncidentPage, AppError>,
    ) -> ResponseOutcome {
        let ticket = match self.in_flight.take() {
            Some(ticket) if ticket.seq == seq => ticket,
            other => {
                self.in_flight = other;
                tracing::debug!(seq, latest = self.last_issued, "discarding stale incident response");
                return ResponseOutcome::Stale;
            }
        };

        match result {
            Ok(page) => {
                self.result = Some(page);
                self.result_query = Some(ticket.query);
                self.error = None;
                ResponseOutcome::Applied
            }
            Err(err) => {
                tracing::warn!(seq, code = %err.code, message = %err.message, "incident retrieval failed");
                self.error = Some(err);
                ResponseOutcome::Failed
            }
        }
    }

    /// Run a ticket synchronously against `source` and settle its response.
    pub fn run<S: IncidentSource + ?Sized>(
        &mut self,
        source: &S,
        ticket: &FetchTicket,
    ) -> ResponseOutcome {
        let result = source.fetch_incidents(&ticket.query);
        self.apply_response(ticket.seq, result)
    }

    /// Fetch the service filter options. On failure the previous list is kept.
    pub fn load_services<S: IncidentSource + ?Sized>(&mut self, source: &S) -> Result<(), AppError> {
        match source.list_services() {
            Ok(services) => {
                self.services = services;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(code = %err.code, "failed to load services");
                Err(err)
            }
        }
    }
}
