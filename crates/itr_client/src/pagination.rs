use serde::Serialize;

/// One slot in the page-button strip.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "page", rename_all = "snake_case")]
pub enum PageItem {
    Page(u32),
    /// Collapsed run of hidden pages.
    Gap,
}

/// Page buttons to render: first, last, current and its neighbours, with gaps collapsed.
///
/// Returns an empty list when there is at most one page (no controls are shown).
pub fn visible_pages(current: u32, total_pages: u32) -> Vec<PageItem> {
    if total_pages <= 1 {
        return Vec::new();
    }

    let mut pages = vec![1, total_pages];
    pages.extend(
        [current.saturating_sub(1), current, current.saturating_add(1)]
            .into_iter()
            .filter(|p| (1..=total_pages).contains(p)),
    );
    pages.sort_unstable();
    pages.dedup();

    let mut out = Vec::with_capacity(pages.len() * 2);
    let mut prev: Option<u32> = None;
    for page in pages {
        if prev.is_some_and(|p| page - p > 1) {
            out.push(PageItem::Gap);
        }
        out.push(PageItem::Page(page));
        prev = Some(page);
    }
    out
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PaginationView {
    pub current: u32,
    pub total_pages: u32,
    pub items: Vec<PageItem>,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PaginationView {
    pub fn new(current: u32, total_pages: u32) -> Self {
        Self {
            current,
            total_pages,
            items: visible_pages(current, total_pages),
            has_previous: current > 1 && total_pages > 1,
            has_next: current < total_pages,
        }
    }

    /// Whether any pagination controls should be shown at all.
    pub fn is_visible(&self) -> bool {
        !self.items.is_empty()
    }
}
