//! Page arithmetic for book listings

/// LIMIT/OFFSET pair handed to a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: i64,
    pub offset: i64,
}

/// Requested page as sent by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    Number(i64),
    Last,
}

impl PageRequest {
    /// Missing or unparseable values fall back to the first page.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("last") => PageRequest::Last,
            Some(value) => PageRequest::Number(value.parse().unwrap_or(1)),
            None => PageRequest::Number(1),
        }
    }
}

/// Resolved position of one page within a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(request: PageRequest, per_page: i64, total: i64) -> Self {
        let per_page = per_page.max(1);
        let total_pages = total_pages(total, per_page);
        let page = match request {
            PageRequest::Number(n) => n,
            PageRequest::Last => total_pages,
        };
        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }

    /// Window to fetch, or `None` when the page lies outside the result set.
    /// Page 1 always has a window, even over an empty set.
    pub fn window(&self) -> Option<PageWindow> {
        if self.page < 1 || self.page > self.total_pages {
            return None;
        }
        Some(PageWindow {
            limit: self.per_page,
            offset: (self.page - 1) * self.per_page,
        })
    }
}

/// Number of pages needed for `total` rows; never less than one.
pub fn total_pages(total: i64, per_page: i64) -> i64 {
    let per_page = per_page.max(1);
    let pages = (total.max(0) + per_page - 1) / per_page;
    pages.max(1)
}
