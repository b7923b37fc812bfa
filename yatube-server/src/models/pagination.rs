//! Page-number pagination
//!
//! The `?page=` value comes straight from the query string. Anything that
//! isn't a positive number resolves to the first page and anything past the
//! end resolves to the last page, so a list view never 404s on a stale link.

use serde::{Deserialize, Serialize, Serializer};

/// Posts per page on the index, profile and follow feeds
pub const POSTS_PER_PAGE: u32 = 10;

/// Posts per page on a group feed
pub const GROUP_POSTS_PER_PAGE: u32 = 5;

/// Splits a counted result set into fixed-size pages
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: u32,
}

impl Paginator {
    /// Per page is clamped to a minimum of 1.
    pub const fn new(per_page: u32) -> Self {
        Self {
            per_page: if per_page == 0 { 1 } else { per_page },
        }
    }

    /// Number of pages for `count` items. An empty list still has one page.
    pub fn num_pages(&self, count: i64) -> u32 {
        if count <= 0 {
            return 1;
        }
        let count = count as u64;
        let per_page = u64::from(self.per_page);
        count.div_ceil(per_page).min(u64::from(u32::MAX)) as u32
    }

    /// Resolve a raw page number against the item count.
    pub fn get_page(&self, raw: Option<&str>, count: i64) -> Pagination {
        let last = self.num_pages(count);
        let page = match raw.map(str::trim).and_then(|s| s.parse::<u64>().ok()) {
            Some(0) | None => 1,
            Some(n) if n > u64::from(last) => last,
            Some(n) => n as u32,
        };

        Pagination {
            page,
            per_page: self.per_page,
        }
    }
}

/// A resolved page position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Page number (1-indexed)
    pub page: u32,
    /// Items per page
    pub per_page: u32,
}

impl Pagination {
    /// Calculate SQL OFFSET value.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.per_page)
    }

    /// Get LIMIT value.
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

/// One page of results plus enough metadata to render page links
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items for current page
    pub object_list: Vec<T>,
    /// Total count across all pages
    pub count: i64,
    /// Current page number
    pub number: u32,
    /// Items per page
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn new(object_list: Vec<T>, count: i64, position: Pagination) -> Self {
        Self {
            object_list,
            count,
            number: position.page,
            per_page: position.per_page,
        }
    }

    pub fn num_pages(&self) -> u32 {
        Paginator::new(self.per_page).num_pages(self.count)
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_page_number(&self) -> Option<u32> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<u32> {
        self.has_previous().then(|| self.number - 1)
    }

    pub fn page_range(&self) -> Vec<u32> {
        (1..=self.num_pages()).collect()
    }

    pub fn len(&self) -> usize {
        self.object_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_list.is_empty()
    }
}

/// Template-facing shape of a page, with derived fields precomputed
#[derive(Serialize)]
struct PageView<'a, T> {
    object_list: &'a [T],
    count: i64,
    number: u32,
    per_page: u32,
    num_pages: u32,
    has_next: bool,
    has_previous: bool,
    has_other_pages: bool,
    next_page_number: Option<u32>,
    previous_page_number: Option<u32>,
    page_range: Vec<u32>,
}

impl<T: Serialize> Serialize for Page<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PageView {
            object_list: &self.object_list,
            count: self.count,
            number: self.number,
            per_page: self.per_page,
            num_pages: self.num_pages(),
            has_next: self.has_next(),
            has_previous: self.has_previous(),
            has_other_pages: self.has_next() || self.has_previous(),
            next_page_number: self.next_page_number(),
            previous_page_number: self.previous_page_number(),
            page_range: self.page_range(),
        }
        .serialize(serializer)
    }
}

/// Query parameters for pagination
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<String>,
}

impl PaginationParams {
    pub fn raw(&self) -> Option<&str> {
        self.page.as_deref()
    }
}
