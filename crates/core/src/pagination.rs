//! Offset pagination.

use serde::{Deserialize, Serialize};

/// Largest page size a client may request.
pub const MAX_PER_PAGE: u32 = 100;

/// A validated page request.
///
/// Pages are 1-based. Out-of-range input is clamped rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    /// Build a page request, clamping `page >= 1` and `1 <= per_page <= 100`.
    #[must_use]
    pub fn new(page: Option<u32>, per_page: Option<u32>, default_per_page: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(default_per_page)
                .clamp(1, MAX_PER_PAGE),
        }
    }

    /// 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Items per page.
    #[must_use]
    pub const fn per_page(&self) -> u32 {
        self.per_page
    }

    /// SQL `LIMIT`.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    /// SQL `OFFSET`.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

/// Pagination metadata returned alongside list results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub items_per_page: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    /// Compute metadata for `total_items` rows. An empty result still has one page.
    #[must_use]
    pub fn new(request: PageRequest, total_items: u64) -> Self {
        let per_page = u64::from(request.per_page());
        let pages = total_items.div_ceil(per_page).max(1);
        let total_pages = u32::try_from(pages).unwrap_or(u32::MAX);

        Self {
            current_page: request.page(),
            total_pages,
            total_items,
            items_per_page: request.per_page(),
            has_next: request.page() < total_pages,
            has_prev: request.page() > 1,
        }
    }
}

/// A page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T> Paginated<T> {
    /// Wrap a page of rows with metadata. `total` is the unpaged row count.
    #[must_use]
    pub fn new(data: Vec<T>, request: PageRequest, total: i64) -> Self {
        let total = u64::try_from(total).unwrap_or(0);
        Self {
            data,
            meta: PaginationMeta::new(request, total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps() {
        let req = PageRequest::new(Some(0), Some(0), 12);
        assert_eq!(req.page(), 1);
        assert_eq!(req.per_page(), 1);

        let req = PageRequest::new(None, Some(10_000), 12);
        assert_eq!(req.per_page(), MAX_PER_PAGE);

        let req = PageRequest::new(None, None, 12);
        assert_eq!((req.page(), req.per_page()), (1, 12));
    }

    #[test]
    fn test_offset_and_limit() {
        let req = PageRequest::new(Some(3), Some(12), 12);
        assert_eq!(req.offset(), 24);
        assert_eq!(req.limit(), 12);
    }

    #[test]
    fn test_meta_middle_page() {
        let meta = PaginationMeta::new(PageRequest::new(Some(2), Some(10), 10), 25);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(meta.has_prev);
    }

    #[test]
    fn test_meta_last_page_exact_multiple() {
        let meta = PaginationMeta::new(PageRequest::new(Some(2), Some(12), 12), 24);
        assert_eq!(meta.total_pages, 2);
        assert!(!meta.has_next);
        assert!(meta.has_prev);
    }

    #[test]
    fn test_meta_empty_result_has_one_page() {
        let meta = PaginationMeta::new(PageRequest::new(None, None, 12), 0);
        assert_eq!(meta.total_pages, 1);
        assert_eq!(meta.total_items, 0);
        assert!(!meta.has_next);
        assert!(!meta.has_prev);
    }

    #[test]
    fn test_paginated_negative_total_is_zero() {
        let page: Paginated<u8> = Paginated::new(vec![], PageRequest::new(None, None, 5), -1);
        assert_eq!(page.meta.total_items, 0);
    }
}
