//! Offset pagination.

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`PageRequest`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PageRequestError {
    #[error("page must be at least 1")]
    InvalidPage,
    #[error("pageSize must be between 1 and {max}")]
    InvalidPageSize { max: u32 },
}

/// A validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Largest page size a caller may ask for.
    pub const MAX_PAGE_SIZE: u32 = 100;

    /// Build a page request.
    ///
    /// # Errors
    ///
    /// Returns an error if `page` is 0 or `page_size` is outside
    /// `1..=MAX_PAGE_SIZE`.
    pub const fn new(page: u32, page_size: u32) -> Result<Self, PageRequestError> {
        if page == 0 {
            return Err(PageRequestError::InvalidPage);
        }
        if page_size == 0 || page_size > Self::MAX_PAGE_SIZE {
            return Err(PageRequestError::InvalidPageSize {
                max: Self::MAX_PAGE_SIZE,
            });
        }
        Ok(Self { page, page_size })
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of rows to skip.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.page_size)
    }

    /// Number of rows to fetch.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    /// Pagination metadata for a result set of `total_count` rows.
    #[must_use]
    pub fn paginate(&self, total_count: u64) -> Pagination {
        Pagination {
            current_page: self.page,
            page_size: self.page_size,
            total_count,
            total_pages: total_count.div_ceil(u64::from(self.page_size)),
        }
    }
}

/// Metadata returned alongside a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        assert_eq!(PageRequest::new(0, 10), Err(PageRequestError::InvalidPage));
        assert!(matches!(
            PageRequest::new(1, 0),
            Err(PageRequestError::InvalidPageSize { .. })
        ));
        assert!(matches!(
            PageRequest::new(1, 101),
            Err(PageRequestError::InvalidPageSize { .. })
        ));
        assert!(PageRequest::new(1, 100).is_ok());
    }

    #[test]
    fn test_offset() {
        let page = PageRequest::new(3, 9).unwrap();
        assert_eq!(page.offset(), 18);
        assert_eq!(page.limit(), 9);
    }

    #[test]
    fn test_paginate_rounds_up() {
        let page = PageRequest::new(1, 9).unwrap();
        assert_eq!(page.paginate(0).total_pages, 0);
        assert_eq!(page.paginate(9).total_pages, 1);
        assert_eq!(page.paginate(10).total_pages, 2);
    }

    #[test]
    fn test_pagination_json_is_camel_case() {
        let json = serde_json::to_value(PageRequest::new(2, 10).unwrap().paginate(25)).unwrap();
        assert_eq!(json["currentPage"], 2);
        assert_eq!(json["pageSize"], 10);
        assert_eq!(json["totalCount"], 25);
        assert_eq!(json["totalPages"], 3);
    }
}
