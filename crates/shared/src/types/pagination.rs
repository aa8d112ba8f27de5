//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

/// Request parameters for paginated queries.
///
/// Field names mirror the public query parameters (`pagina`, `limite`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-indexed).
    #[serde(rename = "pagina", default = "default_page")]
    pub page: u64,
    /// Number of items per page.
    #[serde(rename = "limite", default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    10
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PageRequest {
    /// Maximum allowed page size.
    pub const MAX_PER_PAGE: u64 = 100;

    /// Calculates the offset for database queries.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit())
    }

    /// Returns the limit for database queries, clamped to `MAX_PER_PAGE`.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.per_page.clamp(1, Self::MAX_PER_PAGE)
    }
}

/// Response wrapper for paginated data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// The items in the current page.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub meta: PageMeta,
}

/// Pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    /// Current page number.
    pub page: u64,
    /// Items per page.
    pub per_page: u64,
    /// Total number of items across all pages.
    pub total: u64,
    /// Total number of pages.
    pub total_pages: u64,
}

impl<T> PageResponse<T> {
    /// Creates a new paginated response.
    #[must_use]
    pub fn new(data: Vec<T>, page: u64, per_page: u64, total: u64) -> Self {
        let total_pages = if total == 0 {
            1
        } else {
            total.div_ceil(per_page.max(1))
        };

        Self {
            data,
            meta: PageMeta {
                page,
                per_page,
                total,
                total_pages,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_page_request_default() {
        let request = PageRequest::default();
        assert_eq!(request.page, 1);
        assert_eq!(request.per_page, 10);
    }

    #[rstest]
    #[case(1, 10, 0)]
    #[case(3, 10, 20)]
    #[case(2, 100, 100)]
    fn test_page_request_offset(#[case] page: u64, #[case] per_page: u64, #[case] offset: u64) {
        let request = PageRequest { page, per_page };
        assert_eq!(request.offset(), offset);
    }

    #[test]
    fn test_page_request_limit_clamped() {
        let request = PageRequest {
            page: 1,
            per_page: 5000,
        };
        assert_eq!(request.limit(), PageRequest::MAX_PER_PAGE);

        let request = PageRequest {
            page: 1,
            per_page: 0,
        };
        assert_eq!(request.limit(), 1);
    }

    #[test]
    fn test_page_response_total_pages() {
        let response: PageResponse<u8> = PageResponse::new(vec![], 1, 10, 0);
        assert_eq!(response.meta.total_pages, 1);

        let response: PageResponse<u8> = PageResponse::new(vec![], 1, 10, 10);
        assert_eq!(response.meta.total_pages, 1);

        let response: PageResponse<u8> = PageResponse::new(vec![], 2, 10, 11);
        assert_eq!(response.meta.total_pages, 2);
    }

    #[test]
    fn test_page_request_query_names() {
        let request: PageRequest =
            serde_json::from_str(r#"{"pagina": 2, "limite": 25}"#).unwrap();
        assert_eq!(request.page, 2);
        assert_eq!(request.per_page, 25);

        let request: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.page, 1);
        assert_eq!(request.per_page, 10);
    }
}
