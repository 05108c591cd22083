//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::config::{DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE, MAX_PAGE_NUMBER, MAX_PAGE_SIZE};

/// `?page=&limit=` query parameters, 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    #[param(example = 1)]
    pub page: u64,
    #[serde(default = "default_limit", alias = "per_page")]
    #[param(example = 10)]
    pub limit: u64,
}

fn default_page() -> u64 {
    DEFAULT_PAGE_NUMBER
}

fn default_limit() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl PaginationParams {
    pub fn new(page: u64, limit: u64) -> Self {
        Self { page, limit }
    }

    /// Page number clamped to `1..=MAX_PAGE_NUMBER`.
    pub fn page(&self) -> u64 {
        self.page.clamp(1, MAX_PAGE_NUMBER)
    }

    /// Zero-based page index for the store paginator.
    pub fn page_index(&self) -> u64 {
        self.page() - 1
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`.
    pub fn limit(&self) -> u64 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE)
    }
}

/// A page of results plus its position in the full set.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, params: &PaginationParams, total: u64) -> Self {
        let limit = params.limit();
        Self {
            data,
            meta: PaginationMeta {
                page: params.page(),
                limit,
                total,
                total_pages: total.div_ceil(limit),
            },
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PaginationParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(params.page_index(), 0);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let params = PaginationParams::new(0, 0);
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 1);

        let params = PaginationParams::new(3, 10_000);
        assert_eq!(params.limit(), MAX_PAGE_SIZE);
        assert_eq!(params.page_index(), 2);
    }

    #[test]
    fn test_huge_page_number_keeps_offset_in_range() {
        let params: PaginationParams =
            serde_json::from_str(r#"{"page":18446744073709551615,"limit":10}"#).unwrap();
        assert_eq!(params.page(), MAX_PAGE_NUMBER);
        let offset = params.page_index().checked_mul(params.limit());
        assert!(offset.is_some_and(|offset| offset <= i64::MAX as u64));
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page = Paginated::new(vec![1, 2], &PaginationParams::new(1, 2), 5);
        assert_eq!(page.meta.total_pages, 3);

        let empty: Paginated<u8> = Paginated::new(vec![], &PaginationParams::default(), 0);
        assert_eq!(empty.meta.total_pages, 0);
    }

    #[test]
    fn test_query_accepts_per_page_alias() {
        let params: PaginationParams = serde_json::from_str(r#"{"page":2,"per_page":5}"#).unwrap();
        assert_eq!(params, PaginationParams::new(2, 5));
    }
}
