//! Pagination metadata for list endpoints.

use crate::request::Request;
use serde::{Deserialize, Serialize};

/// The `meta` object of a paginated envelope.
///
/// Servers always send `page`, `limit` and the total; the derived fields are
/// recomputed by [`PaginationMeta::normalized`] when missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default, alias = "total")]
    pub total_items: u64,
    #[serde(default)]
    pub total_pages: u64,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub from: u64,
    #[serde(default)]
    pub to: u64,
}

impl PaginationMeta {
    /// Derive all fields from `(page, limit, total_items)`.
    ///
    /// A page past the end, or `limit == 0`, yields `from == to == 0`.
    pub fn calculate(page: u64, limit: u64, total_items: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total_items.div_ceil(limit)
        };
        let (from, to) = if total_items == 0 || limit == 0 || page == 0 || page > total_pages {
            (0, 0)
        } else {
            let from = (page - 1) * limit + 1;
            (from, (page * limit).min(total_items))
        };
        Self {
            page,
            limit,
            total_items,
            total_pages,
            has_more: page < total_pages,
            from,
            to,
        }
    }

    /// Recompute the derived fields from `page`, `limit` and `total_items`.
    pub fn normalized(self) -> Self {
        Self::calculate(self.page, self.limit, self.total_items)
    }
}

/// A decoded page of a list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        self.meta.has_more
    }

    /// Page number to request next, if any.
    pub fn next_page(&self) -> Option<u64> {
        self.meta.has_more.then(|| self.meta.page + 1)
    }
}

/// Common `page`/`limit` options of list endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl ListOptions {
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// Append `page` then `limit` to the request's query.
    pub fn apply(&self, request: Request) -> Request {
        request
            .query_opt("page", self.page)
            .query_opt("limit", self.limit)
    }
}
