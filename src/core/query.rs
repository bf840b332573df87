//! Query planning for history reads.
//!
//! Translates request parameters into a storage-agnostic filter and a
//! pagination window. Every numeric input is clamped, never rejected.

use serde::{Deserialize, Serialize};

use crate::domain::ClipboardRecord;

/// Page used when none is given
pub const DEFAULT_PAGE: u64 = 1;

/// Page size used when none is given or the given one is out of range
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// Largest page size served
pub const MAX_PAGE_SIZE: u64 = 100;

/// Raw query parameters as received from a caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub type_filter: Option<String>,
    pub search: Option<String>,
}

impl QueryParams {
    /// Build params from unparsed query-string values.
    ///
    /// Absent numbers use their defaults; unparseable ones count as zero
    /// and are clamped like any other out-of-range value.
    pub fn from_query_strings(
        page: Option<&str>,
        page_size: Option<&str>,
        type_filter: Option<&str>,
        search: Option<&str>,
    ) -> Self {
        Self {
            page: page.map(parse_lenient),
            page_size: page_size.map(parse_lenient),
            type_filter: type_filter.map(str::to_string),
            search: search.map(str::to_string),
        }
    }

    pub fn with_page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_type(mut self, type_filter: impl Into<String>) -> Self {
        self.type_filter = Some(type_filter.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }
}

fn parse_lenient(raw: &str) -> i64 {
    raw.trim().parse().unwrap_or(0)
}

/// Which records a `type` parameter selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFilter {
    All,
    Image,
    Text,
}

impl TypeFilter {
    /// Interpret a `type` parameter; anything unrecognized selects all
    pub fn parse(raw: &str) -> Self {
        match raw {
            "image" => TypeFilter::Image,
            "text" => TypeFilter::Text,
            _ => TypeFilter::All,
        }
    }

    fn is_image(self) -> Option<bool> {
        match self {
            TypeFilter::All => None,
            TypeFilter::Image => Some(true),
            TypeFilter::Text => Some(false),
        }
    }
}

/// Storage-agnostic record filter. Constraints combine conjunctively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    /// Required value of the image flag
    pub is_image: Option<bool>,

    /// Case-insensitive substring the preview must contain
    pub preview_contains: Option<String>,
}

impl FilterSpec {
    /// True if this filter matches every record
    pub fn is_unconstrained(&self) -> bool {
        self.is_image.is_none() && self.preview_contains.is_none()
    }

    /// Evaluate the filter against a record in memory
    pub fn matches(&self, record: &ClipboardRecord) -> bool {
        if let Some(is_image) = self.is_image {
            if record.is_image != is_image {
                return false;
            }
        }

        match &self.preview_contains {
            Some(needle) => contains_case_insensitive(&record.preview, needle),
            None => true,
        }
    }
}

/// Unicode-aware case-insensitive substring test
pub fn contains_case_insensitive(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Result ordering. Newest first is the only order served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    TimestampDescending,
}

/// Slice of the sorted result set to return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub skip: u64,
    pub limit: u64,
    pub order: SortOrder,
}

/// Filter, window, and the echoed page numbers for one read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub filter: FilterSpec,
    pub window: PageWindow,
    pub page: u64,
    pub page_size: u64,
}

impl QueryPlan {
    /// Number of pages needed to show `total` matching records
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.page_size)
    }

    /// Wrap fetched records in the response envelope
    pub fn into_response(self, items: Vec<ClipboardRecord>, total: u64) -> PageResponse {
        PageResponse {
            total_pages: self.total_pages(total),
            items,
            total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Paginated response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    pub items: Vec<ClipboardRecord>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

/// Clamp a requested page to `[1, ∞)`
pub fn clamp_page(page: Option<i64>) -> u64 {
    match page {
        Some(page) if page >= 1 => page as u64,
        Some(_) => 1,
        None => DEFAULT_PAGE,
    }
}

/// Clamp a requested page size to `[1, MAX_PAGE_SIZE]`, resetting
/// out-of-range values to the default
pub fn clamp_page_size(page_size: Option<i64>) -> u64 {
    match page_size {
        Some(size) if (1..=MAX_PAGE_SIZE as i64).contains(&size) => size as u64,
        _ => DEFAULT_PAGE_SIZE,
    }
}

/// Plan a history read
pub fn plan(params: &QueryParams) -> QueryPlan {
    let page = clamp_page(params.page);
    let page_size = clamp_page_size(params.page_size);

    let filter = FilterSpec {
        is_image: params
            .type_filter
            .as_deref()
            .map(TypeFilter::parse)
            .and_then(TypeFilter::is_image),
        preview_contains: params.search.clone().filter(|s| !s.is_empty()),
    };

    QueryPlan {
        filter,
        window: PageWindow {
            skip: (page - 1).saturating_mul(page_size),
            limit: page_size,
            order: SortOrder::TimestampDescending,
        },
        page,
        page_size,
    }
}
