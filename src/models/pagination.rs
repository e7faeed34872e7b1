//! Page/limit handling and pagination metadata

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

/// Normalized page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Build from raw query values. Missing, non-numeric or out-of-range
    /// values fall back to the defaults.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        Self::new(parse_number(page), parse_number(limit))
    }

    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE),
            limit: limit.filter(|l| *l >= 1).unwrap_or(DEFAULT_LIMIT),
        }
    }

    /// Number of matching records to skip
    pub fn skip(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn metadata(&self, total: i64) -> PaginationMeta {
        let total = total.max(0);
        let total_pages = if total == 0 {
            0
        } else {
            total / self.limit + i64::from(total % self.limit != 0)
        };
        PaginationMeta {
            current_page: self.page,
            total_pages,
            total_events: total,
            has_next_page: self.page < total_pages,
            has_previous_page: self.page > 1,
        }
    }
}

/// Leading-integer parse: `"3"`, `" 3 "` and `"3abc"` all yield 3
fn parse_number(raw: Option<&str>) -> Option<i64> {
    let s = raw?.trim();
    let end = s
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map_or(s.len(), |(i, _)| i);
    s[..end].parse::<i64>().ok()
}

/// Pagination block of a listing response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_events: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = PageRequest::from_raw(None, None);
        assert_eq!(p, PageRequest { page: 1, limit: 10 });
        assert_eq!(p.skip(), 0);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        assert_eq!(PageRequest::from_raw(Some("abc"), Some("xyz")), PageRequest::default());
        assert_eq!(PageRequest::from_raw(Some("0"), Some("-5")), PageRequest::default());
        assert_eq!(PageRequest::from_raw(Some("-2"), Some("0")), PageRequest::default());
    }

    #[test]
    fn test_numeric_prefix_is_used() {
        assert_eq!(PageRequest::from_raw(Some("3abc"), Some(" 5 ")), PageRequest { page: 3, limit: 5 });
        assert_eq!(PageRequest::from_raw(Some("+2"), None).page, 2);
    }

    #[test]
    fn test_skip() {
        assert_eq!(PageRequest::new(Some(3), Some(10)).skip(), 20);
        assert_eq!(PageRequest::new(Some(2), Some(7)).skip(), 7);
    }

    #[test]
    fn test_total_pages() {
        let p = PageRequest::new(Some(1), Some(10));
        assert_eq!(p.metadata(0).total_pages, 0);
        assert_eq!(p.metadata(1).total_pages, 1);
        assert_eq!(p.metadata(10).total_pages, 1);
        assert_eq!(p.metadata(11).total_pages, 2);
        assert_eq!(p.metadata(25).total_pages, 3);
    }

    #[test]
    fn test_last_page_flags() {
        let meta = PageRequest::new(Some(3), Some(10)).metadata(25);
        assert_eq!(
            meta,
            PaginationMeta {
                current_page: 3,
                total_pages: 3,
                total_events: 25,
                has_next_page: false,
                has_previous_page: true,
            }
        );
    }

    #[test]
    fn test_page_past_the_end_keeps_requested_page() {
        let meta = PageRequest::new(Some(9), Some(10)).metadata(25);
        assert_eq!(meta.current_page, 9);
        assert_eq!(meta.total_pages, 3);
        assert!(!meta.has_next_page);
        assert!(meta.has_previous_page);
    }

    #[test]
    fn test_metadata_serializes_camel_case() {
        let json = serde_json::to_value(PageRequest::default().metadata(4)).unwrap();
        assert_eq!(json["currentPage"], 1);
        assert_eq!(json["totalEvents"], 4);
        assert_eq!(json["hasNextPage"], false);
    }
}
