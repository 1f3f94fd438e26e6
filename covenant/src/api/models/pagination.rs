//! Shared pagination parameters for list endpoints.
//!
//! Lists are offset-based with `skip` and `limit`. Unlike a paged admin API, an absent
//! `limit` returns every matching row; an explicit one is clamped to `1..=MAX_LIMIT`.

use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Maximum number of items that can be requested per page.
pub const MAX_LIMIT: i64 = 1000;

#[serde_as]
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
pub struct Pagination {
    /// Number of items to skip (default: 0)
    #[param(default = 0, minimum = 0)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub skip: Option<i64>,

    /// Maximum number of items to return (default: all, max: 1000)
    #[param(minimum = 1, maximum = 1000)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub limit: Option<i64>,
}

impl Pagination {
    #[inline]
    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    #[inline]
    pub fn limit(&self) -> Option<i64> {
        self.limit.map(|limit| limit.clamp(1, MAX_LIMIT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_return_everything() {
        let pagination = Pagination::default();
        assert_eq!(pagination.skip(), 0);
        assert_eq!(pagination.limit(), None);
    }

    #[test]
    fn test_clamping() {
        let pagination = Pagination {
            skip: Some(-5),
            limit: Some(5000),
        };
        assert_eq!(pagination.skip(), 0);
        assert_eq!(pagination.limit(), Some(MAX_LIMIT));

        let pagination = Pagination {
            skip: Some(3),
            limit: Some(0),
        };
        assert_eq!(pagination.skip(), 3);
        assert_eq!(pagination.limit(), Some(1));
    }

    #[test]
    fn test_parses_from_query_strings() {
        let pagination: Pagination = serde_json::from_value(serde_json::json!({ "skip": "10", "limit": "20" })).unwrap();
        assert_eq!(pagination.skip(), 10);
        assert_eq!(pagination.limit(), Some(20));
    }
}
