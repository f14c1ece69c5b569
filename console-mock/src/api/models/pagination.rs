//! Cursor pagination shared by every list endpoint.
//!
//! Lists are paged with a `limit` and an opaque `page_token`. The token handed back in
//! `next_page` is the id of the last item on the page just returned; passing it back yields the
//! items that follow. A token that no longer matches any item restarts from the first page.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Default number of items to return per page.
pub const DEFAULT_LIMIT: usize = 100;

/// Anything with a stable id can be paged.
pub trait HasId {
    fn id(&self) -> Uuid;
}

/// Pagination query parameters.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct PaginationParams {
    /// Maximum number of items to return (default: 100)
    #[param(minimum = 1)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub limit: Option<usize>,

    /// Token returned as `next_page` by the previous request
    pub page_token: Option<String>,
}

impl PaginationParams {
    /// Requested limit, falling back to `default_limit` when absent or zero.
    #[inline]
    pub fn limit(&self, default_limit: usize) -> usize {
        match self.limit {
            Some(0) | None => default_limit,
            Some(limit) => limit,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResultsPage<T> {
    pub items: Vec<T>,
    /// Token for the following page, `null` once the collection is exhausted
    pub next_page: Option<String>,
}

/// Slice `items` into the page selected by `params`.
pub fn paginate<T: HasId + Clone>(items: &[T], params: &PaginationParams, default_limit: usize) -> ResultsPage<T> {
    let limit = params.limit(default_limit.max(1));

    let start = params
        .page_token
        .as_deref()
        .and_then(|token| items.iter().position(|item| item.id().to_string() == token))
        .map(|idx| idx + 1)
        .unwrap_or(0);

    let end = start.saturating_add(limit).min(items.len());
    let page = items[start.min(end)..end].to_vec();

    let next_page = if end < items.len() {
        page.last().map(|item| item.id().to_string())
    } else {
        None
    };

    ResultsPage { items: page, next_page }
}
