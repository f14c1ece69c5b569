//! HTTP request handlers for the mock API.
//!
//! Each handler resolves the acting user, checks the role the operation needs against the store,
//! then reads or mutates [`crate::db::MockDb`]. The store lock is held for the whole operation, so
//! requests are applied one at a time.

pub mod affinity_groups;
pub mod disks;
pub mod floating_ips;
pub mod hardware;
pub mod instances;
pub mod ip_pools;
pub mod metrics;
pub mod policy;
pub mod projects;
pub mod timeseries;
pub mod users;

use axum::http::Uri;

use crate::AppState;
use crate::api::models::pagination::{HasId, PaginationParams, ResultsPage, paginate};
use crate::errors::{Error, Result};

/// Page `items` using the configured default page size.
pub(crate) fn page<T: HasId + Clone>(state: &AppState, items: &[T], params: &PaginationParams) -> ResultsPage<T> {
    paginate(items, params, state.config.pagination.default_limit)
}

/// Valid names are lowercase, start with a letter, and are at most 63 characters of letters,
/// digits and dashes.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    let valid = (1..=63).contains(&name.len())
        && name.starts_with(|c: char| c.is_ascii_lowercase())
        && !name.ends_with('-')
        && name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::invalid_request(format!(
            "name must begin with a lowercase letter, contain only lowercase letters, digits and dashes, \
             and be at most 63 characters: {name:?}"
        )))
    }
}

/// Fallback for API routes the mock does not serve.
#[tracing::instrument(skip_all, fields(uri = %uri))]
pub async fn not_implemented(uri: Uri) -> Error {
    Error::not_implemented(format!("{} is not implemented by the mock API", uri.path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_app;
    use axum::http::StatusCode;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("db1").is_ok());
        assert!(validate_name("my-project-2").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("1abc").is_err());
        assert!(validate_name("Caps").is_err());
        assert!(validate_name("trailing-").is_err());
        assert!(validate_name("under_score").is_err());
        assert!(validate_name(&"a".repeat(64)).is_err());
    }

    #[test_log::test(tokio::test)]
    async fn test_unknown_route_not_implemented() {
        let app = create_test_app();
        let response = app.get("/v1/vpcs").await;
        response.assert_status(StatusCode::NOT_IMPLEMENTED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error_code"], "NotImplemented");
        assert!(body["request_id"].is_string());
    }
}
