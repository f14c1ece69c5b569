//! Fleet-wide provisioning metrics, synthesized on every request.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{Duration, Utc};
use tracing::debug;

use crate::{
    AppState,
    api::models::{
        metrics::{Datum, Measurement, PaginationOrder, SystemMetricName, SystemMetricsQuery},
        pagination::ResultsPage,
        users::CurrentUser,
    },
    auth::roles::require_fleet_viewer,
    errors::{Error, Result},
    sample_data::generate_utilization,
};

#[utoipa::path(
    get,
    path = "/v1/system/metrics/{metric_name}",
    tag = "system",
    summary = "Fetch a fleet utilization metric",
    description = "Returns a synthetic series sized against the rack's hardware. Without a window the \
                   trailing 24 hours are returned.",
    params(
        ("metric_name" = SystemMetricName, Path, description = "Metric to fetch"),
        SystemMetricsQuery,
    ),
    responses(
        (status = 200, description = "Measurements in the window", body = ResultsPage<Measurement>),
        (status = 400, description = "Empty or inverted window", body = crate::errors::ErrorBody),
        (status = 403, description = "Not a fleet viewer", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(metric = %metric_name))]
pub async fn get_system_metric(
    State(state): State<AppState>,
    Path(metric_name): Path<SystemMetricName>,
    Query(query): Query<SystemMetricsQuery>,
    current_user: CurrentUser,
) -> Result<Json<ResultsPage<Measurement>>> {
    let capacity = {
        let db = state.db.read().await;
        require_fleet_viewer(&db, &current_user)?;
        db.capacity()
    };

    let end = query.end_time.unwrap_or_else(Utc::now);
    let start = match query.start_time {
        Some(start) => start,
        None => end
            .checked_sub_signed(Duration::hours(24))
            .ok_or_else(|| Error::invalid_request("time window out of range"))?,
    };
    if start >= end {
        return Err(Error::invalid_request("start_time must be before end_time"));
    }

    let sample_config = &state.config.sample_data;
    let samples = generate_utilization(
        metric_name,
        start,
        end,
        &capacity,
        sample_config.system_metric_points,
        Duration::days(i64::from(sample_config.max_history_days)),
    )?;

    let mut items: Vec<Measurement> = samples
        .into_iter()
        .map(|s| Measurement {
            timestamp: s.timestamp,
            datum: match metric_name {
                SystemMetricName::CpusProvisioned => Datum::I64(s.value as i64),
                _ => Datum::F64(s.value),
            },
        })
        .collect();

    if query.order.unwrap_or_default() == PaginationOrder::Descending {
        items.reverse();
    }
    if let Some(limit) = query.limit {
        items.truncate(limit);
    }

    debug!(count = items.len(), %start, %end, "generated measurements");
    Ok(Json(ResultsPage { items, next_page: None }))
}

#[cfg(test)]
mod tests {
    use crate::api::models::metrics::{Datum, Measurement};
    use crate::api::models::pagination::ResultsPage;
    use crate::test_utils::*;
    use axum::http::StatusCode;

    #[test_log::test(tokio::test)]
    async fn test_cpu_metric_is_integral_and_bounded() {
        let app = create_test_app();
        let page: ResultsPage<Measurement> = app.get("/v1/system/metrics/cpus_provisioned").await.json();
        assert_eq!(page.items.len(), 200);
        // Two sleds of 128 threads
        for m in &page.items {
            match m.datum {
                Datum::I64(v) => assert!((0..=256).contains(&v), "{v}"),
                Datum::F64(v) => panic!("expected an integer datum, got {v}"),
            }
        }
        assert!(page.items.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test_log::test(tokio::test)]
    async fn test_descending_with_limit() {
        let app = create_test_app();
        let page: ResultsPage<Measurement> = app
            .get("/v1/system/metrics/ram_provisioned?order=descending&limit=5")
            .await
            .json();
        assert_eq!(page.items.len(), 5);
        assert!(page.items.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
        assert!(matches!(page.items[0].datum, Datum::F64(_)));
    }

    #[test_log::test(tokio::test)]
    async fn test_explicit_window() {
        let app = create_test_app();
        let page: ResultsPage<Measurement> = app
            .get("/v1/system/metrics/virtual_disk_space_provisioned")
            .add_query_param("start_time", "2025-01-01T00:00:00Z")
            .add_query_param("end_time", "2025-01-02T00:00:00Z")
            .await
            .json();
        let first = page.items.first().expect("samples in window");
        assert_eq!(first.timestamp.to_rfc3339(), "2025-01-01T00:00:00+00:00");

        app.get("/v1/system/metrics/virtual_disk_space_provisioned")
            .add_query_param("start_time", "2025-01-02T00:00:00Z")
            .add_query_param("end_time", "2025-01-01T00:00:00Z")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[test_log::test(tokio::test)]
    async fn test_window_before_earliest_date() {
        let app = create_test_app();
        let response = app
            .get("/v1/system/metrics/ram_provisioned")
            .add_query_param("start_time", "-262143-01-01T00:00:00Z")
            .add_query_param("end_time", "-262143-01-05T00:00:00Z")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        // Only an end, so the default 24 hour window reaches past the earliest date
        app.get("/v1/system/metrics/cpus_provisioned")
            .add_query_param("end_time", "-262143-01-01T01:00:00Z")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[test_log::test(tokio::test)]
    async fn test_unknown_metric_rejected() {
        let app = create_test_app();
        let response = app.get("/v1/system/metrics/gpus_provisioned").await;
        assert!(response.status_code().is_client_error());
    }

    #[test_log::test(tokio::test)]
    async fn test_metrics_need_fleet_viewer() {
        let app = create_test_app();
        app.get("/v1/system/metrics/cpus_provisioned")
            .add_header("cookie", user_cookie("Jacob Klein"))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}
