//! OxQL timeseries queries, and the chart endpoint that shapes their results for display.

use axum::{Json, extract::State};
use chrono::{Duration, Utc};
use tracing::debug;

use crate::{
    AppState,
    api::models::{
        timeseries::{ChartFlavor, ChartRequest, ChartResponse, TimeseriesQuery},
        users::CurrentUser,
    },
    auth::roles::require_fleet_viewer,
    errors::{Error, Result},
    oxql::{OxqlQuery, OxqlQueryResult, bytes_chart, compose_chart_data, count_chart, parse_query, utilization_chart},
    sample_data::{mock_query_result, mock_table},
};

/// Resolution of raw query results, in seconds.
const QUERY_STEP_SECS: i64 = 60;

#[utoipa::path(
    post,
    path = "/v1/timeseries/query",
    tag = "metrics",
    summary = "Run an OxQL query",
    description = "Only the metric name and a vCPU `state` filter are honored. The result covers \
                   the trailing window at one-minute resolution.",
    request_body = TimeseriesQuery,
    responses(
        (status = 200, description = "Query result", body = OxqlQueryResult),
        (status = 400, description = "Unparseable query", body = crate::errors::ErrorBody),
        (status = 403, description = "Not a fleet viewer", body = crate::errors::ErrorBody),
        (status = 501, description = "No mock data for the metric", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn timeseries_query(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<TimeseriesQuery>,
) -> Result<Json<OxqlQueryResult>> {
    {
        let db = state.db.read().await;
        require_fleet_viewer(&db, &current_user)?;
    }

    let parsed = parse_query(&request.query)?;
    let points = i32::try_from(state.config.sample_data.timeseries_points)
        .map_err(|_| Error::internal("timeseries_points is out of range"))?;
    let step = Duration::seconds(QUERY_STEP_SECS);
    let end = Utc::now();
    let start = end - step * points;

    let result = mock_query_result(&parsed, start, end, step)?;
    debug!(metric = %parsed.metric_name, state = ?parsed.state, "answered timeseries query");
    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/v1/timeseries/chart",
    tag = "metrics",
    summary = "Fetch chart-ready data for a metric",
    description = "Builds the OxQL query the console would send for the window, runs it, sums the \
                   resulting series and scales them for the requested chart flavor.",
    request_body = ChartRequest,
    responses(
        (status = 200, description = "Chart data", body = ChartResponse),
        (status = 400, description = "Invalid window", body = crate::errors::ErrorBody),
        (status = 403, description = "Not a fleet viewer", body = crate::errors::ErrorBody),
        (status = 501, description = "No mock data for the metric", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(metric = %request.metric_name))]
pub async fn timeseries_chart(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ChartRequest>,
) -> Result<Json<ChartResponse>> {
    {
        let db = state.db.read().await;
        require_fleet_viewer(&db, &current_user)?;
    }

    if request.start_time >= request.end_time {
        return Err(Error::invalid_request("start_time must be before end_time"));
    }

    let query = request
        .filters
        .iter()
        .fold(
            OxqlQuery::new(&request.metric_name, request.start_time, request.end_time),
            |q, (key, value)| q.with_filter(key, value),
        );
    let rendered = query.render()?;
    let parsed = parse_query(&rendered)?;
    let window = query.window_secs();

    let table = mock_table(&parsed, query.query_start()?, query.end_time, Duration::seconds(window))?;
    let data = compose_chart_data(&table);

    let props = match request.flavor {
        ChartFlavor::Bytes => bytes_chart(data),
        ChartFlavor::Count => count_chart(data),
        ChartFlavor::Utilization => utilization_chart(data, window, request.cores.unwrap_or(0)),
    };

    debug!(points = props.data.len(), window, unit = %props.unit, "shaped chart");
    Ok(Json(ChartResponse {
        query: rendered,
        unit: props.unit,
        data: props.data,
        tick_labels: props.tick_labels,
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::models::timeseries::ChartResponse;
    use crate::oxql::OxqlQueryResult;
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::json;

    fn chart_body(metric: &str, flavor: &str) -> serde_json::Value {
        json!({
            "metric_name": metric,
            "start_time": "2025-01-01T00:00:00Z",
            "end_time": "2025-01-02T00:00:00Z",
            "flavor": flavor,
        })
    }

    #[test_log::test(tokio::test)]
    async fn test_query_returns_table() {
        let app = create_test_app();
        let result: OxqlQueryResult = app
            .post("/v1/timeseries/query")
            .json(&json!({ "query": "get virtual_disk:bytes_written | align mean_within(60s)" }))
            .await
            .json();
        assert_eq!(result.tables.len(), 1);
        let table = &result.tables[0];
        assert_eq!(table.name, "virtual_disk:bytes_written");
        assert_eq!(table.timeseries[0].points.timestamps.len(), 60);
    }

    #[test_log::test(tokio::test)]
    async fn test_query_unknown_metric() {
        let app = create_test_app();
        let response = app
            .post("/v1/timeseries/query")
            .json(&json!({ "query": "get switch_port:bytes_in" }))
            .await;
        response.assert_status(StatusCode::NOT_IMPLEMENTED);

        app.post("/v1/timeseries/query")
            .json(&json!({ "query": "" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[test_log::test(tokio::test)]
    async fn test_bytes_chart() {
        let app = create_test_app();
        let mut body = chart_body("virtual_disk:bytes_read", "bytes");
        body["filters"] = json!({ "disk_id": "0b1f" });
        let chart: ChartResponse = app.post("/v1/timeseries/chart").json(&body).await.json();

        assert!(chart.query.starts_with("get virtual_disk:bytes_read | filter timestamp >= @2024-12-31T23:12:00.000"));
        assert!(chart.query.contains("disk_id == \"0b1f\""));
        assert!(chart.query.contains("align mean_within(1440s)"));
        assert!(["Bytes", "KiB", "MiB", "GiB", "TiB"].contains(&chart.unit.as_str()));
        // 62 windows queried, the cumulative first one dropped
        assert_eq!(chart.data.len(), 61);
        assert_eq!(chart.tick_labels.len(), 5);
    }

    #[test_log::test(tokio::test)]
    async fn test_count_chart() {
        let app = create_test_app();
        let chart: ChartResponse = app
            .post("/v1/timeseries/chart")
            .json(&chart_body("virtual_disk:reads", "count"))
            .await
            .json();
        assert_eq!(chart.unit, "Count");
        assert!(chart.data.iter().filter_map(|d| d.value).all(|v| v >= 0.0));
    }

    #[test_log::test(tokio::test)]
    async fn test_utilization_chart() {
        let app = create_test_app();
        let mut body = chart_body("virtual_machine:vcpu_usage", "utilization");
        body["cores"] = json!(4);
        body["filters"] = json!({ "state": "run" });
        let chart: ChartResponse = app.post("/v1/timeseries/chart").json(&body).await.json();
        assert_eq!(chart.unit, "%");
        assert!(!chart.data.is_empty());
        assert!(chart.data.iter().filter_map(|d| d.value).all(|v| (0.0..=100.0).contains(&v)));

        // Without a core count there is nothing to chart
        body["cores"] = json!(null);
        let chart: ChartResponse = app.post("/v1/timeseries/chart").json(&body).await.json();
        assert!(chart.data.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_unfiltered_vcpu_chart_stays_within_full_usage() {
        let app = create_test_app();
        let mut body = chart_body("virtual_machine:vcpu_usage", "utilization");
        body["cores"] = json!(4);
        let chart: ChartResponse = app.post("/v1/timeseries/chart").json(&body).await.json();
        assert!(!chart.data.is_empty());
        assert!(chart.data.iter().filter_map(|d| d.value).all(|v| (0.0..=100.0).contains(&v)));
    }

    #[test_log::test(tokio::test)]
    async fn test_chart_rejects_window_before_earliest_date() {
        let app = create_test_app();
        let mut body = chart_body("virtual_disk:reads", "count");
        body["start_time"] = json!("-262143-01-01T00:00:00Z");
        body["end_time"] = json!("-262143-01-05T00:00:00Z");
        let response = app.post("/v1/timeseries/chart").json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let error: serde_json::Value = response.json();
        assert_eq!(error["error_code"], "InvalidRequest");
    }

    #[test_log::test(tokio::test)]
    async fn test_chart_rejects_inverted_window() {
        let app = create_test_app();
        let mut body = chart_body("virtual_disk:reads", "count");
        body["end_time"] = json!("2024-12-31T00:00:00Z");
        app.post("/v1/timeseries/chart")
            .json(&body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
