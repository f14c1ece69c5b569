//! Floating IPs: addresses reserved from an IP pool and optionally bound to an instance.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use std::net::IpAddr;
use tracing::{debug, info};
use uuid::Uuid;

use super::{page, validate_name};
use crate::{
    AppState,
    api::models::{
        floating_ips::{FloatingIp, FloatingIpAttach, FloatingIpCreate},
        pagination::ResultsPage,
        projects::{OptionalProjectSelector, ProjectListQuery, ProjectSelector},
        users::CurrentUser,
    },
    auth::roles::{require_project_collab, require_project_viewer},
    db::MockDb,
    errors::{Error, Result},
    net::{first_free_ip, ip_in_any_range},
};

/// Pick the address for a new floating IP out of `pool_id`.
fn allocate_ip(db: &MockDb, pool_id: Uuid, pool_name: &str, requested: Option<&str>) -> Result<IpAddr> {
    let ranges = db.pool_ranges(pool_id);
    let used = db.allocated_ips(pool_id);

    let Some(requested) = requested else {
        return first_free_ip(&ranges, &used)
            .ok_or_else(|| Error::invalid_request(format!("IP pool {pool_name} has no free addresses")));
    };

    let ip: IpAddr = requested
        .parse()
        .map_err(|_| Error::invalid_request(format!("not an IP address: {requested}")))?;
    if !ip_in_any_range(requested, &ranges) {
        return Err(Error::invalid_request(format!(
            "IP address {ip} is not in any range of pool {pool_name}"
        )));
    }
    if used.contains(&ip) {
        return Err(Error::already_exists("floating-ip address", &ip.to_string()));
    }
    Ok(ip)
}

#[utoipa::path(
    get,
    path = "/v1/floating-ips",
    tag = "floating-ips",
    summary = "List floating IPs in a project",
    params(ProjectListQuery),
    responses(
        (status = 200, description = "Page of floating IPs", body = ResultsPage<FloatingIp>),
        (status = 403, description = "Not a project viewer", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_floating_ips(
    State(state): State<AppState>,
    Query(query): Query<ProjectListQuery>,
    current_user: CurrentUser,
) -> Result<Json<ResultsPage<FloatingIp>>> {
    let db = state.db.read().await;
    let project_id = db.project(&query.project)?.id;
    require_project_viewer(&db, &current_user, project_id)?;

    let ips: Vec<FloatingIp> = MockDb::in_project(&db.floating_ips, project_id)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(page(&state, &ips, &query.pagination)))
}

#[utoipa::path(
    post,
    path = "/v1/floating-ips",
    tag = "floating-ips",
    summary = "Create a floating IP",
    description = "Reserves the requested address, or the first free address of the pool when none is given.",
    params(ProjectSelector),
    request_body = FloatingIpCreate,
    responses(
        (status = 201, description = "Floating IP created", body = FloatingIp),
        (status = 400, description = "Address outside the pool, in use, or pool exhausted", body = crate::errors::ErrorBody),
        (status = 403, description = "Not a project collaborator", body = crate::errors::ErrorBody),
        (status = 404, description = "No such pool", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_floating_ip(
    State(state): State<AppState>,
    Query(selector): Query<ProjectSelector>,
    current_user: CurrentUser,
    Json(create): Json<FloatingIpCreate>,
) -> Result<(StatusCode, Json<FloatingIp>)> {
    let mut db = state.db.write().await;
    let project_id = db.project(&selector.project)?.id;
    require_project_collab(&db, &current_user, project_id)?;
    db.ensure_unique_name(&db.floating_ips, project_id, &create.name)?;
    validate_name(&create.name)?;

    let pool = match create.pool.as_deref() {
        Some(selector) => db.ip_pool(selector)?,
        None => db.default_ip_pool()?,
    };
    let (pool_id, pool_name) = (pool.id, pool.name.clone());
    let ip = allocate_ip(&db, pool_id, &pool_name, create.ip.as_deref())?;

    let floating_ip = FloatingIp {
        id: Uuid::new_v4(),
        name: create.name,
        description: create.description,
        project_id,
        ip,
        ip_pool_id: pool_id,
        instance_id: None,
        time_created: Utc::now(),
    };
    db.floating_ips.push(floating_ip.clone());

    info!(name = %floating_ip.name, ip = %ip, pool = %pool_name, "allocated floating IP");
    Ok((StatusCode::CREATED, Json(floating_ip)))
}

#[utoipa::path(
    delete,
    path = "/v1/floating-ips/{floating_ip}",
    tag = "floating-ips",
    summary = "Delete a floating IP",
    params(
        ("floating_ip" = String, Path, description = "Floating IP name or id"),
        OptionalProjectSelector,
    ),
    responses(
        (status = 204, description = "Floating IP released"),
        (status = 400, description = "Still attached to an instance", body = crate::errors::ErrorBody),
        (status = 404, description = "No such floating IP", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(floating_ip = %floating_ip))]
pub async fn delete_floating_ip(
    State(state): State<AppState>,
    Path(floating_ip): Path<String>,
    Query(selector): Query<OptionalProjectSelector>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    let mut db = state.db.write().await;
    let idx = db.resolve(&db.floating_ips, &floating_ip, selector.project.as_deref())?;
    require_project_collab(&db, &current_user, db.floating_ips[idx].project_id)?;

    if db.floating_ips[idx].instance_id.is_some() {
        return Err(Error::invalid_request(
            "floating IP must be detached before it can be deleted",
        ));
    }

    let removed = db.floating_ips.remove(idx);
    info!(name = %removed.name, ip = %removed.ip, "released floating IP");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/v1/floating-ips/{floating_ip}/attach",
    tag = "floating-ips",
    summary = "Attach a floating IP to an instance",
    params(
        ("floating_ip" = String, Path, description = "Floating IP name or id"),
        OptionalProjectSelector,
    ),
    request_body = FloatingIpAttach,
    responses(
        (status = 202, description = "Attached", body = FloatingIp),
        (status = 400, description = "Already attached", body = crate::errors::ErrorBody),
        (status = 404, description = "No such floating IP or instance", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(floating_ip = %floating_ip))]
pub async fn attach_floating_ip(
    State(state): State<AppState>,
    Path(floating_ip): Path<String>,
    Query(selector): Query<OptionalProjectSelector>,
    current_user: CurrentUser,
    Json(attach): Json<FloatingIpAttach>,
) -> Result<(StatusCode, Json<FloatingIp>)> {
    let mut db = state.db.write().await;
    let idx = db.resolve(&db.floating_ips, &floating_ip, selector.project.as_deref())?;
    let project_id = db.floating_ips[idx].project_id;
    require_project_collab(&db, &current_user, project_id)?;

    if db.floating_ips[idx].instance_id.is_some() {
        return Err(Error::invalid_request("floating IP is already attached to an instance"));
    }

    let project_key = project_id.to_string();
    let instance_idx = db.resolve(&db.instances, &attach.instance, Some(&project_key))?;
    let instance_id = db.instances[instance_idx].id;
    if db.instances[instance_idx].project_id != project_id {
        return Err(Error::not_found("instance", &attach.instance));
    }

    db.floating_ips[idx].instance_id = Some(instance_id);
    let updated = db.floating_ips[idx].clone();
    info!(name = %updated.name, instance = %attach.instance, "attached floating IP");
    Ok((StatusCode::ACCEPTED, Json(updated)))
}

#[utoipa::path(
    post,
    path = "/v1/floating-ips/{floating_ip}/detach",
    tag = "floating-ips",
    summary = "Detach a floating IP from its instance",
    params(
        ("floating_ip" = String, Path, description = "Floating IP name or id"),
        OptionalProjectSelector,
    ),
    responses(
        (status = 202, description = "Detached", body = FloatingIp),
        (status = 400, description = "Not attached", body = crate::errors::ErrorBody),
        (status = 404, description = "No such floating IP", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(floating_ip = %floating_ip))]
pub async fn detach_floating_ip(
    State(state): State<AppState>,
    Path(floating_ip): Path<String>,
    Query(selector): Query<OptionalProjectSelector>,
    current_user: CurrentUser,
) -> Result<(StatusCode, Json<FloatingIp>)> {
    let mut db = state.db.write().await;
    let idx = db.resolve(&db.floating_ips, &floating_ip, selector.project.as_deref())?;
    require_project_collab(&db, &current_user, db.floating_ips[idx].project_id)?;

    let Some(previous) = db.floating_ips[idx].instance_id.take() else {
        return Err(Error::invalid_request("floating IP is not attached to an instance"));
    };

    let updated = db.floating_ips[idx].clone();
    debug!(name = %updated.name, instance = %previous, "detached floating IP");
    Ok((StatusCode::ACCEPTED, Json(updated)))
}

#[cfg(test)]
mod tests {
    use crate::api::models::{floating_ips::FloatingIp, pagination::ResultsPage};
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use std::collections::HashSet;

    async fn create(app: &axum_test::TestServer, body: serde_json::Value) -> axum_test::TestResponse {
        app.post("/v1/floating-ips?project=mock-project").json(&body).await
    }

    #[test_log::test(tokio::test)]
    async fn test_allocates_first_free_address() {
        let app = create_test_app();
        // .4 and .5 are held by the seeded floating IPs
        let response = create(&app, json!({ "name": "fresh" })).await;
        response.assert_status(StatusCode::CREATED);
        let ip: FloatingIp = response.json();
        assert_eq!(ip.ip.to_string(), "123.4.56.0");
        assert!(ip.instance_id.is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_allocation_never_repeats_an_address() {
        let app = create_test_app();
        for i in 0..10 {
            create(&app, json!({ "name": format!("ip-{i}") }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let page: ResultsPage<FloatingIp> = app.get("/v1/floating-ips?project=mock-project&limit=100").await.json();
        let addresses: HashSet<_> = page.items.iter().map(|f| f.ip).collect();
        assert_eq!(addresses.len(), page.items.len());
        assert_eq!(page.items.len(), 12);
    }

    #[test_log::test(tokio::test)]
    async fn test_requested_address() {
        let app = create_test_app();
        let response = create(&app, json!({ "name": "chosen", "ip": "123.4.56.101" })).await;
        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.json::<FloatingIp>().ip.to_string(), "123.4.56.101");

        // Outside both ranges of the pool
        let response = create(&app, json!({ "name": "outside", "ip": "123.4.56.50" })).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error_code"], "InvalidRequest");

        // Held by rootbeer-float
        let response = create(&app, json!({ "name": "taken", "ip": "123.4.56.4" })).await;
        let body: serde_json::Value = response.json();
        assert_eq!(body["error_code"], "ObjectAlreadyExists");

        create(&app, json!({ "name": "garbage", "ip": "not-an-ip" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[test_log::test(tokio::test)]
    async fn test_named_pool() {
        let app = create_test_app();
        let response = create(&app, json!({ "name": "six", "pool": "ip-pool-2" })).await;
        assert_eq!(response.json::<FloatingIp>().ip.to_string(), "fd00::1");

        let response = create(&app, json!({ "name": "empty", "pool": "ip-pool-3" })).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        create(&app, json!({ "name": "missing", "pool": "ip-pool-9" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[test_log::test(tokio::test)]
    async fn test_exhausted_pool() {
        let mut db = crate::db::MockDb::seeded();
        // Shrink ip-pool-1 to exactly the two addresses already held
        db.ip_pool_ranges.retain(|r| r.range.first != "123.4.56.100");
        db.ip_pool_ranges[0].range = crate::net::IpRange::new("123.4.56.4", "123.4.56.5");
        let app = create_test_app_with_db(db);

        let response = create(&app, json!({ "name": "one-too-many" })).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "IP pool ip-pool-1 has no free addresses");
    }

    #[test_log::test(tokio::test)]
    async fn test_attach_detach_delete() {
        let app = create_test_app();

        app.delete("/v1/floating-ips/rootbeer-float?project=mock-project")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        app.post("/v1/floating-ips/rootbeer-float/attach?project=mock-project")
            .json(&json!({ "instance": "you-fail" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let detached: FloatingIp = app
            .post("/v1/floating-ips/rootbeer-float/detach?project=mock-project")
            .await
            .json();
        assert!(detached.instance_id.is_none());
        app.post("/v1/floating-ips/rootbeer-float/detach?project=mock-project")
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let response = app
            .post("/v1/floating-ips/cola-float/attach?project=mock-project")
            .json(&json!({ "instance": "you-fail" }))
            .await;
        response.assert_status(StatusCode::ACCEPTED);
        assert!(response.json::<FloatingIp>().instance_id.is_some());

        app.delete("/v1/floating-ips/rootbeer-float?project=mock-project")
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }

    #[test_log::test(tokio::test)]
    async fn test_viewer_cannot_allocate() {
        let app = create_test_app();
        app.post("/v1/floating-ips?project=mock-project")
            .add_header("cookie", user_cookie("Simone de Beauvoir"))
            .json(&json!({ "name": "nope" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}
