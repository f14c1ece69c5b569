use axum::{
    Json,
    extract::{Path, Query, State},
};

use super::page;
use crate::{
    AppState,
    api::models::{
        ip_pools::{IpPool, IpPoolRange, IpPoolUtilization, Ipv4Utilization, Ipv6Utilization},
        pagination::{PaginationParams, ResultsPage},
        users::CurrentUser,
    },
    auth::roles::require_fleet_viewer,
    db::MockDb,
    errors::Result,
    net::ip_range_len,
};

/// Address counts per family for one pool, summed in the 128-bit domain.
fn pool_utilization(db: &MockDb, pool_id: uuid::Uuid) -> IpPoolUtilization {
    let (mut v4_capacity, mut v6_capacity) = (0u128, 0u128);
    for range in db.pool_ranges(pool_id) {
        let len = ip_range_len(&range);
        if range.is_ipv4() {
            v4_capacity = v4_capacity.saturating_add(len);
        } else {
            v6_capacity = v6_capacity.saturating_add(len);
        }
    }

    let (mut v4_allocated, mut v6_allocated) = (0u128, 0u128);
    for ip in db.allocated_ips(pool_id) {
        if ip.is_ipv4() {
            v4_allocated += 1;
        } else {
            v6_allocated += 1;
        }
    }

    IpPoolUtilization {
        ipv4: Ipv4Utilization {
            allocated: u32::try_from(v4_allocated).unwrap_or(u32::MAX),
            capacity: u32::try_from(v4_capacity).unwrap_or(u32::MAX),
        },
        ipv6: Ipv6Utilization {
            allocated: v6_allocated.to_string(),
            capacity: v6_capacity.to_string(),
        },
    }
}

#[utoipa::path(
    get,
    path = "/v1/system/ip-pools",
    tag = "system",
    summary = "List IP pools",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of IP pools", body = ResultsPage<IpPool>),
        (status = 403, description = "Not a fleet viewer", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_ip_pools(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    current_user: CurrentUser,
) -> Result<Json<ResultsPage<IpPool>>> {
    let db = state.db.read().await;
    require_fleet_viewer(&db, &current_user)?;
    Ok(Json(page(&state, &db.ip_pools, &pagination)))
}

#[utoipa::path(
    get,
    path = "/v1/system/ip-pools/{pool}/ranges",
    tag = "system",
    summary = "List the address ranges of an IP pool",
    params(("pool" = String, Path, description = "Pool name or id"), PaginationParams),
    responses(
        (status = 200, description = "Page of ranges", body = ResultsPage<IpPoolRange>),
        (status = 404, description = "No such pool", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(pool = %pool))]
pub async fn list_ip_pool_ranges(
    State(state): State<AppState>,
    Path(pool): Path<String>,
    Query(pagination): Query<PaginationParams>,
    current_user: CurrentUser,
) -> Result<Json<ResultsPage<IpPoolRange>>> {
    let db = state.db.read().await;
    require_fleet_viewer(&db, &current_user)?;
    let pool_id = db.ip_pool(&pool)?.id;

    let ranges: Vec<IpPoolRange> = db
        .ip_pool_ranges
        .iter()
        .filter(|r| r.ip_pool_id == pool_id)
        .cloned()
        .collect();
    Ok(Json(page(&state, &ranges, &pagination)))
}

#[utoipa::path(
    get,
    path = "/v1/system/ip-pools/{pool}/utilization",
    tag = "system",
    summary = "Allocated and total addresses of an IP pool",
    params(("pool" = String, Path, description = "Pool name or id")),
    responses(
        (status = 200, description = "Utilization per address family", body = IpPoolUtilization),
        (status = 404, description = "No such pool", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(pool = %pool))]
pub async fn get_ip_pool_utilization(
    State(state): State<AppState>,
    Path(pool): Path<String>,
    current_user: CurrentUser,
) -> Result<Json<IpPoolUtilization>> {
    let db = state.db.read().await;
    require_fleet_viewer(&db, &current_user)?;
    let pool_id = db.ip_pool(&pool)?.id;
    Ok(Json(pool_utilization(&db, pool_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::ip_pools::IpPoolRange as Range;
    use crate::test_utils::*;
    use axum::http::StatusCode;

    #[test]
    fn test_utilization_of_seeded_pools() {
        let db = MockDb::seeded();
        let pool_1 = db.ip_pool("ip-pool-1").unwrap().id;
        let utilization = pool_utilization(&db, pool_1);
        // 21 + 5 addresses, two of them held
        assert_eq!(utilization.ipv4, Ipv4Utilization { allocated: 2, capacity: 26 });
        assert_eq!(utilization.ipv6.capacity, "0");

        let pool_2 = db.ip_pool("ip-pool-2").unwrap().id;
        let utilization = pool_utilization(&db, pool_2);
        assert_eq!(utilization.ipv6.capacity, "32");
        assert_eq!(utilization.ipv6.allocated, "0");
        assert_eq!(utilization.ipv4.capacity, 0);
    }

    #[test]
    fn test_full_ipv4_space_saturates() {
        let mut db = MockDb::seeded();
        let pool_3 = db.ip_pool("ip-pool-3").unwrap().id;
        db.ip_pool_ranges.push(Range {
            id: uuid::Uuid::new_v4(),
            ip_pool_id: pool_3,
            range: crate::net::IpRange::new("0.0.0.0", "255.255.255.255"),
            time_created: chrono::Utc::now(),
        });
        assert_eq!(pool_utilization(&db, pool_3).ipv4.capacity, u32::MAX);
    }

    #[test_log::test(tokio::test)]
    async fn test_ip_pool_endpoints() {
        let app = create_test_app();
        let pools: ResultsPage<IpPool> = app.get("/v1/system/ip-pools").await.json();
        assert_eq!(pools.items.len(), 3);
        assert!(pools.items[0].is_default);

        let ranges: ResultsPage<IpPoolRange> = app.get("/v1/system/ip-pools/ip-pool-1/ranges").await.json();
        assert_eq!(ranges.items.len(), 2);
        assert_eq!(ranges.items[0].range.first, "123.4.56.0");

        let utilization: IpPoolUtilization = app.get("/v1/system/ip-pools/ip-pool-2/utilization").await.json();
        assert_eq!(utilization.ipv6.capacity, "32");

        app.get("/v1/system/ip-pools/ip-pool-9/utilization")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[test_log::test(tokio::test)]
    async fn test_ip_pools_need_fleet_viewer() {
        let app = create_test_app();
        app.get("/v1/system/ip-pools")
            .add_header("cookie", user_cookie("Jacob Klein"))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}
