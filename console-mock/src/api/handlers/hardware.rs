use axum::{
    Json,
    extract::{Query, State},
};

use super::page;
use crate::{
    AppState,
    api::models::{
        hardware::Sled,
        pagination::{PaginationParams, ResultsPage},
        users::CurrentUser,
    },
    auth::roles::require_fleet_viewer,
    errors::Result,
};

#[utoipa::path(
    get,
    path = "/v1/system/hardware/sleds",
    tag = "system",
    summary = "List sleds in the rack",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of sleds", body = ResultsPage<Sled>),
        (status = 403, description = "Not a fleet viewer", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_sleds(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    current_user: CurrentUser,
) -> Result<Json<ResultsPage<Sled>>> {
    let db = state.db.read().await;
    require_fleet_viewer(&db, &current_user)?;
    Ok(Json(page(&state, &db.sleds, &pagination)))
}
