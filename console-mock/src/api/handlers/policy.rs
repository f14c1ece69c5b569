//! Reading and replacing role policies on the fleet, the silo and projects.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;

use crate::{
    AppState,
    api::models::{policy::Policy, users::CurrentUser},
    auth::roles::{
        require_fleet_admin, require_fleet_viewer, require_project_admin, require_project_viewer, require_silo_admin,
        require_silo_viewer,
    },
    db::{FLEET_ID, MockDb},
    errors::{Error, Result},
    types::{IdentityType, ResourceType},
};

/// Every identity in a new policy must exist and have the identity type it claims.
fn validate_policy(db: &MockDb, policy: &Policy) -> Result<()> {
    for assignment in &policy.role_assignments {
        let known = match assignment.identity_type {
            IdentityType::SiloUser => db.users.iter().any(|u| u.id == assignment.identity_id),
            IdentityType::SiloGroup => db.groups.iter().any(|g| g.id == assignment.identity_id),
        };
        if !known {
            return Err(Error::invalid_request(format!(
                "role assignment names unknown identity {}",
                assignment.identity_id
            )));
        }
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/v1/policy",
    tag = "policy",
    summary = "Fetch the silo policy",
    responses(
        (status = 200, description = "Role assignments on the silo", body = Policy),
        (status = 403, description = "Not a silo viewer", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_silo_policy(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<Policy>> {
    let db = state.db.read().await;
    require_silo_viewer(&db, &current_user)?;
    Ok(Json(db.policy(ResourceType::Silo, db.silo.id)))
}

#[utoipa::path(
    put,
    path = "/v1/policy",
    tag = "policy",
    summary = "Replace the silo policy",
    request_body = Policy,
    responses(
        (status = 200, description = "Updated policy", body = Policy),
        (status = 400, description = "Unknown identity", body = crate::errors::ErrorBody),
        (status = 403, description = "Not a silo admin", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_silo_policy(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(policy): Json<Policy>,
) -> Result<Json<Policy>> {
    let mut db = state.db.write().await;
    require_silo_admin(&db, &current_user)?;
    validate_policy(&db, &policy)?;

    let silo_id = db.silo.id;
    db.set_policy(ResourceType::Silo, silo_id, &policy);
    info!(assignments = policy.role_assignments.len(), "silo policy replaced");
    Ok(Json(db.policy(ResourceType::Silo, silo_id)))
}

#[utoipa::path(
    get,
    path = "/v1/system/policy",
    tag = "policy",
    summary = "Fetch the fleet policy",
    responses(
        (status = 200, description = "Role assignments on the fleet", body = Policy),
        (status = 403, description = "Not a fleet viewer", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_system_policy(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<Policy>> {
    let db = state.db.read().await;
    require_fleet_viewer(&db, &current_user)?;
    Ok(Json(db.policy(ResourceType::Fleet, FLEET_ID)))
}

#[utoipa::path(
    put,
    path = "/v1/system/policy",
    tag = "policy",
    summary = "Replace the fleet policy",
    request_body = Policy,
    responses(
        (status = 200, description = "Updated policy", body = Policy),
        (status = 400, description = "Unknown identity", body = crate::errors::ErrorBody),
        (status = 403, description = "Not a fleet admin", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_system_policy(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(policy): Json<Policy>,
) -> Result<Json<Policy>> {
    let mut db = state.db.write().await;
    require_fleet_admin(&db, &current_user)?;
    validate_policy(&db, &policy)?;

    db.set_policy(ResourceType::Fleet, FLEET_ID, &policy);
    info!(assignments = policy.role_assignments.len(), "fleet policy replaced");
    Ok(Json(db.policy(ResourceType::Fleet, FLEET_ID)))
}

#[utoipa::path(
    get,
    path = "/v1/projects/{project}/policy",
    tag = "policy",
    summary = "Fetch a project's policy",
    params(("project" = String, Path, description = "Project name or id")),
    responses(
        (status = 200, description = "Role assignments on the project", body = Policy),
        (status = 403, description = "Not a project viewer", body = crate::errors::ErrorBody),
        (status = 404, description = "No such project", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(project = %project))]
pub async fn get_project_policy(
    State(state): State<AppState>,
    Path(project): Path<String>,
    current_user: CurrentUser,
) -> Result<Json<Policy>> {
    let db = state.db.read().await;
    let project_id = db.project(&project)?.id;
    require_project_viewer(&db, &current_user, project_id)?;
    Ok(Json(db.policy(ResourceType::Project, project_id)))
}

#[utoipa::path(
    put,
    path = "/v1/projects/{project}/policy",
    tag = "policy",
    summary = "Replace a project's policy",
    params(("project" = String, Path, description = "Project name or id")),
    request_body = Policy,
    responses(
        (status = 200, description = "Updated policy", body = Policy),
        (status = 400, description = "Unknown identity", body = crate::errors::ErrorBody),
        (status = 403, description = "Not a project admin", body = crate::errors::ErrorBody),
        (status = 404, description = "No such project", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(project = %project))]
pub async fn update_project_policy(
    State(state): State<AppState>,
    Path(project): Path<String>,
    current_user: CurrentUser,
    Json(policy): Json<Policy>,
) -> Result<Json<Policy>> {
    let mut db = state.db.write().await;
    let project_id = db.project(&project)?.id;
    require_project_admin(&db, &current_user, project_id)?;
    validate_policy(&db, &policy)?;

    db.set_policy(ResourceType::Project, project_id, &policy);
    info!(assignments = policy.role_assignments.len(), "project policy replaced");
    Ok(Json(db.policy(ResourceType::Project, project_id)))
}
