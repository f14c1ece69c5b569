use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::{page, validate_name};
use crate::{
    AppState,
    api::models::{
        pagination::{PaginationParams, ResultsPage},
        policy::{RoleAssignment, RoleKey},
        projects::{Project, ProjectCreate},
        users::CurrentUser,
    },
    auth::roles::{require_project_viewer, require_silo_collab, user_has_role},
    errors::{Error, Result},
    types::{IdentityType, ResourceType, abbrev_uuid},
};

#[utoipa::path(
    get,
    path = "/v1/projects",
    tag = "projects",
    summary = "List projects",
    description = "Lists the projects the acting user can view.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of projects", body = ResultsPage<Project>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_projects(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    current_user: CurrentUser,
) -> Result<Json<ResultsPage<Project>>> {
    let db = state.db.read().await;
    let visible: Vec<Project> = db
        .projects
        .iter()
        .filter(|p| user_has_role(&db, current_user.id, ResourceType::Project, p.id, RoleKey::Viewer))
        .cloned()
        .collect();
    Ok(Json(page(&state, &visible, &pagination)))
}

#[utoipa::path(
    post,
    path = "/v1/projects",
    tag = "projects",
    summary = "Create a project",
    description = "The creator is granted the admin role on the new project.",
    request_body = ProjectCreate,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 400, description = "Invalid or duplicate name", body = crate::errors::ErrorBody),
        (status = 403, description = "Not a silo collaborator", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_project(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(create): Json<ProjectCreate>,
) -> Result<(StatusCode, Json<Project>)> {
    let mut db = state.db.write().await;
    require_silo_collab(&db, &current_user)?;
    validate_name(&create.name)?;
    if db.projects.iter().any(|p| p.name == create.name) {
        return Err(Error::already_exists("project", &create.name));
    }

    let now = Utc::now();
    let project = Project {
        id: Uuid::new_v4(),
        name: create.name,
        description: create.description,
        time_created: now,
        time_modified: now,
    };
    db.projects.push(project.clone());
    db.role_assignments.push(RoleAssignment {
        resource_type: ResourceType::Project,
        resource_id: project.id,
        identity_id: current_user.id,
        identity_type: IdentityType::SiloUser,
        role_name: RoleKey::Admin,
    });

    info!(project = %project.name, id = %abbrev_uuid(&project.id), "created project");
    Ok((StatusCode::CREATED, Json(project)))
}

#[utoipa::path(
    get,
    path = "/v1/projects/{project}",
    tag = "projects",
    summary = "Fetch a project",
    params(("project" = String, Path, description = "Project name or id")),
    responses(
        (status = 200, description = "The project", body = Project),
        (status = 403, description = "Not a project viewer", body = crate::errors::ErrorBody),
        (status = 404, description = "No such project", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(project = %project))]
pub async fn get_project(
    State(state): State<AppState>,
    Path(project): Path<String>,
    current_user: CurrentUser,
) -> Result<Json<Project>> {
    let db = state.db.read().await;
    let project = db.project(&project)?;
    require_project_viewer(&db, &current_user, project.id)?;
    Ok(Json(project.clone()))
}
