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
        affinity_groups::{
            AffinityGroup, AffinityGroupCreate, AffinityGroupMember, AffinityGroupMemberAdd,
            AffinityGroupMemberResponse,
        },
        pagination::{PaginationParams, ResultsPage},
        projects::{OptionalProjectSelector, ProjectListQuery, ProjectSelector},
        users::CurrentUser,
    },
    auth::roles::{require_project_collab, require_project_viewer},
    db::MockDb,
    errors::{Error, Result},
    types::abbrev_uuid,
};

#[derive(Debug, serde::Deserialize, utoipa::IntoParams)]
pub struct MemberListQuery {
    /// Name or id of the project, required when the group is given by name
    pub project: Option<String>,

    #[serde(flatten)]
    #[param(inline)]
    pub pagination: PaginationParams,
}

#[utoipa::path(
    get,
    path = "/v1/affinity-groups",
    tag = "affinity",
    summary = "List affinity groups in a project",
    params(ProjectListQuery),
    responses(
        (status = 200, description = "Page of affinity groups", body = ResultsPage<AffinityGroup>),
        (status = 403, description = "Not a project viewer", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_affinity_groups(
    State(state): State<AppState>,
    Query(query): Query<ProjectListQuery>,
    current_user: CurrentUser,
) -> Result<Json<ResultsPage<AffinityGroup>>> {
    let db = state.db.read().await;
    let project_id = db.project(&query.project)?.id;
    require_project_viewer(&db, &current_user, project_id)?;

    let groups: Vec<AffinityGroup> = MockDb::in_project(&db.affinity_groups, project_id)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(page(&state, &groups, &query.pagination)))
}

#[utoipa::path(
    post,
    path = "/v1/affinity-groups",
    tag = "affinity",
    summary = "Create an affinity group",
    params(ProjectSelector),
    request_body = AffinityGroupCreate,
    responses(
        (status = 201, description = "Group created", body = AffinityGroup),
        (status = 400, description = "Invalid or duplicate name", body = crate::errors::ErrorBody),
        (status = 403, description = "Not a project collaborator", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_affinity_group(
    State(state): State<AppState>,
    Query(selector): Query<ProjectSelector>,
    current_user: CurrentUser,
    Json(create): Json<AffinityGroupCreate>,
) -> Result<(StatusCode, Json<AffinityGroup>)> {
    let mut db = state.db.write().await;
    let project_id = db.project(&selector.project)?.id;
    require_project_collab(&db, &current_user, project_id)?;
    db.ensure_unique_name(&db.affinity_groups, project_id, &create.name)?;
    validate_name(&create.name)?;

    let group = AffinityGroup {
        id: Uuid::new_v4(),
        name: create.name,
        description: create.description,
        project_id,
        policy: create.policy,
        time_created: Utc::now(),
    };
    db.affinity_groups.push(group.clone());

    info!(group = %group.name, id = %abbrev_uuid(&group.id), "created affinity group");
    Ok((StatusCode::CREATED, Json(group)))
}

#[utoipa::path(
    get,
    path = "/v1/affinity-groups/{group}/members",
    tag = "affinity",
    summary = "List members of an affinity group",
    params(
        ("group" = String, Path, description = "Affinity group name or id"),
        MemberListQuery,
    ),
    responses(
        (status = 200, description = "Page of member instances", body = ResultsPage<AffinityGroupMemberResponse>),
        (status = 404, description = "No such group", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(group = %group))]
pub async fn list_affinity_group_members(
    State(state): State<AppState>,
    Path(group): Path<String>,
    Query(query): Query<MemberListQuery>,
    current_user: CurrentUser,
) -> Result<Json<ResultsPage<AffinityGroupMemberResponse>>> {
    let db = state.db.read().await;
    let idx = db.resolve(&db.affinity_groups, &group, query.project.as_deref())?;
    let group = &db.affinity_groups[idx];
    require_project_viewer(&db, &current_user, group.project_id)?;

    let members: Vec<AffinityGroupMemberResponse> = db
        .affinity_group_members
        .iter()
        .filter(|m| m.group_id == group.id)
        .filter_map(|m| db.instances.iter().find(|i| i.id == m.instance_id))
        .map(|i| AffinityGroupMemberResponse {
            id: i.id,
            name: i.name.clone(),
            run_state: i.run_state,
        })
        .collect();
    Ok(Json(page(&state, &members, &query.pagination)))
}

#[utoipa::path(
    post,
    path = "/v1/affinity-groups/{group}/members",
    tag = "affinity",
    summary = "Add an instance to an affinity group",
    params(
        ("group" = String, Path, description = "Affinity group name or id"),
        OptionalProjectSelector,
    ),
    request_body = AffinityGroupMemberAdd,
    responses(
        (status = 201, description = "Member added", body = AffinityGroupMemberResponse),
        (status = 400, description = "Already a member", body = crate::errors::ErrorBody),
        (status = 404, description = "No such group or instance", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(group = %group))]
pub async fn add_affinity_group_member(
    State(state): State<AppState>,
    Path(group): Path<String>,
    Query(selector): Query<OptionalProjectSelector>,
    current_user: CurrentUser,
    Json(add): Json<AffinityGroupMemberAdd>,
) -> Result<(StatusCode, Json<AffinityGroupMemberResponse>)> {
    let mut db = state.db.write().await;
    let group_idx = db.resolve(&db.affinity_groups, &group, selector.project.as_deref())?;
    let (group_id, project_id) = (db.affinity_groups[group_idx].id, db.affinity_groups[group_idx].project_id);
    require_project_collab(&db, &current_user, project_id)?;

    // Members come from the group's own project
    let project_key = project_id.to_string();
    let instance_idx = db.resolve(&db.instances, &add.instance, Some(&project_key))?;
    let instance = &db.instances[instance_idx];
    if instance.project_id != project_id {
        return Err(Error::not_found("instance", &add.instance));
    }
    let member = AffinityGroupMemberResponse {
        id: instance.id,
        name: instance.name.clone(),
        run_state: instance.run_state,
    };

    if db
        .affinity_group_members
        .iter()
        .any(|m| m.group_id == group_id && m.instance_id == member.id)
    {
        return Err(Error::already_exists("affinity-group-member", &member.name));
    }
    db.affinity_group_members.push(AffinityGroupMember {
        group_id,
        instance_id: member.id,
    });

    info!(group = %abbrev_uuid(&group_id), instance = %member.name, "added affinity group member");
    Ok((StatusCode::CREATED, Json(member)))
}
