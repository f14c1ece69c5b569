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
        disks::{BLOCK_SIZES, Disk, DiskCreate, DiskState, GIB, MAX_DISK_SIZE_GIB, MIN_DISK_SIZE_GIB},
        pagination::ResultsPage,
        projects::{OptionalProjectSelector, ProjectListQuery, ProjectSelector},
        users::CurrentUser,
    },
    auth::roles::{require_project_collab, require_project_viewer},
    db::MockDb,
    errors::{Error, Result},
    types::abbrev_uuid,
};

/// Size and block size checks, applied before anything is stored.
fn validate_disk(create: &DiskCreate) -> Result<()> {
    validate_name(&create.name)?;
    if !BLOCK_SIZES.contains(&create.block_size) {
        return Err(Error::invalid_request(format!(
            "block size must be one of {BLOCK_SIZES:?}, got {}",
            create.block_size
        )));
    }
    if create.size < MIN_DISK_SIZE_GIB * GIB {
        return Err(Error::invalid_request(format!(
            "disk size must be at least {MIN_DISK_SIZE_GIB} GiB"
        )));
    }
    if create.size > MAX_DISK_SIZE_GIB * GIB {
        return Err(Error::invalid_request(format!(
            "disk size must be at most {MAX_DISK_SIZE_GIB} GiB"
        )));
    }
    if create.size % u64::from(create.block_size) != 0 {
        return Err(Error::invalid_request(format!(
            "disk size must be a multiple of the block size ({} bytes)",
            create.block_size
        )));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/v1/disks",
    tag = "disks",
    summary = "List disks in a project",
    params(ProjectListQuery),
    responses(
        (status = 200, description = "Page of disks", body = ResultsPage<Disk>),
        (status = 403, description = "Not a project viewer", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_disks(
    State(state): State<AppState>,
    Query(query): Query<ProjectListQuery>,
    current_user: CurrentUser,
) -> Result<Json<ResultsPage<Disk>>> {
    let db = state.db.read().await;
    let project_id = db.project(&query.project)?.id;
    require_project_viewer(&db, &current_user, project_id)?;

    let disks: Vec<Disk> = MockDb::in_project(&db.disks, project_id).into_iter().cloned().collect();
    Ok(Json(page(&state, &disks, &query.pagination)))
}

#[utoipa::path(
    post,
    path = "/v1/disks",
    tag = "disks",
    summary = "Create a disk",
    params(ProjectSelector),
    request_body = DiskCreate,
    responses(
        (status = 201, description = "Disk created", body = Disk),
        (status = 400, description = "Invalid size, block size or duplicate name", body = crate::errors::ErrorBody),
        (status = 403, description = "Not a project collaborator", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_disk(
    State(state): State<AppState>,
    Query(selector): Query<ProjectSelector>,
    current_user: CurrentUser,
    Json(create): Json<DiskCreate>,
) -> Result<(StatusCode, Json<Disk>)> {
    let mut db = state.db.write().await;
    let project_id = db.project(&selector.project)?.id;
    require_project_collab(&db, &current_user, project_id)?;
    db.ensure_unique_name(&db.disks, project_id, &create.name)?;
    validate_disk(&create)?;

    let now = Utc::now();
    let disk = Disk {
        id: Uuid::new_v4(),
        device_path: format!("/mnt/{}", create.name),
        name: create.name,
        description: create.description,
        project_id,
        size: create.size,
        block_size: create.block_size,
        state: DiskState::Detached,
        time_created: now,
        time_modified: now,
    };
    db.disks.push(disk.clone());

    info!(disk = %disk.name, id = %abbrev_uuid(&disk.id), size = disk.size, "created disk");
    Ok((StatusCode::CREATED, Json(disk)))
}

#[utoipa::path(
    delete,
    path = "/v1/disks/{disk}",
    tag = "disks",
    summary = "Delete a disk",
    params(
        ("disk" = String, Path, description = "Disk name or id"),
        OptionalProjectSelector,
    ),
    responses(
        (status = 204, description = "Disk deleted"),
        (status = 400, description = "Disk is attached", body = crate::errors::ErrorBody),
        (status = 403, description = "Not a project collaborator", body = crate::errors::ErrorBody),
        (status = 404, description = "No such disk", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(disk = %disk))]
pub async fn delete_disk(
    State(state): State<AppState>,
    Path(disk): Path<String>,
    Query(selector): Query<OptionalProjectSelector>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    let mut db = state.db.write().await;
    let idx = db.resolve(&db.disks, &disk, selector.project.as_deref())?;
    require_project_collab(&db, &current_user, db.disks[idx].project_id)?;

    if let DiskState::Attached { .. } = db.disks[idx].state {
        return Err(Error::invalid_request("disk must be detached before it can be deleted"));
    }

    let removed = db.disks.remove(idx);
    info!(disk = %removed.name, id = %abbrev_uuid(&removed.id), "deleted disk");
    Ok(StatusCode::NO_CONTENT)
}
