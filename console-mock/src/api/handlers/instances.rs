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
        instances::{
            Instance, InstanceCreate, InstanceSerialConsoleData, InstanceState, MAX_MEMORY_BYTES, MAX_NCPUS,
            MIN_MEMORY_BYTES,
        },
        pagination::ResultsPage,
        projects::{OptionalProjectSelector, ProjectListQuery, ProjectSelector},
        users::CurrentUser,
    },
    auth::roles::{require_project_collab, require_project_viewer},
    db::MockDb,
    errors::{Error, Result},
    types::abbrev_uuid,
};

const SERIAL_CONSOLE_BOOT_LOG: &str = "\
Booting from Hard Disk 0...\r\n\
[    0.000000] Linux version 6.1.0 (builder@mock) #1 SMP\r\n\
[    0.412731] Run /sbin/init as init process\r\n\
\r\n\
Welcome to the mock console!\r\n\
login: ";

fn validate_instance(create: &InstanceCreate) -> Result<()> {
    validate_name(&create.name)?;
    if create.ncpus == 0 || create.ncpus > MAX_NCPUS {
        return Err(Error::invalid_request(format!(
            "ncpus must be between 1 and {MAX_NCPUS}, got {}",
            create.ncpus
        )));
    }
    if create.memory < MIN_MEMORY_BYTES {
        return Err(Error::invalid_request("memory must be at least 1 GiB"));
    }
    if create.memory > MAX_MEMORY_BYTES {
        return Err(Error::invalid_request("memory must be at most 256 GiB"));
    }
    Ok(())
}

/// Index of the instance and its project id after checking the caller has `check` on the project.
fn resolve_instance(
    db: &MockDb,
    current_user: &CurrentUser,
    instance: &str,
    project: Option<&str>,
    check: fn(&MockDb, &CurrentUser, Uuid) -> Result<()>,
) -> Result<usize> {
    let idx = db.resolve(&db.instances, instance, project)?;
    check(db, current_user, db.instances[idx].project_id)?;
    Ok(idx)
}

#[utoipa::path(
    get,
    path = "/v1/instances",
    tag = "instances",
    summary = "List instances in a project",
    params(ProjectListQuery),
    responses(
        (status = 200, description = "Page of instances", body = ResultsPage<Instance>),
        (status = 403, description = "Not a project viewer", body = crate::errors::ErrorBody),
        (status = 404, description = "No such project", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_instances(
    State(state): State<AppState>,
    Query(query): Query<ProjectListQuery>,
    current_user: CurrentUser,
) -> Result<Json<ResultsPage<Instance>>> {
    let db = state.db.read().await;
    let project_id = db.project(&query.project)?.id;
    require_project_viewer(&db, &current_user, project_id)?;

    let instances: Vec<Instance> = MockDb::in_project(&db.instances, project_id).into_iter().cloned().collect();
    Ok(Json(page(&state, &instances, &query.pagination)))
}

#[utoipa::path(
    post,
    path = "/v1/instances",
    tag = "instances",
    summary = "Create an instance",
    params(ProjectSelector),
    request_body = InstanceCreate,
    responses(
        (status = 201, description = "Instance created", body = Instance),
        (status = 400, description = "Invalid request or duplicate name", body = crate::errors::ErrorBody),
        (status = 403, description = "Not a project collaborator", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_instance(
    State(state): State<AppState>,
    Query(selector): Query<ProjectSelector>,
    current_user: CurrentUser,
    Json(create): Json<InstanceCreate>,
) -> Result<(StatusCode, Json<Instance>)> {
    let mut db = state.db.write().await;
    let project_id = db.project(&selector.project)?.id;
    require_project_collab(&db, &current_user, project_id)?;
    db.ensure_unique_name(&db.instances, project_id, &create.name)?;
    validate_instance(&create)?;

    let now = Utc::now();
    let instance = Instance {
        id: Uuid::new_v4(),
        hostname: create.hostname.unwrap_or_else(|| create.name.clone()),
        name: create.name,
        description: create.description,
        project_id,
        ncpus: create.ncpus,
        memory: create.memory,
        run_state: if create.start {
            InstanceState::Running
        } else {
            InstanceState::Stopped
        },
        time_created: now,
        time_modified: now,
        time_run_state_updated: now,
    };
    db.instances.push(instance.clone());

    info!(instance = %instance.name, id = %abbrev_uuid(&instance.id), "created instance");
    Ok((StatusCode::CREATED, Json(instance)))
}

#[utoipa::path(
    get,
    path = "/v1/instances/{instance}",
    tag = "instances",
    summary = "Fetch an instance",
    params(
        ("instance" = String, Path, description = "Instance name or id"),
        OptionalProjectSelector,
    ),
    responses(
        (status = 200, description = "The instance", body = Instance),
        (status = 404, description = "No such instance", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(instance = %instance))]
pub async fn get_instance(
    State(state): State<AppState>,
    Path(instance): Path<String>,
    Query(selector): Query<OptionalProjectSelector>,
    current_user: CurrentUser,
) -> Result<Json<Instance>> {
    let db = state.db.read().await;
    let idx = resolve_instance(
        &db,
        &current_user,
        &instance,
        selector.project.as_deref(),
        require_project_viewer,
    )?;
    Ok(Json(db.instances[idx].clone()))
}

/// Move an instance to `target`, refusing while it is mid-transition the other way.
async fn transition(
    state: &AppState,
    current_user: &CurrentUser,
    instance: &str,
    project: Option<&str>,
    target: InstanceState,
) -> Result<Instance> {
    let mut db = state.db.write().await;
    let idx = resolve_instance(&db, current_user, instance, project, require_project_collab)?;

    let instance = &mut db.instances[idx];
    let blocked_by = match target {
        InstanceState::Running => InstanceState::Stopping,
        _ => InstanceState::Starting,
    };
    if instance.run_state == blocked_by {
        return Err(Error::invalid_request(format!(
            "instance {} cannot change state while {:?}",
            instance.name, instance.run_state
        )));
    }
    if instance.run_state != target {
        instance.run_state = target;
        instance.time_run_state_updated = Utc::now();
        info!(instance = %instance.name, state = ?target, "instance state changed");
    }
    Ok(instance.clone())
}

#[utoipa::path(
    post,
    path = "/v1/instances/{instance}/start",
    tag = "instances",
    summary = "Start an instance",
    params(
        ("instance" = String, Path, description = "Instance name or id"),
        OptionalProjectSelector,
    ),
    responses(
        (status = 202, description = "Instance running", body = Instance),
        (status = 400, description = "Instance is stopping", body = crate::errors::ErrorBody),
        (status = 403, description = "Not a project collaborator", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(instance = %instance))]
pub async fn start_instance(
    State(state): State<AppState>,
    Path(instance): Path<String>,
    Query(selector): Query<OptionalProjectSelector>,
    current_user: CurrentUser,
) -> Result<(StatusCode, Json<Instance>)> {
    let instance = transition(
        &state,
        &current_user,
        &instance,
        selector.project.as_deref(),
        InstanceState::Running,
    )
    .await?;
    Ok((StatusCode::ACCEPTED, Json(instance)))
}

#[utoipa::path(
    post,
    path = "/v1/instances/{instance}/stop",
    tag = "instances",
    summary = "Stop an instance",
    params(
        ("instance" = String, Path, description = "Instance name or id"),
        OptionalProjectSelector,
    ),
    responses(
        (status = 202, description = "Instance stopped", body = Instance),
        (status = 400, description = "Instance is starting", body = crate::errors::ErrorBody),
        (status = 403, description = "Not a project collaborator", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(instance = %instance))]
pub async fn stop_instance(
    State(state): State<AppState>,
    Path(instance): Path<String>,
    Query(selector): Query<OptionalProjectSelector>,
    current_user: CurrentUser,
) -> Result<(StatusCode, Json<Instance>)> {
    let instance = transition(
        &state,
        &current_user,
        &instance,
        selector.project.as_deref(),
        InstanceState::Stopped,
    )
    .await?;
    Ok((StatusCode::ACCEPTED, Json(instance)))
}

#[utoipa::path(
    get,
    path = "/v1/instances/{instance}/serial-console",
    tag = "instances",
    summary = "Read an instance's serial console",
    params(
        ("instance" = String, Path, description = "Instance name or id"),
        OptionalProjectSelector,
    ),
    responses(
        (status = 200, description = "Console output", body = InstanceSerialConsoleData),
        (status = 503, description = "Instance is not running", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(instance = %instance))]
pub async fn get_serial_console(
    State(state): State<AppState>,
    Path(instance): Path<String>,
    Query(selector): Query<OptionalProjectSelector>,
    current_user: CurrentUser,
) -> Result<Json<InstanceSerialConsoleData>> {
    let db = state.db.read().await;
    let idx = resolve_instance(
        &db,
        &current_user,
        &instance,
        selector.project.as_deref(),
        require_project_viewer,
    )?;
    if db.instances[idx].run_state != InstanceState::Running {
        return Err(Error::unavailable(format!(
            "serial console is only available while instance {} is running",
            db.instances[idx].name
        )));
    }

    let data = SERIAL_CONSOLE_BOOT_LOG.as_bytes().to_vec();
    Ok(Json(InstanceSerialConsoleData {
        last_byte_offset: data.len() as u64,
        data,
    }))
}
