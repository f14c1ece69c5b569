use axum::{
    Json,
    extract::{Query, State},
};

use super::page;
use crate::{
    AppState,
    api::models::{
        groups::Group,
        pagination::{PaginationParams, ResultsPage},
        users::{CurrentUser, User, UserListQuery},
    },
    auth::roles::require_silo_viewer,
    errors::{Error, Result},
};

#[utoipa::path(
    get,
    path = "/v1/me",
    tag = "identity",
    summary = "Fetch the acting user",
    responses(
        (status = 200, description = "The user requests act as", body = CurrentUser),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_current_user(current_user: CurrentUser) -> Result<Json<CurrentUser>> {
    Ok(Json(current_user))
}

#[utoipa::path(
    get,
    path = "/v1/me/groups",
    tag = "identity",
    summary = "List the acting user's groups",
    params(PaginationParams),
    responses(
        (status = 200, description = "Groups the user belongs to", body = ResultsPage<Group>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_current_user_groups(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    current_user: CurrentUser,
) -> Result<Json<ResultsPage<Group>>> {
    let db = state.db.read().await;
    let groups: Vec<Group> = db.groups_for_user(current_user.id).into_iter().cloned().collect();
    Ok(Json(page(&state, &groups, &pagination)))
}

#[utoipa::path(
    get,
    path = "/v1/users",
    tag = "identity",
    summary = "List users in the silo",
    params(UserListQuery),
    responses(
        (status = 200, description = "Page of users", body = ResultsPage<User>),
        (status = 403, description = "Not a silo viewer", body = crate::errors::ErrorBody),
        (status = 404, description = "Group filter names no group", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
    current_user: CurrentUser,
) -> Result<Json<ResultsPage<User>>> {
    let db = state.db.read().await;
    require_silo_viewer(&db, &current_user)?;

    let users: Vec<User> = match query.group {
        Some(group_id) => {
            if !db.groups.iter().any(|g| g.id == group_id) {
                return Err(Error::not_found("group", group_id));
            }
            db.users
                .iter()
                .filter(|u| {
                    db.group_memberships
                        .iter()
                        .any(|m| m.group_id == group_id && m.user_id == u.id)
                })
                .cloned()
                .collect()
        }
        None => db.users.clone(),
    };

    Ok(Json(page(&state, &users, &query.pagination)))
}

#[utoipa::path(
    get,
    path = "/v1/groups",
    tag = "identity",
    summary = "List groups in the silo",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of groups", body = ResultsPage<Group>),
        (status = 403, description = "Not a silo viewer", body = crate::errors::ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_groups(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    current_user: CurrentUser,
) -> Result<Json<ResultsPage<Group>>> {
    let db = state.db.read().await;
    require_silo_viewer(&db, &current_user)?;
    Ok(Json(page(&state, &db.groups, &pagination)))
}

#[cfg(test)]
mod tests {
    use crate::api::models::{
        groups::Group,
        pagination::ResultsPage,
        users::{CurrentUser, User},
    };
    use crate::test_utils::*;
    use axum::http::StatusCode;

    #[test_log::test(tokio::test)]
    async fn test_me_defaults_to_first_user() {
        let app = create_test_app();
        let response = app.get("/v1/me").await;
        response.assert_status_ok();
        let me: CurrentUser = response.json();
        assert_eq!(me.display_name, "Hannah Arendt");
        assert!(me.fleet_viewer);
    }

    #[test_log::test(tokio::test)]
    async fn test_me_follows_cookie() {
        let app = create_test_app();
        let response = app.get("/v1/me").add_header("cookie", user_cookie("Hans Jonas")).await;
        let me: CurrentUser = response.json();
        assert_eq!(me.display_name, "Hans Jonas");
        assert!(!me.fleet_viewer);

        let groups: ResultsPage<Group> = app
            .get("/v1/me/groups")
            .add_header("cookie", user_cookie("Hans Jonas"))
            .await
            .json();
        let names: Vec<_> = groups.items.into_iter().map(|g| g.display_name).collect();
        assert_eq!(names, vec!["web-devs", "real-estate-devs"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_list_users_paginates() {
        let app = create_test_app();
        let first: ResultsPage<User> = app.get("/v1/users?limit=3").await.json();
        assert_eq!(first.items.len(), 3);
        let token = first.next_page.expect("more users");
        assert_eq!(token, first.items[2].id.to_string());

        let second: ResultsPage<User> = app.get(&format!("/v1/users?limit=3&page_token={token}")).await.json();
        assert_eq!(second.items.len(), 2);
        assert_eq!(second.next_page, None);
        assert_eq!(second.items[1].display_name, "Jane Austen");
    }

    #[test_log::test(tokio::test)]
    async fn test_list_users_in_group() {
        let app = create_test_app();
        let groups: ResultsPage<Group> = app.get("/v1/groups").await.json();
        let kernel_devs = groups.items.iter().find(|g| g.display_name == "kernel-devs").unwrap();

        let users: ResultsPage<User> = app.get(&format!("/v1/users?group={}", kernel_devs.id)).await.json();
        let names: Vec<_> = users.items.into_iter().map(|u| u.display_name).collect();
        assert_eq!(names, vec!["Hannah Arendt", "Jacob Klein"]);

        app.get(&format!("/v1/users?group={}", uuid::Uuid::new_v4()))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[test_log::test(tokio::test)]
    async fn test_list_groups_requires_silo_viewer() {
        let app = create_test_app();
        let response = app.get("/v1/groups").add_header("cookie", user_cookie("Simone de Beauvoir")).await;
        response.assert_status(StatusCode::FORBIDDEN);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error_code"], "Forbidden");
        assert_eq!(body["message"], "action not authorized");
    }
}
