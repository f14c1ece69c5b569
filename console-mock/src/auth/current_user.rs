//! Resolving the acting user of a request.
//!
//! There is no authentication in the mock. The console picks who it acts as by setting a cookie
//! (`msw-user` by default) to a user's display name. Requests without the cookie, or naming
//! nobody we know, act as the first seeded user, who holds every role.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{debug, instrument, trace};

use super::roles::user_has_role;
use crate::{
    AppState,
    api::models::{policy::RoleKey, users::CurrentUser},
    db::{FLEET_ID, MockDb},
    errors::{Error, Result},
    types::ResourceType,
};

/// Value of cookie `name` in the request, with `%20` decoded to spaces.
fn cookie_value(parts: &Parts, name: &str) -> Result<Option<String>> {
    let Some(header) = parts.headers.get(axum::http::header::COOKIE) else {
        return Ok(None);
    };
    let cookie_str = header
        .to_str()
        .map_err(|e| Error::invalid_request(format!("Invalid cookie header: {e}")))?;

    Ok(cookie_str
        .split(';')
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.replace("%20", " ")))
}

/// Build the [`CurrentUser`] for `display_name`, falling back to the first user.
pub fn resolve_user(db: &MockDb, display_name: Option<&str>) -> Result<CurrentUser> {
    let user = match display_name.and_then(|name| db.user_by_display_name(name)) {
        Some(user) => user,
        None => {
            if let Some(name) = display_name {
                debug!(name, "unknown user in cookie, acting as default user");
            }
            db.users
                .first()
                .ok_or_else(|| Error::internal("mock store has no users"))?
        }
    };

    Ok(CurrentUser {
        id: user.id,
        display_name: user.display_name.clone(),
        silo_id: db.silo.id,
        silo_name: db.silo.name.clone(),
        fleet_viewer: user_has_role(db, user.id, ResourceType::Fleet, FLEET_ID, RoleKey::Viewer),
    })
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip_all)]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let name = cookie_value(parts, &state.config.auth.user_cookie)?;
        trace!(?name, "user cookie");

        let db = state.db.read().await;
        resolve_user(&db, name.as_deref())
    }
}
