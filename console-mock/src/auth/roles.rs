//! Role checks against the role assignment table.
//!
//! A role is satisfied by itself or any stronger role, per the fixed table in
//! [`role_or_stronger`]. A user holds a role on a resource if they, or any group they belong to,
//! are assigned a sufficient role on exactly that `(resource_type, resource_id)` pair.
//!
//! Roles are not inherited: being silo admin does not make you admin of the silo's projects. The
//! real API does cascade roles down the hierarchy; the mock deliberately keeps the simpler rule so
//! that fixtures spell out every grant.

use tracing::{debug, info};
use uuid::Uuid;

use crate::api::models::policy::RoleKey;
use crate::api::models::users::CurrentUser;
use crate::db::{FLEET_ID, MockDb};
use crate::errors::{Error, Result};
use crate::types::{ProjectId, ResourceType, UserId, abbrev_uuid};

/// Roles that confer at least the permissions of `role`.
pub fn role_or_stronger(role: RoleKey) -> &'static [RoleKey] {
    match role {
        RoleKey::Viewer => &[RoleKey::Viewer, RoleKey::Collaborator, RoleKey::Admin],
        RoleKey::Collaborator => &[RoleKey::Collaborator, RoleKey::Admin],
        RoleKey::Admin => &[RoleKey::Admin],
    }
}

/// Identities whose role assignments count for `user_id`: the user and each of their groups.
fn actor_ids(db: &MockDb, user_id: UserId) -> Vec<Uuid> {
    std::iter::once(user_id)
        .chain(
            db.group_memberships
                .iter()
                .filter(|m| m.user_id == user_id)
                .map(|m| m.group_id),
        )
        .collect()
}

pub fn user_has_role(
    db: &MockDb,
    user_id: UserId,
    resource_type: ResourceType,
    resource_id: Uuid,
    role: RoleKey,
) -> bool {
    let actors = actor_ids(db, user_id);
    let sufficient = role_or_stronger(role);
    db.role_assignments.iter().any(|ra| {
        ra.resource_type == resource_type
            && ra.resource_id == resource_id
            && actors.contains(&ra.identity_id)
            && sufficient.contains(&ra.role_name)
    })
}

/// Fail with `Forbidden` unless the user holds `role` (or stronger) on the resource.
pub fn require_role(
    db: &MockDb,
    user: &CurrentUser,
    resource_type: ResourceType,
    resource_id: Uuid,
    role: RoleKey,
) -> Result<()> {
    if user_has_role(db, user.id, resource_type, resource_id, role) {
        debug!(
            user = %abbrev_uuid(&user.id),
            %resource_type,
            resource = %abbrev_uuid(&resource_id),
            %role,
            "role check passed"
        );
        return Ok(());
    }
    info!(
        user = %user.display_name,
        %resource_type,
        resource = %abbrev_uuid(&resource_id),
        %role,
        "role check failed"
    );
    Err(Error::forbidden())
}

pub fn require_fleet_viewer(db: &MockDb, user: &CurrentUser) -> Result<()> {
    require_role(db, user, ResourceType::Fleet, FLEET_ID, RoleKey::Viewer)
}

pub fn require_fleet_collab(db: &MockDb, user: &CurrentUser) -> Result<()> {
    require_role(db, user, ResourceType::Fleet, FLEET_ID, RoleKey::Collaborator)
}

pub fn require_fleet_admin(db: &MockDb, user: &CurrentUser) -> Result<()> {
    require_role(db, user, ResourceType::Fleet, FLEET_ID, RoleKey::Admin)
}

pub fn require_silo_viewer(db: &MockDb, user: &CurrentUser) -> Result<()> {
    require_role(db, user, ResourceType::Silo, db.silo.id, RoleKey::Viewer)
}

pub fn require_silo_collab(db: &MockDb, user: &CurrentUser) -> Result<()> {
    require_role(db, user, ResourceType::Silo, db.silo.id, RoleKey::Collaborator)
}

pub fn require_silo_admin(db: &MockDb, user: &CurrentUser) -> Result<()> {
    require_role(db, user, ResourceType::Silo, db.silo.id, RoleKey::Admin)
}

pub fn require_project_viewer(db: &MockDb, user: &CurrentUser, project_id: ProjectId) -> Result<()> {
    require_role(db, user, ResourceType::Project, project_id, RoleKey::Viewer)
}

pub fn require_project_collab(db: &MockDb, user: &CurrentUser, project_id: ProjectId) -> Result<()> {
    require_role(db, user, ResourceType::Project, project_id, RoleKey::Collaborator)
}

pub fn require_project_admin(db: &MockDb, user: &CurrentUser, project_id: ProjectId) -> Result<()> {
    require_role(db, user, ResourceType::Project, project_id, RoleKey::Admin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::policy::RoleAssignment;
    use crate::errors::ErrorKind;
    use crate::types::IdentityType;

    fn current(db: &MockDb, name: &str) -> CurrentUser {
        let user = db.user_by_display_name(name).unwrap();
        CurrentUser {
            id: user.id,
            display_name: user.display_name.clone(),
            silo_id: db.silo.id,
            silo_name: db.silo.name.clone(),
            fleet_viewer: false,
        }
    }

    #[test]
    fn test_role_closures() {
        assert_eq!(role_or_stronger(RoleKey::Admin), &[RoleKey::Admin]);
        assert!(role_or_stronger(RoleKey::Viewer).contains(&RoleKey::Admin));
        assert!(role_or_stronger(RoleKey::Collaborator).contains(&RoleKey::Admin));
        assert!(!role_or_stronger(RoleKey::Collaborator).contains(&RoleKey::Viewer));
    }

    #[test]
    fn test_admin_satisfies_every_role_on_that_resource() {
        let db = MockDb::seeded();
        let hannah = current(&db, "Hannah Arendt");
        let project = db.project("mock-project").unwrap().id;
        for role in [RoleKey::Viewer, RoleKey::Collaborator, RoleKey::Admin] {
            assert!(user_has_role(&db, hannah.id, ResourceType::Project, project, role));
        }
    }

    #[test]
    fn test_no_role_on_other_resource_of_same_type() {
        let db = MockDb::seeded();
        let jacob = current(&db, "Jacob Klein");
        let mine = db.project("mock-project").unwrap().id;
        let other = db.project("other-project").unwrap().id;
        assert!(user_has_role(&db, jacob.id, ResourceType::Project, mine, RoleKey::Viewer));
        assert!(!user_has_role(&db, jacob.id, ResourceType::Project, other, RoleKey::Viewer));
        assert_eq!(
            require_project_viewer(&db, &jacob, other).unwrap_err().kind,
            ErrorKind::Forbidden
        );
    }

    #[test]
    fn test_collaborator_is_not_admin() {
        let db = MockDb::seeded();
        let jacob = current(&db, "Jacob Klein");
        let project = db.project("mock-project").unwrap().id;
        assert!(require_project_viewer(&db, &jacob, project).is_ok());
        assert!(require_project_collab(&db, &jacob, project).is_ok());
        assert!(require_project_admin(&db, &jacob, project).is_err());
    }

    #[test]
    fn test_role_through_group() {
        let db = MockDb::seeded();
        // Hans is silo viewer only through web-devs
        let hans = current(&db, "Hans Jonas");
        assert!(require_silo_viewer(&db, &hans).is_ok());
        assert!(require_silo_collab(&db, &hans).is_err());
    }

    #[test]
    fn test_no_inheritance_from_silo_to_project() {
        let mut db = MockDb::seeded();
        let simone = current(&db, "Simone de Beauvoir");
        let silo_id = db.silo.id;
        db.role_assignments.push(RoleAssignment {
            resource_type: ResourceType::Silo,
            resource_id: silo_id,
            identity_id: simone.id,
            identity_type: IdentityType::SiloUser,
            role_name: RoleKey::Admin,
        });
        let project = db.project("mock-project").unwrap().id;
        assert!(require_silo_admin(&db, &simone).is_ok());
        assert!(require_project_viewer(&db, &simone, project).is_err());
    }

    #[test]
    fn test_roleless_user_is_forbidden_everywhere() {
        let db = MockDb::seeded();
        let simone = current(&db, "Simone de Beauvoir");
        assert!(require_fleet_viewer(&db, &simone).is_err());
        assert!(require_silo_viewer(&db, &simone).is_err());
        for project in &db.projects {
            assert!(require_project_viewer(&db, &simone, project.id).is_err());
        }
    }

    #[test]
    fn test_fleet_roles() {
        let db = MockDb::seeded();
        let jane = current(&db, "Jane Austen");
        assert!(require_fleet_viewer(&db, &jane).is_ok());
        assert!(require_fleet_collab(&db, &jane).is_err());
        let hannah = current(&db, "Hannah Arendt");
        assert!(require_fleet_admin(&db, &hannah).is_ok());
    }
}
