//! In-memory store backing the mock API.
//!
//! [`MockDb`] holds every resource the console can see. It is constructed explicitly (normally
//! via [`MockDb::seeded`]) and owned by [`crate::AppState`]; tests build a fresh one per server, so
//! nothing leaks between test cases.
//!
//! Collections keep insertion order, which is also the order list endpoints page through.
//!
//! # Lookups
//!
//! Project scoped resources are addressed either by UUID alone or by name together with the
//! `project` selector, the same way the real API resolves them:
//!
//! ```ignore
//! let idx = db.resolve(&db.instances, "db1", Some("mock-project"))?;
//! let instance = &db.instances[idx];
//! ```

pub mod seed;

use std::collections::HashSet;
use std::net::IpAddr;

use crate::api::models::affinity_groups::{AffinityGroup, AffinityGroupMember};
use crate::api::models::disks::Disk;
use crate::api::models::floating_ips::FloatingIp;
use crate::api::models::groups::{Group, GroupMembership};
use crate::api::models::hardware::{PhysicalDisk, Sled};
use crate::api::models::instances::Instance;
use crate::api::models::ip_pools::{IpPool, IpPoolRange};
use crate::api::models::pagination::HasId;
use crate::api::models::policy::{Policy, PolicyRoleAssignment, RoleAssignment};
use crate::api::models::projects::Project;
use crate::api::models::users::User;
use crate::errors::{Error, Result};
use crate::net::IpRange;
use crate::sample_data::ClusterCapacity;
use crate::types::{IpPoolId, NameOrId, ProjectId, ResourceType, SiloId, UserId};
use uuid::Uuid;

/// Id of the single fleet. Fleet roles are assigned against it.
pub const FLEET_ID: Uuid = Uuid::from_u128(0x001de000_1334_4000_8000_000000000000);

/// The silo every seeded identity belongs to.
#[derive(Debug, Clone)]
pub struct Silo {
    pub id: SiloId,
    pub name: String,
}

/// A resource that lives inside a project and can be addressed by name within it.
pub trait ProjectScoped: HasId {
    const KIND: &'static str;
    fn name(&self) -> &str;
    fn project_id(&self) -> ProjectId;
}

macro_rules! project_scoped {
    ($ty:ty, $kind:literal) => {
        impl ProjectScoped for $ty {
            const KIND: &'static str = $kind;
            fn name(&self) -> &str {
                &self.name
            }
            fn project_id(&self) -> ProjectId {
                self.project_id
            }
        }
    };
}

project_scoped!(Instance, "instance");
project_scoped!(Disk, "disk");
project_scoped!(FloatingIp, "floating-ip");
project_scoped!(AffinityGroup, "affinity-group");

#[derive(Debug, Clone)]
pub struct MockDb {
    pub silo: Silo,
    pub users: Vec<User>,
    pub groups: Vec<Group>,
    pub group_memberships: Vec<GroupMembership>,
    pub role_assignments: Vec<RoleAssignment>,
    pub projects: Vec<Project>,
    pub instances: Vec<Instance>,
    pub disks: Vec<Disk>,
    pub affinity_groups: Vec<AffinityGroup>,
    pub affinity_group_members: Vec<AffinityGroupMember>,
    pub ip_pools: Vec<IpPool>,
    pub ip_pool_ranges: Vec<IpPoolRange>,
    pub floating_ips: Vec<FloatingIp>,
    pub sleds: Vec<Sled>,
    pub physical_disks: Vec<PhysicalDisk>,
}

impl MockDb {
    /// A store with a silo and nothing else in it.
    pub fn empty(silo: Silo) -> Self {
        Self {
            silo,
            users: Vec::new(),
            groups: Vec::new(),
            group_memberships: Vec::new(),
            role_assignments: Vec::new(),
            projects: Vec::new(),
            instances: Vec::new(),
            disks: Vec::new(),
            affinity_groups: Vec::new(),
            affinity_group_members: Vec::new(),
            ip_pools: Vec::new(),
            ip_pool_ranges: Vec::new(),
            floating_ips: Vec::new(),
            sleds: Vec::new(),
            physical_disks: Vec::new(),
        }
    }

    /// The standard fixture set, see [`seed`].
    pub fn seeded() -> Self {
        seed::build()
    }

    // Identities

    pub fn user_by_display_name(&self, name: &str) -> Option<&User> {
        self.users.iter().find(|u| u.display_name == name)
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn groups_for_user(&self, user_id: UserId) -> Vec<&Group> {
        let group_ids: HashSet<Uuid> = self
            .group_memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.group_id)
            .collect();
        self.groups.iter().filter(|g| group_ids.contains(&g.id)).collect()
    }

    /// Whether `id` names a user or group of this silo.
    pub fn identity_exists(&self, id: Uuid) -> bool {
        self.users.iter().any(|u| u.id == id) || self.groups.iter().any(|g| g.id == id)
    }

    // Policies

    pub fn policy(&self, resource_type: ResourceType, resource_id: Uuid) -> Policy {
        let role_assignments = self
            .role_assignments
            .iter()
            .filter(|ra| ra.resource_type == resource_type && ra.resource_id == resource_id)
            .map(|ra| PolicyRoleAssignment {
                identity_id: ra.identity_id,
                identity_type: ra.identity_type,
                role_name: ra.role_name,
            })
            .collect();
        Policy { role_assignments }
    }

    /// Replace every assignment on the resource with those in `policy`.
    pub fn set_policy(&mut self, resource_type: ResourceType, resource_id: Uuid, policy: &Policy) {
        self.role_assignments
            .retain(|ra| !(ra.resource_type == resource_type && ra.resource_id == resource_id));
        self.role_assignments
            .extend(policy.role_assignments.iter().map(|pra| RoleAssignment {
                resource_type,
                resource_id,
                identity_id: pra.identity_id,
                identity_type: pra.identity_type,
                role_name: pra.role_name,
            }));
    }

    // Projects and project scoped resources

    pub fn project(&self, selector: &str) -> Result<&Project> {
        let key = NameOrId::from(selector);
        self.projects
            .iter()
            .find(|p| key.matches(p.id, &p.name))
            .ok_or_else(|| Error::not_found("project", selector))
    }

    /// Index of the resource in `items` addressed by `selector`.
    ///
    /// A UUID selector is looked up directly. A name needs `project` to say which project it lives
    /// in.
    pub fn resolve<T: ProjectScoped>(&self, items: &[T], selector: &str, project: Option<&str>) -> Result<usize> {
        let position = match NameOrId::from(selector) {
            NameOrId::Id(id) => items.iter().position(|item| item.id() == id),
            NameOrId::Name(name) => {
                let project = project.ok_or_else(|| {
                    Error::invalid_request(format!("project is required when selecting a {} by name", T::KIND))
                })?;
                let project_id = self.project(project)?.id;
                items
                    .iter()
                    .position(|item| item.project_id() == project_id && item.name() == name)
            }
        };
        position.ok_or_else(|| Error::not_found(T::KIND, selector))
    }

    /// Error if a resource called `name` already exists in the project.
    pub fn ensure_unique_name<T: ProjectScoped>(&self, items: &[T], project_id: ProjectId, name: &str) -> Result<()> {
        if items.iter().any(|item| item.project_id() == project_id && item.name() == name) {
            return Err(Error::already_exists(T::KIND, name));
        }
        Ok(())
    }

    pub fn in_project<'a, T: ProjectScoped>(items: &'a [T], project_id: ProjectId) -> Vec<&'a T> {
        items.iter().filter(|item| item.project_id() == project_id).collect()
    }

    // IP pools

    pub fn ip_pool(&self, selector: &str) -> Result<&IpPool> {
        let key = NameOrId::from(selector);
        self.ip_pools
            .iter()
            .find(|p| key.matches(p.id, &p.name))
            .ok_or_else(|| Error::not_found("ip-pool", selector))
    }

    pub fn default_ip_pool(&self) -> Result<&IpPool> {
        self.ip_pools
            .iter()
            .find(|p| p.is_default)
            .ok_or_else(|| Error::not_found("ip-pool", "default"))
    }

    pub fn pool_ranges(&self, pool_id: IpPoolId) -> Vec<IpRange> {
        self.ip_pool_ranges
            .iter()
            .filter(|r| r.ip_pool_id == pool_id)
            .map(|r| r.range.clone())
            .collect()
    }

    /// Addresses of the pool currently held by floating IPs.
    pub fn allocated_ips(&self, pool_id: IpPoolId) -> HashSet<IpAddr> {
        self.floating_ips
            .iter()
            .filter(|f| f.ip_pool_id == pool_id)
            .map(|f| f.ip)
            .collect()
    }

    // Hardware

    pub fn capacity(&self) -> ClusterCapacity {
        ClusterCapacity::from_inventory(&self.sleds, &self.physical_disks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::policy::RoleKey;
    use crate::errors::ErrorKind;
    use crate::types::IdentityType;

    #[test]
    fn test_resolve_by_name_needs_project() {
        let db = MockDb::seeded();
        let err = db.resolve(&db.instances, "db1", None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidRequest);

        let idx = db.resolve(&db.instances, "db1", Some("mock-project")).unwrap();
        assert_eq!(db.instances[idx].name, "db1");
    }

    #[test]
    fn test_resolve_by_id_ignores_project() {
        let db = MockDb::seeded();
        let id = db.disks[1].id;
        let idx = db.resolve(&db.disks, &id.to_string(), None).unwrap();
        assert_eq!(idx, 1);
    }

    #[test]
    fn test_resolve_wrong_project_is_not_found() {
        let db = MockDb::seeded();
        let err = db.resolve(&db.instances, "db1", Some("other-project")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(err.message.contains("instance"));
    }

    #[test]
    fn test_unique_name() {
        let db = MockDb::seeded();
        let project_id = db.project("mock-project").unwrap().id;
        let err = db.ensure_unique_name(&db.disks, project_id, "disk-1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ObjectAlreadyExists);
        assert!(db.ensure_unique_name(&db.disks, project_id, "disk-99").is_ok());
    }

    #[test]
    fn test_set_policy_replaces_only_that_resource() {
        let mut db = MockDb::seeded();
        let project_id = db.project("mock-project").unwrap().id;
        let other_id = db.project("other-project").unwrap().id;
        let other_before = db.policy(ResourceType::Project, other_id);

        let user = db.users[2].id;
        let policy = Policy {
            role_assignments: vec![PolicyRoleAssignment {
                identity_id: user,
                identity_type: IdentityType::SiloUser,
                role_name: RoleKey::Viewer,
            }],
        };
        db.set_policy(ResourceType::Project, project_id, &policy);

        assert_eq!(db.policy(ResourceType::Project, project_id), policy);
        assert_eq!(db.policy(ResourceType::Project, other_id), other_before);
    }

    #[test]
    fn test_groups_for_user() {
        let db = MockDb::seeded();
        let hannah = db.user_by_display_name("Hannah Arendt").unwrap();
        let names: Vec<_> = db.groups_for_user(hannah.id).iter().map(|g| g.display_name.clone()).collect();
        assert_eq!(names, vec!["kernel-devs".to_string()]);

        let simone = db.user_by_display_name("Simone de Beauvoir").unwrap();
        assert!(db.groups_for_user(simone.id).is_empty());
    }

    #[test]
    fn test_default_pool_and_allocations() {
        let db = MockDb::seeded();
        let pool = db.default_ip_pool().unwrap();
        assert_eq!(pool.name, "ip-pool-1");
        let used = db.allocated_ips(pool.id);
        assert!(used.contains(&"123.4.56.4".parse().unwrap()));
        assert_eq!(db.pool_ranges(pool.id).len(), 2);
    }

    #[test]
    fn test_capacity_from_seed() {
        let cap = MockDb::seeded().capacity();
        assert!(cap.hardware_threads > 0);
        assert!(cap.physical_memory_bytes > 0);
        assert!(cap.disk_bytes > 0);
    }
}
