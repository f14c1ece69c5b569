//! Fixture data the mock server starts with.
//!
//! The first user holds every role and is who requests act as when no user cookie is sent.
//! Simone de Beauvoir holds no role anywhere and is useful for exercising permission errors.
//!
//! | User               | Groups                     | Roles                                          |
//! |--------------------|----------------------------|------------------------------------------------|
//! | Hannah Arendt      | kernel-devs                | fleet admin, silo admin, admin of both projects|
//! | Hans Jonas         | web-devs, real-estate-devs | silo viewer (via web-devs)                     |
//! | Jacob Klein        | kernel-devs                | mock-project collaborator                      |
//! | Simone de Beauvoir |                            |                                                |
//! | Jane Austen        | real-estate-devs           | other-project admin, fleet viewer              |

use chrono::{Duration, Utc};
use uuid::Uuid;

use super::{FLEET_ID, MockDb, Silo};
use crate::api::models::affinity_groups::{AffinityGroup, AffinityGroupMember, AffinityPolicy};
use crate::api::models::disks::{Disk, DiskState, GIB};
use crate::api::models::floating_ips::FloatingIp;
use crate::api::models::groups::{Group, GroupMembership};
use crate::api::models::hardware::{PhysicalDisk, Sled};
use crate::api::models::instances::{Instance, InstanceState};
use crate::api::models::ip_pools::{IpPool, IpPoolRange};
use crate::api::models::policy::{RoleAssignment, RoleKey};
use crate::api::models::projects::Project;
use crate::api::models::users::User;
use crate::net::IpRange;
use crate::types::{IdentityType, ResourceType};

const TIB: u64 = 1 << 40;

fn id(n: u128) -> Uuid {
    Uuid::from_u128(0x5eed_0000_0000_4000_8000_000000000000 | n)
}

fn assign(
    resource_type: ResourceType,
    resource_id: Uuid,
    identity_id: Uuid,
    identity_type: IdentityType,
    role_name: RoleKey,
) -> RoleAssignment {
    RoleAssignment {
        resource_type,
        resource_id,
        identity_id,
        identity_type,
        role_name,
    }
}

pub(super) fn build() -> MockDb {
    let now = Utc::now();
    let created = now - Duration::days(30);

    let mut db = MockDb::empty(Silo {
        id: id(0x1),
        name: "maze-war".to_string(),
    });
    let silo_id = db.silo.id;

    // Users and groups
    let user = |n: u128, name: &str| User {
        id: id(0x100 + n),
        display_name: name.to_string(),
        silo_id,
        time_created: created,
    };
    let hannah = user(1, "Hannah Arendt");
    let hans = user(2, "Hans Jonas");
    let jacob = user(3, "Jacob Klein");
    let simone = user(4, "Simone de Beauvoir");
    let jane = user(5, "Jane Austen");

    let group = |n: u128, name: &str| Group {
        id: id(0x200 + n),
        display_name: name.to_string(),
        silo_id,
    };
    let kernel_devs = group(1, "kernel-devs");
    let web_devs = group(2, "web-devs");
    let real_estate_devs = group(3, "real-estate-devs");

    let member = |user: &User, group: &Group| GroupMembership {
        user_id: user.id,
        group_id: group.id,
    };
    db.group_memberships = vec![
        member(&hannah, &kernel_devs),
        member(&hans, &web_devs),
        member(&hans, &real_estate_devs),
        member(&jacob, &kernel_devs),
        member(&jane, &real_estate_devs),
    ];

    // Projects
    let project = |n: u128, name: &str, description: &str| Project {
        id: id(0x300 + n),
        name: name.to_string(),
        description: description.to_string(),
        time_created: created,
        time_modified: created,
    };
    let mock_project = project(1, "mock-project", "a fake project");
    let other_project = project(2, "other-project", "another fake project");

    use IdentityType::{SiloGroup, SiloUser};
    use ResourceType::{Fleet, Project as ProjectResource, Silo as SiloResource};
    db.role_assignments = vec![
        assign(Fleet, FLEET_ID, hannah.id, SiloUser, RoleKey::Admin),
        assign(Fleet, FLEET_ID, jane.id, SiloUser, RoleKey::Viewer),
        assign(SiloResource, silo_id, hannah.id, SiloUser, RoleKey::Admin),
        assign(SiloResource, silo_id, web_devs.id, SiloGroup, RoleKey::Viewer),
        assign(ProjectResource, mock_project.id, hannah.id, SiloUser, RoleKey::Admin),
        assign(ProjectResource, mock_project.id, jacob.id, SiloUser, RoleKey::Collaborator),
        assign(ProjectResource, other_project.id, hannah.id, SiloUser, RoleKey::Admin),
        assign(ProjectResource, other_project.id, jane.id, SiloUser, RoleKey::Admin),
    ];

    // Instances
    let instance = |n: u128, name: &str, ncpus: u16, memory_gib: u64, run_state: InstanceState| Instance {
        id: id(0x400 + n),
        name: name.to_string(),
        description: format!("an instance called {name}"),
        project_id: mock_project.id,
        hostname: name.to_string(),
        ncpus,
        memory: memory_gib * GIB,
        run_state,
        time_created: created,
        time_modified: created,
        time_run_state_updated: now - Duration::hours(2),
    };
    let db1 = instance(1, "db1", 4, 8, InstanceState::Running);
    let you_fail = instance(2, "you-fail", 2, 4, InstanceState::Stopped);
    let not_there_yet = instance(3, "not-there-yet", 1, 2, InstanceState::Starting);

    // Disks
    let disk = |n: u128, name: &str, size_gib: u64, state: DiskState| Disk {
        id: id(0x500 + n),
        name: name.to_string(),
        description: String::new(),
        project_id: mock_project.id,
        size: size_gib * GIB,
        block_size: 4096,
        state,
        device_path: format!("/mnt/{name}"),
        time_created: created,
        time_modified: created,
    };
    db.disks = vec![
        disk(1, "disk-1", 2, DiskState::Attached { instance: db1.id }),
        disk(2, "disk-2", 4, DiskState::Detached),
        disk(3, "disk-3", 6, DiskState::Detached),
    ];

    // Affinity groups
    let affinity_group = |n: u128, name: &str, policy: AffinityPolicy| AffinityGroup {
        id: id(0x600 + n),
        name: name.to_string(),
        description: String::new(),
        project_id: mock_project.id,
        policy,
        time_created: created,
    };
    let romulus = affinity_group(1, "romulus", AffinityPolicy::Allow);
    let remus = affinity_group(2, "remus", AffinityPolicy::Fail);
    db.affinity_group_members = vec![
        AffinityGroupMember {
            group_id: romulus.id,
            instance_id: db1.id,
        },
        AffinityGroupMember {
            group_id: romulus.id,
            instance_id: you_fail.id,
        },
    ];
    db.affinity_groups = vec![romulus, remus];

    // IP pools
    let pool = |n: u128, name: &str, is_default: bool| IpPool {
        id: id(0x700 + n),
        name: name.to_string(),
        description: String::new(),
        is_default,
        time_created: created,
    };
    let pool_1 = pool(1, "ip-pool-1", true);
    let pool_2 = pool(2, "ip-pool-2", false);
    let pool_3 = pool(3, "ip-pool-3", false);

    let range = |n: u128, pool: &IpPool, first: &str, last: &str| IpPoolRange {
        id: id(0x800 + n),
        ip_pool_id: pool.id,
        range: IpRange::new(first, last),
        time_created: created,
    };
    db.ip_pool_ranges = vec![
        range(1, &pool_1, "123.4.56.0", "123.4.56.20"),
        range(2, &pool_1, "123.4.56.100", "123.4.56.104"),
        range(3, &pool_2, "fd00::1", "fd00::20"),
    ];

    // Floating IPs; the addresses must come from ip-pool-1's ranges
    let floating_ip = |n: u128, name: &str, ip: [u8; 4], instance_id: Option<Uuid>| FloatingIp {
        id: id(0x900 + n),
        name: name.to_string(),
        description: String::new(),
        project_id: mock_project.id,
        ip: ip.into(),
        ip_pool_id: pool_1.id,
        instance_id,
        time_created: created,
    };
    db.floating_ips = vec![
        floating_ip(1, "rootbeer-float", [123, 4, 56, 4], Some(db1.id)),
        floating_ip(2, "cola-float", [123, 4, 56, 5], None),
    ];
    db.ip_pools = vec![pool_1, pool_2, pool_3];

    // Hardware
    let sled = |n: u128, serial: &str| Sled {
        id: id(0xa00 + n),
        serial: serial.to_string(),
        usable_hardware_threads: 128,
        usable_physical_ram: TIB,
    };
    db.sleds = vec![sled(1, "BRM42220001"), sled(2, "BRM42220002")];
    db.physical_disks = db
        .sleds
        .iter()
        .enumerate()
        .flat_map(|(s, sled)| {
            (0..4u128).map(move |d| PhysicalDisk {
                id: id(0xb00 + (s as u128) * 0x10 + d),
                sled_id: sled.id,
                size_bytes: 3 * TIB,
            })
        })
        .collect();

    db.instances = vec![db1, you_fail, not_there_yet];
    db.projects = vec![mock_project, other_project];
    db.users = vec![hannah, hans, jacob, simone, jane];
    db.groups = vec![kernel_devs, web_devs, real_estate_devs];
    db
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::ip_in_any_range;
    use std::collections::HashSet;

    #[test]
    fn test_first_user_is_default_actor() {
        let db = build();
        assert_eq!(db.users[0].display_name, "Hannah Arendt");
    }

    #[test]
    fn test_ids_are_unique() {
        let db = build();
        let mut ids = HashSet::new();
        let all = db
            .users
            .iter()
            .map(|u| u.id)
            .chain(db.groups.iter().map(|g| g.id))
            .chain(db.projects.iter().map(|p| p.id))
            .chain(db.instances.iter().map(|i| i.id))
            .chain(db.disks.iter().map(|d| d.id))
            .chain(db.affinity_groups.iter().map(|g| g.id))
            .chain(db.ip_pools.iter().map(|p| p.id))
            .chain(db.ip_pool_ranges.iter().map(|r| r.id))
            .chain(db.floating_ips.iter().map(|f| f.id))
            .chain(db.sleds.iter().map(|s| s.id))
            .chain(db.physical_disks.iter().map(|d| d.id));
        for id in all {
            assert!(ids.insert(id), "duplicate id {id}");
        }
    }

    #[test]
    fn test_floating_ips_inside_their_pool() {
        let db = build();
        for fip in &db.floating_ips {
            let ranges = db.pool_ranges(fip.ip_pool_id);
            assert!(ip_in_any_range(&fip.ip.to_string(), &ranges), "{} outside its pool", fip.name);
        }
    }

    #[test]
    fn test_attached_disk_points_at_existing_instance() {
        let db = build();
        let attached: Vec<_> = db
            .disks
            .iter()
            .filter_map(|d| match d.state {
                DiskState::Attached { instance } => Some(instance),
                DiskState::Detached => None,
            })
            .collect();
        assert_eq!(attached.len(), 1);
        assert!(db.instances.iter().any(|i| i.id == attached[0]));
    }
}
