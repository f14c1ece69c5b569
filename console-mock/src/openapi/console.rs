//! OpenAPI documentation for the mock console API.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::api;
use crate::config::DEFAULT_USER_COOKIE;

/// The acting user is picked by a cookie holding their display name.
struct UserCookieAddon;

impl Modify for UserCookieAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "UserCookie".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    DEFAULT_USER_COOKIE,
                    "Display name of the user to act as, e.g. `Hannah%20Arendt`. Without it the first seeded \
                     user is used.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&UserCookieAddon),
    security(("UserCookie" = [])),
    paths(
        api::handlers::users::get_current_user,
        api::handlers::users::list_current_user_groups,
        api::handlers::users::list_users,
        api::handlers::users::list_groups,
        api::handlers::policy::get_silo_policy,
        api::handlers::policy::update_silo_policy,
        api::handlers::policy::get_system_policy,
        api::handlers::policy::update_system_policy,
        api::handlers::policy::get_project_policy,
        api::handlers::policy::update_project_policy,
        api::handlers::projects::list_projects,
        api::handlers::projects::create_project,
        api::handlers::projects::get_project,
        api::handlers::instances::list_instances,
        api::handlers::instances::create_instance,
        api::handlers::instances::get_instance,
        api::handlers::instances::start_instance,
        api::handlers::instances::stop_instance,
        api::handlers::instances::get_serial_console,
        api::handlers::disks::list_disks,
        api::handlers::disks::create_disk,
        api::handlers::disks::delete_disk,
        api::handlers::affinity_groups::list_affinity_groups,
        api::handlers::affinity_groups::create_affinity_group,
        api::handlers::affinity_groups::list_affinity_group_members,
        api::handlers::affinity_groups::add_affinity_group_member,
        api::handlers::floating_ips::list_floating_ips,
        api::handlers::floating_ips::create_floating_ip,
        api::handlers::floating_ips::delete_floating_ip,
        api::handlers::floating_ips::attach_floating_ip,
        api::handlers::floating_ips::detach_floating_ip,
        api::handlers::ip_pools::list_ip_pools,
        api::handlers::ip_pools::list_ip_pool_ranges,
        api::handlers::ip_pools::get_ip_pool_utilization,
        api::handlers::hardware::list_sleds,
        api::handlers::metrics::get_system_metric,
        api::handlers::timeseries::timeseries_query,
        api::handlers::timeseries::timeseries_chart,
    ),
    components(
        schemas(
            crate::errors::ErrorBody,
            api::models::users::User,
            api::models::users::CurrentUser,
            api::models::groups::Group,
            api::models::policy::RoleKey,
            api::models::policy::PolicyRoleAssignment,
            api::models::policy::Policy,
            api::models::projects::Project,
            api::models::projects::ProjectCreate,
            api::models::instances::InstanceState,
            api::models::instances::Instance,
            api::models::instances::InstanceCreate,
            api::models::instances::InstanceSerialConsoleData,
            api::models::disks::DiskState,
            api::models::disks::Disk,
            api::models::disks::DiskCreate,
            api::models::affinity_groups::AffinityPolicy,
            api::models::affinity_groups::AffinityGroup,
            api::models::affinity_groups::AffinityGroupCreate,
            api::models::affinity_groups::AffinityGroupMemberAdd,
            api::models::affinity_groups::AffinityGroupMemberResponse,
            api::models::floating_ips::FloatingIp,
            api::models::floating_ips::FloatingIpCreate,
            api::models::floating_ips::FloatingIpAttach,
            api::models::ip_pools::IpPool,
            api::models::ip_pools::IpPoolRange,
            api::models::ip_pools::IpPoolUtilization,
            api::models::ip_pools::Ipv4Utilization,
            api::models::ip_pools::Ipv6Utilization,
            crate::net::IpRange,
            api::models::hardware::Sled,
            api::models::metrics::SystemMetricName,
            api::models::metrics::PaginationOrder,
            api::models::metrics::Datum,
            api::models::metrics::Measurement,
            api::models::timeseries::TimeseriesQuery,
            api::models::timeseries::ChartFlavor,
            api::models::timeseries::ChartRequest,
            api::models::timeseries::ChartResponse,
            crate::oxql::OxqlQueryResult,
            crate::oxql::Table,
            crate::oxql::Timeseries,
            crate::oxql::Points,
            crate::oxql::Values,
            crate::oxql::ValueArray,
            crate::oxql::MetricType,
            crate::oxql::ChartDatum,
        )
    ),
    tags(
        (name = "identity", description = "The acting user, and the users and groups of the silo."),
        (name = "policy", description = "Role assignments on the fleet, the silo and projects.

Roles are `admin`, `collaborator` and `viewer`; each includes the ones after it. A role on one
resource says nothing about any other resource."),
        (name = "projects", description = "Projects hold instances, disks, floating IPs and affinity groups."),
        (name = "instances", description = "Virtual machines and their run state."),
        (name = "disks", description = "Virtual disks."),
        (name = "affinity", description = "Affinity groups and their member instances."),
        (name = "floating-ips", description = "Addresses reserved from an IP pool."),
        (name = "system", description = "Fleet-wide resources. Requires a role on the fleet."),
        (name = "metrics", description = "OxQL queries and chart data, synthesized on request."),
    ),
    info(
        title = "Console Mock API",
        version = "1.0.0",
        description = "In-memory stand-in for the infrastructure management API, used to develop and test the web console.

## Acting user

Requests act as the user named by the `msw-user` cookie. Without it, the first seeded user is used.

## Pagination

List endpoints take `limit` and `page_token`. Pass the `next_page` of one response as the
`page_token` of the next request; `next_page` is `null` on the last page.

## Errors

Errors carry an `error_code`, a `message` and a `request_id`:

```json
{
  \"error_code\": \"Forbidden\",
  \"message\": \"action not authorized\",
  \"request_id\": \"5f0b…\"
}
```

Routes under `/v1` that the mock does not serve answer `501 NotImplemented`.",
    ),
)]
pub struct ConsoleApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_route_is_documented() {
        let doc = ConsoleApiDoc::openapi();
        for path in [
            "/v1/me",
            "/v1/projects/{project}/policy",
            "/v1/instances/{instance}/serial-console",
            "/v1/floating-ips/{floating_ip}/attach",
            "/v1/system/ip-pools/{pool}/utilization",
            "/v1/system/metrics/{metric_name}",
            "/v1/timeseries/chart",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing from the OpenAPI document");
        }
        let components = doc.components.expect("components are generated");
        assert!(components.security_schemes.contains_key("UserCookie"));
    }
}
