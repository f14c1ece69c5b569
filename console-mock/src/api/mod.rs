//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for every `/v1` endpoint
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! - **Identity** (`/v1/me`, `/v1/users`, `/v1/groups`): the acting user, silo users and groups
//! - **Policy** (`/v1/policy`, `/v1/system/policy`, `/v1/projects/{project}/policy`): role assignments
//! - **Projects** (`/v1/projects/*`) and the resources scoped to them: instances, disks,
//!   affinity groups and floating IPs, selected with `?project=`
//! - **System** (`/v1/system/*`): IP pools, sleds and utilization metrics, fleet roles only
//! - **Timeseries** (`/v1/timeseries/*`): OxQL queries and chart data
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with `utoipa` annotations. The rendered reference is served at
//! `/docs` and the raw document at `/openapi.json`.

pub mod handlers;
pub mod models;
