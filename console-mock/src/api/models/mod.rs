//! API request and response data models.
//!
//! These types define the wire contract of the mock API. The in-memory store holds the resource
//! models directly, so there is no separate storage representation.
//!
//! # Model Categories
//!
//! ## Identity and access
//!
//! - [`users`], [`groups`]: silo identities and group memberships
//! - [`policy`]: roles, role assignments and per-resource policies
//!
//! ## Project resources
//!
//! - [`projects`], [`instances`], [`disks`], [`affinity_groups`], [`floating_ips`]
//!
//! ## System resources
//!
//! - [`ip_pools`], [`hardware`], [`metrics`], [`timeseries`]
//!
//! ## Shared
//!
//! - [`pagination`]: cursor pagination used by every list endpoint

pub mod affinity_groups;
pub mod disks;
pub mod floating_ips;
pub mod groups;
pub mod hardware;
pub mod instances;
pub mod ip_pools;
pub mod metrics;
pub mod pagination;
pub mod policy;
pub mod projects;
pub mod timeseries;
pub mod users;
