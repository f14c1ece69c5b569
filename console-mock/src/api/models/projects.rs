//! API models for projects.

use super::pagination::{HasId, PaginationParams};
use crate::types::ProjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Project {
    #[schema(value_type = String, format = "uuid")]
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub time_created: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,
}

impl HasId for Project {
    fn id(&self) -> uuid::Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectCreate {
    #[schema(example = "web-frontend")]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Selects the project for project-scoped collections.
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct ProjectSelector {
    /// Name or id of the project
    pub project: String,
}

/// Project selector plus pagination, for list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct ProjectListQuery {
    /// Name or id of the project
    pub project: String,

    #[serde(flatten)]
    #[param(inline)]
    pub pagination: PaginationParams,
}

/// Resources inside a project are addressed by name only with `?project=`, or directly by id.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct OptionalProjectSelector {
    pub project: Option<String>,
}
