//! # console-mock: in-memory mock of the infrastructure management API
//!
//! `console-mock` serves the subset of the management API that the web console talks to, backed
//! by an in-memory store seeded with a small fixed fleet. It exists so the console can be
//! developed and tested without a rack: every request is answered from memory, and metrics are
//! synthesized on the fly.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum). Every request is handled as:
//!
//! 1. The [`CurrentUser`](api::models::users::CurrentUser) extractor picks the acting user from a
//!    cookie holding their display name, falling back to the first seeded user.
//! 2. The handler takes the store lock, checks the role the operation needs with
//!    [`auth::roles`], then reads or mutates [`db::MockDb`].
//! 3. Failures become an [`errors::Error`], rendered as `{error_code, message, request_id}`.
//!
//! ### Core Components
//!
//! - [`api`]: route handlers and request/response models
//! - [`auth`]: acting-user resolution and role closures
//! - [`db`]: the in-memory store and its seed fixtures
//! - [`net`]: IPv4/IPv6 range containment and sizing used by IP pools
//! - [`oxql`]: OxQL query building, result types and chart shaping
//! - [`sample_data`]: the seeded generators behind the metrics endpoints
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use console_mock::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = console_mock::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     console_mock::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod net;
mod openapi;
pub mod oxql;
pub mod sample_data;
pub mod telemetry;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use crate::{config::CorsOrigin, db::MockDb, openapi::ConsoleApiDoc};
use api::handlers::{
    affinity_groups, disks, floating_ips, hardware, instances, ip_pools, metrics, not_implemented, policy, projects,
    timeseries, users,
};
use axum::{
    Json, Router, http,
    routing::{any, delete, get, post},
};
use bon::Builder;
pub use config::Config;
use std::sync::Arc;
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
///
/// The store sits behind a single lock. Handlers hold it for the whole operation, so mutations are
/// applied one request at a time.
///
/// ```ignore
/// let state = AppState::builder()
///     .db(Arc::new(RwLock::new(MockDb::seeded())))
///     .config(config)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: Arc<RwLock<MockDb>>,
    pub config: Config,
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.cors;

    // Credentials cannot be combined with a literal `*`, so a wildcard echoes the caller's origin
    let allow_origin = if cors_config
        .allowed_origins
        .iter()
        .any(|o| matches!(o, CorsOrigin::Wildcard))
    {
        AllowOrigin::mirror_request()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                // Origins never carry the trailing slash `Url` adds
                origins.push(url.as_str().trim_end_matches('/').parse::<http::HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(cors_config.allow_credentials)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PUT, http::Method::DELETE])
        .allow_headers([http::header::CONTENT_TYPE])
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the router with every `/v1` route, API docs, CORS and tracing.
///
/// `/v1` paths that match no route answer `501 NotImplemented` so the console can tell a missing
/// mock apart from a missing resource.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        // Acting user, users and groups
        .route("/v1/me", get(users::get_current_user))
        .route("/v1/me/groups", get(users::list_current_user_groups))
        .route("/v1/users", get(users::list_users))
        .route("/v1/groups", get(users::list_groups))
        // Policies
        .route("/v1/policy", get(policy::get_silo_policy).put(policy::update_silo_policy))
        .route(
            "/v1/system/policy",
            get(policy::get_system_policy).put(policy::update_system_policy),
        )
        // Projects
        .route("/v1/projects", get(projects::list_projects).post(projects::create_project))
        .route("/v1/projects/{project}", get(projects::get_project))
        .route(
            "/v1/projects/{project}/policy",
            get(policy::get_project_policy).put(policy::update_project_policy),
        )
        // Instances
        .route("/v1/instances", get(instances::list_instances).post(instances::create_instance))
        .route("/v1/instances/{instance}", get(instances::get_instance))
        .route("/v1/instances/{instance}/start", post(instances::start_instance))
        .route("/v1/instances/{instance}/stop", post(instances::stop_instance))
        .route("/v1/instances/{instance}/serial-console", get(instances::get_serial_console))
        // Disks
        .route("/v1/disks", get(disks::list_disks).post(disks::create_disk))
        .route("/v1/disks/{disk}", delete(disks::delete_disk))
        // Affinity groups
        .route(
            "/v1/affinity-groups",
            get(affinity_groups::list_affinity_groups).post(affinity_groups::create_affinity_group),
        )
        .route(
            "/v1/affinity-groups/{group}/members",
            get(affinity_groups::list_affinity_group_members).post(affinity_groups::add_affinity_group_member),
        )
        // Floating IPs
        .route(
            "/v1/floating-ips",
            get(floating_ips::list_floating_ips).post(floating_ips::create_floating_ip),
        )
        .route("/v1/floating-ips/{floating_ip}", delete(floating_ips::delete_floating_ip))
        .route("/v1/floating-ips/{floating_ip}/attach", post(floating_ips::attach_floating_ip))
        .route("/v1/floating-ips/{floating_ip}/detach", post(floating_ips::detach_floating_ip))
        // System
        .route("/v1/system/ip-pools", get(ip_pools::list_ip_pools))
        .route("/v1/system/ip-pools/{pool}/ranges", get(ip_pools::list_ip_pool_ranges))
        .route("/v1/system/ip-pools/{pool}/utilization", get(ip_pools::get_ip_pool_utilization))
        .route("/v1/system/hardware/sleds", get(hardware::list_sleds))
        .route("/v1/system/metrics/{metric_name}", get(metrics::get_system_metric))
        // Timeseries
        .route("/v1/timeseries/query", post(timeseries::timeseries_query))
        .route("/v1/timeseries/chart", post(timeseries::timeseries_chart))
        .route("/v1/{*rest}", any(not_implemented))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/openapi.json", get(|| async { Json(ConsoleApiDoc::openapi()) }))
        .merge(api_routes)
        .merge(Scalar::with_url("/docs", ConsoleApiDoc::openapi()));

    let cors_layer = create_cors_layer(&state.config)?;
    let router = router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::DEBUG))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// The mock server: a freshly seeded store plus the router over it.
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Seed a new store and build the router over it.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting console mock with configuration: {:#?}", config);

        let db = MockDb::seeded();
        info!(
            silo = %db.silo.name,
            users = db.users.len(),
            projects = db.projects.len(),
            "Seeded mock store"
        );

        let app_state = AppState::builder()
            .db(Arc::new(RwLock::new(db)))
            .config(config.clone())
            .build();
        let router = build_router(&app_state)?;

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(any(test, feature = "test-utils"))]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Serve until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Console mock listening on http://{}, docs at http://localhost:{}/docs",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::create_test_config;
    use axum::http::{HeaderValue, StatusCode, header};

    #[test_log::test(tokio::test)]
    async fn test_application_serves_seeded_store() {
        let app = Application::new(create_test_config())
            .await
            .expect("Failed to create application");
        let server = app.into_test_server();

        server.get("/healthz").await.assert_text("OK");
        let me: serde_json::Value = server.get("/v1/me").await.json();
        assert_eq!(me["display_name"], "Hannah Arendt");
    }

    #[test_log::test(tokio::test)]
    async fn test_openapi_document_served() {
        let server = Application::new(create_test_config()).await.unwrap().into_test_server();
        let doc: serde_json::Value = server.get("/openapi.json").await.json();
        assert_eq!(doc["info"]["title"], "Console Mock API");
        assert!(doc["paths"]["/v1/disks"].is_object());

        server.get("/docs").await.assert_status_ok();
    }

    #[test_log::test(tokio::test)]
    async fn test_unknown_paths_outside_v1_are_404() {
        let server = Application::new(create_test_config()).await.unwrap().into_test_server();
        server.get("/nope").await.assert_status(StatusCode::NOT_FOUND);
        server.get("/v1/system/silos").await.assert_status(StatusCode::NOT_IMPLEMENTED);
    }

    #[test_log::test(tokio::test)]
    async fn test_cors_preflight_from_console_origin() {
        let server = Application::new(create_test_config()).await.unwrap().into_test_server();
        let response = server
            .method(http::Method::OPTIONS, "/v1/projects")
            .add_header(header::ORIGIN, HeaderValue::from_static("http://localhost:4000"))
            .add_header(header::ACCESS_CONTROL_REQUEST_METHOD, HeaderValue::from_static("POST"))
            .await;
        assert_eq!(
            response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            HeaderValue::from_static("http://localhost:4000")
        );
        assert_eq!(
            response.header(header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
            HeaderValue::from_static("true")
        );
    }

    #[test]
    fn test_wildcard_origin_mirrors_request() {
        let mut config = create_test_config();
        config.cors.allowed_origins = vec![CorsOrigin::Wildcard];
        config.cors.allow_credentials = true;
        assert!(create_cors_layer(&config).is_ok());
    }
}
