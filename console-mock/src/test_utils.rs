//! Test utilities for integration testing (available with `test-utils` feature).

use crate::{AppState, build_router, config::Config, db::MockDb};
use axum_test::TestServer;
use std::sync::Arc;
use tokio::sync::RwLock;

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..Default::default()
    }
}

/// A test server over a freshly seeded store. Each call gets its own store.
pub fn create_test_app() -> TestServer {
    create_test_app_with_db(MockDb::seeded())
}

/// A test server over `db`, for tests that need fixtures beyond the seed.
pub fn create_test_app_with_db(db: MockDb) -> TestServer {
    let state = AppState::builder()
        .db(Arc::new(RwLock::new(db)))
        .config(create_test_config())
        .build();
    let router = build_router(&state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

/// `Cookie` header value that makes a request act as `display_name`.
pub fn user_cookie(display_name: &str) -> String {
    format!("{}={}", crate::config::DEFAULT_USER_COOKIE, display_name.replace(' ', "%20"))
}
