//! Acting identity and role-based authorization.
//!
//! # Modules
//!
//! - [`current_user`]: extractor that resolves the acting user from the user cookie
//! - [`roles`]: role closures and the `require_*` checks handlers call
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use console_mock::api::models::users::CurrentUser;
//! use console_mock::auth::roles::require_silo_viewer;
//!
//! async fn list_things(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<..>> {
//!     let db = state.db.read().await;
//!     require_silo_viewer(&db, &current_user)?;
//!     ...
//! }
//! ```

pub mod current_user;
pub mod roles;
