//! OpenAPI documentation configuration.
//!
//! [`console::ConsoleApiDoc`] describes every `/v1/*` route the mock serves. It is rendered at
//! `/docs` and published as JSON at `/openapi.json`.

pub mod console;

pub use console::ConsoleApiDoc;
