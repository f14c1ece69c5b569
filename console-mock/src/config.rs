//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `CONSOLE_MOCK_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`, optional)
//! 2. **Environment variables** - Variables prefixed with `CONSOLE_MOCK_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `CONSOLE_MOCK_AUTH__USER_COOKIE=acting-user` sets the `auth.user_cookie` field.
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Override server port
//! CONSOLE_MOCK_PORT=12220
//!
//! # Denser synthetic metrics
//! CONSOLE_MOCK_SAMPLE_DATA__SYSTEM_METRIC_POINTS=500
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "CONSOLE_MOCK_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// All fields have defaults, so an empty or missing file yields a working mock server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
    /// How the acting identity is picked for each request
    pub auth: AuthConfig,
    /// CORS settings for the console dev server
    pub cors: CorsConfig,
    /// List endpoint defaults
    pub pagination: PaginationConfig,
    /// Shape of generated metrics data
    pub sample_data: SampleDataConfig,
}

/// Cookie the console sets to pick the acting user.
pub const DEFAULT_USER_COOKIE: &str = "msw-user";

/// Identity selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Cookie holding the display name of the acting user. Missing or unknown names fall back to
    /// the first seeded user, who holds every role.
    pub user_cookie: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_cookie: DEFAULT_USER_COOKIE.to_string(),
        }
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![CorsOrigin::Url(
                Url::parse("http://localhost:4000").expect("static origin url is valid"),
            )],
            allow_credentials: true,
            max_age: Some(3600),
        }
    }
}

/// CORS origin specification.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `http://localhost:4000`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationConfig {
    /// Page size used when a request carries no `limit`
    pub default_limit: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: crate::api::models::pagination::DEFAULT_LIMIT,
        }
    }
}

/// Synthetic data settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SampleDataConfig {
    /// Number of samples produced for each system metrics request
    pub system_metric_points: usize,
    /// Number of one-minute samples in a raw timeseries query result
    pub timeseries_points: usize,
    /// Utilization history is never generated further back than this many days
    pub max_history_days: u32,
}

impl Default for SampleDataConfig {
    fn default() -> Self {
        Self {
            system_metric_points: 200,
            timeseries_points: 60,
            max_history_days: 90,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 12220,
            enable_otel_export: false,
            auth: AuthConfig::default(),
            cors: CorsConfig::default(),
            pagination: PaginationConfig::default(),
            sample_data: SampleDataConfig::default(),
        }
    }
}

impl Config {
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.auth.user_cookie.trim().is_empty() {
            return Err(Error::internal("Config validation: auth.user_cookie cannot be empty"));
        }
        if self.pagination.default_limit == 0 {
            return Err(Error::internal("Config validation: pagination.default_limit must be positive"));
        }
        if self.sample_data.system_metric_points == 0 {
            return Err(Error::internal("Config validation: sample_data.system_metric_points must be positive"));
        }
        if self.sample_data.timeseries_points < 2 {
            return Err(Error::internal(
                "Config validation: sample_data.timeseries_points must be at least 2, the first point of a delta series is dropped",
            ));
        }
        if self.sample_data.max_history_days == 0 {
            return Err(Error::internal("Config validation: sample_data.max_history_days must be positive"));
        }
        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("CONSOLE_MOCK_").split("__"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args(path: &str) -> Args {
        Args {
            config: path.to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load(&args("missing.yaml"))?;
            assert_eq!(config.port, 12220);
            assert_eq!(config.auth.user_cookie, "msw-user");
            assert_eq!(config.pagination.default_limit, 100);
            Ok(())
        });
    }

    #[test]
    fn test_yaml_values() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
port: 8080
auth:
  user_cookie: acting-user
cors:
  allowed_origins:
    - "*"
    - http://localhost:3000
sample_data:
  system_metric_points: 50
"#,
            )?;

            let config = Config::load(&args("test.yaml"))?;
            assert_eq!(config.port, 8080);
            assert_eq!(config.auth.user_cookie, "acting-user");
            assert_eq!(config.sample_data.system_metric_points, 50);
            assert_eq!(config.sample_data.timeseries_points, 60);
            assert!(matches!(config.cors.allowed_origins[0], CorsOrigin::Wildcard));
            assert!(matches!(config.cors.allowed_origins[1], CorsOrigin::Url(_)));
            Ok(())
        });
    }

    #[test]
    fn test_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "port: 8080\n")?;
            jail.set_env("CONSOLE_MOCK_PORT", "9090");
            jail.set_env("CONSOLE_MOCK_PAGINATION__DEFAULT_LIMIT", "25");

            let config = Config::load(&args("test.yaml"))?;
            assert_eq!(config.port, 9090);
            assert_eq!(config.pagination.default_limit, 25);
            Ok(())
        });
    }

    #[test]
    fn test_unknown_field_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "not_a_field: true\n")?;
            assert!(Config::load(&args("test.yaml")).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.pagination.default_limit = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("default_limit must be positive"));

        config = Config::default();
        config.sample_data.timeseries_points = 1;
        assert!(config.validate().unwrap_err().to_string().contains("timeseries_points"));

        config = Config::default();
        config.auth.user_cookie = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_points_rejected_on_load() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "sample_data:\n  system_metric_points: 0\n")?;
            let err = Config::load(&args("test.yaml")).unwrap_err().to_string();
            assert!(err.contains("system_metric_points must be positive"));
            Ok(())
        });
    }
}
