use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub fund: FundConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Extra prefix the routes are also mounted under, e.g. a serverless function path.
    pub base_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_rate_limiting: bool,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub enable_request_logging: bool,
    /// Key rate limits on `x-forwarded-for` instead of the socket peer.
    /// Only safe behind a proxy that overwrites the header.
    pub trust_proxy: bool,
    pub enable_response_compression: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub admin_secret: Option<String>,
    pub cors_origins: Vec<String>,
}

// Keep the admin secret out of logs.
impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("admin_secret", &self.admin_secret.as_ref().map(|_| "<redacted>"))
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundConfig {
    /// Fund served by `GET /api/fund` when no `id` is given
    pub active_fund_id: i64,
}

const DEFAULT_SQLITE_PATH: &str = "data.sqlite";

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_vars(|key| vars.get(key).cloned())
    }

    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(&lookup)?;

        config.validate()?;
        Ok(config)
    }

    fn with_overrides(mut self, lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Server overrides
        if let Some(v) = lookup("FUND_TRACKER_PORT").or_else(|| lookup("PORT")) {
            self.server.port = parse("PORT", v)?;
        }
        if let Some(v) = lookup("API_BASE_PATH") {
            let trimmed = v.trim().trim_end_matches('/');
            self.server.base_path = if trimmed.is_empty() {
                None
            } else if trimmed.starts_with('/') {
                Some(trimmed.to_string())
            } else {
                Some(format!("/{}", trimmed))
            };
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()) {
            self.database.url = v.trim().to_string();
        } else if let Some(path) = lookup("DATABASE_PATH").filter(|v| !v.trim().is_empty()) {
            self.database.url = sqlite_url(path.trim());
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse("DATABASE_MAX_CONNECTIONS", v)?;
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = parse("DATABASE_CONNECTION_TIMEOUT", v)?;
        }

        // API overrides
        if let Some(v) = lookup("API_ENABLE_RATE_LIMITING") {
            self.api.enable_rate_limiting = parse("API_ENABLE_RATE_LIMITING", v)?;
        }
        if let Some(v) = lookup("API_RATE_LIMIT_REQUESTS") {
            self.api.rate_limit_requests = parse("API_RATE_LIMIT_REQUESTS", v)?;
        }
        if let Some(v) = lookup("API_RATE_LIMIT_WINDOW_SECS") {
            self.api.rate_limit_window_secs = parse("API_RATE_LIMIT_WINDOW_SECS", v)?;
        }
        if let Some(v) = lookup("API_TRUST_PROXY") {
            self.api.trust_proxy = parse("API_TRUST_PROXY", v)?;
        }
        if let Some(v) = lookup("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = parse("API_ENABLE_REQUEST_LOGGING", v)?;
        }
        if let Some(v) = lookup("API_ENABLE_RESPONSE_COMPRESSION") {
            self.api.enable_response_compression = parse("API_ENABLE_RESPONSE_COMPRESSION", v)?;
        }
        if let Some(v) = lookup("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = parse("API_MAX_REQUEST_SIZE_BYTES", v)?;
        }

        // Security overrides
        if let Some(v) = lookup("ADMIN_SECRET") {
            self.security.admin_secret = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS").or_else(|| lookup("ALLOWED_ORIGINS")) {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Fund overrides
        if let Some(v) = lookup("FUND_ID") {
            self.fund.active_fund_id = parse("FUND_ID", v)?;
        }

        Ok(self)
    }

    /// Production refuses to start on implicit defaults.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.environment == Environment::Production {
            if self.security.admin_secret.is_none() {
                return Err(ConfigError::Missing("ADMIN_SECRET"));
            }
            if self.database.url.is_empty() {
                return Err(ConfigError::Missing("DATABASE_URL"));
            }
        }
        if self.fund.active_fund_id <= 0 {
            return Err(ConfigError::Invalid {
                key: "FUND_ID",
                value: self.fund.active_fund_id.to_string(),
            });
        }
        if self.api.rate_limit_requests == 0 || self.api.rate_limit_window_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "API_RATE_LIMIT_REQUESTS",
                value: format!(
                    "{} per {}s",
                    self.api.rate_limit_requests, self.api.rate_limit_window_secs
                ),
            });
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                base_path: None,
            },
            database: DatabaseConfig {
                url: sqlite_url(DEFAULT_SQLITE_PATH),
                max_connections: 5,
                connection_timeout: 30,
            },
            api: ApiConfig {
                enable_rate_limiting: false,
                rate_limit_requests: 100,
                rate_limit_window_secs: 15 * 60,
                enable_request_logging: true,
                trust_proxy: false,
                enable_response_compression: false,
                max_request_size_bytes: 100 * 1024, // 100KB
            },
            security: SecurityConfig {
                admin_secret: None,
                cors_origins: vec![],
            },
            fund: FundConfig { active_fund_id: 1 },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                base_path: None,
            },
            database: DatabaseConfig {
                url: sqlite_url(DEFAULT_SQLITE_PATH),
                max_connections: 10,
                connection_timeout: 10,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_requests: 100,
                rate_limit_window_secs: 15 * 60,
                enable_request_logging: true,
                trust_proxy: false,
                enable_response_compression: true,
                max_request_size_bytes: 100 * 1024,
            },
            security: SecurityConfig {
                admin_secret: None,
                cors_origins: vec![],
            },
            fund: FundConfig { active_fund_id: 1 },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                base_path: None,
            },
            database: DatabaseConfig {
                // Must come from DATABASE_URL
                url: String::new(),
                max_connections: 10,
                connection_timeout: 5,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_requests: 100,
                rate_limit_window_secs: 15 * 60,
                enable_request_logging: false,
                trust_proxy: false,
                enable_response_compression: true,
                max_request_size_bytes: 100 * 1024,
            },
            security: SecurityConfig {
                admin_secret: None,
                cors_origins: vec![],
            },
            fund: FundConfig { active_fund_id: 1 },
        }
    }
}

fn sqlite_url(path: &str) -> String {
    format!("sqlite://{}?mode=rwc", path)
}

fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::from_map(&HashMap::new()).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert!(!config.api.enable_rate_limiting);
        assert_eq!(config.database.url, "sqlite://data.sqlite?mode=rwc");
        assert_eq!(config.fund.active_fund_id, 1);
        assert!(config.security.admin_secret.is_none());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.api.enable_rate_limiting);
        assert_eq!(config.api.rate_limit_requests, 100);
        assert_eq!(config.api.rate_limit_window_secs, 900);
    }

    #[test]
    fn production_requires_admin_secret() {
        let err = AppConfig::from_map(&vars(&[
            ("APP_ENV", "production"),
            ("DATABASE_URL", "postgres://u:p@db/funds"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("ADMIN_SECRET")));
    }

    #[test]
    fn production_requires_database_url() {
        let err = AppConfig::from_map(&vars(&[("APP_ENV", "prod"), ("ADMIN_SECRET", "s3cret")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn empty_admin_secret_counts_as_missing() {
        let err = AppConfig::from_map(&vars(&[
            ("APP_ENV", "production"),
            ("ADMIN_SECRET", ""),
            ("DATABASE_URL", "postgres://u:p@db/funds"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("ADMIN_SECRET")));
    }

    #[test]
    fn overrides_apply_on_top_of_preset() {
        let config = AppConfig::from_map(&vars(&[
            ("PORT", "8080"),
            ("API_BASE_PATH", ".netlify/functions/server/"),
            ("DATABASE_PATH", "/tmp/funds.sqlite"),
            ("ADMIN_SECRET", "s3cret"),
            ("FUND_ID", "7"),
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
        ]))
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.base_path.as_deref(), Some("/.netlify/functions/server"));
        assert_eq!(config.database.url, "sqlite:///tmp/funds.sqlite?mode=rwc");
        assert_eq!(config.security.admin_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.fund.active_fund_id, 7);
        assert_eq!(
            config.security.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn proxy_headers_are_untrusted_unless_enabled() {
        let config = AppConfig::from_map(&HashMap::new()).unwrap();
        assert!(!config.api.trust_proxy);
        assert!(!AppConfig::production().api.trust_proxy);

        let config = AppConfig::from_map(&vars(&[("API_TRUST_PROXY", "true")])).unwrap();
        assert!(config.api.trust_proxy);

        let err = AppConfig::from_map(&vars(&[("API_TRUST_PROXY", "sometimes")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "API_TRUST_PROXY", .. }));
    }

    #[test]
    fn database_url_wins_over_path() {
        let config = AppConfig::from_map(&vars(&[
            ("DATABASE_URL", "postgres://u:p@db/funds"),
            ("DATABASE_PATH", "/tmp/ignored.sqlite"),
        ]))
        .unwrap();
        assert_eq!(config.database.url, "postgres://u:p@db/funds");
    }

    #[test]
    fn malformed_numbers_fail_fast() {
        let err = AppConfig::from_map(&vars(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));

        let err = AppConfig::from_map(&vars(&[("FUND_ID", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "FUND_ID", .. }));
    }

    #[test]
    fn debug_output_redacts_secret() {
        let config = AppConfig::from_map(&vars(&[("ADMIN_SECRET", "hunter2")])).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
