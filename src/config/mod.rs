use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// One year
const MAX_SESSION_TTL_HOURS: u64 = 24 * 365;

/// Errors raised while loading or validating configuration at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub identity: IdentityConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub enable_cors: bool,
}

/// The SharePoint REST list the gateway reads missions from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the list items endpoint (`spo-rest-api-endpoint`)
    pub endpoint: Option<Url>,
    /// Identity-provider resource the access token must be scoped to (`spo-rest-api-resourceid`)
    pub resource_id: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub authorize_url: Option<Url>,
    pub token_url: Option<Url>,
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(skip_serializing)]
    pub secret: String,
    pub cookie_name: String,
    pub ttl_hours: u64,
    pub secure_cookie: bool,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Upstream settings only, for tools that talk to the list without a web session
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut upstream = AppConfig::from_env()?.upstream;
        upstream.validate()?;
        Ok(upstream)
    }

    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let endpoint = self
            .endpoint
            .as_ref()
            .ok_or(ConfigError::Missing("SPO_REST_API_ENDPOINT"))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                key: "SPO_REST_API_ENDPOINT",
                reason: format!("unsupported scheme '{}'", endpoint.scheme()),
            });
        }
        if endpoint.query().is_some() {
            return Err(ConfigError::Invalid {
                key: "SPO_REST_API_ENDPOINT",
                reason: "endpoint must not carry a query string".to_string(),
            });
        }
        if self.resource_id.trim().is_empty() {
            return Err(ConfigError::Missing("SPO_REST_API_RESOURCEID"));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "SPO_REST_API_TIMEOUT_SECS",
                reason: "timeout must be at least one second".to_string(),
            });
        }
        Ok(())
    }
}

impl AppConfig {
    /// Build from environment profile defaults plus overrides. Call `validate` before use.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Server overrides
        if let Ok(v) = env::var("MISSION_PORTAL_PORT").or_else(|_| env::var("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("SERVER_ENABLE_CORS") {
            self.server.enable_cors = v.parse().unwrap_or(self.server.enable_cors);
        }

        // Upstream overrides
        if let Ok(v) = env::var("SPO_REST_API_ENDPOINT") {
            self.upstream.endpoint = Some(parse_url("SPO_REST_API_ENDPOINT", &v)?);
        }
        if let Ok(v) = env::var("SPO_REST_API_RESOURCEID") {
            self.upstream.resource_id = v;
        }
        if let Ok(v) = env::var("SPO_REST_API_TIMEOUT_SECS") {
            self.upstream.timeout_secs = v.parse().unwrap_or(self.upstream.timeout_secs);
        }

        // Identity provider overrides
        if let Ok(v) = env::var("IDENTITY_AUTHORIZE_URL") {
            self.identity.authorize_url = Some(parse_url("IDENTITY_AUTHORIZE_URL", &v)?);
        }
        if let Ok(v) = env::var("IDENTITY_TOKEN_URL") {
            self.identity.token_url = Some(parse_url("IDENTITY_TOKEN_URL", &v)?);
        }
        if let Ok(v) = env::var("IDENTITY_CLIENT_ID") {
            self.identity.client_id = v;
        }
        if let Ok(v) = env::var("IDENTITY_CLIENT_SECRET") {
            self.identity.client_secret = v;
        }
        if let Ok(v) = env::var("IDENTITY_REDIRECT_URI") {
            self.identity.redirect_uri = v;
        }

        // Session overrides
        if let Ok(v) = env::var("SESSION_SECRET") {
            self.session.secret = v;
        }
        if let Ok(v) = env::var("SESSION_COOKIE_NAME") {
            self.session.cookie_name = v;
        }
        if let Ok(v) = env::var("SESSION_TTL_HOURS") {
            self.session.ttl_hours = v.parse().unwrap_or(self.session.ttl_hours);
        }
        if let Ok(v) = env::var("SESSION_SECURE_COOKIE") {
            self.session.secure_cookie = v.parse().unwrap_or(self.session.secure_cookie);
        }

        Ok(self)
    }

    /// Reject configurations the server cannot run with
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.upstream.validate()?;

        if self.identity.authorize_url.is_none() {
            return Err(ConfigError::Missing("IDENTITY_AUTHORIZE_URL"));
        }
        if self.identity.token_url.is_none() {
            return Err(ConfigError::Missing("IDENTITY_TOKEN_URL"));
        }
        if self.identity.client_id.is_empty() {
            return Err(ConfigError::Missing("IDENTITY_CLIENT_ID"));
        }
        if self.identity.redirect_uri.is_empty() {
            return Err(ConfigError::Missing("IDENTITY_REDIRECT_URI"));
        }

        if self.session.secret.len() < 32 {
            return Err(ConfigError::Invalid {
                key: "SESSION_SECRET",
                reason: "secret must be at least 32 bytes".to_string(),
            });
        }
        if self.session.ttl_hours == 0 || self.session.ttl_hours > MAX_SESSION_TTL_HOURS {
            return Err(ConfigError::Invalid {
                key: "SESSION_TTL_HOURS",
                reason: format!("session lifetime must be between 1 and {} hours", MAX_SESSION_TTL_HOURS),
            });
        }

        Ok(())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                enable_cors: true,
            },
            upstream: UpstreamConfig {
                endpoint: None,
                resource_id: String::new(),
                timeout_secs: 30,
            },
            identity: IdentityConfig {
                authorize_url: None,
                token_url: None,
                client_id: String::new(),
                client_secret: String::new(),
                redirect_uri: "http://localhost:3000/auth/callback".to_string(),
            },
            session: SessionConfig {
                secret: String::new(),
                cookie_name: "mission_portal_session".to_string(),
                ttl_hours: 24,
                secure_cookie: false,
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.upstream.timeout_secs = 15;
        config.identity.redirect_uri = String::new();
        config.session.ttl_hours = 8;
        config.session.secure_cookie = true;
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.server.enable_cors = false;
        config.upstream.timeout_secs = 10;
        config.identity.redirect_uri = String::new();
        config.session.ttl_hours = 4;
        config.session.secure_cookie = true;
        config
    }
}

fn parse_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}
