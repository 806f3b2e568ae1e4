//! Configuration types for songforge

use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Top-level configuration
///
/// All fields have sensible defaults; an embedding application only needs to
/// supply the provider credential to get a working orchestrator.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Generation provider settings (credential, host, callback address)
    #[serde(default)]
    pub provider: ProviderConfig,

    /// API server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Task store settings
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Generation provider configuration
///
/// Groups everything the submission client needs: the credential, the host to
/// contact (direct or relay), the callback address handed to the provider, and
/// the timeouts bounding the outbound calls.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ProviderConfig {
    /// Provider API key. Submission fails with a configuration error when
    /// unset; no network call is attempted.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Provider host (default: "https://api.kie.ai")
    ///
    /// When this differs from the provider's default domain the client
    /// operates in relay mode: traffic passes through an intermediary and
    /// gateway errors are attributed to it rather than to the provider.
    #[serde(default = "default_api_host")]
    pub api_host: String,

    /// Publicly reachable base URL the provider invokes on completion
    /// (default: "http://localhost:8080")
    #[serde(default = "default_callback_base_url")]
    pub callback_base_url: String,

    /// Generation model identifier (default: "V3_5")
    #[serde(default = "default_model")]
    pub model: String,

    /// Timeout for the submission request (default: 20s)
    #[serde(default = "default_request_timeout", with = "duration_secs")]
    #[schema(value_type = u64)]
    pub request_timeout: Duration,

    /// Endpoint used for the best-effort outbound IP probe on whitelist
    /// errors (default: "https://api.ipify.org")
    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,

    /// Timeout for the outbound IP probe (default: 2s)
    #[serde(default = "default_ip_lookup_timeout", with = "duration_secs")]
    #[schema(value_type = u64)]
    pub ip_lookup_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_host: default_api_host(),
            callback_base_url: default_callback_base_url(),
            model: default_model(),
            request_timeout: default_request_timeout(),
            ip_lookup_url: default_ip_lookup_url(),
            ip_lookup_timeout: default_ip_lookup_timeout(),
        }
    }
}

/// API server configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ServerConfig {
    /// Address to bind the API server to (default: "127.0.0.1:8080")
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS middleware (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins; "*" or empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Serve interactive Swagger UI at /swagger-ui (default: false)
    #[serde(default)]
    pub swagger_ui: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            swagger_ui: false,
        }
    }
}

/// Task store configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file (default: "./songforge.db")
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_api_host() -> String {
    "https://api.kie.ai".to_string()
}

fn default_callback_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_model() -> String {
    "V3_5".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(20)
}

fn default_ip_lookup_url() -> String {
    "https://api.ipify.org".to_string()
}

fn default_ip_lookup_timeout() -> Duration {
    Duration::from_secs(2)
}

fn default_bind_address() -> SocketAddr {
    #[allow(clippy::unwrap_used)]
    "127.0.0.1:8080".parse().unwrap()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./songforge.db")
}

fn default_true() -> bool {
    true
}

/// Serialize/deserialize a `Duration` as whole seconds
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}
