//! Provider submission client
//!
//! Builds and sends the generation request to the provider, resolves the
//! provider host (direct vs. relay), and classifies the immediate HTTP/network
//! outcome into the shared error taxonomy. Each call makes at most one
//! submission attempt; every failure is terminal for that attempt.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::types::{GenerationRequest, TaskId};
use crate::{Error, Result};

/// The provider's default domain; a configured host that does not contain
/// this fragment means traffic passes through a relay intermediary
pub const DEFAULT_PROVIDER_DOMAIN: &str = "api.kie.ai";

/// Placeholder reported when the outbound IP probe itself fails
pub const IP_UNKNOWN: &str = "could not determine";

/// Generation request wire format
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeneratePayload<'a> {
    /// In custom mode the prompt field carries the full lyrics
    prompt: &'a str,
    style: &'a str,
    title: &'a str,
    /// Caller supplies both lyrics and style rather than a free-text prompt
    custom_mode: bool,
    instrumental: bool,
    model: &'a str,
    call_back_url: String,
}

/// Provider response envelope for the generate endpoint
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Option<GenerateData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateData {
    #[serde(default)]
    task_id: Option<String>,
}

/// HTTP client for the generation provider
#[derive(Debug, Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    config: ProviderConfig,
}

impl ProviderClient {
    /// Create a client from provider configuration
    ///
    /// Malformed host URLs are rejected here, before any submission is
    /// attempted. The underlying HTTP client carries the configured request
    /// timeout, so a submission blocks the caller for at most that bounded
    /// interval.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        Url::parse(&config.api_host).map_err(|e| Error::Config {
            message: format!("invalid provider host {:?}: {}", config.api_host, e),
            key: Some("provider.api_host".to_string()),
        })?;
        Url::parse(&config.callback_base_url).map_err(|e| Error::Config {
            message: format!(
                "invalid callback base URL {:?}: {}",
                config.callback_base_url, e
            ),
            key: Some("provider.callback_base_url".to_string()),
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { http, config })
    }

    /// Whether the configured host routes through a relay intermediary
    ///
    /// Relay mode changes the attribution of gateway errors: a 502/503/504 is
    /// reported as a relay misconfiguration rather than a provider failure.
    pub fn is_relay(&self) -> bool {
        !self.config.api_host.contains(DEFAULT_PROVIDER_DOMAIN)
    }

    /// The callback address handed to the provider at submission time
    pub fn callback_url(&self) -> String {
        format!(
            "{}/provider/callback",
            self.config.callback_base_url.trim_end_matches('/')
        )
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/api/v1/generate",
            self.config.api_host.trim_end_matches('/')
        )
    }

    /// Submit a generation request and return the provider-issued task id
    ///
    /// Fails before any network call when no credential is configured. On any
    /// failure the caller gets a classified diagnostic; no retry is attempted.
    pub async fn submit(&self, request: &GenerationRequest) -> Result<TaskId> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| Error::Config {
            message: "provider API key is not configured".to_string(),
            key: Some("provider.api_key".to_string()),
        })?;

        let payload = GeneratePayload {
            prompt: &request.lyrics,
            style: &request.style,
            title: &request.title,
            custom_mode: true,
            instrumental: false,
            model: &self.config.model,
            call_back_url: self.callback_url(),
        };

        let url = self.generate_url();
        tracing::debug!(url = %url, relay = self.is_relay(), "submitting generation request");

        let response = match self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                let message = format!(
                    "no response from {} within {}s, try again later",
                    self.config.api_host,
                    self.config.request_timeout.as_secs()
                );
                tracing::error!(error = %e, "provider request timed out");
                return Err(ProviderError::Timeout(message).into());
            }
            Err(e) if e.is_connect() => {
                let message = format!(
                    "cannot reach the {} ({}), check the network or the relay service",
                    self.target_name(),
                    self.config.api_host
                );
                tracing::error!(error = %e, "provider connection failed");
                return Err(ProviderError::Connection(message).into());
            }
            Err(e) => return Err(Error::Network(e)),
        };

        let status = response.status().as_u16();

        if status == 200 {
            let body: GenerateResponse = response.json().await.map_err(|e| {
                ProviderError::Logic(format!("unparsable provider response: {}", e))
            })?;
            return self.handle_provider_body(body).await;
        }

        // Gateway errors while in relay mode are attributable to the
        // intermediary, not the provider
        if matches!(status, 502 | 503 | 504) && self.is_relay() {
            tracing::error!(status, host = %self.config.api_host, "relay gateway error");
            return Err(ProviderError::RelayGateway {
                status,
                host: self.config.api_host.clone(),
            }
            .into());
        }

        tracing::error!(status, "provider HTTP error");
        Err(ProviderError::Http { status }.into())
    }

    /// Classify an HTTP 200 provider envelope
    async fn handle_provider_body(&self, body: GenerateResponse) -> Result<TaskId> {
        if body.code == 200 {
            let task_id = body
                .data
                .and_then(|d| d.task_id)
                .filter(|id| !id.is_empty())
                .ok_or_else(|| {
                    ProviderError::Logic("provider response is missing the task id".to_string())
                })?;
            tracing::info!(task_id = %task_id, "generation task accepted by provider");
            return Ok(TaskId::from(task_id));
        }

        tracing::error!(code = body.code, msg = %body.msg, "provider logic error");

        if body.code == 401 || body.msg.to_lowercase().contains("whitelist") {
            // Best-effort outbound IP probe to shorten operator remediation
            let detected_ip = self.lookup_outbound_ip().await;
            let remediation = if self.is_relay() {
                "add the relay server's IP to the provider whitelist"
            } else {
                "add this machine's IP to the provider whitelist"
            };
            return Err(ProviderError::Whitelist {
                message: format!("{}, {}", body.msg, remediation),
                detected_ip,
            }
            .into());
        }

        if body.code == 403 {
            return Err(ProviderError::PermissionDenied(body.msg).into());
        }

        Err(ProviderError::Logic(body.msg).into())
    }

    /// Best-effort outbound IP lookup; failure degrades to [`IP_UNKNOWN`]
    async fn lookup_outbound_ip(&self) -> String {
        let result = self
            .http
            .get(&self.config.ip_lookup_url)
            .timeout(self.config.ip_lookup_timeout)
            .send()
            .await;

        match result {
            Ok(response) => match response.text().await {
                Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
                _ => IP_UNKNOWN.to_string(),
            },
            Err(e) => {
                tracing::warn!(error = %e, "outbound IP probe failed");
                IP_UNKNOWN.to_string()
            }
        }
    }

    fn target_name(&self) -> &'static str {
        if self.is_relay() {
            "relay server"
        } else {
            "provider API"
        }
    }
}
