use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Jitter, Quota, RateLimiter};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ApiConfig;
use crate::role::Role;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

#[derive(Debug, Error)]
pub enum DemoApiError {
    #[error("Demo API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Demo API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Demo API returned an unusable response: {0}")]
    InvalidResponse(String),
}

/// Token issued by the backend for a demo persona
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoTokenGrant {
    pub access_token: String,
    pub role: String,
    #[serde(default)]
    pub outlet_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl DemoTokenGrant {
    /// Grant carrying only a token, as returned by the legacy route
    pub fn bare(role: Role, access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            role: role.as_str().to_string(),
            outlet_id: None,
            display_name: None,
            employee_id: None,
            session_id: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LegacyTokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    role: &'a str,
}

/// Backend endpoints the demo host depends on
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait DemoApi: Send + Sync {
    async fn fetch_role_token(&self, role: Role) -> Result<DemoTokenGrant, DemoApiError>;
    async fn reset_demo_data(&self) -> Result<(), DemoApiError>;
}

/// Rate-limited client for the demo endpoints with a per-role token cache
#[derive(Debug)]
pub struct DemoHttpClient {
    http: reqwest::Client,
    base_url: String,
    legacy_token_route: bool,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    token_cache: Option<Cache<Role, DemoTokenGrant>>,
}

impl DemoHttpClient {
    pub fn new(config: &ApiConfig) -> Result<Self, DemoApiError> {
        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.burst).unwrap_or(per_second);
        let quota = Quota::per_second(per_second).allow_burst(burst);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .build()?;

        // TTL of zero disables caching
        let token_cache = (config.token_ttl_seconds > 0).then(|| {
            Cache::builder()
                .max_capacity(Role::ALL.len() as u64)
                .time_to_live(Duration::from_secs(config.token_ttl_seconds))
                .build()
        });

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            legacy_token_route: config.legacy_token_route,
            rate_limiter,
            token_cache,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn uses_legacy_token_route(&self) -> bool {
        self.legacy_token_route
    }

    /// Drop every cached token
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.token_cache {
            cache.invalidate_all();
            info!("Demo token cache cleared");
        }
    }

    async fn throttle(&self) {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;
    }

    async fn request_token(&self, role: Role) -> Result<DemoTokenGrant, DemoApiError> {
        self.throttle().await;

        if self.legacy_token_route || !issued_by_token_route(role) {
            let url = format!("{}/api/v1/demo/auth/token/{}", self.base_url, role);
            debug!(url = %url, "Requesting demo token (legacy route)");
            let response = check_status(self.http.get(&url).send().await?).await?;
            let body: LegacyTokenResponse = response.json().await?;
            return non_empty(DemoTokenGrant::bare(role, body.access_token));
        }

        let url = format!("{}/api/v1/demo/token", self.base_url);
        debug!(url = %url, role = %role, "Requesting demo token");
        let response = self
            .http
            .post(&url)
            .json(&TokenRequest {
                role: role.as_str(),
            })
            .send()
            .await?;
        let grant: DemoTokenGrant = check_status(response).await?.json().await?;
        non_empty(grant)
    }
}

/// `POST /api/v1/demo/token` only issues these roles; the rest use the
/// per-role GET route
fn issued_by_token_route(role: Role) -> bool {
    matches!(role, Role::Customer | Role::Staff | Role::Admin)
}

fn non_empty(grant: DemoTokenGrant) -> Result<DemoTokenGrant, DemoApiError> {
    if grant.access_token.trim().is_empty() {
        return Err(DemoApiError::InvalidResponse(
            "token response carried an empty access token".to_string(),
        ));
    }
    Ok(grant)
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DemoApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), body = %body, "Demo API request rejected");
    Err(DemoApiError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl DemoApi for DemoHttpClient {
    async fn fetch_role_token(&self, role: Role) -> Result<DemoTokenGrant, DemoApiError> {
        if let Some(cache) = &self.token_cache {
            if let Some(grant) = cache.get(&role).await {
                debug!(role = %role, "Demo token cache hit");
                return Ok(grant);
            }
        }

        let grant = self.request_token(role).await?;
        if let Some(cache) = &self.token_cache {
            cache.insert(role, grant.clone()).await;
        }
        info!(role = %role, outlet = ?grant.outlet_id, "Demo token issued");
        Ok(grant)
    }

    async fn reset_demo_data(&self) -> Result<(), DemoApiError> {
        self.throttle().await;
        let url = format!("{}/api/v1/demo/reset", self.base_url);
        debug!(url = %url, "Resetting demo data");
        check_status(self.http.post(&url).send().await?).await?;
        self.clear_cache();
        info!("Demo data reset");
        Ok(())
    }
}
