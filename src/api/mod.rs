use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::error::ApiError;

pub mod model;

use model::{
    AuthResponse, Health, Listing, ListingCreate, ListingId, ListingUpdate, LoginRequest, Match,
    Me, Message, MessageCreate, OnboardingRequest, RegisterRequest, Subject, SwipeRequest,
    SwipeResponse, UserId,
};

const API_PREFIX: &str = "api/v1/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_USER_AGENT: &str = "korfinder-client/0.1";

/// REST client for the Korfinder API.
///
/// A client value carries at most one bearer token. Signing in produces a new
/// value via [`ApiClient::with_token`]; there is no shared instance.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authorized", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

/// Candidate feed and swipe submission.
#[async_trait]
pub trait FeedService: Send + Sync {
    /// Fetch the ordered candidate list. `again` asks the server to restart
    /// from scratch.
    async fn fetch_candidates(&self, again: bool) -> Result<Vec<Listing>, ApiError>;

    /// Record a like/pass on a user; returns whether it produced a match.
    async fn submit_swipe(&self, target_user_id: UserId, like: bool) -> Result<bool, ApiError>;
}

/// Account endpoints used by [`crate::session::Session`].
#[async_trait]
pub trait AuthService: Send + Sync {
    /// A copy of this service that authenticates as `token`.
    fn authorized(&self, token: &str) -> Self
    where
        Self: Sized;

    /// A copy of this service without credentials.
    fn anonymous(&self) -> Self
    where
        Self: Sized;

    async fn register(&self, req: &RegisterRequest) -> Result<AuthResponse, ApiError>;
    async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ApiError>;
    async fn me(&self) -> Result<Me, ApiError>;
    async fn save_onboarding(&self, req: &OnboardingRequest) -> Result<(), ApiError>;
}

/// Matches and the chat inside them.
#[async_trait]
pub trait MatchService: Send + Sync {
    async fn matches(&self) -> Result<Vec<Match>, ApiError>;
    async fn messages(&self, match_id: i64) -> Result<Vec<Message>, ApiError>;
    async fn send_message(&self, match_id: i64, body: &str) -> Result<Message, ApiError>;
}

impl ApiClient {
    pub fn new(base_url: Url) -> Result<Self, ApiError> {
        Self::with_options(base_url, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    pub fn with_options(
        mut base_url: Url,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, ApiError> {
        // `Url::join` replaces the last segment unless the base ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(ApiError::Transport)?;
        Ok(Self {
            http,
            base_url,
            token: None,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, ApiError> {
        let base_url = Url::parse(cfg.api.base_url.trim())
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", cfg.api.base_url)))?;
        let client = Self::with_options(base_url, cfg.api.timeout(), &cfg.api.user_agent)?;
        Ok(match cfg.api.token() {
            Some(token) => client.with_token(token),
            None => client,
        })
    }

    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..self.clone()
        }
    }

    pub fn without_token(&self) -> Self {
        Self {
            token: None,
            ..self.clone()
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(API_PREFIX)
            .and_then(|api| api.join(path))
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))
    }

    pub fn build_request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<reqwest::Request, ApiError> {
        let mut url = self.endpoint(path)?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }

        let mut builder = self
            .http
            .request(method, url)
            .header("Content-Type", "application/json");
        if let Some(token) = &self.token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        builder.build().map_err(ApiError::Transport)
    }

    /// Execute a request and return the body of a 2xx response.
    async fn execute(&self, request: reqwest::Request) -> Result<String, ApiError> {
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending api request");

        let res = self
            .http
            .execute(request)
            .await
            .map_err(ApiError::Transport)?;
        let status = res.status();
        let body = res.text().await.map_err(ApiError::Transport)?;

        if !status.is_success() {
            warn!(%method, %url, status = status.as_u16(), %body, "api request failed");
            return Err(ApiError::http(status.as_u16(), body));
        }
        Ok(body)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        let request = self.build_request(method, path, query, body)?;
        let raw = self.execute(request).await?;
        decode(path, &raw)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.call(Method::GET, path, query, None).await
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        payload: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(payload).map_err(ApiError::Encode)?;
        self.call(method, path, &[], Some(&body)).await
    }

    pub async fn health(&self) -> Result<Health, ApiError> {
        self.get("health", &[]).await
    }

    // Auth

    pub async fn register(&self, req: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.send_json(Method::POST, "auth/register", req).await
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.send_json(Method::POST, "auth/login", req).await
    }

    pub async fn me(&self) -> Result<Me, ApiError> {
        self.get("auth/me", &[]).await
    }

    pub async fn save_onboarding(&self, req: &OnboardingRequest) -> Result<(), ApiError> {
        let _: Value = self.send_json(Method::POST, "onboarding", req).await?;
        Ok(())
    }

    pub async fn subjects(&self) -> Result<Vec<Subject>, ApiError> {
        self.get("subjects", &[]).await
    }

    // Feed and listings

    pub async fn feed(&self, again: bool) -> Result<Vec<Listing>, ApiError> {
        let query = feed_query(again);
        self.get("feed", &query).await
    }

    pub async fn create_listing(&self, req: &ListingCreate) -> Result<Listing, ApiError> {
        self.send_json(Method::POST, "listings", req).await
    }

    pub async fn listing(&self, id: ListingId) -> Result<Listing, ApiError> {
        self.get(&format!("listings/{id}"), &[]).await
    }

    pub async fn my_listings(&self) -> Result<Vec<Listing>, ApiError> {
        self.get("listings/me", &[]).await
    }

    pub async fn update_listing(
        &self,
        id: ListingId,
        payload: &ListingUpdate,
    ) -> Result<Listing, ApiError> {
        self.send_json(Method::PATCH, &format!("listings/{id}"), payload)
            .await
    }

    pub async fn delete_listing(&self, id: ListingId) -> Result<(), ApiError> {
        let request = self.build_request(Method::DELETE, &format!("listings/{id}"), &[], None)?;
        self.execute(request).await?;
        Ok(())
    }

    // Swipes, matches, messages

    pub async fn swipe(&self, req: &SwipeRequest) -> Result<SwipeResponse, ApiError> {
        self.send_json(Method::POST, "swipes", req).await
    }

    pub async fn matches(&self) -> Result<Vec<Match>, ApiError> {
        self.get("matches", &[]).await
    }

    pub async fn messages(&self, match_id: i64) -> Result<Vec<Message>, ApiError> {
        self.get("messages", &[("match_id", match_id.to_string())])
            .await
    }

    pub async fn send_message(&self, req: &MessageCreate) -> Result<Message, ApiError> {
        self.send_json(Method::POST, "messages", req).await
    }
}

/// `again=true` is only sent for a forced restart.
pub fn feed_query(again: bool) -> Vec<(&'static str, String)> {
    if again {
        vec![("again", "true".to_string())]
    } else {
        Vec::new()
    }
}

pub(crate) fn decode<T: DeserializeOwned>(path: &str, raw: &str) -> Result<T, ApiError> {
    serde_json::from_str(raw).map_err(|err| {
        error!(path, %err, body = raw, "failed to decode api response");
        ApiError::Decode(err)
    })
}

#[async_trait]
impl FeedService for ApiClient {
    async fn fetch_candidates(&self, again: bool) -> Result<Vec<Listing>, ApiError> {
        self.feed(again).await
    }

    async fn submit_swipe(&self, target_user_id: UserId, like: bool) -> Result<bool, ApiError> {
        let out = self.swipe(&SwipeRequest { target_user_id, like }).await?;
        Ok(out.matched)
    }
}

#[async_trait]
impl AuthService for ApiClient {
    fn authorized(&self, token: &str) -> Self {
        self.with_token(token)
    }

    fn anonymous(&self) -> Self {
        self.without_token()
    }

    async fn register(&self, req: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        ApiClient::register(self, req).await
    }

    async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ApiError> {
        ApiClient::login(self, req).await
    }

    async fn me(&self) -> Result<Me, ApiError> {
        ApiClient::me(self).await
    }

    async fn save_onboarding(&self, req: &OnboardingRequest) -> Result<(), ApiError> {
        ApiClient::save_onboarding(self, req).await
    }
}

#[async_trait]
impl MatchService for ApiClient {
    async fn matches(&self) -> Result<Vec<Match>, ApiError> {
        ApiClient::matches(self).await
    }

    async fn messages(&self, match_id: i64) -> Result<Vec<Message>, ApiError> {
        ApiClient::messages(self, match_id).await
    }

    async fn send_message(&self, match_id: i64, body: &str) -> Result<Message, ApiError> {
        let req = MessageCreate {
            match_id,
            body: body.to_string(),
        };
        ApiClient::send_message(self, &req).await
    }
}
