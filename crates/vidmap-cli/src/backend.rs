//! Minimal client for the vidmap backend's JSON API.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, Method, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid backend URL: {0}")]
    InvalidBaseUrl(String),
    #[error("{message} ({code}, HTTP {status})")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("not logged in; run `vidmap-cli login` first")]
    NotLoggedIn,
}

impl BackendError {
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    pub video_id: String,
    pub title: String,
    pub place_name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub watched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
struct Cleared {
    removed: u64,
}

/// Payload for `POST /api/register-video-access`.
#[derive(Debug, Clone, Serialize)]
pub struct VideoAccess<'a> {
    pub video_id: &'a str,
    pub title: &'a str,
    pub place_name: Option<&'a str>,
    pub latitude: f64,
    pub longitude: f64,
}

pub struct BackendClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl BackendClient {
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidBaseUrl`] if `base_url` does not parse,
    /// or [`BackendError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("vidmap-cli/0.1")
            .build()?;
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| BackendError::InvalidBaseUrl(format!("'{base_url}': {e}")))?;
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// # Errors
    ///
    /// Returns [`BackendError::Api`] with status 401 for bad credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let body = serde_json::json!({ "email": email, "password": password });
        self.send(Method::POST, "api/auth/login", Some(&body), false)
            .await
    }

    /// # Errors
    ///
    /// Returns [`BackendError::Api`] with status 409 if the email is taken.
    pub async fn register(
        &self,
        display_name: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError> {
        let body = serde_json::json!({
            "display_name": display_name,
            "email": email,
            "password": password,
        });
        self.send(Method::POST, "api/auth/register", Some(&body), false)
            .await
    }

    /// # Errors
    ///
    /// Returns [`BackendError::NotLoggedIn`] without a token, or the
    /// backend's error.
    pub async fn history(&self, user_id: i64, limit: i64) -> Result<Vec<HistoryEntry>, BackendError> {
        let path = format!("api/user-history/{user_id}?limit={limit}");
        self.send::<_, ()>(Method::GET, &path, None, true).await
    }

    /// Returns how many entries were removed.
    ///
    /// # Errors
    ///
    /// Same as [`BackendClient::history`].
    pub async fn clear_history(&self, user_id: i64) -> Result<u64, BackendError> {
        let path = format!("api/clear-history/{user_id}");
        let cleared: Cleared = self.send::<_, ()>(Method::DELETE, &path, None, true).await?;
        Ok(cleared.removed)
    }

    /// # Errors
    ///
    /// Same as [`BackendClient::history`].
    pub async fn register_video_access(&self, access: &VideoAccess<'_>) -> Result<(), BackendError> {
        let _: serde_json::Value = self
            .send(Method::POST, "api/register-video-access", Some(access), true)
            .await?;
        Ok(())
    }

    async fn send<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        authenticated: bool,
    ) -> Result<T, BackendError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| BackendError::InvalidBaseUrl(format!("'{path}': {e}")))?;

        let mut request = self.client.request(method, url);
        if authenticated {
            let token = self.token.as_deref().ok_or(BackendError::NotLoggedIn)?;
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            let envelope: Envelope<T> = response.json().await?;
            return Ok(envelope.data);
        }

        let text = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ErrorEnvelope>(&text) {
            Ok(envelope) => (envelope.error.code, envelope.error.message),
            Err(_) => ("http_error".to_string(), text),
        };
        Err(BackendError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }
}
