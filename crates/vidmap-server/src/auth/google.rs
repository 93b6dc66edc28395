//! Google ID-token verification via the `tokeninfo` endpoint.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;
use vidmap_db::GoogleProfile;

const DEFAULT_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

#[derive(Debug, Error)]
pub enum GoogleAuthError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid tokeninfo URL: {0}")]
    InvalidUrl(String),
    #[error("identity provider rejected the credential (status {status})")]
    Rejected { status: u16 },
    #[error("credential was issued for another client")]
    AudienceMismatch,
    #[error("email address is not verified")]
    EmailNotVerified,
    #[error("credential is missing the {0} claim")]
    MissingClaim(&'static str),
}

/// `tokeninfo` reports booleans as strings (`"true"`), but tolerate real booleans too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

impl Flag {
    fn is_true(&self) -> bool {
        match self {
            Flag::Bool(value) => *value,
            Flag::Text(value) => value.eq_ignore_ascii_case("true"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: Option<String>,
    sub: Option<String>,
    email: Option<String>,
    email_verified: Option<Flag>,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Clone, Debug)]
pub struct GoogleVerifier {
    client: Client,
    client_id: String,
    tokeninfo_url: Url,
}

impl GoogleVerifier {
    /// # Errors
    ///
    /// Returns [`GoogleAuthError::Http`] if the HTTP client cannot be built.
    pub fn new(client_id: &str, timeout_secs: u64) -> Result<Self, GoogleAuthError> {
        Self::with_tokeninfo_url(client_id, timeout_secs, DEFAULT_TOKENINFO_URL)
    }

    /// Creates a verifier against a custom `tokeninfo` URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`GoogleAuthError::InvalidUrl`] if `tokeninfo_url` does not parse.
    pub fn with_tokeninfo_url(
        client_id: &str,
        timeout_secs: u64,
        tokeninfo_url: &str,
    ) -> Result<Self, GoogleAuthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        let tokeninfo_url = Url::parse(tokeninfo_url)
            .map_err(|e| GoogleAuthError::InvalidUrl(format!("'{tokeninfo_url}': {e}")))?;

        Ok(Self {
            client,
            client_id: client_id.to_owned(),
            tokeninfo_url,
        })
    }

    /// Verifies an ID token and returns the identity it asserts.
    ///
    /// # Errors
    ///
    /// Returns [`GoogleAuthError`] if the provider rejects the token, the
    /// audience is not this client, or the email is unverified.
    pub async fn verify(&self, credential: &str) -> Result<GoogleProfile, GoogleAuthError> {
        let mut url = self.tokeninfo_url.clone();
        url.query_pairs_mut().append_pair("id_token", credential);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GoogleAuthError::Rejected {
                status: status.as_u16(),
            });
        }
        let info: TokenInfo = response.json().await?;

        if info.aud.as_deref() != Some(self.client_id.as_str()) {
            return Err(GoogleAuthError::AudienceMismatch);
        }
        if !info.email_verified.as_ref().is_some_and(Flag::is_true) {
            return Err(GoogleAuthError::EmailNotVerified);
        }
        let sub = info.sub.ok_or(GoogleAuthError::MissingClaim("sub"))?;
        let email = info.email.ok_or(GoogleAuthError::MissingClaim("email"))?;
        let display_name = info
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_owned());

        Ok(GoogleProfile {
            sub,
            email,
            display_name,
            picture: info.picture,
        })
    }
}
