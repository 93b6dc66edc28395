//! Stateless bearer tokens.
//!
//! A token is `base64url(payload) "." base64url(hmac_sha256(payload))` where
//! the payload is the JSON claims `{ "sub": <user id>, "exp": <unix secs> }`.
//! There is no server-side session store, so tokens cannot be revoked before
//! they expire.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signing key is unusable")]
    InvalidKey,
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not match")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: i64,
    exp: i64,
}

/// Issues and verifies bearer tokens with a shared HMAC key.
#[derive(Clone)]
pub struct TokenSigner {
    mac: HmacSha256,
    ttl_secs: i64,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("key", &"[redacted]")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl TokenSigner {
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidKey`] if the HMAC cannot be keyed with
    /// `secret`.
    pub fn new(secret: &str, ttl_secs: u64) -> Result<Self, TokenError> {
        let mac =
            HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::InvalidKey)?;
        Ok(Self {
            mac,
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        })
    }

    #[must_use]
    pub fn issue(&self, user_id: i64) -> String {
        self.issue_at(user_id, Utc::now())
    }

    #[must_use]
    pub fn issue_at(&self, user_id: i64, now: DateTime<Utc>) -> String {
        let claims = Claims {
            sub: user_id,
            exp: now.timestamp().saturating_add(self.ttl_secs),
        };
        // Claims is two integers; serialisation cannot fail.
        let payload = serde_json::to_vec(&claims).unwrap_or_default();
        let encoded = URL_SAFE_NO_PAD.encode(payload);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(encoded.as_bytes()));
        format!("{encoded}.{signature}")
    }

    /// Returns the user id carried by a valid, unexpired token.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] describing why the token was rejected.
    pub fn verify(&self, token: &str) -> Result<i64, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// # Errors
    ///
    /// Same as [`TokenSigner::verify`].
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<i64, TokenError> {
        let (encoded, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;

        let expected = self.sign(encoded.as_bytes());
        if !bool::from(expected.as_slice().ct_eq(signature.as_slice())) {
            return Err(TokenError::BadSignature);
        }

        let payload = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims.sub)
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}
