//! Credential handling for the backend: bearer tokens, password hashes, and
//! Google ID-token verification.

mod google;
mod password;
mod token;

pub use google::{GoogleAuthError, GoogleVerifier};
pub use password::{hash_password, verify_password, PasswordError, MIN_PASSWORD_LEN};
pub use token::{TokenError, TokenSigner};
