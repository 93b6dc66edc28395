//! Backend commands: sign-in, history, and video-access registration.

use crate::backend::{BackendClient, BackendError, Session, VideoAccess};
use crate::store::StoredSession;

const DEFAULT_HISTORY_LIMIT: i64 = 20;

fn remember(session: &mut StoredSession, signed_in: Session) {
    session.auth_token = Some(signed_in.token);
    session.user_profile = Some(signed_in.user);
}

fn require_user(session: &StoredSession) -> anyhow::Result<i64> {
    session
        .user_id()
        .ok_or_else(|| anyhow::Error::new(BackendError::NotLoggedIn))
}

/// # Errors
///
/// Returns the backend error; stored credentials are left untouched.
pub async fn login(
    backend: &BackendClient,
    session: &mut StoredSession,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let signed_in = backend.login(email, password).await?;
    let name = signed_in.user["display_name"]
        .as_str()
        .unwrap_or(email)
        .to_string();
    remember(session, signed_in);
    println!("Sesión iniciada como {name}");
    Ok(())
}

/// # Errors
///
/// Returns the backend error (409 when the email already has an account).
pub async fn register(
    backend: &BackendClient,
    session: &mut StoredSession,
    name: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let signed_in = backend.register(name, email, password).await?;
    remember(session, signed_in);
    println!("Cuenta creada para {email}");
    Ok(())
}

pub fn logout(session: &mut StoredSession) {
    session.logout();
    println!("Sesión cerrada");
}

/// # Errors
///
/// Returns an error when not logged in or when the backend rejects the call.
/// A 401/403 does not clear the stored token.
pub async fn history(
    backend: &BackendClient,
    session: &StoredSession,
    limit: Option<i64>,
) -> anyhow::Result<()> {
    let user_id = require_user(session)?;
    let rows = backend
        .history(user_id, limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
        .await?;
    if rows.is_empty() {
        println!("Sin historial");
    }
    for row in rows {
        println!(
            "{} · {} · {} ({:.4}, {:.4}) https://www.youtube.com/watch?v={}",
            row.watched_at.format("%Y-%m-%d %H:%M"),
            row.title,
            row.place_name.as_deref().unwrap_or("-"),
            row.latitude,
            row.longitude,
            row.video_id,
        );
    }
    Ok(())
}

/// # Errors
///
/// Same as [`history`].
pub async fn clear_history(backend: &BackendClient, session: &StoredSession) -> anyhow::Result<()> {
    let user_id = require_user(session)?;
    let removed = backend.clear_history(user_id).await?;
    println!("Historial borrado ({removed} entradas)");
    Ok(())
}

/// Records a watched video. Failures are logged and never fail the command.
pub async fn watch(backend: &BackendClient, access: &VideoAccess<'_>) {
    println!("https://www.youtube.com/watch?v={}", access.video_id);
    if let Err(e) = backend.register_video_access(access).await {
        tracing::warn!(error = %e, video_id = access.video_id, "failed to record video access");
    }
}
