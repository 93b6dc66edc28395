mod api;
mod auth;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use vidmap_youtube::{VideoClientSettings, YoutubeClient};

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    auth::{GoogleVerifier, TokenSigner},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = vidmap_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = vidmap_db::PoolConfig::from_app_config(&config);
    let pool = vidmap_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = vidmap_db::run_migrations(&pool).await?;
    tracing::info!(applied, "database migrations complete");

    let tokens = TokenSigner::new(&config.token_secret, config.token_ttl_secs)?;

    let google = config
        .google_client_id
        .as_deref()
        .map(|client_id| GoogleVerifier::new(client_id, config.provider.http_timeout_secs))
        .transpose()?;
    if google.is_none() {
        tracing::warn!("GOOGLE_CLIENT_ID not set; Google sign-in disabled");
    }

    let videos = config
        .provider
        .youtube_api_key
        .as_deref()
        .map(|key| YoutubeClient::new(key, VideoClientSettings::from_config(&config.provider)))
        .transpose()?
        .map(Arc::new);
    if videos.is_none() {
        tracing::warn!("YOUTUBE_API_KEY not set; /api/search disabled");
    }

    let app = build_app(
        AppState {
            pool,
            tokens,
            google,
            videos,
        },
        default_rate_limit_state(),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "vidmap-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
