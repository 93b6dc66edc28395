mod account;
mod backend;
mod explore;
mod store;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::backend::{BackendClient, VideoAccess};
use crate::explore::ProviderArgs;
use crate::store::StoredSession;

#[derive(Debug, Parser)]
#[command(name = "vidmap-cli")]
#[command(about = "Browse videos recorded around places on the map")]
struct Cli {
    /// Base URL of the vidmap backend
    #[arg(long, global = true, env = "VIDMAP_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// Session file (defaults to ~/.vidmap/state.json)
    #[arg(long, global = true, env = "VIDMAP_STATE_FILE")]
    state_file: Option<PathBuf>,

    #[command(flatten)]
    providers: ProviderArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search videos for a text at the active location
    Search { text: String },
    /// Search, then load one more page of results
    More { text: String },
    /// Select a point on the map, optionally searching there
    Click {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        #[arg(long)]
        query: Option<String>,
    },
    /// Search a random keyword of a category (food, music, culture, ...)
    Category { name: String },
    /// Show trending videos for the default region
    Trending,
    /// Suggest place names for partial input
    Suggest { text: String },
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "VIDMAP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "VIDMAP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored credentials
    Logout,
    /// Show your watch history
    History {
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Delete your watch history
    ClearHistory,
    /// Open a video and record it in your history
    Watch {
        video_id: String,
        #[arg(long)]
        title: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        #[arg(long)]
        place: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let state_path = cli
        .state_file
        .clone()
        .unwrap_or_else(store::default_state_path);
    let mut session = StoredSession::load(&state_path)?;

    let Some(command) = cli.command else {
        println!("vidmap-cli ready; run `vidmap-cli --help` for commands");
        return Ok(());
    };

    let result = run(command, &cli.api_url, &cli.providers, &mut session).await;
    session.save(&state_path)?;
    result
}

async fn run(
    command: Commands,
    api_url: &str,
    providers: &ProviderArgs,
    session: &mut StoredSession,
) -> anyhow::Result<()> {
    match command {
        Commands::Search { text } => {
            let config = explore::provider_config(providers)?;
            let orchestrator = explore::build_orchestrator(&config)?;
            explore::restore_location(&orchestrator, session).await;
            explore::run_search(&orchestrator, &text).await
        }
        Commands::More { text } => {
            let config = explore::provider_config(providers)?;
            let orchestrator = explore::build_orchestrator(&config)?;
            explore::restore_location(&orchestrator, session).await;
            explore::run_more(&orchestrator, &text).await
        }
        Commands::Click { lat, lng, query } => {
            let config = explore::provider_config(providers)?;
            let orchestrator = explore::build_orchestrator(&config)?;
            explore::restore_location(&orchestrator, session).await;
            explore::run_click(&orchestrator, lat, lng, query.as_deref()).await
        }
        Commands::Category { name } => {
            let config = explore::provider_config(providers)?;
            let orchestrator = explore::build_orchestrator(&config)?;
            explore::restore_location(&orchestrator, session).await;
            explore::run_category(&orchestrator, &name).await
        }
        Commands::Trending => {
            let config = explore::provider_config(providers)?;
            let orchestrator = explore::build_orchestrator(&config)?;
            explore::restore_location(&orchestrator, session).await;
            explore::run_trending(&orchestrator).await
        }
        Commands::Suggest { text } => {
            let config = explore::provider_config(providers)?;
            let geocoder = explore::build_geocoder(&config)?;
            explore::run_suggest(&geocoder, &text).await;
            Ok(())
        }
        Commands::Login { email, password } => {
            let backend = BackendClient::new(api_url, None)?;
            account::login(&backend, session, &email, &password).await
        }
        Commands::Register {
            name,
            email,
            password,
        } => {
            let backend = BackendClient::new(api_url, None)?;
            account::register(&backend, session, &name, &email, &password).await
        }
        Commands::Logout => {
            account::logout(session);
            Ok(())
        }
        Commands::History { limit } => {
            let backend = BackendClient::new(api_url, session.auth_token.clone())?;
            account::history(&backend, session, limit).await
        }
        Commands::ClearHistory => {
            let backend = BackendClient::new(api_url, session.auth_token.clone())?;
            account::clear_history(&backend, session).await
        }
        Commands::Watch {
            video_id,
            title,
            lat,
            lng,
            place,
        } => {
            let backend = BackendClient::new(api_url, session.auth_token.clone())?;
            let access = VideoAccess {
                video_id: &video_id,
                title: &title,
                place_name: place.as_deref(),
                latitude: lat,
                longitude: lng,
            };
            account::watch(&backend, &access).await;
            Ok(())
        }
    }
}
