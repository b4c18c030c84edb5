//! Maquette - command line client for the model hosting service
//!
//! Sign in, upload and manage models, and drive viewer sessions with
//! saved camera viewpoints against a remote Maquette backend.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use maquette_client::{ApiClient, SessionStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "maquette")]
#[command(about = "Upload, view, and manage 3D models on a Maquette server")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "maquette.toml")]
    config: PathBuf,

    /// Backend base URL (overrides the config file)
    #[arg(long)]
    api_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and sign in
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in with an existing account
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List uploaded models
    List,
    /// Upload a model file (.glb, .gltf, or .obj)
    Upload { path: PathBuf },
    /// Delete a model and its saved views
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Open a model in a viewer session
    View {
        id: String,
        /// Save the current view under this name
        #[arg(long)]
        save_view: Option<String>,
        /// Apply a saved viewpoint by id
        #[arg(long)]
        apply_view: Option<String>,
        /// Number of frames to run the loop for
        #[arg(long, default_value_t = 120)]
        frames: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Load configuration
    let mut config = config::load_config(&args.config)?;
    if let Some(url) = args.api_url {
        config.api.base_url = url;
    }

    let session = Arc::new(SessionStore::open(config.credentials_path()?));
    let client = Arc::new(ApiClient::with_timeout(
        &config.api.base_url,
        session,
        Duration::from_secs(config.api.timeout_secs),
    )?);

    match args.command {
        Command::Register {
            username,
            email,
            password,
        } => commands::register(&client, &username, &email, &password).await,
        Command::Login { email, password } => commands::login(&client, &email, &password).await,
        Command::Logout => commands::logout(&client),
        Command::Whoami => commands::whoami(&client),
        Command::List => commands::list(&client).await,
        Command::Upload { path } => commands::upload(&client, &path).await,
        Command::Delete { id, yes } => commands::delete(&client, &id, yes).await,
        Command::View {
            id,
            save_view,
            apply_view,
            frames,
        } => commands::view(&client, &id, save_view, apply_view, frames).await,
    }
}
