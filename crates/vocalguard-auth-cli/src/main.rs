//! VocalGuard auth CLI - sign in to the VocalGuard API from a terminal.
//!
//! Each subcommand maps onto one `SessionStore` operation and prints its
//! outcome as JSON. The session persists between runs in the configured
//! storage backend.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vocalguard_auth::{AuthOutcome, Config, ReqwestTransport, SessionStore, StorageBackend};

#[derive(Parser, Debug)]
#[command(name = "vocalguard-auth", version, about = "Sign in to VocalGuard and manage the local session")]
struct Cli {
    /// Auth API base URL (overrides config and VOCALGUARD_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Where the session is kept: file, keyring or memory
    #[arg(long, global = true)]
    storage: Option<StorageBackend>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Create an account and sign in
    Signup {
        email: String,
        /// Read from the terminal without echo when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign in with email and password
    Login {
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign in with a Google ID token
    GoogleLogin { credential: String },
    /// Forget the stored session
    Logout,
    /// Fetch the signed-in user from the server
    Me,
    /// Verify the stored session with the server, if there is one
    Check,
    /// Print the stored bearer token
    Token,
    /// Show whether a session is stored, without contacting the server
    Status,
    /// Save --api-url and --storage to the config file
    Configure,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn apply_flags(config: &mut Config, cli: &Cli) {
    if let Some(ref url) = cli.api_url {
        config.api_base_url = url.clone();
    }
    if let Some(storage) = cli.storage {
        config.storage = storage;
    }
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load()?;
    apply_flags(&mut config, cli);
    Ok(config)
}

/// Persist the command-line flags on top of the saved file, ignoring
/// environment overrides so they don't leak into the file.
fn configure(cli: &Cli) -> Result<ExitCode> {
    let path = Config::config_path()?;
    let mut config = Config::load_from(&path)?;
    apply_flags(&mut config, cli);
    config.save()?;
    info!(path = %path.display(), "Configuration saved");

    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(ExitCode::SUCCESS)
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    match password {
        Some(password) => Ok(password),
        None => rpassword::prompt_password("Password: ").context("Failed to read password"),
    }
}

fn print_outcome(outcome: &AuthOutcome) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn run(store: &SessionStore, command: Command) -> Result<ExitCode> {
    match command {
        Command::Signup { email, password } => {
            let password = password_or_prompt(password)?;
            print_outcome(&store.signup(&email, &password).await)
        }
        Command::Login { email, password } => {
            let password = password_or_prompt(password)?;
            print_outcome(&store.login(&email, &password).await)
        }
        Command::GoogleLogin { credential } => {
            print_outcome(&store.google_login(&credential).await)
        }
        Command::Logout => {
            store.logout();
            Ok(ExitCode::SUCCESS)
        }
        Command::Me => print_outcome(&store.current_user().await),
        Command::Check => print_outcome(&store.check_auth().await),
        Command::Token => match store.token() {
            Some(token) => {
                println!("{}", token);
                Ok(ExitCode::SUCCESS)
            }
            None => {
                eprintln!("Not authenticated");
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Configure => unreachable!("handled before the store is built"),
        Command::Status => {
            let status = json!({
                "authenticated": store.is_authenticated(),
                "user": store.user(),
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();
    if cli.command == Command::Configure {
        return configure(&cli);
    }

    let config = resolve_config(&cli)?;
    debug!(api = %config.api_base_url, storage = %config.storage, "Configuration loaded");

    let storage = config.open_storage()?;
    let transport = Arc::new(ReqwestTransport::new()?);
    let store = SessionStore::new(storage, transport, config.api_base_url.clone());
    info!(authenticated = store.is_authenticated(), "Session store ready");

    run(&store, cli.command).await
}
