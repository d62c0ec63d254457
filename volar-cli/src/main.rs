use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use volar_core::{Credentials, PassengerLimit, SessionStore};
use volar_store::{Config, FileSessionStore, HttpGateway};

mod commands;
mod terminal;

/// `volar` is this binary's tracing target.
const DEFAULT_LOG_FILTER: &str = "volar=debug,volar_reservation=debug,volar_store=info";

#[derive(Debug, Parser)]
#[command(name = "volar", about = "Manage flight reservations from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Store the auth token issued by the login service
    Login {
        token: String,
        #[arg(long)]
        user_id: Option<i64>,
    },
    /// Forget the stored session
    Logout,
    /// Show your reservations
    List,
    /// Book a flight
    Book {
        flight_id: i64,
        #[arg(short, long, default_value_t = 1)]
        passengers: u32,
    },
    /// Change the passenger count of a reservation
    Edit { id: i64, passengers: u32 },
    /// Delete a reservation
    Delete {
        id: i64,
        /// Answer the confirmation with "Delete"
        #[arg(long)]
        yes: bool,
    },
    /// Confirm payment of a pending reservation
    Confirm { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("Failed to load config")?;
    tracing::debug!("Using API at {}", config.api.base_url);

    let session = Arc::new(
        FileSessionStore::open(&config.session.path).context("Failed to open session store")?,
    );
    let gateway = Arc::new(
        HttpGateway::new(&config.api, session.clone()).context("Failed to build HTTP client")?,
    );
    let limit = PassengerLimit::new(config.booking.max_passengers)
        .context("Invalid booking.max_passengers")?;
    let ctx = commands::Context {
        gateway,
        session: session.clone(),
        navigator: Arc::new(terminal::HintNavigator),
        limit,
    };

    match cli.command {
        Command::Login { token, user_id } => {
            if token.trim().is_empty() {
                bail!("token must not be empty");
            }
            let mut credentials = Credentials::new(token.trim());
            if let Some(id) = user_id {
                credentials = credentials.with_user_id(id);
            }
            session.sign_in(credentials)?;
            println!("Logged in.");
            Ok(())
        }
        Command::Logout => {
            session.sign_out()?;
            println!("Logged out.");
            Ok(())
        }
        Command::List => commands::list(&ctx).await,
        Command::Book { flight_id, passengers } => commands::book(&ctx, flight_id, passengers).await,
        Command::Edit { id, passengers } => commands::edit(&ctx, id, passengers).await,
        Command::Delete { id, yes } => commands::delete(&ctx, id, yes).await,
        Command::Confirm { id } => commands::confirm(&ctx, id).await,
    }
}
