use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use smart_ledger::commands;
use smart_ledger::services::state::AppState;

#[derive(Parser)]
#[command(
    name = "smart-ledger",
    version,
    about = "Sequential document numbers for Smart Ledger"
)]
struct Cli {
    /// SQLite database holding counters, session and settings
    #[arg(long, env = "SMART_LEDGER_DB", default_value = "smart-ledger.sqlite")]
    db: PathBuf,

    /// Ledger API base URL for this run (overrides the stored setting)
    #[arg(long, env = "SMART_LEDGER_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hand out the next number of a category
    Generate {
        /// payment, receipt, purchase, invoice, sell or a folder name
        category: String,
        /// Show the number without claiming it
        #[arg(long)]
        preview: bool,
    },
    /// Show the stored number without incrementing
    Current { category: String },
    /// Forget the stored number of a category
    Reset { category: String },
    /// Store an explicit number for a category
    Set { category: String, value: String },
    /// Numbers handed out on this device
    History {
        category: String,
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Store the ledger API token
    Login {
        token: String,
        /// Store the token unencrypted
        #[arg(long)]
        plain: bool,
    },
    /// Clear the token and all counters
    Logout,
    /// Show or change stored settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    Show,
    /// Keys: api_base_url, request_timeout_secs
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("smart_ledger=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let state = AppState::open(&cli.db, cli.api_url).await?;

    match cli.command {
        Commands::Generate { category, preview } => {
            let number = commands::numbers::generate_number(&state, &category, preview).await?;
            println!("{}", number);
        }
        Commands::Current { category } => {
            println!("{}", commands::numbers::current_number(&state, &category).await?);
        }
        Commands::Reset { category } => {
            commands::numbers::reset_number(&state, &category).await?;
            println!("Reset {}", category.trim().to_lowercase());
        }
        Commands::Set { category, value } => {
            commands::numbers::override_number(&state, &category, &value).await?;
            println!("{}", value.trim());
        }
        Commands::History { category, limit } => {
            for entry in commands::numbers::number_history(&state, &category, limit)? {
                println!("{}  {:<10} {}", entry.created_at, entry.source, entry.document_number);
            }
        }
        Commands::Login { token, plain } => {
            commands::session::login(&state, &token, !plain).await?;
            println!("Logged in");
        }
        Commands::Logout => {
            commands::session::logout(&state).await?;
            println!("Logged out");
        }
        Commands::Config(ConfigCommands::Show) => {
            let settings = commands::settings::get_settings(&state).await?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Commands::Config(ConfigCommands::Set { key, value }) => {
            commands::settings::set_setting(&state, &key, &value).await?;
            println!("Saved {}", key);
        }
    }

    Ok(())
}
