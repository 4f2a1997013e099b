//! Papero CLI - Command-line reading client

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use papero_core::types::{BookId, UserId};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "papero")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Library service URL (overrides PAPERO_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the books in a user's library
    Library {
        /// Reader identifier (UUID)
        #[arg(short, long)]
        user: UserId,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the book to continue reading
    Continue {
        /// Reader identifier (UUID)
        #[arg(short, long)]
        user: UserId,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Open a book from the library and show how to read it
    Open {
        /// Book identifier (UUID)
        book: BookId,

        /// Reader identifier (UUID)
        #[arg(short, long)]
        user: UserId,

        /// Output the content descriptor as JSON
        #[arg(long)]
        json: bool,
    },

    /// Save reading progress for a book (clamped to 0-100)
    Progress {
        /// Book identifier (UUID)
        book: BookId,

        /// Progress percentage
        #[arg(allow_negative_numbers = true)]
        value: i64,

        /// Reader identifier (UUID)
        #[arg(short, long)]
        user: UserId,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "papero_cli=debug,papero_core=debug"
    } else {
        "papero_cli=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let service = commands::connect(cli.api_url.as_deref())?;

    match cli.command {
        Commands::Library { user, json } => commands::library(service, user, json).await,

        Commands::Continue { user, json } => commands::continue_reading(service, user, json).await,

        Commands::Open { book, user, json } => commands::open(service, user, book, json).await,

        Commands::Progress { book, value, user } => {
            commands::progress(service, user, book, value).await
        }
    }
}
