//! GreenBible CLI: the main entry point.
//!
//! Commands:
//! - `onboard`: initialize config & data directory
//! - `chat`: interactive chat or single-message mode
//! - `history`: inspect, limit, or clear the chat history
//! - `tasks`: manage calendar tasks and reminders
//! - `config`: show, locate, or validate configuration
//! - `status`: show system status

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "greenbible",
    about = "GreenBible: gardening assistant with calendar scheduling",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and data directory
    Onboard,

    /// Chat with the plant assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Inspect or manage the chat history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Manage calendar tasks
    Tasks {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show system status
    Status,
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Print the stored conversation
    Show,
    /// Show the history limit, or set it (0 or less keeps up to 200 messages)
    Limit {
        #[arg(allow_negative_numbers = true)]
        value: Option<i64>,
    },
    /// Delete the stored conversation
    Clear,
}

#[derive(Subcommand)]
enum TaskAction {
    /// List tasks by date and time
    List,
    /// Add a task
    Add {
        /// What to do
        text: String,
        /// Date as YYYY-MM-DD
        #[arg(short, long)]
        date: String,
        /// Time as HH:MM
        #[arg(short, long)]
        time: Option<String>,
    },
    /// Remove a task by ID
    Remove { id: String },
    /// Show upcoming reminders
    Reminders,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Validate the configuration
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::History { action } => match action {
            HistoryAction::Show => commands::history::show().await?,
            HistoryAction::Limit { value } => commands::history::limit(value).await?,
            HistoryAction::Clear => commands::history::clear().await?,
        },
        Commands::Tasks { action } => match action {
            TaskAction::List => commands::tasks::list().await?,
            TaskAction::Add { text, date, time } => {
                commands::tasks::add(&text, &date, time.as_deref()).await?
            }
            TaskAction::Remove { id } => commands::tasks::remove(&id).await?,
            TaskAction::Reminders => commands::tasks::reminders().await?,
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
        },
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
