use clap::{Parser, Subcommand};
use quarry_engine::CancelFlag;
use tracing::Level;

use quarry_client::{GenerateArgs, ImportArgs, SearchArgs, commands};

#[derive(Parser)]
#[command(
    name = "quarry",
    about = "Token search over very large encoded record files",
    version,
    author,
    long_about = "Indexes encoded/compressed record-structured files into a durable \
                  token catalog, then answers whole-word searches by re-decoding only \
                  the matching byte ranges. The decoded stream is never persisted."
)]
struct Cli {
    /// Set the logging level
    #[arg(short, long, value_enum, default_value = "warn")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Index an encoded source into a catalog
    Import(ImportArgs),

    /// Search a catalog and print matching records
    Search(SearchArgs),

    /// Generate an encoded test fixture of a target size
    Generate(GenerateArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| Level::from(cli.log_level).to_string().to_lowercase().into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Ctrl-C flips the cooperative flag; the running operation aborts at
    // its next batch or read boundary.
    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("cancellation requested");
                cancel.cancel();
            }
        });
    }

    let result = match cli.command {
        Commands::Import(args) => commands::import::handle(args, cancel).await,
        Commands::Search(args) => commands::search::handle(args, cancel).await,
        Commands::Generate(args) => commands::generate::handle(args).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
