//! Drive Fetcher CLI application
//!
//! Downloads the commodities and macro datasets from their shared Google
//! Drive folders, or any folders given on the command line.

use std::error::Error as _;
use std::process;

use tracing::{info, warn};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use drive_fetcher::app::DriveFetcher;
use drive_fetcher::cli::{handle_config, handle_datasets, handle_fetch, handle_list, Cli, Commands};
use drive_fetcher::config::{default_log_level, AppConfig};
use drive_fetcher::errors::Result;

type FilterHandle = reload::Handle<EnvFilter, Registry>;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        if let Some(hint) = e.kind().hint() {
            eprintln!("Hint: {}", hint);
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    if let Some(Commands::Config) = cli.command {
        return handle_config();
    }

    let log_handle = init_logging(&cli);
    info!("Drive Fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load(cli.global.config.clone()).await?;
    apply_configured_level(&log_handle, &cli, &config);

    let fetcher = DriveFetcher::new(config.to_client_config());
    let options = cli.fetch_options(config.to_fetch_options());

    match &cli.command {
        None => {
            info!("Fetching configured datasets");
            handle_datasets(&fetcher, &config.datasets, &options).await?;
        }
        Some(Commands::Fetch { folders }) => {
            info!("Executing fetch command");
            handle_fetch(&fetcher, folders, &options).await?;
        }
        Some(Commands::List { folder }) => {
            info!("Executing list command");
            handle_list(&fetcher, folder, &options).await?;
        }
        Some(Commands::Config) => handle_config()?,
    }

    Ok(())
}

/// Initialize logging from the CLI verbosity flags and the default level
///
/// The returned handle swaps in the configured level once the configuration
/// file has been read.
fn init_logging(cli: &Cli) -> FilterHandle {
    let (filter, handle) = reload::Layer::new(log_filter(cli.log_level(default_log_level())));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(cli.global.very_verbose) // Show levels only in very verbose mode
                .with_writer(std::io::stderr),
        )
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
    handle
}

/// Apply the configured level; verbosity flags still take precedence
fn apply_configured_level(handle: &FilterHandle, cli: &Cli, config: &AppConfig) {
    let level = cli.log_level(config.log_level());
    if let Err(e) = handle.reload(log_filter(level)) {
        warn!("Cannot apply configured log level {}: {}", level, e);
    }
}

fn log_filter(level: tracing::Level) -> EnvFilter {
    match format!("drive_fetcher={}", level).parse::<Directive>() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    }
}
