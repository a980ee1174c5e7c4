//! Coursemap CLI
//!
//! Starts the interactive shell, or runs a single query non-interactively.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use coursemap::{
    client::NebulaClient,
    error::Result,
    models::Config,
    services::{QueryEngine, ResponseCache},
    shell::{ConsoleProgress, Shell},
    storage::{LocalStorage, RecordStorage},
    utils::log as console,
};

#[cfg(feature = "map")]
use coursemap::client::MapClient;

/// Coursemap - course section query shell
#[derive(Parser, Debug)]
#[command(
    name = "coursemap",
    version,
    about = "Query course sections, compose weekly schedules and draw room maps"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "coursemap.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Seed the response cache from a snapshot written by an earlier session
    #[arg(long, value_name = "PATH")]
    load_cache: Option<PathBuf>,

    /// Do not write a cache snapshot on exit
    #[arg(long)]
    no_persist: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the interactive shell (default)
    Shell,

    /// Run one query and print a summary
    Query {
        /// Filters as key=value, e.g. session=23F building=JO
        filters: Vec<String>,

        /// Also export the records as JSON
        #[arg(long)]
        export: bool,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, config: &Config) {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
    console::init(level);
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.config);
    init_logging(cli.verbose, &config);
    if cli.no_persist {
        config.storage.persist_on_exit = false;
    }

    if let Some(Command::Validate) = cli.command {
        config.validate()?;
        console::success(&format!("{} is valid", cli.config.display()));
        return Ok(());
    }
    config.validate()?;

    let storage = Arc::new(LocalStorage::new(&config.storage));
    let cache = Arc::new(ResponseCache::new());
    if let Some(path) = &cli.load_cache {
        let restored = cache.restore(storage.load_cache_snapshot(path).await?);
        console::info(&format!(
            "Loaded {} cached responses from {}",
            restored,
            path.display()
        ));
    }

    let client = Arc::new(NebulaClient::new(&config.api)?);
    let mut engine = QueryEngine::new(client, cache, &config.api);

    match cli.command {
        Some(Command::Query { filters, export }) => {
            let mut progress = ConsoleProgress::new(config.logging.show_progress);
            let result = engine.run_query_args(&filters, &mut progress).await?;
            console::summary(
                "Query",
                &[
                    ("filter", result.filter.to_string()),
                    ("sections", result.sections.len().to_string()),
                ],
            );
            if export {
                let path = storage
                    .export_sections(&result.file_stem(), &result.sections)
                    .await?;
                console::success(&format!("Saved to {}", path.display()));
            }
            if config.storage.persist_on_exit && !engine.cache().is_empty() {
                storage
                    .write_cache_snapshot(&engine.cache().snapshot())
                    .await?;
            }
        }
        Some(Command::Shell) | None => {
            console::header("coursemap - type 'help' for commands");
            let shell = Shell::new(engine, storage, &config);

            #[cfg(feature = "map")]
            let shell = shell.with_map_client(MapClient::new(&config.map, &config.api)?);

            let mut shell = shell;
            shell.run().await?;
            log::info!(
                "Session done: {} network requests",
                shell.engine().network_requests()
            );
        }
        Some(Command::Validate) => {}
    }

    Ok(())
}
