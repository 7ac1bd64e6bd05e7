//! Novelti CLI
//!
//! Local entry point for resolving book searches and managing thumbnails.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use novelti::{
    cache::ResultCache,
    error::{AppError, Result},
    models::{Config, SearchMode, SearchRequest},
    services::{BookResolver, HttpBookSource},
    storage::LocalThumbnailStore,
};

/// Novelti - book search over the Google Books API
#[derive(Parser, Debug)]
#[command(name = "novelti", version, about = "Book search with normalization and caching")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "novelti.toml")]
    config: PathBuf,

    /// Override the thumbnail store directory
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search books and print them as JSON
    Search {
        /// Search mode: id, subject, title, text, isbn
        #[arg(short, long, default_value = "text")]
        mode: SearchMode,

        /// Search term (volume ID for `id` mode)
        term: String,

        /// Pagination offset
        #[arg(long, default_value_t = 0)]
        offset: u32,

        /// Include descriptions
        #[arg(long)]
        detailed: bool,
    },

    /// Show the thumbnail recorded for a book
    Thumbnail {
        /// Book ID
        id: String,
    },

    /// Record a thumbnail for a book
    Attach {
        /// Book ID
        id: String,

        /// Thumbnail URL (http or https)
        url: String,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, default_level: &str) {
    let level = if verbose { "debug" } else { default_level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn build_resolver(config: &Config) -> Result<BookResolver> {
    let source = Arc::new(HttpBookSource::new(&config.upstream)?);
    let store = Arc::new(LocalThumbnailStore::new(&config.thumbnails.store_dir));
    let cache = Arc::new(ResultCache::new(config.cache.ttl(), config.cache.capacity));
    Ok(BookResolver::new(source, store, cache, config))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };
    if let Some(dir) = cli.storage_dir {
        config.thumbnails.store_dir = dir;
    }

    init_logging(cli.verbose, &config.logging.level);
    log::debug!("Using configuration from {}", cli.config.display());

    match cli.command {
        Command::Search {
            mode,
            term,
            offset,
            detailed,
        } => {
            config.validate()?;
            let resolver = build_resolver(&config)?;
            let request = match mode {
                SearchMode::ById => SearchRequest::by_id(term),
                mode => SearchRequest::new(mode, term, offset).detailed(detailed),
            };

            let outcome = resolver.resolve(&request).await;
            let stats = resolver.cache().stats();
            log::debug!(
                "Cache: {} entries, {} hits, {} misses, {} expired",
                stats.entries,
                stats.hits,
                stats.misses,
                stats.expired
            );

            match outcome {
                Ok(books) => println!("{}", serde_json::to_string_pretty(&*books)?),
                Err(AppError::NoResultsFound { term }) => {
                    log::info!("No books found for '{}'", term);
                    println!("[]");
                }
                Err(e) => {
                    log::error!(
                        "Search failed ({}, retryable: {}): {}",
                        e.kind(),
                        e.is_retryable(),
                        e
                    );
                    return Err(e);
                }
            }
        }

        Command::Thumbnail { id } => {
            let resolver = build_resolver(&config)?;
            match resolver.stored_thumbnail(&id).await? {
                Some(url) => println!("{}", serde_json::json!({ "id": id, "thumbnail": url })),
                None => {
                    log::warn!("No thumbnail recorded for {}", id);
                    return Err(AppError::validation(format!(
                        "no thumbnail found for book ID: {id}"
                    )));
                }
            }
        }

        Command::Attach { id, url } => {
            let resolver = build_resolver(&config)?;
            resolver.attach_thumbnail(&id, &url).await?;
            log::info!("✓ Thumbnail recorded for {}", id);
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }
    }

    Ok(())
}
