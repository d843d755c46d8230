//! Command-line driver for the instant search pipeline.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use instasearch_core::aggregation::build_search_request;
use instasearch_core::cache::{InMemorySearchCache, SearchCacheStore};
use instasearch_core::client::RemoteSearchClient;
use instasearch_core::interceptor::InstantSearch;
use instasearch_core::models::{Post, QueryContext, SearchError};
use instasearch_core::options::InstantSearchConfig;
use instasearch_core::sqlite::SqliteSearchCache;
use instasearch_core::transport::UreqTransport;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "instasearch")]
#[command(about = "Instant search aggregation driver")]
struct Cli {
    /// Site configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Persist cached responses in this SQLite database
    #[arg(long, global = true)]
    cache_db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch filter aggregations for a site search
    Aggregations {
        /// Search terms of the simulated request
        #[arg(short, long, default_value = "")]
        search: String,
    },

    /// Print the aggregation request and its endpoint URL without sending it
    Request,

    /// Print the options handed to the front-end client
    Options,

    /// Run the listing interception for a simulated request
    Listing {
        /// Search terms; omit to simulate a non-search listing
        #[arg(short, long)]
        search: Option<String>,

        /// Simulate an admin-context request
        #[arg(long)]
        admin: bool,
    },

    /// Delete expired entries from the SQLite cache
    PurgeCache,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config '{path}': {source}")]
    ParseConfig {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{0}")]
    Search(#[from] SearchError),
    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("purge-cache requires --cache-db")]
    MissingCacheDb,
}

#[derive(Serialize)]
struct ListingOutput {
    intercepted: bool,
    found_posts: u64,
    max_num_pages: u64,
    posts: Vec<Post>,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "instasearch command failed");
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => InstantSearchConfig::default(),
    };

    if let Commands::PurgeCache = cli.command {
        let path = cli.cache_db.ok_or(CliError::MissingCacheDb)?;
        let cache = SqliteSearchCache::new(path);
        cache.migrate_to_latest()?;
        let removed = cache.purge_expired()?;
        tracing::info!(removed, "purged expired cache entries");
        return print_json(&serde_json::json!({ "removed": removed }));
    }

    let cache = open_cache(cli.cache_db.as_deref())?;
    let client = RemoteSearchClient::new(
        config.remote.clone(),
        Arc::new(UreqTransport::default()),
        cache,
    );
    let search = InstantSearch::new(config, client);

    match cli.command {
        Commands::Aggregations { search: terms } => {
            let mut scope = search.scope();
            scope.after_parse(&QueryContext::site_search(terms));
            if let Some(Err(error)) = scope.outcome() {
                return Err(error.clone().into());
            }
            print_json(&scope.aggregation_results())
        }
        Commands::Request => {
            let request = build_search_request(search.filters());
            let args = request.to_value();
            let url = search.client().search_url(search.config().site_id, &args);
            print_json(&serde_json::json!({ "url": url, "args": args }))
        }
        Commands::Options => print_json(&search.client_options()),
        Commands::Listing {
            search: terms,
            admin,
        } => {
            let mut query = match terms {
                Some(terms) => QueryContext::site_search(terms),
                None => QueryContext::listing(),
            };
            if admin {
                query = query.in_admin();
            }

            let scope = search.scope();
            let before = query.clone();
            let posts = scope.before_listing(Vec::new(), &mut query);
            print_json(&ListingOutput {
                intercepted: query != before,
                found_posts: query.found_posts,
                max_num_pages: query.max_num_pages,
                posts,
            })
        }
        Commands::PurgeCache => Ok(()),
    }
}

fn load_config(path: &Path) -> Result<InstantSearchConfig, CliError> {
    let raw = fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| CliError::ParseConfig {
        path: path.to_path_buf(),
        source,
    })
}

fn open_cache(database_path: Option<&Path>) -> Result<Arc<dyn SearchCacheStore>, CliError> {
    match database_path {
        Some(path) => {
            let cache = SqliteSearchCache::new(path);
            cache.migrate_to_latest()?;
            Ok(Arc::new(cache))
        }
        None => Ok(Arc::new(InMemorySearchCache::new())),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
