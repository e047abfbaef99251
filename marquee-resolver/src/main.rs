//! marquee-resolver - Movie Resolution Service
//!
//! Resolves free-text or IMDb-link movie queries into canonical, persisted
//! catalog records scoped per guild, minimizing calls to the rate-limited
//! external metadata provider. Exposes the resolver surface over HTTP for
//! the chat command layer.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marquee_resolver::services::omdb_client::OmdbClient;
use marquee_resolver::services::resolver::Resolver;
use marquee_resolver::services::search_cache::SearchCache;
use marquee_resolver::AppState;

/// Command-line arguments for marquee-resolver
#[derive(Parser, Debug)]
#[command(name = "marquee-resolver")]
#[command(about = "Movie resolution service for Marquee")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5727", env = "MARQUEE_PORT")]
    port: u16,

    /// Root folder containing the database
    #[arg(short, long, env = "MARQUEE_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marquee_resolver=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting marquee-resolver");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Resolve configuration: CLI -> env -> TOML -> defaults
    let toml_config = marquee_common::config::TomlConfig::load();
    let root_folder =
        marquee_common::config::resolve_root_folder(args.root_folder.as_deref(), &toml_config);
    info!("Root folder: {}", root_folder.display());

    // Open or create the catalog database
    let db_path = marquee_common::config::database_path(&root_folder);
    info!("Database: {}", db_path.display());

    let db_pool = marquee_resolver::db::init_database_pool(&db_path)
        .await
        .context("Failed to initialize database")?;
    info!("Database connection established");

    // Metadata provider: Database -> ENV -> TOML key resolution
    let api_key = marquee_resolver::config::resolve_omdb_api_key(&db_pool, &toml_config).await?;
    let provider = OmdbClient::new(api_key)
        .map_err(|e| anyhow::anyhow!("Failed to create OMDb client: {}", e))?;

    let (cache_capacity, cache_ttl) = marquee_resolver::config::search_cache_settings(&toml_config);
    let search_cache = SearchCache::new(cache_capacity, cache_ttl);
    info!(
        "Search cache: capacity {}, TTL {:?}",
        cache_capacity, cache_ttl
    );

    let resolver = Arc::new(Resolver::new(db_pool.clone(), Arc::new(provider), search_cache));

    let state = AppState::new(db_pool, resolver);
    let app = marquee_resolver::build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", args.port)).await?;
    info!("Listening on http://127.0.0.1:{}", args.port);
    info!("Health check: http://127.0.0.1:{}/health", args.port);

    axum::serve(listener, app).await?;

    Ok(())
}
