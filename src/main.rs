//! precache - client-side asset cache
//!
//! Pre-populates a named cache with a manifest of static resources from an
//! origin, then serves requests cache-first with network fallback.

mod cache;
mod manifest;
mod origin;
mod worker;

use std::env;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

use cache::AssetStore;
use manifest::{Manifest, DEFAULT_CACHE_NAME};
use origin::OriginClient;
use worker::AssetWorker;

/// CLI command
#[derive(Debug)]
enum Command {
    /// Pre-populate the cache from the manifest (install handler)
    Install { manifest: PathBuf, origin: String },
    /// Resolve one request cache-first (fetch handler)
    Get { path: String, origin: String },
    /// List cached entries
    Status,
    /// Show help
    Help,
}

fn print_help() {
    eprintln!(
        r#"precache - Client-side asset cache with manifest pre-population

USAGE:
    precache install [manifest.json] [origin]
    precache get <path> [origin]
    precache status
    precache help

COMMANDS:
    install  Fetch every manifest resource from the origin and store it in
             the named cache. Fails as a whole if any resource is unreachable.
    get      Resolve one request: served from the cache when present,
             otherwise fetched from the origin. Body is written to stdout.
    status   List entries in the named cache
    help     Show this help message

EXAMPLES:
    # Pre-populate the cache
    precache install manifest.json https://assets.example.com/app

    # Serve a cached resource (zero network calls after install)
    precache get index.html https://assets.example.com/app > index.html

    # A path outside the manifest falls back to the network
    precache get api/data https://assets.example.com/app

ENVIRONMENT:
    PRECACHE_ORIGIN       Origin base URL (alternative to CLI arg)
    PRECACHE_MANIFEST     Manifest file path (alternative to CLI arg)
    PRECACHE_CACHE_NAME   Cache name (default: {default_cache})
    RUST_LOG              Log level (trace, debug, info, warn, error)
"#,
        default_cache = DEFAULT_CACHE_NAME
    );
}

/// Origin base URL from CLI arg or environment
fn resolve_origin(arg: Option<String>) -> Result<String> {
    arg.or_else(|| env::var("PRECACHE_ORIGIN").ok())
        .ok_or_else(|| anyhow!("No origin configured (pass [origin] or set PRECACHE_ORIGIN)"))
}

/// Manifest path from CLI arg or environment
fn resolve_manifest(arg: Option<String>) -> Result<PathBuf> {
    arg.or_else(|| env::var("PRECACHE_MANIFEST").ok())
        .map(PathBuf::from)
        .ok_or_else(|| {
            anyhow!("No manifest configured (pass [manifest.json] or set PRECACHE_MANIFEST)")
        })
}

/// Cache name from environment, or the default
fn cache_name() -> String {
    env::var("PRECACHE_CACHE_NAME").unwrap_or_else(|_| DEFAULT_CACHE_NAME.to_string())
}

fn parse_args() -> Result<Command> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        return Ok(Command::Help);
    }

    match args[1].as_str() {
        "install" => {
            let manifest = resolve_manifest(args.get(2).cloned())?;
            let origin = resolve_origin(args.get(3).cloned())?;
            Ok(Command::Install { manifest, origin })
        }
        "get" => {
            let path = args
                .get(2)
                .cloned()
                .ok_or_else(|| anyhow!("Usage: precache get <path> [origin]"))?;
            let origin = resolve_origin(args.get(3).cloned())?;
            Ok(Command::Get { path, origin })
        }
        "status" => Ok(Command::Status),
        "help" | "--help" | "-h" => Ok(Command::Help),
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            Ok(Command::Help)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let log_level = env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Parse command
    let command = match parse_args() {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            std::process::exit(1);
        }
    };

    match command {
        Command::Install { manifest, origin } => {
            let manifest = match Manifest::load(&manifest) {
                Ok(manifest) => manifest,
                Err(e) => {
                    error!(error = %e, "Failed to load manifest");
                    return Err(e);
                }
            };

            let store = AssetStore::open(&cache_name())?;
            let client = OriginClient::new(&origin)?;
            let worker = AssetWorker::new(store, Box::new(client));

            match worker.install(&manifest).await {
                Ok(report) => {
                    println!(
                        "Cached {} resources ({} bytes) into '{}'",
                        report.resources,
                        report.total_bytes,
                        worker.store().name()
                    );
                }
                Err(e) => {
                    error!(error = %e, "Install failed");
                    return Err(e);
                }
            }
        }
        Command::Get { path, origin } => {
            let store = AssetStore::open(&cache_name())?;
            let client = OriginClient::new(&origin)?;
            let worker = AssetWorker::new(store, Box::new(client));

            let response = worker.fetch(&path).await?;
            info!(
                path = %response.path,
                source = %response.source,
                status = response.status,
                content_type = response.content_type.as_deref().unwrap_or("-"),
                size = response.body.len(),
                "Request resolved"
            );

            let (hits, misses) = worker.store().stats();
            debug!(hits = hits, misses = misses, "Store lookup stats");

            std::io::stdout().write_all(&response.body)?;
        }
        Command::Status => {
            let store = AssetStore::open(&cache_name())?;
            let entries = store.entries()?;

            if entries.is_empty() {
                println!("Cache '{}' is empty.", store.name());
            } else {
                println!("Cache '{}': {} entries", store.name(), entries.len());
                for entry in entries {
                    println!(
                        "  {}  v{}  {}  {} bytes",
                        entry.path,
                        entry.version,
                        entry.content_type.as_deref().unwrap_or("-"),
                        entry.size
                    );
                }
            }
        }
        Command::Help => {
            print_help();
        }
    }

    Ok(())
}
