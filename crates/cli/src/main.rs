// ABOUTME: CLI for the rewise podcast feed service.
// ABOUTME: Fetches and normalizes feeds, normalizes local files offline, and searches the podcast directory.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use rewise_feed::{
    models::non_empty, normalize_feed_bytes, PodcastService, MAX_EPISODES,
};
use serde_json::{json, Value};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Client identity used for rate limiting CLI requests.
const CLI_CLIENT: &str = "cli";

#[derive(Parser, Debug)]
#[command(name = "rewise-cli")]
#[command(about = "Fetch, normalize and search podcast feeds", long_about = None)]
struct Args {
    /// Output compact JSON instead of pretty
    #[arg(long, global = true)]
    compact: bool,

    /// Log filter (e.g. "debug", "rewise_feed=trace"); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch feeds over HTTP and print their normalized episodes
    Episodes {
        /// Feed URLs (http/https)
        #[arg(required = true)]
        urls: Vec<String>,

        /// Print the cache status after fetching
        #[arg(long)]
        status: bool,
    },
    /// Normalize a feed file without network access. Use "-" for stdin.
    Parse {
        target: String,

        /// Feed URL reported for the document
        #[arg(long)]
        feed_url: Option<String>,

        /// Entries to consider
        #[arg(long, default_value_t = MAX_EPISODES)]
        max_episodes: usize,
    },
    /// Search the podcast directory
    Search { term: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());

    match run(&args).await {
        Ok(output) => {
            let rendered = if args.compact {
                serde_json::to_string(&output)
            } else {
                serde_json::to_string_pretty(&output)
            };
            match rendered {
                Ok(text) => {
                    println!("{text}");
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    ExitCode::FAILURE
                }
            }
        }
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rewise=info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(args: &Args) -> Result<Value> {
    match &args.command {
        Command::Episodes { urls, status } => {
            let service = PodcastService::builder().build()?;
            let mut results = Vec::new();
            for url in urls {
                match service.episodes(CLI_CLIENT, url).await {
                    Ok(response) => results.push(json!({
                        "feedUrl": url,
                        "ok": true,
                        "response": response,
                        "error": null
                    })),
                    Err(err) => results.push(json!({
                        "feedUrl": url,
                        "ok": false,
                        "response": null,
                        "error": err.to_string(),
                        "status": err.status_code()
                    })),
                }
            }

            let mut output = if results.len() == 1 {
                results.remove(0)
            } else {
                let total = results.len();
                let ok = results
                    .iter()
                    .filter(|r| r.get("ok").and_then(Value::as_bool) == Some(true))
                    .count();
                json!({
                    "feeds": results,
                    "total": total,
                    "ok": ok,
                    "failed": total - ok
                })
            };

            if *status {
                let cache = service.cache_status(CLI_CLIENT)?;
                if let Some(map) = output.as_object_mut() {
                    map.insert("cacheStatus".to_string(), serde_json::to_value(cache)?);
                }
            }
            Ok(output)
        }
        Command::Parse {
            target,
            feed_url,
            max_episodes,
        } => {
            let bytes = load_bytes(target)?;
            debug!(file = %target, bytes = bytes.len(), "normalizing local feed");
            let feed_url = feed_url.clone().unwrap_or_else(|| target.clone());
            let feed = normalize_feed_bytes(&bytes, &feed_url, *max_episodes)
                .with_context(|| format!("could not normalize {target}"))?;
            Ok(json!({
                "podcast": feed.podcast,
                "count": feed.episodes.len(),
                "episodes": feed.episodes,
                "feedUrl": feed_url,
                "parsingIssues": non_empty(feed.parsing_issues),
            }))
        }
        Command::Search { term } => {
            let service = PodcastService::builder().build()?;
            let response = service.search(CLI_CLIENT, term).await?;
            Ok(serde_json::to_value(response)?)
        }
    }
}

fn load_bytes(target: &str) -> Result<Vec<u8>> {
    if target == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        return Ok(buf);
    }

    let path = PathBuf::from(target);
    if !path.exists() {
        return Err(anyhow!("file not found: {}", target));
    }
    Ok(fs::read(path)?)
}
