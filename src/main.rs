mod client;
mod config;
mod error;
mod ingest;
mod query;
mod samples;
mod schema;
mod session;
mod workflow;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::{ClientOptions, VectorStore, VectorStoreClient};
use crate::config::{ConfigManager, VectorDbConfig};
use query::SearchRequest;
use schema::manager::{ensure_collection, reset_collection};
use schema::presets::Preset;
use session::SearchSession;
use std::io::{self, Write};
use workflow::{DemoOptions, DemoSummary, projected_fields, run_demo, search_and_print, search_or_empty, search_target};

// ============================================================================
// CLI Argument Parsing
// ============================================================================

#[derive(Parser)]
#[command(name = "vectordb", version, about = "Semantic search against a Weaviate vector store")]
struct Cli {
    /// Output JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    /// Service base URL (overrides the config file)
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reset the collection, load samples, verify, and run example searches
    Demo {
        #[arg(long, value_enum)]
        preset: Option<Preset>,
        /// Skip the interactive prompt at the end
        #[arg(long)]
        no_interactive: bool,
    },
    /// Run a single near-text search
    Search {
        /// Free-text concept to search for
        query: String,
        #[arg(long, value_enum)]
        preset: Option<Preset>,
        /// Collection to query (defaults to the preset's collection)
        #[arg(short, long)]
        collection: Option<String>,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Read queries from stdin until 'quit'
    Interactive {
        #[arg(long, value_enum)]
        preset: Option<Preset>,
        /// Collection to query (defaults to the preset's collection)
        #[arg(short, long)]
        collection: Option<String>,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Drop and recreate the collection (destroys its records)
    Reset {
        #[arg(long, value_enum)]
        preset: Option<Preset>,
    },
    /// Create the collection if it does not exist
    Ensure {
        #[arg(long, value_enum)]
        preset: Option<Preset>,
    },
    /// Show service liveness, readiness and collection state
    Status {
        #[arg(long, value_enum)]
        preset: Option<Preset>,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
    /// Set a config value (url, api-key, timeout, settle, search-limit, verify-limit, snippet-chars, verify-snippet-chars, preset)
    Set {
        key: String,
        value: String,
    },
}

/// JSON envelope for non-interactive output
fn json_output(success: bool, data: serde_json::Value, error: Option<&str>) -> String {
    serde_json::json!({
        "success": success,
        "data": data,
        "error": error,
    })
    .to_string()
}

fn demo_json(summary: &DemoSummary) -> serde_json::Value {
    serde_json::json!({
        "inserted": summary.inserted,
        "failed_inserts": summary.failed_inserts,
        "listed": summary.listed,
        "searches": summary.searches.iter()
            .map(|(q, n)| serde_json::json!({ "query": q, "hits": n }))
            .collect::<Vec<_>>(),
    })
}

/// Run the demo workflow and report it on `out`: progress text, or a single
/// JSON envelope (success or failure) in JSON mode.
fn write_demo<S: VectorStore + ?Sized, W: Write>(
    store: &S,
    options: &DemoOptions,
    json_mode: bool,
    out: &mut W,
) -> Result<()> {
    let outcome = if json_mode {
        run_demo(store, options, &mut io::sink())
    } else {
        run_demo(store, options, &mut *out)
    };

    match outcome {
        Ok(summary) => {
            if json_mode {
                writeln!(out, "{}", json_output(true, demo_json(&summary), None))?;
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(kind = e.kind(), error = %e, "Demo aborted");
            if json_mode {
                writeln!(out, "{}", json_output(false, serde_json::Value::Null, Some(&e.to_string())))?;
            }
            Err(e.into())
        }
    }
}

fn init_logging(json_mode: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("vectordb=info"));

    if json_mode {
        // Keep stdout clean for the JSON envelope
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_ansi(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    } else if std::env::var("VECTORDB_LOG_JSON").is_ok() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .compact()
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json);

    let mut config_manager = ConfigManager::new()?;
    let mut config = config_manager.get().clone();
    if let Some(url) = cli.url {
        config.url = url;
    }

    run_command(cli.command, &config, &mut config_manager, cli.json)
}

fn connect(config: &VectorDbConfig) -> Result<VectorStoreClient> {
    VectorStoreClient::connect_with(&config.url, ClientOptions::from(config))
        .with_context(|| format!("Failed to connect to {}", config.url))
}

// ============================================================================
// Command Runner
// ============================================================================

fn run_command(
    command: Commands,
    config: &VectorDbConfig,
    config_manager: &mut ConfigManager,
    json_mode: bool,
) -> Result<()> {
    let stdout = io::stdout();

    match command {
        Commands::Demo { preset, no_interactive } => {
            let mut options = DemoOptions::from(config);
            options.preset = preset.unwrap_or(config.preset);

            let mut client = connect(config)?;
            if !json_mode {
                println!("Successfully connected to {}", client.base_url());
            }

            let mut result = write_demo(&client, &options, json_mode, &mut stdout.lock());
            if result.is_ok() && !no_interactive && !json_mode {
                println!("\nStarting interactive search...");
                let session = SearchSession::new(
                    &client,
                    options.preset.name(),
                    projected_fields(options.preset),
                    options.search_limit,
                );
                result = session
                    .run(io::stdin().lock(), &mut stdout.lock(), options.snippet_chars)
                    .map_err(Into::into);
            }

            client.close();
            if json_mode {
                tracing::info!("Connection closed");
            } else {
                println!("\nConnection closed.");
            }
            result?;
        }
        Commands::Search { query, preset, collection, limit } => {
            let (collection, fields) = search_target(preset.unwrap_or(config.preset), collection);
            let limit = limit.unwrap_or(config.output.search_limit);
            let client = connect(config)?;

            let field_refs: Vec<&str> = fields.iter().map(|f| f.as_str()).collect();
            let request = SearchRequest::new(&collection, query, &field_refs, limit).with_additional();

            if json_mode {
                let hits: Vec<serde_json::Value> = search_or_empty(&client, &request)
                    .map(|hit| {
                        serde_json::json!({
                            "id": hit.id,
                            "distance": hit.distance,
                            "properties": hit.properties,
                        })
                    })
                    .collect();
                println!("{}", json_output(true, serde_json::json!(hits), None));
            } else {
                search_and_print(&client, &request, config.output.snippet_chars, &mut stdout.lock())?;
            }
        }
        Commands::Interactive { preset, collection, limit } => {
            let (collection, fields) = search_target(preset.unwrap_or(config.preset), collection);
            let limit = limit.unwrap_or(config.output.search_limit);
            let client = connect(config)?;

            let session = SearchSession::new(&client, collection, fields, limit);
            session.run(io::stdin().lock(), &mut stdout.lock(), config.output.snippet_chars)?;
        }
        Commands::Reset { preset } => {
            let collection = preset.unwrap_or(config.preset).collection();
            let client = connect(config)?;
            reset_collection(&client, &collection, config.settle())?;

            if json_mode {
                println!("{}", json_output(true, serde_json::json!({ "collection": collection.name }), None));
            } else {
                println!("Collection {} recreated.", collection.name);
            }
        }
        Commands::Ensure { preset } => {
            let collection = preset.unwrap_or(config.preset).collection();
            let client = connect(config)?;
            let created = ensure_collection(&client, &collection)?;

            if json_mode {
                println!(
                    "{}",
                    json_output(true, serde_json::json!({ "collection": collection.name, "created": created }), None)
                );
            } else if created {
                println!("Collection {} created.", collection.name);
            } else {
                println!("Collection {} already exists.", collection.name);
            }
        }
        Commands::Status { preset } => {
            let name = preset.unwrap_or(config.preset).name();
            match VectorStoreClient::connect_with(&config.url, ClientOptions::from(config)) {
                Ok(client) => {
                    let ready = client.is_ready();
                    let exists = client.collection_exists(name);
                    if json_mode {
                        println!(
                            "{}",
                            json_output(
                                true,
                                serde_json::json!({
                                    "url": client.base_url(),
                                    "live": true,
                                    "ready": ready,
                                    "collection": name,
                                    "exists": exists.as_ref().ok(),
                                }),
                                None
                            )
                        );
                    } else {
                        println!("Service:    {} (live)", client.base_url());
                        println!("Ready:      {}", if ready { "yes" } else { "not yet" });
                        match exists {
                            Ok(true) => println!("Collection: {} exists", name),
                            Ok(false) => println!("Collection: {} missing", name),
                            Err(e) => println!("Collection: {} unknown ({})", name, e),
                        }
                    }
                }
                Err(e) => {
                    if json_mode {
                        println!("{}", json_output(false, serde_json::json!({ "url": config.url }), Some(&e.to_string())));
                    } else {
                        println!("Service:    {} unreachable ({})", config.url, e);
                    }
                }
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let mut shown = config.clone();
                if shown.api_key.is_some() {
                    shown.api_key = Some("********".to_string());
                }
                if json_mode {
                    println!("{}", json_output(true, serde_json::to_value(&shown)?, None));
                } else {
                    print!("{}", toml::to_string_pretty(&shown)?);
                }
            }
            ConfigAction::Path => {
                println!("{}", config_manager.config_path().display());
            }
            ConfigAction::Set { key, value } => {
                if let Err(e) = config_manager.get_mut().set(&key, &value) {
                    if json_mode {
                        println!("{}", json_output(false, serde_json::Value::Null, Some(&e.to_string())));
                    } else {
                        eprintln!("{}", e);
                    }
                    std::process::exit(1);
                }
                config_manager.save()?;
                if json_mode {
                    println!("{}", json_output(true, serde_json::json!({ "key": key }), None));
                } else {
                    println!("{} updated in {}", key, config_manager.config_path().display());
                }
            }
        },
    }

    io::stdout().flush()?;
    Ok(())
}
