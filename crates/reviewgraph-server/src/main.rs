//! ReviewGraph: review enrichment, triple graph and search from the command line or over HTTP.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use reviewgraph_core::{AppConfig, ServerConfig};
use reviewgraph_resolve::{SearchFilters, SearchOutcome};
use reviewgraph_runtime::{GraphView, QueryFacade};
use reviewgraph_server::{build_router, AppState};
use reviewgraph_store::EnrichmentCache;

#[derive(Parser)]
#[command(name = "reviewgraph")]
#[command(version, about = "Review enrichment, knowledge triples and search", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML file overriding the built-in vocabularies and thresholds
    #[arg(long, global = true, env = "REVIEWGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory (enrichment cache, exports)
    #[arg(long, global = true, env = "REVIEWGRAPH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Skip the on-disk enrichment cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich a review CSV and write the enriched table
    Enrich {
        input: PathBuf,
        /// Output file (defaults to <input>_enriched.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Ranked search with intent boosts and semantic triples
    Search {
        input: PathBuf,
        query: String,
        #[arg(short = 'n', long)]
        top_n: Option<usize>,
        /// Plain BM25 without intent, expansion or boosts
        #[arg(long)]
        plain: bool,
    },

    /// Attribute-filtered search
    Filter {
        input: PathBuf,
        #[arg(long)]
        product: Option<String>,
        #[arg(long)]
        brand: Option<String>,
        #[arg(long)]
        sentiment: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// Re-rank the filtered subset by this keyword
        #[arg(short, long)]
        keyword: Option<String>,
        #[arg(short = 'n', long)]
        top_n: Option<usize>,
    },

    /// Rule-table triple lookup for a natural-language question
    Semantic { input: PathBuf, query: String },

    /// Export the triple table as CSV plus a stats file
    Export {
        input: PathBuf,
        /// Output file (defaults to <data-dir>/exports/triples.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Entity graph summary, or one entity's neighbours
    Graph {
        input: PathBuf,
        /// full, sentiment or product
        #[arg(long, default_value = "full")]
        view: GraphView,
        #[arg(long, default_value_t = 10)]
        top: usize,
        #[arg(long)]
        entity: Option<String>,
    },

    /// Start the HTTP server
    Serve {
        /// Review file to load at startup
        #[arg(long)]
        dataset: Option<PathBuf>,
        #[arg(long, env = "REVIEWGRAPH_PORT")]
        port: Option<u16>,
    },
}

fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()));
        if let Some(dir) = exe_dir {
            let parent_data = dir.join("../data");
            if parent_data.exists() {
                return parent_data;
            }
        }
        PathBuf::from("data")
    })
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            AppConfig::from_toml_file(path)?
        }
        None => AppConfig::default(),
    };
    Ok(config.with_env_overrides())
}

fn build_facade(
    config: AppConfig,
    server: &ServerConfig,
    no_cache: bool,
) -> anyhow::Result<QueryFacade> {
    let cache = if no_cache {
        None
    } else {
        match EnrichmentCache::open(&server.data_paths.cache_db) {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!("Enrichment cache unavailable, continuing without it: {}", e);
                None
            }
        }
    };
    Ok(QueryFacade::new(config, cache)?)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_hits<'a>(hits: impl IntoIterator<Item = &'a reviewgraph_resolve::Hit>) {
    for (rank, hit) in hits.into_iter().enumerate() {
        println!("{:>2}. [review {}] score {:.3}", rank + 1, hit.review_id, hit.score);
        for key in ["event", "product", "brand", "location", "price", "rating"] {
            if let Some(value) = hit.fields.get(key) {
                println!("      {:<9}{}", key, value);
            }
        }
        let snippet: String = hit.text.chars().take(160).collect();
        println!("      {}", snippet);
    }
}

fn print_outcome_header(status: &str, message: &str, count: usize) {
    println!("{} ({} results): {}", status, count, message);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let data_dir = resolve_data_dir(cli.data_dir.clone());
    let server = ServerConfig::from_env(&data_dir)?;
    let config = load_config(cli.config.as_deref())?;
    let json = matches!(cli.format, OutputFormat::Json);

    let facade = build_facade(config, &server, cli.no_cache)?;

    match cli.command {
        Commands::Enrich { input, output } => {
            let summary = facade.load(&input)?;
            let output = output.unwrap_or_else(|| enriched_path_for(&input));
            facade.write_enriched(&output)?;
            if json {
                print_json(&summary)?;
            } else {
                let r = &summary.report;
                println!("Enriched {} of {} reviews -> {}", r.kept, r.total, output.display());
                println!(
                    "  prices {}  dates {}  models {}  products {}  brands {}  locations {}  persons {}",
                    r.with_prices,
                    r.with_dates,
                    r.with_models,
                    r.with_products,
                    r.with_brands,
                    r.with_locations,
                    r.with_persons
                );
                println!(
                    "  positive {}  negative {}  neutral {}  dropped {}",
                    r.positive,
                    r.negative,
                    r.neutral,
                    r.dropped_short + r.dropped_language
                );
                println!("  {} triples", summary.triples);
            }
        }

        Commands::Search {
            input,
            query,
            top_n,
            plain,
        } => {
            facade.load(&input)?;
            if plain {
                let outcome: SearchOutcome = facade.keyword_search(&query, top_n);
                if json {
                    print_json(&outcome)?;
                } else {
                    print_outcome_header(
                        &outcome.status.to_string(),
                        &outcome.message,
                        outcome.hits.len(),
                    );
                    print_hits(&outcome.hits);
                }
            } else {
                let answer = facade.search(&query, top_n);
                if json {
                    print_json(&answer)?;
                } else {
                    print_outcome_header(&answer.status.to_string(), &answer.message, answer.hits.len());
                    print_hits(answer.hits.iter().map(|h| &h.hit));
                    if !answer.semantic.triples.is_empty() {
                        println!();
                        println!("Related facts ({}):", answer.semantic.matched_rules.join(", "));
                        for t in &answer.semantic.triples {
                            println!("  {} {} {}", t.subject, t.predicate, t.object);
                        }
                    }
                }
            }
        }

        Commands::Filter {
            input,
            product,
            brand,
            sentiment,
            location,
            keyword,
            top_n,
        } => {
            facade.load(&input)?;
            let filters = SearchFilters {
                product,
                brand,
                sentiment,
                location,
            };
            let answer = facade.filtered_search(&filters, keyword.as_deref(), top_n);
            if json {
                print_json(&answer)?;
            } else {
                print_outcome_header(&answer.status.to_string(), &answer.message, answer.hits.len());
                print_hits(answer.hits.iter().map(|h| &h.hit));
            }
        }

        Commands::Semantic { input, query } => {
            facade.load(&input)?;
            let result = facade.semantic_query(&query);
            if json {
                print_json(&result)?;
            } else {
                if result.matched_rules.is_empty() {
                    println!("No rule matched; showing a sample of the triple store");
                } else {
                    println!("Matched rules: {}", result.matched_rules.join(", "));
                }
                for t in &result.triples {
                    println!("  {} {} {}", t.subject, t.predicate, t.object);
                }
            }
        }

        Commands::Export { input, output } => {
            facade.load(&input)?;
            let output = output.unwrap_or_else(|| server.data_paths.exports.join("triples.csv"));
            let summary = facade.export_triples(&output)?;
            if json {
                print_json(&summary)?;
            } else {
                println!(
                    "Exported {} triples to {} (stats: {})",
                    summary.stats.total_triples,
                    summary.path.display(),
                    summary.stats_path.display()
                );
            }
        }

        Commands::Graph {
            input,
            view,
            top,
            entity,
        } => {
            facade.load(&input)?;
            let graph = facade.graph(view);
            match entity {
                Some(entity) => {
                    if !graph.contains(&entity) {
                        anyhow::bail!("'{}' is not in the {} graph", entity, view);
                    }
                    let neighbors = graph.neighbors(&entity);
                    if json {
                        print_json(&neighbors)?;
                    } else {
                        for n in &neighbors {
                            let arrow = if n.outgoing { "->" } else { "<-" };
                            println!("  {} {} {} ({:?})", arrow, n.predicate, n.label, n.kind);
                        }
                    }
                }
                None => {
                    let stats = graph.stats();
                    let top_entities = graph.top_entities(top);
                    if json {
                        print_json(&serde_json::json!({
                            "view": view,
                            "stats": stats,
                            "top_entities": top_entities,
                        }))?;
                    } else {
                        println!(
                            "{} graph: {} nodes, {} edges",
                            view, stats.node_count, stats.edge_count
                        );
                        for (kind, count) in &stats.by_kind {
                            println!("  {:?}: {}", kind, count);
                        }
                        println!("Top entities:");
                        for e in &top_entities {
                            println!("  {:<24} {:?} degree {}", e.label, e.kind, e.degree);
                        }
                    }
                }
            }
        }

        Commands::Serve { dataset, port } => {
            if let Some(path) = &dataset {
                facade.load(path)?;
            }
            let port = port.unwrap_or(server.port);
            info!("Data directory: {}", data_dir.display());

            let state = Arc::new(AppState::new(server, facade));
            let app = build_router(state);

            let addr = format!("0.0.0.0:{}", port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("ReviewGraph server listening on {}", addr);

            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

fn enriched_path_for(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "reviews".to_string());
    input.with_file_name(format!("{}_enriched.csv", stem))
}
