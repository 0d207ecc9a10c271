use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use butterfly_routing::contracted::{contract, ContractedRouter, MetaGraph};
use butterfly_routing::validate::{grid_profile, random_grid, validate_ch};
use butterfly_routing::{route, Graph, RoutingConfig, UNBOUNDED};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "butterfly-route")]
#[command(
    about = "Contraction hierarchy builder and checker on synthetic road grids",
    long_about = None
)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Routing configuration (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Contract a random grid and compare hierarchy routes with plain search
    Validate {
        #[arg(long, default_value = "50")]
        width: u32,
        #[arg(long, default_value = "50")]
        height: u32,
        /// Number of random queries
        #[arg(long, default_value = "1000")]
        queries: usize,
        #[arg(long, default_value = "42")]
        seed: u64,
    },
    /// Route between two vertices of a random grid
    Route {
        #[arg(long, default_value = "20")]
        width: u32,
        #[arg(long, default_value = "20")]
        height: u32,
        #[arg(long, default_value = "42")]
        seed: u64,
        #[arg(long)]
        from: u32,
        #[arg(long)]
        to: u32,
        /// Answer through a contracted hierarchy instead of plain search
        #[arg(long)]
        ch: bool,
    },
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<RoutingConfig> {
    let mut config = match path {
        Some(path) => RoutingConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RoutingConfig::default(),
    };
    if config.profiles.is_empty() {
        config.profiles = grid_profile();
    }
    Ok(config)
}

fn build_hierarchy(
    width: u32,
    height: u32,
    seed: u64,
    config: &RoutingConfig,
) -> Result<(Graph, MetaGraph)> {
    let graph = random_grid(width, height, seed).context("Failed to build grid")?;
    let meta = MetaGraph::from_graph(&graph, &config.profiles)?;
    let (meta, stats) = contract(meta, &config.contraction).context("Contraction failed")?;
    tracing::info!(
        shortcuts = stats.shortcuts,
        requeued = stats.requeued,
        elapsed_ms = stats.elapsed_ms as u64,
        "Hierarchy ready"
    );
    Ok((graph, meta))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Validate {
            width,
            height,
            queries,
            seed,
        } => {
            let (graph, meta) = build_hierarchy(width, height, seed, &config)?;
            let result = validate_ch(&graph, &config.profiles, &meta, queries, seed)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.passed() {
                bail!(
                    "{} of {} queries disagree with plain search",
                    result.incorrect,
                    result.n_tests
                );
            }
        }
        Commands::Route {
            width,
            height,
            seed,
            from,
            to,
            ch,
        } => {
            let start = Instant::now();
            let found = if ch {
                let (_, meta) = build_hierarchy(width, height, seed, &config)?;
                let router = ContractedRouter::new(&meta)?;
                router.route(from, to, UNBOUNDED)
            } else {
                let graph = random_grid(width, height, seed)?;
                route(&graph, &config.profiles, from, to, UNBOUNDED)
            };
            match found {
                Ok(found) => {
                    tracing::info!(elapsed_ms = start.elapsed().as_millis() as u64, "Route found");
                    println!("{}", serde_json::to_string_pretty(&found)?);
                }
                Err(e) if e.is_no_route() => println!("no route: {e}"),
                Err(e) => return Err(e).with_context(|| format!("Routing {from} -> {to} failed")),
            }
        }
    }
    Ok(())
}
