use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use club_network::config::Config;
use club_network::logging;
use club_network::pipeline::{self, storage::cache, NetworkPipeline};

#[derive(Parser)]
#[command(name = "club_network")]
#[command(about = "Yearly club similarity networks from scraped listings")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to config.toml (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build network-<year>.json for every year in the data
    Build {
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Seed for community detection
        #[arg(long)]
        seed: Option<u64>,
        /// Ignore the fact-table cache entirely
        #[arg(long)]
        no_cache: bool,
        /// Recompute the fact table and overwrite the cache
        #[arg(long, conflicts_with = "no_cache")]
        rebuild_cache: bool,
    },
    /// Report per-region residency statistics for each year
    Analyze {
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        no_cache: bool,
    },
    /// Summarise a written network document
    Inspect {
        file: PathBuf,
    },
    /// Delete the cached fact table
    ClearCache,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let mut config = Config::load(path.map(|p| p.as_path())).context("Failed to load configuration")?;
    config
        .apply_env()
        .context("Invalid environment override")?;
    Ok(config)
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Build {
            data_dir,
            output_dir,
            seed,
            no_cache,
            rebuild_cache,
        } => {
            if let Some(dir) = data_dir {
                config.input.data_dir = dir;
            }
            if let Some(dir) = output_dir {
                config.output.dir = dir;
            }
            if let Some(seed) = seed {
                config.community.seed = seed;
            }
            if no_cache {
                config.cache.enabled = false;
            }
            if rebuild_cache {
                config.cache.rebuild = true;
            }

            println!("🔄 Building club networks from {}...", config.input.data_dir.display());
            let result = match NetworkPipeline::new(config).run() {
                Ok(result) => result,
                Err(e) => {
                    error!("Pipeline failed: {}", e);
                    return Err(e).context("Network build failed");
                }
            };

            println!("\n📊 Pipeline Results (run {}):", result.run_id);
            println!("   Fact rows: {}{}", result.fact_rows, if result.cache_hit { " (cached)" } else { "" });
            println!("   Artist id exceptions: {}", result.artist_exceptions);
            for year in &result.years {
                println!(
                    "   {}: {} venues, {} links, {} communities -> {}",
                    year.year,
                    year.venues,
                    year.links,
                    year.communities,
                    year.output.display()
                );
            }
            println!("✅ Build completed successfully");
        }
        Commands::Analyze { data_dir, no_cache } => {
            if let Some(dir) = data_dir {
                config.input.data_dir = dir;
            }
            if no_cache {
                config.cache.enabled = false;
            }
            let significance = config.analysis.significance;
            let years = NetworkPipeline::new(config)
                .analyze()
                .context("Residency analysis failed")?;

            for year in years {
                println!("\n📈 {} (significance {})", year.year, significance);
                println!("   {:<24} {:>6} {:>8} {:>10}  distinct", "region", "n", "D", "p");
                for c in &year.comparisons {
                    println!(
                        "   {:<24} {:>6} {:>8.4} {:>10.3e}  {}",
                        c.region,
                        c.sample_size,
                        c.statistic,
                        c.p_value,
                        if c.distinct { "yes" } else { "no" }
                    );
                }
            }
        }
        Commands::Inspect { file } => {
            let document = pipeline::read_document(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let nodes = document.node_records().context("Node rows do not match node_keys")?;
            let links = document.link_records().context("Link rows do not match link_keys")?;

            let mut groups: Vec<u64> = nodes
                .iter()
                .filter_map(|n| n.get("group").and_then(|g| g.as_u64()))
                .collect();
            groups.sort_unstable();
            groups.dedup();

            println!("📄 {}", file.display());
            println!("   Nodes: {} ({} keys)", nodes.len(), document.node_keys.len());
            println!("   Links: {} ({} keys)", links.len(), document.link_keys.len());
            println!("   Communities: {}", groups.len());
            println!("   Artist id exceptions: {}", document.artist_names_to_ids.len());
            for node in nodes.iter().take(5) {
                println!("   - {}", serde_json::to_string(node)?);
            }
        }
        Commands::ClearCache => {
            let path = config.cache.path.clone();
            if cache::clear(&path).with_context(|| format!("Failed to remove {}", path.display()))? {
                info!("Removed cache {}", path.display());
                println!("🧹 Removed {}", path.display());
            } else {
                println!("No cache at {}", path.display());
            }
        }
    }
    Ok(())
}
