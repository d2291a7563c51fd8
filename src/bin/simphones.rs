//! simphones CLI
//!
//! Compute distances or similarities between sounds from PHOIBLE allophone
//! data, list per-language inventories, and inspect saved score files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use simphones_core::config::{DistanceStrategy, OutputFormat, Settings};
use simphones_core::histogram::Histogram;
use simphones_core::{phoible, serialize, AllophoneEngine, EdgeWeighting, COMBINED_INVENTORY};

#[derive(Parser)]
#[command(name = "simphones")]
#[command(author, version, about = "Compute distances between sounds using PHOIBLE allophone data")]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute pairwise scores and save them as CSV or JSON.
    Compute(ComputeArgs),

    /// Print every language inventory as `code,phone1,phone2,...`.
    Inventories {
        /// PHOIBLE CSV file
        phoible: PathBuf,
    },

    /// Print a text histogram of a saved score CSV file.
    Histogram {
        /// Score CSV written by `compute`
        data: PathBuf,

        /// Number of bins
        #[arg(short, long, default_value_t = 10)]
        bins: usize,
    },
}

#[derive(Args)]
struct ComputeArgs {
    /// PHOIBLE CSV file
    phoible: PathBuf,

    /// Output file
    output: PathBuf,

    /// JSON settings file (`{"engine": {...}, "output": {...}}`)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Edge weighting and closure
    #[arg(long, value_enum)]
    weighting: Option<WeightingArg>,

    /// Derive similarity from distances by normalizing against the maximum
    #[arg(long)]
    normalize: bool,

    /// Run the closure on the full graph without removing degree-1 nodes
    #[arg(long)]
    no_prune: bool,

    /// All-pairs algorithm for distances
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Round scores to this many decimal places
    #[arg(long)]
    ndigits: Option<u32>,
}

#[derive(Clone, Copy, ValueEnum)]
enum WeightingArg {
    Distance,
    Similarity,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Dijkstra,
    Sweep,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Compute(args) => compute(args),
        Commands::Inventories { phoible } => inventories(phoible),
        Commands::Histogram { data, bins } => histogram(data, bins),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn settings(args: &ComputeArgs) -> Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::from_json_file(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?,
        None => Settings::default(),
    };

    if let Some(weighting) = args.weighting {
        settings.engine.weighting = match weighting {
            WeightingArg::Distance => EdgeWeighting::Distance,
            WeightingArg::Similarity => EdgeWeighting::Similarity,
        };
    }
    if args.no_prune {
        settings.engine.prune_pendants = false;
    }
    if let Some(strategy) = args.strategy {
        settings.engine.distance_strategy = match strategy {
            StrategyArg::Dijkstra => DistanceStrategy::Dijkstra,
            StrategyArg::Sweep => DistanceStrategy::Sweep,
        };
    }
    if let Some(format) = args.format {
        settings.output.format = match format {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Json => OutputFormat::Json,
        };
    }
    if args.ndigits.is_some() {
        settings.output.ndigits = args.ndigits;
    }
    Ok(settings)
}

fn compute(args: ComputeArgs) -> Result<()> {
    let settings = settings(&args)?;
    if args.normalize && settings.engine.weighting != EdgeWeighting::Distance {
        anyhow::bail!("--normalize derives similarity from distances; use --weighting distance");
    }

    let dataset = phoible::read_inventories(&args.phoible)
        .with_context(|| format!("failed to read {}", args.phoible.display()))?;

    let engine = AllophoneEngine::new(settings.engine.clone());
    let mut scores = engine.compute(&dataset)?;
    if args.normalize {
        scores = simphones_core::similarity_from_distances(&scores)?;
    }

    let ndigits = settings.output.ndigits;
    match settings.output.format {
        OutputFormat::Csv => serialize::save_as_csv(&args.output, &scores, ndigits),
        OutputFormat::Json => serialize::save_as_json(&args.output, &scores, ndigits),
    }
    .with_context(|| format!("failed to write {}", args.output.display()))?;

    info!(pairs = scores.len(), output = %args.output.display(), "saved scores");
    Ok(())
}

fn inventories(path: PathBuf) -> Result<()> {
    let dataset = phoible::read_inventories(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    for (code, inventory) in &dataset {
        if code == COMBINED_INVENTORY {
            continue;
        }
        let mut line = code.clone();
        for sound in inventory.keys() {
            line.push(',');
            line.push_str(sound);
        }
        println!("{line}");
    }
    Ok(())
}

fn histogram(path: PathBuf, bins: usize) -> Result<()> {
    let scores = serialize::read_from_csv(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let histogram = Histogram::from_scores(scores.into_values(), bins)?;
    print!("{}", histogram.render(50));
    Ok(())
}
