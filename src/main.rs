use anyhow::Context;
use clap::Parser;
use gleaner::config::{load_config, validate};
use gleaner::CrawlConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Polite breadth-first web harvester
#[derive(Debug, Parser)]
#[command(name = "gleaner", version, about)]
struct Cli {
    /// Seed URL to start crawling from
    seed_url: String,

    /// Destination for page records (directory or .jsonl file)
    dest: PathBuf,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum link depth from the seed (0 = seed only)
    #[arg(long)]
    max_depth: Option<u32>,

    /// Stop after this many page records
    #[arg(long)]
    max_pages: Option<u64>,

    /// Number of concurrent fetch workers
    #[arg(long)]
    workers: Option<usize>,

    /// Minimum delay between fetches to the same host, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Skip URLs already recorded at the destination
    #[arg(long)]
    resume: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn setup_logging(verbose: u8, quiet: bool) {
    let default_level = if quiet {
        "gleaner=warn"
    } else {
        match verbose {
            0 => "gleaner=info",
            1 => "gleaner=debug",
            _ => "gleaner=trace",
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Builds the effective configuration: file first, then CLI overrides
fn build_config(cli: &Cli) -> anyhow::Result<CrawlConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => CrawlConfig::default(),
    };

    if let Some(depth) = cli.max_depth {
        config.limits.max_depth = depth;
    }
    if let Some(pages) = cli.max_pages {
        config.limits.max_pages = pages;
    }
    if let Some(workers) = cli.workers {
        config.pool.workers = workers;
    }
    if let Some(delay) = cli.delay_ms {
        config.politeness.min_delay_ms = delay;
    }

    validate(&config)?;
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = build_config(&cli)?;

    let mut controller =
        gleaner::crawler::Controller::new(&cli.seed_url, &cli.dest, config, cli.resume)
            .context("could not start the crawl")?;

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, draining");
        }
    };

    let summary = controller.run(shutdown).await.context("crawl failed")?;

    println!(
        "Crawled {} page(s) in {:.1}s ({} failed, {} discovered, stopped: {})",
        summary.pages,
        summary.duration.as_secs_f64(),
        summary.failures,
        summary.discovered,
        summary.stop_reason
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
