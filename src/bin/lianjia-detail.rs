use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use lianjia_scout::config::{SessionArgs, SessionCredentials, Settings};
use lianjia_scout::pipeline::DetailRun;
use lianjia_scout::scrapers::HttpFetcher;

/// Fetch detail pages for listings produced by lianjia-scout
#[derive(Parser, Debug)]
#[command(name = "lianjia-detail", long_about = None)]
struct Args {
    /// JSON or CSV listing file written by lianjia-scout
    #[arg(long)]
    input: PathBuf,

    /// Output CSV (defaults to <input>_details.csv beside the input)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Only process the first N listings
    #[arg(long)]
    limit: Option<usize>,

    /// Minimum delay between requests, in seconds
    #[arg(long, default_value_t = 0.6)]
    min_delay: f64,

    /// Maximum delay between requests, in seconds
    #[arg(long, default_value_t = 1.6)]
    max_delay: f64,

    #[command(flatten)]
    session: SessionArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    lianjia_scout::init_tracing();
    let args = Args::parse();
    let settings = Settings::from_env()?;

    if !args.input.exists() {
        anyhow::bail!("Input listing file not found: {}", args.input.display());
    }

    let source = args.session.apply(settings.credentials.clone());
    let credentials = SessionCredentials::resolve(&source).context("Session credentials are not configured")?;
    let fetcher = HttpFetcher::new(&credentials, settings.request_timeout)?;

    let run = DetailRun::new(fetcher)?
        .with_limit(args.limit)
        .with_delay_secs(args.min_delay, args.max_delay);

    let summary = run
        .run(&args.input, args.output.as_deref())
        .await
        .with_context(|| format!("Detail scrape of {} failed", args.input.display()))?;

    info!(
        "✅ {} listings: {} ok, {} login required, {} without link, {} failed ({}s)",
        summary.total,
        summary.ok,
        summary.login_required,
        summary.no_link,
        summary.failed,
        summary.elapsed.num_seconds()
    );
    info!("💾 Detail table saved to {}", summary.csv_path.display());
    info!("💾 Detail JSON saved to {}", summary.json_path.display());

    Ok(())
}
