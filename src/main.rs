use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use lianjia_scout::cities::city_code;
use lianjia_scout::config::{SessionArgs, SessionCredentials, Settings};
use lianjia_scout::pipeline::ListingRun;
use lianjia_scout::scrapers::{FailurePolicy, HttpFetcher, ListingLayout, PageRange};

/// Scrape a city's LianJia second-hand listings into CSV and JSON
#[derive(Parser, Debug)]
#[command(name = "lianjia-scout", long_about = None)]
struct Args {
    /// City name as shown on the site, e.g. 深圳 (prompted when omitted)
    #[arg(long)]
    city: Option<String>,

    /// Inclusive page range `l-r`, 1 <= l <= r <= 100 (prompted when omitted)
    #[arg(long)]
    pages: Option<String>,

    /// What to do when a page cannot be fetched or parsed
    #[arg(long, value_enum, default_value_t = FailurePolicy::Skip)]
    on_error: FailurePolicy,

    /// Output directory (defaults to OUTPUT_DIR or result/information)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// JSON file replacing the built-in field extraction layout
    #[arg(long)]
    layout: Option<PathBuf>,

    #[command(flatten)]
    session: SessionArgs,
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    lianjia_scout::init_tracing();
    let args = Args::parse();
    let settings = Settings::from_env()?;

    info!("🏠 LianJia Scout - listing scraper");
    info!("==========================================");

    let city = match args.city {
        Some(city) => city,
        None => prompt("请输入城市:")?,
    };
    if city_code(&city).is_none() {
        anyhow::bail!("链家暂未提供该城市相关信息: {city}");
    }

    let range = match args.pages {
        Some(pages) => PageRange::parse(&pages)?,
        None => PageRange::parse(&prompt("请输入页数范围:")?)?,
    };

    let layout = match &args.layout {
        Some(path) => ListingLayout::from_file(path)?,
        None => ListingLayout::default(),
    }
    .compile()?;

    let source = args.session.apply(settings.credentials.clone());
    let credentials = SessionCredentials::resolve(&source).context("Session credentials are not configured")?;
    let fetcher = HttpFetcher::new(&credentials, settings.request_timeout)?;

    let output_dir = args.out_dir.unwrap_or(settings.output_dir);
    let run = ListingRun::new(fetcher, layout, output_dir)
        .with_policy(args.on_error)
        .with_page_delay(*settings.page_delay_ms.start(), *settings.page_delay_ms.end());

    let summary = run.run(&city, range).await?;

    info!(
        "✅ Scraped {} listings from {} of {} pages in {}s",
        summary.listings,
        summary.pages_succeeded.len(),
        summary.range.page_count(),
        summary.elapsed.num_seconds()
    );
    for (page, reason) in &summary.failed_pages {
        warn!("Page {} was skipped: {}", page, reason);
    }
    if summary.listings == 0 {
        warn!("未成功抓取到任何数据，请检查登录状态或网络环境。");
    }
    info!("💾 CSV:  {}", summary.csv_path.display());
    info!("💾 JSON: {}", summary.json_path.display());

    Ok(())
}
